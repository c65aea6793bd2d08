//! Core error types.
//!
//! Only infrastructure failures are errors. A record that breaks a rule is
//! reported as a [`Violation`](crate::Violation) inside a normal result.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::RowKind;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core validation errors.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The schema source failed while the catalog was being refreshed.
    ///
    /// Callers should report this as "validation unavailable", never as an
    /// invalid record. Shared so that callers waiting on the same failed
    /// refresh all receive it.
    #[error("validation infrastructure unavailable: {0}")]
    SchemaUnavailable(#[source] Arc<SourceError>),

    /// A descriptor row from the schema source is missing a required name.
    #[error("malformed {kind} row at index {index}: {reason}")]
    MalformedCatalogInput {
        /// Which descriptor list the row came from.
        kind: RowKind,
        /// Position of the row in that list.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

impl Error {
    /// Create a schema-unavailable error.
    pub fn unavailable(source: SourceError) -> Self {
        Error::SchemaUnavailable(Arc::new(source))
    }

    /// Create a malformed-input error.
    pub fn malformed(kind: RowKind, index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedCatalogInput {
            kind,
            index,
            reason: reason.into(),
        }
    }

    /// Check if this error means the schema could not be obtained.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::SchemaUnavailable(_))
    }
}

/// Errors raised by a [`SchemaSource`](crate::SchemaSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// IO error while reading schema data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema data could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend-specific failure (connection refused, query error, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

impl SourceError {
    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        SourceError::Backend(message.into())
    }
}
