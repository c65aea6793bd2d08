//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Validation core error.
    #[error(transparent)]
    Core(#[from] schemaguard_core::Error),

    /// Could not read a record file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Record text is not valid JSON.
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Record JSON is not an object.
    #[error("record must be a JSON object")]
    NotAnObject,

    /// Requested table is not in the catalog.
    #[error("table not found in catalog: {0}")]
    UnknownTable(String),
}
