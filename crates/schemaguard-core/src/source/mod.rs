//! Schema sources.
//!
//! A schema source reports every table's column, check and unique
//! constraints as three flat row lists. Database-backed sources live in the
//! host; this module provides the trait plus in-memory and JSON-file
//! implementations.

mod json_file;
mod memory;

use serde::{Deserialize, Serialize};

use crate::catalog::{CheckRow, ColumnRow, UniqueRow};
use crate::error::SourceError;

pub use json_file::JsonFileSchemaSource;
pub use memory::MemorySchemaSource;

/// Capability to read the schema's structural rules.
///
/// Each call returns rows for all tables; no per-table filtering is assumed.
/// Calls may block on I/O and inherit whatever timeouts the backend applies.
pub trait SchemaSource: Send + Sync {
    /// Fetch one row per (table, column).
    fn fetch_column_constraints(&self) -> Result<Vec<ColumnRow>, SourceError>;

    /// Fetch one row per check constraint.
    fn fetch_check_constraints(&self) -> Result<Vec<CheckRow>, SourceError>;

    /// Fetch one row per unique constraint.
    fn fetch_unique_constraints(&self) -> Result<Vec<UniqueRow>, SourceError>;

    /// Fetch all three row lists for one catalog build.
    ///
    /// The default issues the three fetches in turn. Sources that can read
    /// every list from a single snapshot should override this so a build
    /// never mixes rows from two versions of the schema.
    fn fetch_document(&self) -> Result<SchemaDocument, SourceError> {
        Ok(SchemaDocument {
            columns: self.fetch_column_constraints()?,
            checks: self.fetch_check_constraints()?,
            uniques: self.fetch_unique_constraints()?,
        })
    }
}

/// All three row lists in one document.
///
/// This is the on-disk format read by [`JsonFileSchemaSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Column rows.
    #[serde(default)]
    pub columns: Vec<ColumnRow>,
    /// Check rows.
    #[serde(default)]
    pub checks: Vec<CheckRow>,
    /// Unique rows.
    #[serde(default)]
    pub uniques: Vec<UniqueRow>,
}
