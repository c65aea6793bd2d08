//! In-memory schema source.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{SchemaDocument, SchemaSource};
use crate::catalog::{CheckRow, ColumnRow, UniqueRow};
use crate::error::SourceError;

/// Schema source backed by rows held in memory.
///
/// Rows can be swapped at runtime to model a migration; the cache picks the
/// change up on its next rebuild.
#[derive(Debug, Default)]
pub struct MemorySchemaSource {
    document: RwLock<SchemaDocument>,
    fetches: AtomicU64,
}

impl MemorySchemaSource {
    /// Create a source over the given rows.
    pub fn new(columns: Vec<ColumnRow>, checks: Vec<CheckRow>, uniques: Vec<UniqueRow>) -> Self {
        Self::from_document(SchemaDocument {
            columns,
            checks,
            uniques,
        })
    }

    /// Create a source over a schema document.
    pub fn from_document(document: SchemaDocument) -> Self {
        Self {
            document: RwLock::new(document),
            fetches: AtomicU64::new(0),
        }
    }

    /// Replace all rows.
    pub fn replace(&self, document: SchemaDocument) {
        *self.document.write() = document;
    }

    /// Replace the column rows.
    pub fn set_columns(&self, columns: Vec<ColumnRow>) {
        self.document.write().columns = columns;
    }

    /// Replace the check rows.
    pub fn set_checks(&self, checks: Vec<CheckRow>) {
        self.document.write().checks = checks;
    }

    /// Replace the unique rows.
    pub fn set_uniques(&self, uniques: Vec<UniqueRow>) {
        self.document.write().uniques = uniques;
    }

    /// Number of snapshots served, counting column fetches and whole
    /// documents (one per catalog rebuild).
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl SchemaSource for MemorySchemaSource {
    fn fetch_column_constraints(&self) -> Result<Vec<ColumnRow>, SourceError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.document.read().columns.clone())
    }

    fn fetch_check_constraints(&self) -> Result<Vec<CheckRow>, SourceError> {
        Ok(self.document.read().checks.clone())
    }

    fn fetch_unique_constraints(&self) -> Result<Vec<UniqueRow>, SourceError> {
        Ok(self.document.read().uniques.clone())
    }

    fn fetch_document(&self) -> Result<SchemaDocument, SourceError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.document.read().clone())
    }
}
