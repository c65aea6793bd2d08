//! JSON file schema source.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::{SchemaDocument, SchemaSource};
use crate::catalog::{CheckRow, ColumnRow, UniqueRow};
use crate::error::SourceError;

/// Schema source that reads a [`SchemaDocument`] from a JSON file.
///
/// The file is read once per catalog rebuild, so edits are seen on the next
/// rebuild and a build never mixes two versions of the file.
#[derive(Debug)]
pub struct JsonFileSchemaSource {
    path: PathBuf,
    reads: AtomicU64,
}

impl JsonFileSchemaSource {
    /// Create a source for the given path. The file is not read until fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reads: AtomicU64::new(0),
        }
    }

    /// Path of the schema file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the file has been read.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Read and decode the whole document.
    pub fn read_document(&self) -> Result<SchemaDocument, SourceError> {
        trace!(path = %self.path.display(), "reading schema document");
        self.reads.fetch_add(1, Ordering::Relaxed);
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl SchemaSource for JsonFileSchemaSource {
    fn fetch_column_constraints(&self) -> Result<Vec<ColumnRow>, SourceError> {
        Ok(self.read_document()?.columns)
    }

    fn fetch_check_constraints(&self) -> Result<Vec<CheckRow>, SourceError> {
        Ok(self.read_document()?.checks)
    }

    fn fetch_unique_constraints(&self) -> Result<Vec<UniqueRow>, SourceError> {
        Ok(self.read_document()?.uniques)
    }

    fn fetch_document(&self) -> Result<SchemaDocument, SourceError> {
        self.read_document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(
            &path,
            r#"{
                "columns": [
                    {"table_name": "leads", "column_name": "email",
                     "data_type": "text", "is_nullable": "NO"}
                ],
                "uniques": [
                    {"table_name": "leads", "constraint_name": "leads_email_key",
                     "columns": "email"}
                ]
            }"#,
        )
        .unwrap();

        let source = JsonFileSchemaSource::new(&path);
        assert_eq!(source.path(), path.as_path());

        let columns = source.fetch_column_constraints().unwrap();
        assert_eq!(columns.len(), 1);
        assert!(!columns[0].is_nullable);
        assert!(source.fetch_check_constraints().unwrap().is_empty());
        assert_eq!(source.fetch_unique_constraints().unwrap().len(), 1);
    }

    #[test]
    fn test_document_fetch_reads_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(
            &path,
            r#"{
                "columns": [
                    {"table_name": "t", "column_name": "score",
                     "data_type": "integer", "is_nullable": "NO"}
                ],
                "checks": [
                    {"table_name": "t", "constraint_name": "t_score_check",
                     "check_clause": "((score >= 1) AND (score <= 10))"}
                ]
            }"#,
        )
        .unwrap();

        let source = JsonFileSchemaSource::new(&path);
        let document = source.fetch_document().unwrap();
        assert_eq!(document.columns.len(), 1);
        assert_eq!(document.checks.len(), 1);
        assert_eq!(source.read_count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSchemaSource::new(dir.path().join("absent.json"));
        assert!(matches!(
            source.fetch_column_constraints(),
            Err(SourceError::Io(_))
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, "{ columns: ").unwrap();

        let source = JsonFileSchemaSource::new(path);
        assert!(matches!(
            source.fetch_check_constraints(),
            Err(SourceError::Parse(_))
        ));
    }
}
