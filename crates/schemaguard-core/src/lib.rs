//! SchemaGuard Core - runtime schema-constraint validation.
//!
//! This crate discovers a relational schema's structural rules at runtime,
//! caches them with a time-to-live, and validates untyped records against
//! them before they reach storage. The database remains authoritative; this
//! layer surfaces the common failures early and with field-level diagnostics.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constraint;
pub mod error;
pub mod source;
pub mod value;

pub use cache::{CacheStats, ConstraintCache, DEFAULT_CACHE_TTL};
pub use catalog::{
    CheckDescriptor, CheckRow, ColumnDescriptor, ColumnRow, ConstraintCatalog, RowKind,
    TableConstraints, UniqueDescriptor, UniqueRow,
};
pub use config::ValidatorConfig;
pub use constraint::{
    is_compatible, CheckEvaluator, CheckExpr, OperationKind, TypeFamily, ValidationResult,
    Validator, Violation, ViolationKind,
};
pub use error::{Error, Result, SourceError};
pub use source::{JsonFileSchemaSource, MemorySchemaSource, SchemaDocument, SchemaSource};
pub use value::{Record, Value};
