//! Record validation against the constraint catalog.
//!
//! The Validator checks a candidate record for one table before it is handed
//! to storage: required columns, declared types, and the range checks the
//! interpreter understands. Rule failures are returned as [`Violation`]s;
//! only infrastructure problems are errors.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cache::ConstraintCache;
use crate::catalog::{ConstraintCatalog, TableConstraints};
use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::source::SchemaSource;
use crate::value::Record;

use super::check::CheckExpr;
use super::types::is_compatible;

/// The write a record is destined for.
///
/// Both kinds are currently validated the same way; the distinction is kept
/// so partial updates can later relax required-column checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// New row.
    Insert,
    /// Existing row.
    Update,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Update => write!(f, "update"),
        }
    }
}

/// Error parsing an [`OperationKind`].
#[derive(Debug, Clone, Error)]
#[error("unknown operation kind: {0} (expected insert or update)")]
pub struct ParseOperationKindError(String);

impl FromStr for OperationKind {
    type Err = ParseOperationKindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(OperationKind::Insert),
            "update" => Ok(OperationKind::Update),
            _ => Err(ParseOperationKindError(s.to_string())),
        }
    }
}

/// Category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A non-nullable column without a default is missing or null.
    Required,
    /// A value does not fit the column's declared type.
    TypeMismatch,
    /// A check constraint evaluated false.
    Check,
}

/// One reason a record failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Offending field, for column rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Offending constraint, for check rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    /// A required column is missing or null.
    pub fn required(field: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            constraint_name: None,
            kind: ViolationKind::Required,
            message: format!("{field} is required and cannot be null"),
        }
    }

    /// A value does not match the declared column type.
    pub fn type_mismatch(field: &str, declared_type: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            constraint_name: None,
            kind: ViolationKind::TypeMismatch,
            message: format!("{field} has an invalid type, expected {declared_type}"),
        }
    }

    /// A check constraint failed.
    pub fn check(constraint_name: &str, raw_definition: &str) -> Self {
        Self {
            field: None,
            constraint_name: Some(constraint_name.to_string()),
            kind: ViolationKind::Check,
            message: format!("Check constraint violation: {raw_definition}"),
        }
    }
}

/// Outcome of validating one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// True when there are no violations.
    pub valid: bool,
    /// Every violation found, columns first (by name) then checks.
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }

    /// Build a result from a violation list.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    /// Violations raised for a field.
    pub fn violations_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.field.as_deref() == Some(field))
    }
}

/// Record validator backed by a [`ConstraintCache`].
pub struct Validator {
    cache: Arc<ConstraintCache>,
}

impl Validator {
    /// Create a validator over an existing cache.
    pub fn new(cache: Arc<ConstraintCache>) -> Self {
        Self { cache }
    }

    /// Create a validator with its own cache over a schema source.
    pub fn from_config(source: Arc<dyn SchemaSource>, config: &ValidatorConfig) -> Self {
        Self::new(Arc::new(ConstraintCache::with_ttl(source, config.cache_ttl)))
    }

    /// The backing cache.
    pub fn cache(&self) -> &Arc<ConstraintCache> {
        &self.cache
    }

    /// Validate a record bound for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaUnavailable`](crate::Error::SchemaUnavailable)
    /// or [`Error::MalformedCatalogInput`](crate::Error::MalformedCatalogInput)
    /// if the catalog had to be rebuilt and that failed. Rule failures are
    /// never errors.
    #[tracing::instrument(level = "debug", skip(self, record), fields(fields = record.len()))]
    pub fn validate(
        &self,
        table: &str,
        op: OperationKind,
        record: &Record,
    ) -> Result<ValidationResult> {
        let catalog = self.cache.get()?;
        Ok(Self::validate_against(&catalog, table, op, record))
    }

    /// Validate a record against a given catalog, without touching the cache.
    ///
    /// Tables missing from the catalog pass: there is nothing to check them
    /// against and the database still enforces its own rules.
    pub fn validate_against(
        catalog: &ConstraintCatalog,
        table: &str,
        op: OperationKind,
        record: &Record,
    ) -> ValidationResult {
        let Some(constraints) = catalog.table(table) else {
            debug!(table, %op, "table not in constraint catalog, skipping validation");
            return ValidationResult::ok();
        };

        let mut violations = Vec::new();
        check_columns(constraints, record, &mut violations);
        check_constraints(constraints, record, &mut violations);

        if !violations.is_empty() {
            debug!(table, %op, count = violations.len(), "record failed validation");
        }
        ValidationResult::from_violations(violations)
    }
}

fn check_columns(constraints: &TableConstraints, record: &Record, out: &mut Vec<Violation>) {
    for column in constraints.columns.values() {
        let value = record.get_or_null(&column.column_name);

        if value.is_null() {
            if !column.accepts_null() {
                out.push(Violation::required(&column.column_name));
            }
            continue;
        }

        if !is_compatible(value, &column.declared_type) {
            out.push(Violation::type_mismatch(
                &column.column_name,
                &column.declared_type,
            ));
        }
    }
}

fn check_constraints(constraints: &TableConstraints, record: &Record, out: &mut Vec<Violation>) {
    for check in &constraints.checks {
        let expr = check.expr();

        // A check on a column the catalog does not list cannot be verified.
        if let CheckExpr::Range { field, .. } = &expr {
            if !constraints.has_column(field) {
                continue;
            }
        }

        if !expr.evaluate(record) {
            out.push(Violation::check(
                &check.constraint_name,
                &check.raw_definition,
            ));
        }
    }
}
