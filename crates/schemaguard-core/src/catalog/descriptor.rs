//! Descriptor rows and catalog descriptors.
//!
//! Rows are what the schema source hands over, shaped like the database's
//! information schema. Descriptors are the checked form stored in the
//! catalog.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constraint::{CheckExpr, TypeFamily};

/// The descriptor list a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Column row.
    Column,
    /// Check constraint row.
    Check,
    /// Unique constraint row.
    Unique,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Column => write!(f, "column"),
            RowKind::Check => write!(f, "check"),
            RowKind::Unique => write!(f, "unique"),
        }
    }
}

/// A column row as reported by the schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    /// Owning table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Column name.
    #[serde(default)]
    pub column_name: Option<String>,
    /// Declared type name (e.g. `integer`, `character varying`, `text[]`).
    #[serde(alias = "declared_type")]
    pub data_type: String,
    /// Whether the column accepts null.
    #[serde(alias = "nullable", deserialize_with = "deserialize_yes_no")]
    pub is_nullable: bool,
    /// Default expression, if any.
    #[serde(default, alias = "default_value")]
    pub column_default: Option<String>,
}

impl ColumnRow {
    /// Create a column row.
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: bool,
    ) -> Self {
        Self {
            table_name: Some(table.into()),
            column_name: Some(column.into()),
            data_type: data_type.into(),
            is_nullable,
            column_default: None,
        }
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.column_default = Some(default.into());
        self
    }
}

/// A check constraint row as reported by the schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRow {
    /// Owning table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Constraint name.
    pub constraint_name: String,
    /// Raw constraint text.
    #[serde(alias = "check_definition", alias = "raw_definition")]
    pub check_clause: String,
}

impl CheckRow {
    /// Create a check row.
    pub fn new(
        table: impl Into<String>,
        constraint: impl Into<String>,
        clause: impl Into<String>,
    ) -> Self {
        Self {
            table_name: Some(table.into()),
            constraint_name: constraint.into(),
            check_clause: clause.into(),
        }
    }
}

/// A unique constraint row as reported by the schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueRow {
    /// Owning table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Constraint name.
    pub constraint_name: String,
    /// Comma-delimited column list, in index order.
    #[serde(alias = "column_names")]
    pub columns: String,
}

impl UniqueRow {
    /// Create a unique row.
    pub fn new(
        table: impl Into<String>,
        constraint: impl Into<String>,
        columns: impl Into<String>,
    ) -> Self {
        Self {
            table_name: Some(table.into()),
            constraint_name: constraint.into(),
            columns: columns.into(),
        }
    }
}

/// A column rule in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Owning table.
    pub table_name: String,
    /// Column name.
    pub column_name: String,
    /// Declared type name, as reported.
    pub declared_type: String,
    /// Whether null is accepted.
    pub nullable: bool,
    /// Whether the database fills the column when omitted.
    pub has_default: bool,
    /// Default expression, if any.
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    /// Type family of the declared type.
    pub fn type_family(&self) -> TypeFamily {
        TypeFamily::from_declared(&self.declared_type)
    }

    /// Check if a null (or absent) value is acceptable for this column.
    pub fn accepts_null(&self) -> bool {
        self.nullable || self.has_default
    }
}

/// A check constraint in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDescriptor {
    /// Owning table.
    pub table_name: String,
    /// Constraint name.
    pub constraint_name: String,
    /// Raw constraint text.
    pub raw_definition: String,
}

impl CheckDescriptor {
    /// Parse the raw definition.
    pub fn expr(&self) -> CheckExpr {
        CheckExpr::parse(&self.raw_definition)
    }
}

/// A unique constraint in the catalog. Carried, not evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueDescriptor {
    /// Owning table.
    pub table_name: String,
    /// Constraint name.
    pub constraint_name: String,
    /// Columns in index order.
    pub columns: Vec<String>,
}

/// Split a delimited column list into trimmed, non-empty names.
pub(crate) fn split_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accept either a JSON boolean or the information-schema `YES`/`NO` text.
fn deserialize_yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YesNo {
        Bool(bool),
        Text(String),
    }

    match YesNo::deserialize(deserializer)? {
        YesNo::Bool(b) => Ok(b),
        YesNo::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
            "YES" | "TRUE" => Ok(true),
            "NO" | "FALSE" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected YES or NO, found {other:?}"
            ))),
        },
    }
}
