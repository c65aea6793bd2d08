//! Catalog construction and lookup.

use std::collections::BTreeMap;

use serde::Serialize;

use super::descriptor::{
    split_columns, CheckDescriptor, CheckRow, ColumnDescriptor, ColumnRow, RowKind,
    UniqueDescriptor, UniqueRow,
};
use crate::error::{Error, Result};

/// All constraints known for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableConstraints {
    /// Columns keyed by name.
    pub columns: BTreeMap<String, ColumnDescriptor>,
    /// Check constraints, in source order.
    pub checks: Vec<CheckDescriptor>,
    /// Unique constraints, in source order.
    pub uniques: Vec<UniqueDescriptor>,
}

impl TableConstraints {
    /// Get a column descriptor by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.get(name)
    }

    /// Check if the table has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// The per-table constraint catalog.
///
/// Built in one pass; a schema change is picked up by building a new catalog,
/// never by editing this one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConstraintCatalog {
    tables: BTreeMap<String, TableConstraints>,
}

impl ConstraintCatalog {
    /// Build a catalog from the three descriptor lists.
    ///
    /// Fails on the first row with a missing or blank table name (or, for
    /// columns, a missing column name). A catalog with silently dropped rows
    /// would under-validate, so nothing is returned in that case.
    pub fn build(
        columns: Vec<ColumnRow>,
        checks: Vec<CheckRow>,
        uniques: Vec<UniqueRow>,
    ) -> Result<Self> {
        let mut tables: BTreeMap<String, TableConstraints> = BTreeMap::new();

        for (index, row) in columns.into_iter().enumerate() {
            let table_name = require_name(row.table_name, RowKind::Column, index, "table")?;
            let column_name = require_name(row.column_name, RowKind::Column, index, "column")?;

            let descriptor = ColumnDescriptor {
                table_name: table_name.clone(),
                column_name: column_name.clone(),
                declared_type: row.data_type,
                nullable: row.is_nullable,
                has_default: row.column_default.is_some(),
                default_value: row.column_default,
            };

            tables
                .entry(table_name)
                .or_default()
                .columns
                .insert(column_name, descriptor);
        }

        for (index, row) in checks.into_iter().enumerate() {
            let table_name = require_name(row.table_name, RowKind::Check, index, "table")?;

            let descriptor = CheckDescriptor {
                table_name: table_name.clone(),
                constraint_name: row.constraint_name,
                raw_definition: row.check_clause,
            };

            tables.entry(table_name).or_default().checks.push(descriptor);
        }

        for (index, row) in uniques.into_iter().enumerate() {
            let table_name = require_name(row.table_name, RowKind::Unique, index, "table")?;

            let descriptor = UniqueDescriptor {
                table_name: table_name.clone(),
                constraint_name: row.constraint_name,
                columns: split_columns(&row.columns),
            };

            tables.entry(table_name).or_default().uniques.push(descriptor);
        }

        Ok(Self { tables })
    }

    /// Get the constraints for a table.
    pub fn table(&self, name: &str) -> Option<&TableConstraints> {
        self.tables.get(name)
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the catalog has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn require_name(name: Option<String>, kind: RowKind, index: usize, what: &str) -> Result<String> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        Some(_) => Err(Error::malformed(kind, index, format!("blank {what} name"))),
        None => Err(Error::malformed(kind, index, format!("missing {what} name"))),
    }
}
