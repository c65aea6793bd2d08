//! Constraint catalog.
//!
//! The catalog is the in-memory picture of a relational schema's structural
//! rules, grouped per table. It is built in one pass from the three flat row
//! lists a [`SchemaSource`](crate::SchemaSource) returns, and is never updated
//! in place.

mod catalog;
mod descriptor;

pub use catalog::{ConstraintCatalog, TableConstraints};
pub use descriptor::{
    CheckDescriptor, CheckRow, ColumnDescriptor, ColumnRow, RowKind, UniqueDescriptor, UniqueRow,
};
