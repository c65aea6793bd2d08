//! Constraint evaluation.
//!
//! This module provides the rule checks run against candidate records:
//! - Declared-type compatibility
//! - Check constraints (bounded numeric ranges)
//! - The validator that applies both, plus nullability, per table

mod check;
mod types;
mod validator;

pub use check::{CheckEvaluator, CheckExpr};
pub use types::{is_compatible, TypeFamily};
pub use validator::{
    OperationKind, ParseOperationKindError, ValidationResult, Validator, Violation, ViolationKind,
};
