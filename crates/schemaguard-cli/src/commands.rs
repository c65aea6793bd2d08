//! Subcommand implementations.

use std::fs;
use std::sync::Arc;

use schemaguard_core::{
    ConstraintCache, JsonFileSchemaSource, Record, ValidationResult, Validator, ValidatorConfig,
};
use tracing::info;

use crate::error::CliError;
use crate::{DescribeArgs, ValidateArgs};

/// Validate the record named by `args`.
pub fn validate(args: &ValidateArgs) -> Result<ValidationResult, CliError> {
    let record = load_record(args)?;

    let config = ValidatorConfig::new().with_cache_ttl_ms(args.cache_ttl_ms);
    let source = Arc::new(JsonFileSchemaSource::new(&args.schema));
    let validator = Validator::from_config(source, &config);

    let result = validator.validate(&args.table, args.op, &record)?;
    info!(
        table = %args.table,
        op = %args.op,
        valid = result.valid,
        violations = result.violations.len(),
        "record validated"
    );
    Ok(result)
}

/// Build the catalog and render it (or one table) as JSON.
pub fn describe(args: &DescribeArgs) -> Result<serde_json::Value, CliError> {
    let cache = ConstraintCache::new(Arc::new(JsonFileSchemaSource::new(&args.schema)));
    let catalog = cache.refresh()?;

    match &args.table {
        Some(table) => {
            let constraints = catalog
                .table(table)
                .ok_or_else(|| CliError::UnknownTable(table.clone()))?;
            Ok(serde_json::to_value(constraints)?)
        }
        None => Ok(serde_json::to_value(&*catalog)?),
    }
}

fn load_record(args: &ValidateArgs) -> Result<Record, CliError> {
    // clap requires exactly one of --record and --data.
    let text = match &args.record {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?,
        None => args.data.clone().unwrap_or_default(),
    };

    let json: serde_json::Value = serde_json::from_str(&text)?;
    Record::from_json(json).ok_or(CliError::NotAnObject)
}
