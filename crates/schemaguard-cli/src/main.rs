//! SchemaGuard command-line host.
//!
//! Validates JSON records against a schema document on disk, the same way a
//! request handler would before handing a payload to storage.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schemaguard_core::OperationKind;

/// Exit code for a record with violations.
const EXIT_INVALID: u8 = 1;

/// Exit code for infrastructure failures (schema unavailable, bad input).
const EXIT_ERROR: u8 = 2;

/// SchemaGuard record validator
#[derive(Parser, Debug)]
#[command(name = "schemaguard")]
#[command(version, about = "Validate records against a relational schema's constraints")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one record for a table.
    Validate(ValidateArgs),
    /// Print the constraint catalog built from a schema document.
    Describe(DescribeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Schema document (JSON with columns, checks and uniques).
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Target table.
    #[arg(short, long)]
    pub table: String,

    /// Operation kind (insert or update).
    #[arg(long, default_value = "insert")]
    pub op: OperationKind,

    /// Record file (JSON object).
    #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
    pub record: Option<PathBuf>,

    /// Inline record JSON.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Catalog cache TTL in milliseconds.
    #[arg(long, default_value_t = 3_600_000)]
    pub cache_ttl_ms: u64,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(clap::Args, Debug)]
pub struct DescribeArgs {
    /// Schema document (JSON with columns, checks and uniques).
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Only show this table.
    #[arg(short, long)]
    pub table: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schemaguard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "schemaguard failed");
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: Args) -> Result<ExitCode, error::CliError> {
    match args.command {
        Command::Validate(args) => {
            let result = commands::validate(&args)?;
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", rendered);

            Ok(if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INVALID)
            })
        }
        Command::Describe(args) => {
            let description = commands::describe(&args)?;
            println!("{}", serde_json::to_string_pretty(&description)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
