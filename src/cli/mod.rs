//! CLI support for simple-lang
//!
//! Provides programmatic access to the `simple` command line functionality
//! for embedding in other tools.

mod check;
mod convert;

pub use check::{RunOptions, RunResult, execute};
pub use convert::{exchange_from_json, value_to_json};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] crate::SimpleIllegalSyntaxError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::ConfigError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
