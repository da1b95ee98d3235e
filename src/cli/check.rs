//! Compile and run simple expressions and predicates against JSON input

use super::{CliError, exchange_from_json, value_to_json};
use crate::{CodeKind, Exchange, SimpleLanguage, SimpleLanguageConfig, Value};

/// Options shared by the `eval` and `check` commands
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The expression or predicate text
    pub text: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Print generated code instead of evaluating
    pub code: bool,
    pub config: SimpleLanguageConfig,
}

/// Result of a run
#[derive(Debug)]
pub enum RunResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Generated source code
    Code(String),
    /// Evaluated successfully
    Success(serde_json::Value),
}

/// Compile `options.text` as `kind` and evaluate it against the input exchange.
///
/// Without input the exchange is empty.
pub fn execute(kind: CodeKind, options: &RunOptions) -> Result<RunResult, CliError> {
    let language = SimpleLanguage::new(options.config.clone())?;

    if options.code {
        return Ok(RunResult::Code(language.create_code(&options.text, kind)?));
    }

    let mut exchange = match &options.input {
        Some(input) => exchange_from_json(serde_json::from_str(input)?),
        None => Exchange::default(),
    };

    let value = match kind {
        CodeKind::Expression => {
            let expression = language.create_expression(&options.text)?;
            if options.syntax_only {
                return Ok(RunResult::SyntaxValid);
            }
            expression.evaluate(&mut exchange)?
        }
        CodeKind::Predicate => {
            let predicate = language.create_predicate(&options.text)?;
            if options.syntax_only {
                return Ok(RunResult::SyntaxValid);
            }
            Value::Boolean(predicate.matches(&mut exchange)?)
        }
    };

    Ok(RunResult::Success(value_to_json(value)))
}
