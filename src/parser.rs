//! Parsers for simple expressions and predicates.
//!
//! Both grammars share the token cursor in [`base`]. Errors raised while
//! parsing carry only a message and a position; the public entry points wrap
//! them into a [`SimpleIllegalSyntaxError`] that also knows the full text.

use std::borrow::Borrow;

use log::debug;
use thiserror::Error;

use crate::evaluator::{Expression, Predicate};

mod base;
mod expression;
mod init;
mod predicate;

use expression::ExpressionParser;
use init::split_init_block;
pub use init::has_init_block;
use predicate::PredicateParser;

/// A parse failure at a character position of the text being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SimpleParserError {
    pub message: String,
    pub index: usize,
}

impl SimpleParserError {
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        SimpleParserError {
            message: message.into(),
            index,
        }
    }
}

/// A syntax error in an expression or predicate.
///
/// Displays the message, the text and a `*` under the failing position:
///
/// ```text
/// function has no ending token at location 0
/// ${body
/// *
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at location {index}\n{expression}\n{}*", marker(.index))]
pub struct SimpleIllegalSyntaxError {
    pub expression: String,
    pub index: usize,
    pub message: String,
}

impl SimpleIllegalSyntaxError {
    fn new(expression: &str, error: SimpleParserError) -> Self {
        SimpleIllegalSyntaxError {
            expression: expression.to_string(),
            index: error.index,
            message: error.message,
        }
    }
}

fn marker(index: impl Borrow<usize>) -> String {
    " ".repeat(*index.borrow())
}

/// Parse and compile a template expression.
pub fn parse_expression(expression: &str, allow_escape: bool) -> Result<Expression, SimpleIllegalSyntaxError> {
    debug!("parsing expression: {}", expression);
    let result = match split_init_block(expression) {
        Ok(Some(block)) => block.parse(allow_escape),
        Ok(None) => ExpressionParser::new(expression, allow_escape).parse_expression(),
        Err(e) => Err(e),
    };
    result.map_err(|e| SimpleIllegalSyntaxError::new(expression, e))
}

/// Parse and compile a predicate.
pub fn parse_predicate(predicate: &str, allow_escape: bool) -> Result<Predicate, SimpleIllegalSyntaxError> {
    debug!("parsing predicate: {}", predicate);
    PredicateParser::new(predicate, allow_escape)
        .parse_predicate()
        .map_err(|e| SimpleIllegalSyntaxError::new(predicate, e))
}

/// Parse a template expression and emit source code for it.
pub fn parse_expression_code(expression: &str, allow_escape: bool) -> Result<String, SimpleIllegalSyntaxError> {
    let result = match split_init_block(expression) {
        Ok(Some(block)) => block.code(allow_escape),
        Ok(None) => ExpressionParser::new(expression, allow_escape).parse_code(),
        Err(e) => Err(e),
    };
    result.map_err(|e| SimpleIllegalSyntaxError::new(expression, e))
}

/// Parse a predicate and emit source code for it.
pub fn parse_predicate_code(predicate: &str, allow_escape: bool) -> Result<String, SimpleIllegalSyntaxError> {
    PredicateParser::new(predicate, allow_escape)
        .parse_code()
        .map_err(|e| SimpleIllegalSyntaxError::new(predicate, e))
}
