use std::{cmp::Ordering, collections::HashMap};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    ast::{BinaryOperator, LogicalOperator, UnaryOperator},
    function::Function,
    value::Value,
};

/// The message an expression is evaluated against.
///
/// Headers are looked up by exact name first and then ignoring case.
/// Variables are written by init blocks, which is why evaluation takes the
/// exchange mutably.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    pub body: Value,
    pub headers: HashMap<String, Value>,
    pub properties: HashMap<String, Value>,
    pub variables: HashMap<String, Value>,
}

impl Exchange {
    pub fn new(body: impl Into<Value>) -> Self {
        Exchange {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name).or_else(|| {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }
}

/// Errors that can occur while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    /// A regular expression computed at runtime did not compile
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),

    /// A range computed at runtime is not of the form `from..to`
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A function assembled from embedded functions failed to compile
    #[error("Illegal syntax: {0}")]
    Syntax(String),
}

/// A compiled value expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A fixed value
    Constant(Value),

    /// Template text: every part rendered as text and joined in order
    Concat(Vec<Expression>),

    /// A `${...}` function whose text was known when compiling
    Function(Box<Function>),

    /// A function with embedded functions, such as `${header.${header.key}}`.
    /// The parts are evaluated, joined and compiled on every evaluation.
    Dynamic {
        parts: Vec<Expression>,
        allow_escape: bool,
    },

    /// `${x}++` / `${x}--`
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },

    /// `condition ? when_true : when_false`
    Ternary {
        condition: Box<Expression>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
    },

    /// `left ~> right`: `right` sees the result of `left` as its body
    Chain {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `left ?: right`
    Elvis {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `$$name := value` from an init block; renders as nothing
    Init { name: String, value: Box<Expression> },

    /// The bindings of an init block, run before the template after it
    Initialized {
        bindings: Vec<Expression>,
        body: Box<Expression>,
    },

    /// A predicate used where a value is expected
    Predicate(Box<Predicate>),
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    /// Build the expression for a list of parts: nothing is the empty string,
    /// a single part is itself and anything more is concatenated.
    pub fn from_parts(mut parts: Vec<Expression>) -> Self {
        match parts.len() {
            0 => Expression::constant(""),
            1 => parts.remove(0),
            _ => Expression::Concat(parts),
        }
    }

    pub fn evaluate(&self, exchange: &mut Exchange) -> Result<Value, EvalError> {
        match self {
            Expression::Constant(value) => Ok(value.clone()),

            Expression::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&part.evaluate(exchange)?.to_template_text());
                }
                Ok(Value::String(text))
            }

            Expression::Function(function) => function.evaluate(exchange),

            Expression::Dynamic {
                parts,
                allow_escape,
            } => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&part.evaluate(exchange)?.to_template_text());
                }
                log::trace!("Resolved embedded function: {}", text);
                let function = Function::parse(&text, *allow_escape).map_err(EvalError::Syntax)?;
                function.evaluate(exchange)
            }

            Expression::Unary { operator, operand } => {
                let value = operand.evaluate(exchange)?;
                apply_unary(*operator, value)
            }

            Expression::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                if condition.evaluate(exchange)?.as_bool() {
                    when_true.evaluate(exchange)
                } else {
                    when_false.evaluate(exchange)
                }
            }

            Expression::Chain { left, right } => {
                let input = left.evaluate(exchange)?;
                let saved = std::mem::replace(&mut exchange.body, input);
                let result = right.evaluate(exchange);
                exchange.body = saved;
                result
            }

            Expression::Elvis { left, right } => {
                let value = left.evaluate(exchange)?;
                if is_elvis_fallback(&value) {
                    right.evaluate(exchange)
                } else {
                    Ok(value)
                }
            }

            Expression::Init { name, value } => {
                let value = value.evaluate(exchange)?;
                exchange.variables.insert(name.clone(), value);
                Ok(Value::Null)
            }

            Expression::Initialized { bindings, body } => {
                for binding in bindings {
                    binding.evaluate(exchange)?;
                }
                body.evaluate(exchange)
            }

            Expression::Predicate(predicate) => Ok(Value::Boolean(predicate.matches(exchange)?)),
        }
    }
}

fn apply_unary(operator: UnaryOperator, value: Value) -> Result<Value, EvalError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let number = value.as_decimal().ok_or_else(|| {
        EvalError::TypeError(format!(
            "{} requires a numeric value, got {}",
            operator,
            value.type_name()
        ))
    })?;
    let result = match operator {
        UnaryOperator::Increment => number + Decimal::ONE,
        UnaryOperator::Decrement => number - Decimal::ONE,
    };
    match (&value, Value::from_decimal(result)) {
        (Value::Float(_), Value::Integer(n)) => Ok(Value::Float(n as f64)),
        (_, computed) => Ok(computed),
    }
}

/// The elvis operator falls back on null, false, empty and zero.
fn is_elvis_fallback(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => !b,
        Value::Integer(n) => *n == 0,
        Value::Float(f) => *f == 0.0,
        _ => value.is_empty(),
    }
}

/// A compiled boolean expression.
#[derive(Debug, Clone)]
pub enum Predicate {
    Constant(bool),

    /// Truthiness of a value, see [`Value::as_bool`]
    Truthy(Expression),

    Binary(BinaryPredicate),

    Logical {
        operator: LogicalOperator,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },

    /// All must match, evaluated left to right
    And(Vec<Predicate>),
}

impl Predicate {
    /// Use a compiled expression as a predicate.
    pub fn from_expression(expression: Expression) -> Self {
        match expression {
            Expression::Predicate(predicate) => *predicate,
            Expression::Constant(Value::Boolean(b)) => Predicate::Constant(b),
            other => Predicate::Truthy(other),
        }
    }

    pub fn matches(&self, exchange: &mut Exchange) -> Result<bool, EvalError> {
        match self {
            Predicate::Constant(b) => Ok(*b),
            Predicate::Truthy(expression) => Ok(expression.evaluate(exchange)?.as_bool()),
            Predicate::Binary(binary) => binary.matches(exchange),
            Predicate::Logical {
                operator,
                left,
                right,
            } => match operator {
                LogicalOperator::And => Ok(left.matches(exchange)? && right.matches(exchange)?),
                LogicalOperator::Or => Ok(left.matches(exchange)? || right.matches(exchange)?),
            },
            Predicate::And(predicates) => {
                for predicate in predicates {
                    if !predicate.matches(exchange)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// Type names understood by the `is` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl TypeName {
    pub fn parse(name: &str) -> Option<TypeName> {
        let lower = name.trim().to_ascii_lowercase();
        let lower = lower.strip_prefix("java.lang.").unwrap_or(&lower);
        let type_name = match lower {
            "string" => TypeName::String,
            "integer" | "int" | "long" => TypeName::Integer,
            "float" | "double" => TypeName::Float,
            "number" => TypeName::Number,
            "boolean" | "bool" => TypeName::Boolean,
            "array" | "list" => TypeName::Array,
            "object" | "map" => TypeName::Object,
            "null" => TypeName::Null,
            _ => return None,
        };
        Some(type_name)
    }

    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (TypeName::String, Value::String(_))
            | (TypeName::Integer, Value::Integer(_))
            | (TypeName::Float, Value::Float(_))
            | (TypeName::Number, Value::Integer(_) | Value::Float(_))
            | (TypeName::Boolean, Value::Boolean(_))
            | (TypeName::Array, Value::Array(_))
            | (TypeName::Object, Value::Object(_))
            | (TypeName::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// Right hand sides that were validated and prepared when compiling.
#[derive(Debug, Clone)]
enum Prepared {
    Nothing,
    Regex(regex::Regex),
    Range(Decimal, Decimal),
    Type(TypeName),
}

/// `left <operator> right`
#[derive(Debug, Clone)]
pub struct BinaryPredicate {
    pub operator: BinaryOperator,
    pub left: Expression,
    pub right: Expression,
    prepared: Prepared,
}

impl BinaryPredicate {
    /// Compile a comparison. A constant right hand side is validated now, so
    /// a bad regex, range or type name is reported before anything runs.
    pub fn new(operator: BinaryOperator, left: Expression, right: Expression) -> Result<Self, String> {
        use BinaryOperator::*;
        let prepared = match (&right, operator) {
            (Expression::Constant(value), Regex | NotRegex) => {
                Prepared::Regex(compile_regex(&value.as_string())?)
            }
            (Expression::Constant(value), Range | NotRange) => {
                let (from, to) = parse_range(&value.as_string())?;
                Prepared::Range(from, to)
            }
            (Expression::Constant(value), Is | NotIs) => {
                let name = value.as_string();
                Prepared::Type(
                    TypeName::parse(&name).ok_or_else(|| format!("Unknown type name: {}", name))?,
                )
            }
            _ => Prepared::Nothing,
        };
        Ok(BinaryPredicate {
            operator,
            left,
            right,
            prepared,
        })
    }

    pub fn matches(&self, exchange: &mut Exchange) -> Result<bool, EvalError> {
        let left = self.left.evaluate(exchange)?;
        let right = self.right.evaluate(exchange)?;
        let positive = self.compare(&left, &right)?;
        Ok(if self.operator.is_negated() {
            !positive
        } else {
            positive
        })
    }

    fn compare(&self, left: &Value, right: &Value) -> Result<bool, EvalError> {
        use BinaryOperator::*;
        let result = match self.operator {
            Equal | NotEqual => left.loose_equals(right, false),
            EqualIgnoreCase | NotEqualIgnoreCase => left.loose_equals(right, true),
            GreaterThan => left.loose_compare(right) == Some(Ordering::Greater),
            GreaterEqual => matches!(left.loose_compare(right), Some(Ordering::Greater | Ordering::Equal)),
            LessThan => left.loose_compare(right) == Some(Ordering::Less),
            LessEqual => matches!(left.loose_compare(right), Some(Ordering::Less | Ordering::Equal)),
            Contains | NotContains => contains(left, right, false),
            ContainsIgnoreCase | NotContainsIgnoreCase => contains(left, right, true),
            Regex | NotRegex => {
                if left.is_null() {
                    return Ok(false);
                }
                match &self.prepared {
                    Prepared::Regex(regex) => regex.is_match(&left.as_string()),
                    _ => compile_regex(&right.as_string())
                        .map_err(EvalError::InvalidRegex)?
                        .is_match(&left.as_string()),
                }
            }
            In | NotIn => match right {
                Value::Array(items) => items.iter().any(|item| left.loose_equals(item, false)),
                _ => right
                    .as_string()
                    .split(',')
                    .any(|item| left.loose_equals(&Value::from(item.trim()), false)),
            },
            Is | NotIs => match &self.prepared {
                Prepared::Type(type_name) => type_name.matches(left),
                _ => {
                    let name = right.as_string();
                    TypeName::parse(&name)
                        .ok_or_else(|| EvalError::TypeError(format!("Unknown type name: {}", name)))?
                        .matches(left)
                }
            },
            Range | NotRange => {
                let (from, to) = match &self.prepared {
                    Prepared::Range(from, to) => (*from, *to),
                    _ => parse_range(&right.as_string()).map_err(EvalError::InvalidRange)?,
                };
                match left.as_decimal() {
                    Some(number) => from <= number && number <= to,
                    None => false,
                }
            }
            StartsWith => !left.is_null() && left.as_string().starts_with(&right.as_string()),
            EndsWith => !left.is_null() && left.as_string().ends_with(&right.as_string()),
        };
        Ok(result)
    }
}

fn contains(left: &Value, right: &Value, ignore_case: bool) -> bool {
    match left {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| item.loose_equals(right, ignore_case)),
        _ => {
            let (haystack, needle) = (left.as_string(), right.to_template_text());
            if ignore_case {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            } else {
                haystack.contains(&needle)
            }
        }
    }
}

fn compile_regex(pattern: &str) -> Result<regex::Regex, String> {
    // the whole value has to match
    regex::Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| format!("Invalid regex '{}': {}", pattern, e))
}

fn parse_range(text: &str) -> Result<(Decimal, Decimal), String> {
    let invalid = || format!("Range operator expects the form 'from..to' but was: {}", text);
    let (from, to) = text.split_once("..").ok_or_else(invalid)?;
    let from = Value::from(from.trim()).as_decimal().ok_or_else(invalid)?;
    let to = Value::from(to.trim()).as_decimal().ok_or_else(invalid)?;
    Ok((from, to))
}
