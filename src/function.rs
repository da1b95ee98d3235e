//! The functions available inside `${...}`.
//!
//! Accessors (`body`, `header.name`, `variable.name`, ...) navigate the
//! exchange. Call style functions (`uppercase(exp)`, `iif(pred,a,b)`, ...)
//! take simple expressions as arguments; an omitted expression argument means
//! the body.

use std::env;

use crate::{
    evaluator::{EvalError, Exchange, Expression, Predicate},
    lexer::has_function_start_token,
    parser::{parse_expression, parse_predicate},
    path::{Path, navigate, parse_path},
    value::Value,
};

/// A compiled function.
#[derive(Debug, Clone)]
pub enum Function {
    /// `body`, `in.body`, `body.address.city`, `body[0]`
    Body(Path),

    /// `bodyAs(String)`
    BodyAsString,

    /// `header.name`, `header[name]`, `headers.name`, `in.header.name`
    Header { name: String, path: Path },

    /// `headers`
    Headers,

    /// `headers.size`
    HeadersSize,

    /// `exchangeProperty.name`
    Property { name: String, path: Path },

    /// `variable.name`
    Variable { name: String, path: Path },

    /// `variables`
    Variables,

    /// `variables.size`
    VariablesSize,

    /// `env:NAME`, `sysenv.NAME`
    Env(String),

    /// `null`
    Null,

    /// `uppercase(exp)`, `replace(from,to,exp)`, ...
    Call { builtin: Builtin, args: Vec<Expression> },

    /// `iif(predicate,trueExp,falseExp)`
    Iif {
        condition: Box<Predicate>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
    },
}

/// Call style functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Uppercase,
    Lowercase,
    Trim,
    Length,
    Size,
    IsEmpty,
    Not,
    Concat,
    Replace,
    SubstringBefore,
    SubstringAfter,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "uppercase" => Builtin::Uppercase,
            "lowercase" => Builtin::Lowercase,
            "trim" => Builtin::Trim,
            "length" => Builtin::Length,
            "size" => Builtin::Size,
            "isEmpty" => Builtin::IsEmpty,
            "not" => Builtin::Not,
            "concat" => Builtin::Concat,
            "replace" => Builtin::Replace,
            "substringBefore" => Builtin::SubstringBefore,
            "substringAfter" => Builtin::SubstringAfter,
            _ => return None,
        };
        Some(builtin)
    }

    /// Inclusive bounds on the number of arguments.
    fn arity(self) -> (usize, usize) {
        match self {
            Builtin::Concat | Builtin::Replace => (2, 3),
            Builtin::SubstringBefore | Builtin::SubstringAfter => (1, 2),
            _ => (0, 1),
        }
    }

    fn syntax(self) -> &'static str {
        match self {
            Builtin::Uppercase => "${uppercase(exp)}",
            Builtin::Lowercase => "${lowercase(exp)}",
            Builtin::Trim => "${trim(exp)}",
            Builtin::Length => "${length(exp)}",
            Builtin::Size => "${size(exp)}",
            Builtin::IsEmpty => "${isEmpty(exp)}",
            Builtin::Not => "${not(exp)}",
            Builtin::Concat => "${concat(exp,exp)} or ${concat(exp,exp,separator)}",
            Builtin::Replace => "${replace(from,to)} or ${replace(from,to,exp)}",
            Builtin::SubstringBefore => "${substringBefore(before)} or ${substringBefore(exp,before)}",
            Builtin::SubstringAfter => "${substringAfter(after)} or ${substringAfter(exp,after)}",
        }
    }
}

const HEADER_PREFIXES: &[&str] = &["in.headers", "in.header", "headers", "header"];
const VARIABLE_PREFIXES: &[&str] = &["variables", "variable"];
const ENV_PREFIXES: &[&str] = &["env:", "env.", "sysenv:", "sysenv."];

impl Function {
    /// Compile the text between `${` and `}`.
    pub fn parse(text: &str, allow_escape: bool) -> Result<Function, String> {
        let text = text.trim();

        if let Some(function) = parse_accessor(text)? {
            return Ok(function);
        }

        if let Some((name, inner)) = split_call(text) {
            if name == "iif" {
                return parse_iif(text, inner, allow_escape);
            }
            if let Some(builtin) = Builtin::from_name(name) {
                let raw_args = split_arguments(inner);
                let (min, max) = builtin.arity();
                if raw_args.len() < min || raw_args.len() > max {
                    return Err(format!("Valid syntax: {} was: {}", builtin.syntax(), text));
                }
                let args = raw_args
                    .iter()
                    .map(|arg| compile_argument(arg, allow_escape))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Function::Call { builtin, args });
            }
        }

        Err(format!("Unknown function: {}", text))
    }

    pub fn evaluate(&self, exchange: &mut Exchange) -> Result<Value, EvalError> {
        match self {
            Function::Body(path) => Ok(navigate(&exchange.body, path)),
            Function::BodyAsString => Ok(match &exchange.body {
                Value::Null => Value::Null,
                body => Value::String(body.as_string()),
            }),
            Function::Header { name, path } => Ok(exchange
                .header(name)
                .map(|value| navigate(value, path))
                .unwrap_or_default()),
            Function::Headers => Ok(Value::Object(exchange.headers.clone())),
            Function::HeadersSize => Ok(Value::Integer(exchange.headers.len() as i64)),
            Function::Property { name, path } => Ok(exchange
                .properties
                .get(name)
                .map(|value| navigate(value, path))
                .unwrap_or_default()),
            Function::Variable { name, path } => Ok(exchange
                .variables
                .get(name)
                .map(|value| navigate(value, path))
                .unwrap_or_default()),
            Function::Variables => Ok(Value::Object(exchange.variables.clone())),
            Function::VariablesSize => Ok(Value::Integer(exchange.variables.len() as i64)),
            Function::Env(name) => Ok(env::var(name).map(Value::String).unwrap_or_default()),
            Function::Null => Ok(Value::Null),
            Function::Call { builtin, args } => call_builtin(*builtin, args, exchange),
            Function::Iif {
                condition,
                when_true,
                when_false,
            } => {
                if condition.matches(exchange)? {
                    when_true.evaluate(exchange)
                } else {
                    when_false.evaluate(exchange)
                }
            }
        }
    }
}

fn parse_accessor(text: &str) -> Result<Option<Function>, String> {
    let function = match text {
        "body" | "in.body" => Function::Body(Vec::new()),
        "bodyAs(String)" | "bodyAs(string)" | "bodyAs(java.lang.String)" => Function::BodyAsString,
        "headers" | "in.headers" => Function::Headers,
        "headers.size" | "headers.size()" | "in.headers.size" => Function::HeadersSize,
        "variables" => Function::Variables,
        "variables.size" | "variables.size()" => Function::VariablesSize,
        "null" => Function::Null,
        _ => {
            for prefix in ["in.body", "body"] {
                if let Some(rest) = text.strip_prefix(prefix)
                    && rest.starts_with(['.', '[', '?'])
                {
                    return Ok(Some(Function::Body(parse_path(rest)?)));
                }
            }
            for prefix in HEADER_PREFIXES {
                if let Some((name, path)) = named_accessor(text, prefix)? {
                    return Ok(Some(Function::Header { name, path }));
                }
            }
            if let Some((name, path)) = named_accessor(text, "exchangeProperty")? {
                return Ok(Some(Function::Property { name, path }));
            }
            for prefix in VARIABLE_PREFIXES {
                if let Some((name, path)) = named_accessor(text, prefix)? {
                    return Ok(Some(Function::Variable { name, path }));
                }
            }
            for prefix in ENV_PREFIXES {
                if let Some(name) = text.strip_prefix(prefix)
                    && !name.is_empty()
                {
                    return Ok(Some(Function::Env(name.to_string())));
                }
            }
            return Ok(None);
        }
    };
    Ok(Some(function))
}

/// `prefix.name<path>` or `prefix[name]<path>`
fn named_accessor(text: &str, prefix: &str) -> Result<Option<(String, Path)>, String> {
    let Some(rest) = text.strip_prefix(prefix) else {
        return Ok(None);
    };

    if let Some(bracketed) = rest.strip_prefix('[') {
        let end = bracketed
            .find(']')
            .ok_or_else(|| format!("Missing ] in function: {}", text))?;
        let name = unquote(bracketed[..end].trim()).unwrap_or(bracketed[..end].trim());
        if name.is_empty() {
            return Err(format!("Missing name in function: {}", text));
        }
        return Ok(Some((name.to_string(), parse_path(&bracketed[end + 1..])?)));
    }

    if let Some(dotted) = rest.strip_prefix('.') {
        let end = dotted.find(['.', '[', '?']).unwrap_or(dotted.len());
        let name = &dotted[..end];
        if name.is_empty() {
            return Err(format!("Missing name in function: {}", text));
        }
        return Ok(Some((name.to_string(), parse_path(&dotted[end..])?)));
    }

    Ok(None)
}

fn parse_iif(text: &str, inner: &str, allow_escape: bool) -> Result<Function, String> {
    let args = split_arguments(inner);
    if args.len() != 3 {
        return Err(format!(
            "Valid syntax: ${{iif(predicate,trueExpression,falseExpression)}} was: {}",
            text
        ));
    }
    let predicate_text = args[0].trim();
    let predicate_text = unquote(predicate_text).unwrap_or(predicate_text);
    let condition = parse_predicate(predicate_text, allow_escape).map_err(|e| e.message)?;
    Ok(Function::Iif {
        condition: Box::new(condition),
        when_true: Box::new(compile_argument(&args[1], allow_escape)?),
        when_false: Box::new(compile_argument(&args[2], allow_escape)?),
    })
}

/// Compile one argument of a call style function.
///
/// Quoted arguments are template text, arguments holding `${` are parsed as
/// expressions, bare accessors such as `header.foo` are functions and anything
/// else is literal text.
fn compile_argument(arg: &str, allow_escape: bool) -> Result<Expression, String> {
    let arg = arg.trim();
    if let Some(inner) = unquote(arg) {
        if has_function_start_token(inner) {
            return parse_expression(inner, allow_escape).map_err(|e| e.message);
        }
        return Ok(Expression::constant(inner));
    }
    if has_function_start_token(arg) {
        return parse_expression(arg, allow_escape).map_err(|e| e.message);
    }
    match Function::parse(arg, allow_escape) {
        Ok(function) => Ok(Expression::Function(Box::new(function))),
        Err(_) => Ok(Expression::constant(arg)),
    }
}

fn unquote(text: &str) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
}

/// `name(inner)` when the text has that shape.
pub(crate) fn split_call(text: &str) -> Option<(&str, &str)> {
    let open = text.find('(')?;
    let name = &text[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let inner = text[open + 1..].strip_suffix(')')?;
    Some((name, inner))
}

/// Split on commas that are outside quotes, parentheses and embedded functions.
pub fn split_arguments(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for ch in text.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(' | '{') => depth += 1,
            (None, ')' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    args.push(current);
    args
}

fn argument_or_body(args: &[Expression], position: usize, exchange: &mut Exchange) -> Result<Value, EvalError> {
    match args.get(position) {
        Some(arg) => arg.evaluate(exchange),
        None => Ok(exchange.body.clone()),
    }
}

fn call_builtin(builtin: Builtin, args: &[Expression], exchange: &mut Exchange) -> Result<Value, EvalError> {
    match builtin {
        Builtin::Uppercase => map_text(argument_or_body(args, 0, exchange)?, |s| s.to_uppercase()),
        Builtin::Lowercase => map_text(argument_or_body(args, 0, exchange)?, |s| s.to_lowercase()),
        Builtin::Trim => map_text(argument_or_body(args, 0, exchange)?, |s| s.trim().to_string()),
        Builtin::Length => {
            let value = argument_or_body(args, 0, exchange)?;
            let length = match &value {
                Value::Null => 0,
                Value::Array(arr) => arr.len(),
                Value::Object(obj) => obj.len(),
                other => other.as_string().chars().count(),
            };
            Ok(Value::Integer(length as i64))
        }
        Builtin::Size => {
            let size = match argument_or_body(args, 0, exchange)? {
                Value::Null => 0,
                Value::Array(arr) => arr.len(),
                Value::Object(obj) => obj.len(),
                _ => 1,
            };
            Ok(Value::Integer(size as i64))
        }
        Builtin::IsEmpty => Ok(Value::Boolean(argument_or_body(args, 0, exchange)?.is_empty())),
        Builtin::Not => Ok(Value::Boolean(!argument_or_body(args, 0, exchange)?.as_bool())),
        Builtin::Concat => {
            let first = args[0].evaluate(exchange)?.to_template_text();
            let second = args[1].evaluate(exchange)?.to_template_text();
            let separator = match args.get(2) {
                Some(arg) => arg.evaluate(exchange)?.to_template_text(),
                None => String::new(),
            };
            Ok(Value::String(format!("{}{}{}", first, separator, second)))
        }
        Builtin::Replace => {
            let from = args[0].evaluate(exchange)?.to_template_text();
            let to = args[1].evaluate(exchange)?.to_template_text();
            map_text(argument_or_body(args, 2, exchange)?, |s| s.replace(&from, &to))
        }
        Builtin::SubstringBefore | Builtin::SubstringAfter => {
            let (value, marker) = if args.len() == 1 {
                (exchange.body.clone(), args[0].evaluate(exchange)?)
            } else {
                (args[0].evaluate(exchange)?, args[1].evaluate(exchange)?)
            };
            if value.is_null() {
                return Ok(Value::Null);
            }
            let text = value.as_string();
            let marker = marker.to_template_text();
            let part = match builtin {
                Builtin::SubstringBefore => text.split_once(&marker).map(|(before, _)| before),
                _ => text.split_once(&marker).map(|(_, after)| after),
            };
            Ok(part.map(Value::from).unwrap_or_default())
        }
    }
}

fn map_text(value: Value, f: impl FnOnce(&str) -> String) -> Result<Value, EvalError> {
    match value {
        Value::Null => Ok(Value::Null),
        other => Ok(Value::String(f(&other.as_string()))),
    }
}
