pub mod ast;
pub mod cache;
pub mod cli;
pub mod evaluator;
pub mod function;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod value;

pub use ast::{SimpleNode, SimpleToken, TokenType};
pub use cache::CacheStatistics;
pub use evaluator::{EvalError, Exchange, Expression, Predicate};
pub use function::Function;
pub use language::{CodeKind, ConfigError, LanguageStatistics, MAX_CACHE_SIZE, SimpleLanguage, SimpleLanguageConfig};
pub use lexer::Lexer;
pub use parser::{
    SimpleIllegalSyntaxError, SimpleParserError, parse_expression, parse_expression_code, parse_predicate,
    parse_predicate_code,
};
pub use value::Value;
