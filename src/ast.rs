//! # Simple Language - Syntax Tree
//!
//! This module defines the tokens and nodes the simple language parsers work
//! with. Parsing is a three step affair:
//!
//! 1. The lexer scans [`SimpleToken`]s on demand while the grammar walks the text.
//! 2. Accepted tokens become a flat list of [`SimpleNode`]s.
//! 3. Shaping passes fold the flat list into a tree: blocks take their
//!    children, operators take their operands.
//!
//! The finished nodes then compile into an [`Expression`](crate::Expression)
//! or [`Predicate`](crate::Predicate), or into source code.
//!
//! ## Submodules
//!
//! - **[tokens]** - Token kinds and scanned tokens
//! - **[operators]** - Unary, binary, logical, ternary, chain and other operators
//! - **[nodes]** - Node kinds, operand linking and compilation
//!
//! ## Templates
//!
//! An expression is template text with embedded functions:
//!
//! ```text
//! Hello ${header.name}, you ordered ${body.items.size} items
//! ```
//!
//! Between functions the expression grammar also knows a few operators:
//!
//! ```text
//! ${header.vip} ? 'gold' : 'standard'
//! ${body} ~> ${trim()} ~> ${uppercase()}
//! ${header.nick} ?: ${header.name}
//! ${header.counter}++
//! ```
//!
//! ## Predicates
//!
//! A predicate compares operands with binary operators and combines the
//! comparisons with `&&` / `||`:
//!
//! ```text
//! ${header.age} >= 18 && ${header.country} in 'DK,SE,NO'
//! ${body} regex '[0-9]+' || ${header.type} is 'String'
//! ```
//!
//! ## Init Blocks
//!
//! An expression may start with an init block declaring local variables:
//!
//! ```text
//! $init{
//!   $$greeting := ${header.greeting}
//! }init$
//! $greeting world
//! ```

pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{NodeKind, SimpleNode};
pub use operators::{
    BinaryOperator, LogicalOperator, OtherOperator, ParameterType, TernaryOperator, UnaryOperator,
};
pub use tokens::{SimpleToken, TokenType};
