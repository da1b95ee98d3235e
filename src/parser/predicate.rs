//! Grammar of predicates such as `${header.age} > 18 && ${body} contains 'x'`.

use std::mem;

use log::trace;

use super::{
    SimpleParserError,
    base::{Cursor, push_image, quote_node},
};
use crate::{
    ast::{
        BinaryOperator, NodeKind, ParameterType, SimpleNode, SimpleToken, TokenType,
        nodes::is_number,
    },
    evaluator::Predicate,
};

type ParseResult<T> = Result<T, SimpleParserError>;

/// Parses a predicate. Unlike templates, every token has to fit the grammar.
pub(super) struct PredicateParser {
    cursor: Cursor,
    allow_escape: bool,
}

/// Which right hand sides a binary operator lets the grammar read.
#[derive(Debug, Default, Clone, Copy)]
struct Supported {
    literal: bool,
    literal_with_functions: bool,
    function: bool,
    numeric: bool,
    boolean: bool,
    null: bool,
    minus: bool,
}

impl Supported {
    fn of(operator: BinaryOperator) -> Self {
        let types = operator.supported_parameter_types();
        if types.is_empty() {
            return Supported {
                literal: false,
                literal_with_functions: true,
                function: true,
                numeric: true,
                boolean: true,
                null: true,
                minus: true,
            };
        }
        let mut supported = Supported::default();
        for kind in types {
            match kind {
                ParameterType::Literal => supported.literal = true,
                ParameterType::LiteralWithFunction => supported.literal_with_functions = true,
                ParameterType::Function => supported.function = true,
                ParameterType::NumericValue => supported.numeric = true,
                ParameterType::BooleanValue => supported.boolean = true,
                ParameterType::NullValue => supported.null = true,
                ParameterType::MinusValue => supported.minus = true,
            }
        }
        supported
    }
}

impl PredicateParser {
    pub fn new(expression: &str, allow_escape: bool) -> Self {
        PredicateParser {
            cursor: Cursor::new(expression, allow_escape),
            allow_escape,
        }
    }

    /// Run the grammar and shape the nodes. Returns the top level nodes.
    pub fn parse_tokens(&mut self) -> ParseResult<Vec<SimpleNode>> {
        self.cursor.clear();

        self.cursor.next_token();
        while !self.cursor.is_eol() {
            let matched = self.cursor.quoted_text(TokenType::SingleQuote, true)?
                || self.cursor.quoted_text(TokenType::DoubleQuote, true)?
                || self.cursor.function_text()?
                || self.unary_operator()?
                || self.binary_operator()?
                || self.logical_operator()?
                || self.cursor.accept(TokenType::BooleanValue)
                || self.cursor.accept(TokenType::Whitespace);
            if !matched {
                let text = self.cursor.token.as_ref().map(|t| t.text.clone()).unwrap_or_default();
                return Err(SimpleParserError::new(
                    format!("Unexpected token {}", text),
                    self.cursor.previous_index,
                ));
            }
            self.cursor.next_token();
        }

        self.remove_ignorable_white_space_tokens();
        self.create_nodes()?;
        self.cursor.prepare_blocks()?;
        self.cursor.prepare_unary_expressions()?;
        self.cursor.prepare_infix_expressions(TokenType::is_binary)?;
        self.cursor.prepare_infix_expressions(TokenType::is_logical)?;

        trace!(
            "parsed {} tokens into {} nodes",
            self.cursor.tokens.len(),
            self.cursor.nodes.len()
        );
        Ok(mem::take(&mut self.cursor.nodes))
    }

    pub fn parse_predicate(&mut self) -> ParseResult<Predicate> {
        let nodes = self.parse_tokens()?;
        let mut predicates = Vec::with_capacity(nodes.len());
        for node in &nodes {
            if let Some(expression) = node.create_expression(self.allow_escape)? {
                predicates.push(Predicate::from_expression(expression));
            }
        }
        Ok(match predicates.len() {
            0 => Predicate::Constant(false),
            1 => predicates.remove(0),
            _ => Predicate::And(predicates),
        })
    }

    pub fn parse_code(&mut self) -> ParseResult<String> {
        let nodes = self.parse_tokens()?;
        let mut parts = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let code = node.create_code()?;
            if !code.is_empty() {
                parts.push(code);
            }
        }
        Ok(parts.join(" && "))
    }

    // --------------------------------------------------------------
    // grammar
    // --------------------------------------------------------------

    fn unary_operator(&mut self) -> ParseResult<bool> {
        if !self.cursor.kind().is_unary() {
            return Ok(false);
        }
        self.cursor.next_token();
        if !self.cursor.is_eol() {
            self.cursor.expect(TokenType::Whitespace)?;
        }
        Ok(true)
    }

    fn binary_operator(&mut self) -> ParseResult<bool> {
        if !self.cursor.kind().is_binary() {
            return Ok(false);
        }
        let text = self.current_text();
        let Some(operator) = BinaryOperator::from_text(&text) else {
            return Ok(false);
        };

        self.cursor.next_token();
        self.cursor.expect_and_accept_more(TokenType::Whitespace)?;

        let supported = Supported::of(operator);
        let matched = (supported.literal_with_functions
            && self.cursor.quoted_text(TokenType::SingleQuote, true)?)
            || (supported.literal_with_functions && self.cursor.quoted_text(TokenType::DoubleQuote, true)?)
            || (supported.literal && self.cursor.quoted_text(TokenType::SingleQuote, false)?)
            || (supported.literal && self.cursor.quoted_text(TokenType::DoubleQuote, false)?)
            || (supported.function && self.cursor.function_text()?)
            || (supported.numeric && self.cursor.accept(TokenType::NumericValue))
            || (supported.boolean && self.cursor.accept(TokenType::BooleanValue))
            || (supported.null && self.cursor.accept(TokenType::NullValue))
            || (supported.minus && self.minus_value());
        if !matched {
            return Err(self.unsupported("Binary", &operator.to_string()));
        }

        self.cursor.next_token();
        if !self.cursor.is_eol() {
            self.cursor.expect(TokenType::Whitespace)?;
        }
        Ok(true)
    }

    fn logical_operator(&mut self) -> ParseResult<bool> {
        if !self.cursor.kind().is_logical() {
            return Ok(false);
        }
        let operator = self.current_text();

        self.cursor.next_token();
        self.cursor.expect_and_accept_more(TokenType::Whitespace)?;

        let matched = self.cursor.quoted_text(TokenType::SingleQuote, true)?
            || self.cursor.quoted_text(TokenType::DoubleQuote, true)?
            || self.cursor.function_text()?
            || self.cursor.accept(TokenType::NumericValue)
            || self.cursor.accept(TokenType::BooleanValue)
            || self.cursor.accept(TokenType::NullValue);
        if !matched {
            return Err(self.unsupported("Logical", &operator));
        }

        self.cursor.next_token();
        if !self.cursor.is_eol() {
            self.cursor.expect(TokenType::Whitespace)?;
        }
        Ok(true)
    }

    /// `-` directly followed by a number.
    fn minus_value(&mut self) -> bool {
        if !self.cursor.kind().is_minus_value() {
            return false;
        }
        self.cursor.next_token();
        self.cursor.accept(TokenType::NumericValue)
    }

    fn current_text(&self) -> String {
        self.cursor.token.as_ref().map(|t| t.text.clone()).unwrap_or_default()
    }

    fn unsupported(&self, group: &str, operator: &str) -> SimpleParserError {
        let index = self.cursor.token.as_ref().map_or(self.cursor.index, |t| t.index);
        SimpleParserError::new(
            format!("{} operator {} does not support token {}", group, operator, self.current_text()),
            index,
        )
    }

    // --------------------------------------------------------------
    // shaping
    // --------------------------------------------------------------

    /// Whitespace outside quotes and functions separates tokens and nothing more.
    fn remove_ignorable_white_space_tokens(&mut self) {
        let mut open_quote: Option<TokenType> = None;
        let mut depth = 0usize;

        self.cursor.tokens.retain(|token| {
            let kind = token.kind;
            if let Some(quote) = open_quote {
                if kind == quote {
                    open_quote = None;
                }
                return true;
            }
            if kind.is_quote() && depth == 0 {
                open_quote = Some(kind);
            } else if kind.is_function_start() {
                depth += 1;
            } else if kind.is_function_end() {
                depth = depth.saturating_sub(1);
            } else if kind.is_whitespace() && depth == 0 {
                return false;
            }
            true
        });
    }

    fn create_nodes(&mut self) -> ParseResult<()> {
        let mut nodes: Vec<SimpleNode> = Vec::new();
        let mut image: Option<SimpleNode> = None;
        let mut open_quote: Option<SimpleToken> = None;
        let mut functions: Vec<usize> = Vec::new();

        for token in mem::take(&mut self.cursor.tokens) {
            let kind = token.kind;
            let node = if kind.is_function_start() {
                functions.push(token.index);
                Some(SimpleNode::new(token, NodeKind::FunctionStart { children: vec![] }))
            } else if kind.is_function_end() && !functions.is_empty() {
                functions.pop();
                Some(SimpleNode::new(token, NodeKind::FunctionEnd))
            } else if !functions.is_empty() {
                push_image(&mut image, &token);
                None
            } else if let Some(quote) = &open_quote {
                if kind == quote.kind {
                    open_quote = None;
                    Some(quote_node(token, false))
                } else {
                    push_image(&mut image, &token);
                    None
                }
            } else if kind.is_quote() {
                open_quote = Some(token.clone());
                Some(quote_node(token, true))
            } else if kind.is_unary() || kind.is_binary() || kind.is_logical() {
                SimpleNode::operator(token)
            } else if kind.is_null_value() {
                Some(SimpleNode::new(token, NodeKind::Null))
            } else if kind.is_boolean_value() {
                let value = token.text == "true";
                Some(SimpleNode::new(token, NodeKind::Boolean(value)))
            } else {
                push_image(&mut image, &token);
                None
            };

            if let Some(node) = node {
                flush_image(&mut nodes, &mut image, open_quote.is_some() || node.is_block_end());
                nodes.push(node);
            }
        }
        flush_image(&mut nodes, &mut image, open_quote.is_some());

        if let Some(quote) = open_quote {
            let name = if quote.kind.is_single_quote() { "single" } else { "double" };
            return Err(SimpleParserError::new(
                format!("{} quote has no ending quote", name),
                quote.index,
            ));
        }
        if let Some(&index) = functions.first() {
            return Err(SimpleParserError::new("function has no ending token", index));
        }

        self.cursor.nodes = nodes;
        Ok(())
    }
}

/// Add pending literal text. Unquoted text that reads as a number becomes a
/// numeric node.
fn flush_image(nodes: &mut Vec<SimpleNode>, image: &mut Option<SimpleNode>, quoted: bool) {
    let Some(literal) = image.take() else {
        return;
    };
    let numeric = !quoted
        && !nodes.last().is_some_and(|n| {
            matches!(
                n.kind,
                NodeKind::SingleQuoteStart { .. } | NodeKind::DoubleQuoteStart { .. }
            )
        });
    match literal.text() {
        Some(text) if numeric && is_number(text) => {
            let text = text.to_string();
            nodes.push(SimpleNode::new(literal.token, NodeKind::Numeric(text)));
        }
        _ => nodes.push(literal),
    }
}


