//! Grammar of template expressions such as `Hello ${body}`.

use std::mem;

use log::trace;

use super::{
    SimpleParserError,
    base::{Cursor, push_image, quote_node},
};
use crate::{
    ast::{NodeKind, SimpleNode, TernaryOperator, TokenType, nodes::join_code},
    evaluator::Expression,
};

type ParseResult<T> = Result<T, SimpleParserError>;

/// Parses template text with embedded functions and the unary, ternary,
/// chain and other operators.
///
/// Any text the grammar does not recognize is kept as literal text. In init
/// mode the parser also accepts `$$name := value` bindings.
pub(super) struct ExpressionParser {
    cursor: Cursor,
    allow_escape: bool,
    init_mode: bool,
    // the last thing read was a function, a unary operator or an operand
    operand_closed: bool,
    // the current token was read ahead and still needs the grammar rules
    reprocess: bool,
}

impl ExpressionParser {
    pub fn new(expression: &str, allow_escape: bool) -> Self {
        ExpressionParser {
            cursor: Cursor::new(expression, allow_escape),
            allow_escape,
            init_mode: false,
            operand_closed: false,
            reprocess: false,
        }
    }

    /// A parser for the bindings between `$init{` and `}init$`.
    pub fn for_init_block(preamble: &str, allow_escape: bool) -> Self {
        let mut parser = ExpressionParser::new(preamble, allow_escape);
        parser.init_mode = true;
        parser
    }

    /// Run the grammar and shape the nodes. Returns the top level nodes.
    pub fn parse_tokens(&mut self) -> ParseResult<Vec<SimpleNode>> {
        self.cursor.clear();
        self.cursor.accept_init_tokens = self.init_mode;
        self.operand_closed = false;
        self.reprocess = false;

        self.cursor.next_token();
        while !self.cursor.is_eol() {
            self.template_text();
            if self.cursor.function_text()? {
                self.operand_closed = true;
            }
            self.unary_operator()?;
            self.operator(TokenType::is_ternary, "Ternary", false)?;
            self.operator(TokenType::is_chain, "Chain", true)?;
            self.operator(TokenType::is_other, "Other", false)?;
            if self.init_mode {
                self.init_operator()?;
            }

            if mem::take(&mut self.reprocess) {
                continue;
            }
            self.cursor.next_token();
        }

        self.remove_ignorable_white_space_tokens();
        self.create_nodes();
        self.cursor.prepare_blocks()?;
        self.cursor.prepare_unary_expressions()?;
        self.prepare_ternary_expressions()?;
        self.cursor.prepare_infix_expressions(TokenType::is_chain)?;
        self.cursor.prepare_infix_expressions(TokenType::is_other)?;
        if self.init_mode {
            self.prepare_init_expressions()?;
        }

        trace!(
            "parsed {} tokens into {} nodes",
            self.cursor.tokens.len(),
            self.cursor.nodes.len()
        );
        Ok(mem::take(&mut self.cursor.nodes))
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        let nodes = self.parse_tokens()?;
        compile_nodes(&nodes, self.allow_escape)
    }

    pub fn parse_code(&mut self) -> ParseResult<String> {
        let nodes = self.parse_tokens()?;
        join_code(&nodes)
    }

    // --------------------------------------------------------------
    // grammar
    // --------------------------------------------------------------

    /// Everything up to the next function, unary operator or operator in
    /// operator position. Operator tokens that follow plain text are demoted
    /// to text.
    fn template_text(&mut self) {
        loop {
            let kind = self.cursor.kind();
            if kind.is_eol()
                || kind.is_function_start()
                || kind.is_function_end()
                || kind.is_unary()
                || kind.is_init_operator()
                || kind.is_init_variable()
            {
                return;
            }
            if kind.is_expression_operator() {
                if self.operand_closed {
                    return;
                }
                self.cursor.demote_current_token();
                self.operand_closed = false;
            } else if !kind.is_whitespace() {
                self.operand_closed = false;
            }
            self.cursor.next_token();
        }
    }

    fn unary_operator(&mut self) -> ParseResult<()> {
        if !self.cursor.kind().is_unary() {
            return Ok(());
        }
        self.cursor.next_token();
        if !self.cursor.is_eol() {
            self.cursor.expect(TokenType::Whitespace)?;
        }
        self.operand_closed = true;
        Ok(())
    }

    /// A ternary, chain or other operator and its right hand operand.
    fn operator(
        &mut self,
        is_operator: fn(TokenType) -> bool,
        group: &str,
        consume_trailing: bool,
    ) -> ParseResult<()> {
        if !is_operator(self.cursor.kind()) {
            return Ok(());
        }
        let operator = self.cursor.token.as_ref().map(|t| t.text.clone()).unwrap_or_default();

        self.cursor.next_token();
        self.cursor.expect_and_accept_more(TokenType::Whitespace)?;

        let supported = self.cursor.quoted_text(TokenType::SingleQuote, true)?
            || self.cursor.quoted_text(TokenType::DoubleQuote, true)?
            || self.cursor.function_text()?
            || self.cursor.accept(TokenType::NumericValue)
            || self.cursor.accept(TokenType::BooleanValue)
            || self.cursor.accept(TokenType::NullValue);
        if !supported {
            let (text, index) = self
                .cursor
                .token
                .as_ref()
                .map_or((String::new(), self.cursor.index), |t| (t.text.clone(), t.index));
            return Err(SimpleParserError::new(
                format!("{} operator {} does not support token {}", group, operator, text),
                index,
            ));
        }
        self.operand_closed = true;

        self.cursor.next_token();
        if !self.cursor.is_eol() {
            if consume_trailing {
                self.cursor.expect_and_accept_more(TokenType::Whitespace)?;
                self.reprocess = true;
            } else {
                self.cursor.expect(TokenType::Whitespace)?;
            }
        }
        Ok(())
    }

    /// `:=` of an init binding. A value opening with a quote is read up to its
    /// closing quote, anything else is ordinary template text.
    fn init_operator(&mut self) -> ParseResult<()> {
        if !self.cursor.kind().is_init_operator() {
            return Ok(());
        }
        self.cursor.next_token();
        self.cursor.expect_and_accept_more(TokenType::Whitespace)?;
        self.operand_closed = false;

        if self.cursor.quoted_text(TokenType::SingleQuote, true)?
            || self.cursor.quoted_text(TokenType::DoubleQuote, true)?
        {
            self.operand_closed = true;
            self.cursor.next_token();
        }
        self.reprocess = true;
        Ok(())
    }

    // --------------------------------------------------------------
    // shaping
    // --------------------------------------------------------------

    /// Drop the whitespace around operators, leaving functions and quoted
    /// operands alone. In init mode the whitespace around the whole preamble
    /// goes too.
    fn remove_ignorable_white_space_tokens(&mut self) {
        let tokens = mem::take(&mut self.cursor.tokens);
        let mut keep = vec![true; tokens.len()];
        let mut depth = 0usize;
        let mut open_quote: Option<TokenType> = None;
        // the last token outside whitespace was an operator
        let mut after_operator = false;

        for (i, token) in tokens.iter().enumerate() {
            let kind = token.kind;
            if let Some(quote) = open_quote {
                if kind == quote && depth == 0 {
                    open_quote = None;
                    after_operator = false;
                } else if kind.is_function_start() {
                    depth += 1;
                } else if kind.is_function_end() {
                    depth = depth.saturating_sub(1);
                }
                continue;
            }

            if kind.is_function_start() {
                depth += 1;
            } else if kind.is_function_end() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && kind.is_quote() && after_operator {
                open_quote = Some(kind);
            } else if depth == 0 && kind.trims_whitespace() {
                let mut before = i;
                while before > 0 && tokens[before - 1].kind.is_whitespace() {
                    before -= 1;
                    keep[before] = false;
                }
                let mut after = i + 1;
                while after < tokens.len() && tokens[after].kind.is_whitespace() {
                    keep[after] = false;
                    after += 1;
                }
            }

            if depth == 0 && !kind.is_whitespace() {
                after_operator = kind.is_expression_operator() || kind.is_init_operator();
            }
        }

        if self.init_mode {
            for (i, token) in tokens.iter().enumerate() {
                if !token.kind.is_whitespace() {
                    break;
                }
                keep[i] = false;
            }
            for (i, token) in tokens.iter().enumerate().rev() {
                if !token.kind.is_whitespace() {
                    break;
                }
                keep[i] = false;
            }
        }

        self.cursor.tokens = tokens
            .into_iter()
            .zip(keep)
            .filter_map(|(token, keep)| keep.then_some(token))
            .collect();
    }

    fn create_nodes(&mut self) {
        let mut nodes: Vec<SimpleNode> = Vec::new();
        let mut image: Option<SimpleNode> = None;
        let mut depth = 0usize;
        let mut open_quote: Option<TokenType> = None;

        for token in mem::take(&mut self.cursor.tokens) {
            let kind = token.kind;
            let operand_position = image.is_none()
                && nodes
                    .last()
                    .is_some_and(|n| n.is_unlinked_operator() && !n.token.kind.is_unary());

            let node = if kind.is_function_start() {
                depth += 1;
                Some(SimpleNode::new(token, NodeKind::FunctionStart { children: vec![] }))
            } else if kind.is_function_end() && depth > 0 {
                depth -= 1;
                Some(SimpleNode::new(token, NodeKind::FunctionEnd))
            } else if depth > 0 {
                push_image(&mut image, &token);
                None
            } else if let Some(quote) = open_quote {
                if kind == quote {
                    open_quote = None;
                    Some(quote_node(token, false))
                } else {
                    push_image(&mut image, &token);
                    None
                }
            } else if kind.is_quote() && operand_position {
                open_quote = Some(kind);
                Some(quote_node(token, true))
            } else if kind.is_numeric_value() && operand_position {
                let text = token.text.clone();
                Some(SimpleNode::new(token, NodeKind::Numeric(text)))
            } else if kind.is_boolean_value() && operand_position {
                let value = token.text == "true";
                Some(SimpleNode::new(token, NodeKind::Boolean(value)))
            } else if kind.is_null_value() && operand_position {
                Some(SimpleNode::new(token, NodeKind::Null))
            } else if kind.is_unary() {
                let after_function = image.is_none()
                    && nodes.last().is_some_and(|n| matches!(n.kind, NodeKind::FunctionEnd));
                if after_function {
                    SimpleNode::operator(token)
                } else {
                    push_image(&mut image, &token);
                    None
                }
            } else if kind.is_expression_operator() || kind.is_init_operator() {
                SimpleNode::operator(token)
            } else if kind.is_init_variable() {
                Some(SimpleNode::literal(token))
            } else {
                push_image(&mut image, &token);
                None
            };

            if let Some(node) = node {
                if let Some(text) = image.take() {
                    nodes.push(text);
                }
                nodes.push(node);
            }
        }

        if let Some(text) = image.take() {
            nodes.push(text);
        }
        self.cursor.nodes = nodes;
    }

    /// Fold `condition ? when_true : when_false`, innermost last operator
    /// first so that ternaries nest to the right.
    fn prepare_ternary_expressions(&mut self) -> ParseResult<()> {
        let mut nodes = mem::take(&mut self.cursor.nodes);

        while let Some(position) = nodes.iter().rposition(|n| {
            n.is_unlinked_operator()
                && matches!(
                    n.kind,
                    NodeKind::Ternary {
                        operator: TernaryOperator::Condition,
                        ..
                    }
                )
        }) {
            let operator = &nodes[position];
            let error = |message: &str| {
                SimpleParserError::new(format!("{} {}", operator.describe(), message), operator.token.index)
            };

            if position == 0 {
                return Err(error("has no left hand side token"));
            }
            let condition = &nodes[position - 1];
            if !operator.accepts_left(condition) {
                return Err(error(&format!("does not support left hand side token {}", condition.token)));
            }
            let Some(when_true) = nodes.get(position + 1) else {
                return Err(error("has no right hand side token"));
            };
            if !operator.accepts_right(when_true) {
                return Err(error(&format!("does not support right hand side token {}", when_true.token)));
            }
            let is_otherwise = nodes.get(position + 2).is_some_and(|n| {
                matches!(
                    n.kind,
                    NodeKind::Ternary {
                        operator: TernaryOperator::Otherwise,
                        ..
                    }
                )
            });
            if !is_otherwise {
                return Err(error("has no matching : token"));
            }
            let Some(when_false) = nodes.get(position + 3) else {
                return Err(error("has no right hand side token"));
            };
            if !operator.accepts_right(when_false) {
                return Err(error(&format!("does not support right hand side token {}", when_false.token)));
            }

            let mut parts = nodes.drain(position - 1..=position + 3);
            let (Some(condition), Some(mut operator), Some(when_true), Some(_), Some(when_false)) =
                (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(SimpleParserError::new("Ternary operator ? has no right hand side token", 0));
            };
            drop(parts);
            operator.set_left(condition);
            operator.set_branches(when_true, when_false);
            nodes.insert(position - 1, operator);
        }

        if let Some(stray) = nodes.iter().find(|n| {
            matches!(
                n.kind,
                NodeKind::Ternary {
                    operator: TernaryOperator::Otherwise,
                    ..
                }
            )
        }) {
            return Err(SimpleParserError::new(
                "Ternary operator : has no matching ? token",
                stray.token.index,
            ));
        }

        self.cursor.nodes = nodes;
        Ok(())
    }

    /// Give each `:=` the variable on its left and every node up to the next
    /// variable as its value.
    fn prepare_init_expressions(&mut self) -> ParseResult<()> {
        let mut answer: Vec<SimpleNode> = Vec::new();
        let mut remaining = mem::take(&mut self.cursor.nodes).into_iter().peekable();

        while let Some(mut node) = remaining.next() {
            if node.is_init_variable() {
                answer.push(node);
                continue;
            }
            if !matches!(node.kind, NodeKind::Init { .. }) {
                return Err(SimpleParserError::new(
                    format!("Unexpected token {}", node.token),
                    node.token.index,
                ));
            }

            match answer.pop() {
                Some(left) if node.accepts_left(&left) => node.set_left(left),
                Some(left) => {
                    return Err(SimpleParserError::new(
                        format!("{} does not support left hand side token {}", node.describe(), left.token),
                        node.token.index,
                    ));
                }
                None => {
                    return Err(SimpleParserError::new(
                        format!("{} has no left hand side token", node.describe()),
                        node.token.index,
                    ));
                }
            }

            let mut has_value = false;
            while let Some(value) =
                remaining.next_if(|n| !n.is_init_variable() && !matches!(n.kind, NodeKind::Init { .. }))
            {
                node.set_right(value);
                has_value = true;
            }
            if !has_value {
                return Err(SimpleParserError::new(
                    format!("{} has no right hand side token", node.describe()),
                    node.token.index,
                ));
            }
            answer.push(node);
        }

        if let Some(stray) = answer.iter().find(|n| n.is_init_variable()) {
            return Err(SimpleParserError::new(
                format!("Unexpected token {}", stray.token),
                stray.token.index,
            ));
        }

        self.cursor.nodes = answer;
        Ok(())
    }
}



/// Compile top level nodes into one expression, joining several as text.
/// Init bindings run first and take no part in the joined text.
pub(super) fn compile_nodes(nodes: &[SimpleNode], allow_escape: bool) -> ParseResult<Expression> {
    let mut bindings = Vec::new();
    let mut parts = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.create_expression(allow_escape)? {
            Some(expression @ Expression::Init { .. }) => bindings.push(expression),
            Some(expression) => parts.push(expression),
            None => {}
        }
    }

    let body = Expression::from_parts(parts);
    if bindings.is_empty() {
        Ok(body)
    } else {
        Ok(Expression::Initialized {
            bindings,
            body: Box::new(body),
        })
    }
}
