//! Token cursor and the grammar pieces both parsers share.

use std::mem;

use super::SimpleParserError;
use crate::{
    ast::{NodeKind, SimpleNode, SimpleToken, TokenType},
    lexer::Lexer,
};

type ParseResult<T> = Result<T, SimpleParserError>;

/// Walks the expression text one token at a time and collects what it saw.
///
/// Grammar rules test the current token with [`Cursor::accept`] and move on
/// with [`Cursor::next_token`]. Every scanned token is recorded, so once the
/// grammar is satisfied the token list can be turned into nodes.
pub(super) struct Cursor {
    lexer: Lexer,
    pub tokens: Vec<SimpleToken>,
    pub nodes: Vec<SimpleNode>,
    pub token: Option<SimpleToken>,
    pub index: usize,
    pub previous_index: usize,
    pub accept_init_tokens: bool,
}

impl Cursor {
    pub fn new(expression: &str, allow_escape: bool) -> Self {
        Cursor {
            lexer: Lexer::new(expression, allow_escape),
            tokens: Vec::new(),
            nodes: Vec::new(),
            token: None,
            index: 0,
            previous_index: 0,
            accept_init_tokens: false,
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.nodes.clear();
        self.token = None;
        self.index = 0;
        self.previous_index = 0;
    }

    pub fn next_token(&mut self) {
        self.next_token_filtered(&[]);
    }

    /// Scan the next token. At the end of the text the current token becomes
    /// eol and the position stays where it is.
    pub fn next_token_filtered(&mut self, filter: &[TokenType]) {
        if self.index >= self.lexer.len() {
            self.token = Some(SimpleToken::eol(self.index));
            return;
        }
        let token = if self.accept_init_tokens {
            self.lexer.next_init_token(self.index, filter)
        } else {
            self.lexer.next_token(self.index, filter)
        };
        self.previous_index = self.index;
        self.index += token.length.max(1);
        self.tokens.push(token.clone());
        self.token = Some(token);
    }

    pub fn kind(&self) -> TokenType {
        self.token.as_ref().map_or(TokenType::Eol, |t| t.kind)
    }

    pub fn is_eol(&self) -> bool {
        self.kind().is_eol()
    }

    pub fn accept(&self, kind: TokenType) -> bool {
        self.token.as_ref().is_none_or(|t| t.kind == kind)
    }

    pub fn expect(&self, kind: TokenType) -> ParseResult<()> {
        match &self.token {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) if !token.kind.is_eol() => Err(SimpleParserError::new(
                format!("Expected symbol {} but was {}", kind, token.kind),
                self.previous_index,
            )),
            _ => Err(SimpleParserError::new(
                format!("Expected symbol {} but reached eol", kind),
                self.previous_index,
            )),
        }
    }

    /// Expect at least one token of `kind` and skip past any that follow.
    /// The cursor ends on the first token of another kind.
    pub fn expect_and_accept_more(&mut self, kind: TokenType) -> ParseResult<()> {
        self.expect(kind)?;
        loop {
            self.next_token();
            if self.is_eol() || !self.accept(kind) {
                return Ok(());
            }
        }
    }

    /// Turn the current token back into plain text.
    pub fn demote_current_token(&mut self) {
        if let Some(token) = &mut self.token {
            token.kind = TokenType::Character;
        }
        if let Some(token) = self.tokens.last_mut() {
            token.kind = TokenType::Character;
        }
    }

    fn current_index(&self) -> usize {
        self.token.as_ref().map_or(self.index, |t| t.index)
    }

    /// A quoted literal. With `with_functions` the text may embed functions.
    pub fn quoted_text(&mut self, quote: TokenType, with_functions: bool) -> ParseResult<bool> {
        if !self.accept(quote) {
            return Ok(false);
        }
        let start = self.current_index();
        let filter: &[TokenType] = if with_functions {
            &[quote, TokenType::Eol, TokenType::FunctionStart, TokenType::FunctionEnd, TokenType::Escape]
        } else {
            &[quote, TokenType::Eol, TokenType::Escape]
        };
        let accept_init_tokens = mem::replace(&mut self.accept_init_tokens, false);

        self.next_token_filtered(filter);
        while self.kind() != quote && !self.is_eol() {
            self.next_token_filtered(filter);
        }

        self.accept_init_tokens = accept_init_tokens;
        if self.is_eol() {
            let name = if quote.is_single_quote() { "single" } else { "double" };
            return Err(SimpleParserError::new(
                format!("{} quote has no ending quote", name),
                start,
            ));
        }
        Ok(true)
    }

    /// A function block, with any functions nested in it.
    pub fn function_text(&mut self) -> ParseResult<bool> {
        if !self.accept(TokenType::FunctionStart) {
            return Ok(false);
        }
        let start = self.current_index();
        let accept_init_tokens = mem::replace(&mut self.accept_init_tokens, false);

        self.next_token();
        while !self.kind().is_function_end() && !self.is_eol() {
            if self.kind().is_function_start() {
                self.function_text()?;
            }
            self.next_token();
        }

        self.accept_init_tokens = accept_init_tokens;
        if self.is_eol() {
            return Err(SimpleParserError::new("function has no ending token", start));
        }
        Ok(true)
    }

    /// Move every node that sits between a block start and its end into the block.
    pub fn prepare_blocks(&mut self) -> ParseResult<()> {
        let mut answer = Vec::new();
        let mut stack: Vec<SimpleNode> = Vec::new();

        for node in mem::take(&mut self.nodes) {
            if node.is_block_start() {
                stack.push(node);
            } else if node.is_block_end() {
                let block = match stack.pop() {
                    Some(block) if node.closes(&block) => block,
                    _ => {
                        return Err(SimpleParserError::new(
                            format!("{} has no matching start token", node.token.kind),
                            node.token.index,
                        ));
                    }
                };
                match stack.last_mut() {
                    Some(parent) => add_to_block(parent, block)?,
                    None => answer.push(block),
                }
            } else {
                match stack.last_mut() {
                    Some(parent) => add_to_block(parent, node)?,
                    None => answer.push(node),
                }
            }
        }

        if let Some(open) = stack.pop() {
            return Err(SimpleParserError::new(
                format!("{} has no ending token", open.block_name()),
                open.token.index,
            ));
        }

        self.nodes = answer;
        Ok(())
    }

    /// Link each unary operator with the node on its left.
    pub fn prepare_unary_expressions(&mut self) -> ParseResult<()> {
        let mut answer: Vec<SimpleNode> = Vec::new();
        for mut node in mem::take(&mut self.nodes) {
            if !node.token.kind.is_unary() || !node.is_unlinked_operator() {
                answer.push(node);
                continue;
            }
            let Some(left) = answer.pop() else {
                return Err(SimpleParserError::new(
                    format!("{} has no left hand side token", node.describe()),
                    node.token.index,
                ));
            };
            if !node.accepts_left(&left) {
                return Err(SimpleParserError::new(
                    format!("{} does not support left hand side token {}", node.describe(), left.token),
                    node.token.index,
                ));
            }
            node.set_left(left);
            answer.push(node);
        }
        self.nodes = answer;
        Ok(())
    }

    /// Link each operator picked by `is_operator` with the node before and
    /// the node after it, folding left to right.
    pub fn prepare_infix_expressions(&mut self, is_operator: impl Fn(TokenType) -> bool) -> ParseResult<()> {
        let mut answer: Vec<SimpleNode> = Vec::new();
        let mut remaining = mem::take(&mut self.nodes).into_iter();

        while let Some(mut node) = remaining.next() {
            if !is_operator(node.token.kind) || !node.is_unlinked_operator() {
                answer.push(node);
                continue;
            }
            let error = |message: String| SimpleParserError::new(message, node.token.index);

            let Some(left) = answer.pop() else {
                return Err(error(format!("{} has no left hand side token", node.describe())));
            };
            if !node.accepts_left(&left) {
                return Err(error(format!(
                    "{} does not support left hand side token {}",
                    node.describe(),
                    left.token
                )));
            }
            let Some(right) = remaining.next() else {
                return Err(error(format!("{} has no right hand side token", node.describe())));
            };
            if !node.accepts_right(&right) {
                return Err(error(format!(
                    "{} does not support right hand side token {}",
                    node.describe(),
                    right.token
                )));
            }

            node.set_left(left);
            node.set_right(right);
            answer.push(node);
        }

        self.nodes = answer;
        Ok(())
    }
}

/// Append the token's text to the literal being collected, starting one if needed.
pub(super) fn push_image(image: &mut Option<SimpleNode>, token: &SimpleToken) {
    match image {
        Some(literal) => literal.add_text(&token.text),
        None => *image = Some(SimpleNode::literal(token.clone())),
    }
}

pub(super) fn quote_node(token: SimpleToken, start: bool) -> SimpleNode {
    let kind = match (token.kind.is_single_quote(), start) {
        (true, true) => NodeKind::SingleQuoteStart { children: vec![] },
        (true, false) => NodeKind::SingleQuoteEnd,
        (false, true) => NodeKind::DoubleQuoteStart { children: vec![] },
        (false, false) => NodeKind::DoubleQuoteEnd,
    };
    SimpleNode::new(token, kind)
}

fn add_to_block(parent: &mut SimpleNode, node: SimpleNode) -> ParseResult<()> {
    let index = node.token.index;
    let text = node.token.text.clone();
    if parent.accept_and_add_node(node) {
        Ok(())
    } else {
        Err(SimpleParserError::new(
            format!("{} cannot accept {}", parent.block_name(), text),
            index,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eol_does_not_advance() {
        let mut cursor = Cursor::new("a", true);
        cursor.next_token();
        assert_eq!(cursor.kind(), TokenType::Character);
        cursor.next_token();
        assert!(cursor.is_eol());
        assert_eq!(cursor.index, 1);
        assert_eq!(cursor.tokens.len(), 1);
    }

    #[test]
    fn test_expect_and_accept_more() {
        let mut cursor = Cursor::new("   x", true);
        cursor.next_token();
        cursor.expect_and_accept_more(TokenType::Whitespace).unwrap();
        assert_eq!(cursor.token.as_ref().unwrap().text, "x");
    }

    #[test]
    fn test_expect_reports_previous_index() {
        let mut cursor = Cursor::new("ab", true);
        cursor.next_token();
        cursor.next_token();
        let err = cursor.expect(TokenType::Whitespace).unwrap_err();
        assert_eq!(err.message, "Expected symbol whiteSpace but was character");
        assert_eq!(err.index, 1);
    }

    #[test]
    fn test_unterminated_quote() {
        let mut cursor = Cursor::new("x 'abc", true);
        cursor.next_token();
        cursor.next_token();
        cursor.next_token();
        let err = cursor.quoted_text(TokenType::SingleQuote, true).unwrap_err();
        assert_eq!(err.message, "single quote has no ending quote");
        assert_eq!(err.index, 2);
    }

    #[test]
    fn test_quoted_text_reads_init_tokens_as_text() {
        let mut cursor = Cursor::new("'$$y := 1' $$z", true);
        cursor.accept_init_tokens = true;
        cursor.next_token();
        assert!(cursor.quoted_text(TokenType::SingleQuote, true).unwrap());
        assert!(cursor.tokens.iter().all(|t| !t.kind.is_init_variable() && !t.kind.is_init_operator()));

        assert!(cursor.accept_init_tokens);
        cursor.next_token();
        cursor.next_token();
        assert!(cursor.kind().is_init_variable());
    }

    #[test]
    fn test_nested_function_text() {
        let mut cursor = Cursor::new("${header.${body}}", true);
        cursor.next_token();
        assert!(cursor.function_text().unwrap());
        assert!(cursor.kind().is_function_end());
        assert_eq!(cursor.index, 17);
    }
}
