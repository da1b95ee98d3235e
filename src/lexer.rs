use crate::ast::{SimpleToken, TokenType};

/// Known tokens in the order they are tried. The first entry whose text
/// matches, whose kind passes the filter and whose context check passes wins,
/// so longer spellings must come before their prefixes.
const KNOWN_TOKENS: &[(TokenType, &str)] = &[
    (TokenType::Whitespace, " "),
    (TokenType::Whitespace, "\t"),
    (TokenType::Whitespace, "\n"),
    (TokenType::Whitespace, "\r"),
    (TokenType::SingleQuote, "'"),
    (TokenType::DoubleQuote, "\""),
    (TokenType::FunctionStart, "${"),
    (TokenType::FunctionStart, "$simple{"),
    (TokenType::FunctionEnd, "}"),
    (TokenType::BooleanValue, "true"),
    (TokenType::BooleanValue, "false"),
    (TokenType::NullValue, "null"),
    (TokenType::BinaryOperator, "=="),
    (TokenType::BinaryOperator, "=~"),
    (TokenType::BinaryOperator, ">="),
    (TokenType::BinaryOperator, "<="),
    (TokenType::BinaryOperator, ">"),
    (TokenType::BinaryOperator, "<"),
    (TokenType::BinaryOperator, "!=~"),
    (TokenType::BinaryOperator, "!="),
    (TokenType::BinaryOperator, "not is"),
    (TokenType::BinaryOperator, "!is"),
    (TokenType::BinaryOperator, "is"),
    (TokenType::BinaryOperator, "not contains"),
    (TokenType::BinaryOperator, "!contains"),
    (TokenType::BinaryOperator, "contains"),
    (TokenType::BinaryOperator, "!~~"),
    (TokenType::BinaryOperator, "~~"),
    (TokenType::BinaryOperator, "not regex"),
    (TokenType::BinaryOperator, "!regex"),
    (TokenType::BinaryOperator, "regex"),
    (TokenType::BinaryOperator, "not in"),
    (TokenType::BinaryOperator, "!in"),
    (TokenType::BinaryOperator, "in"),
    (TokenType::BinaryOperator, "not range"),
    (TokenType::BinaryOperator, "!range"),
    (TokenType::BinaryOperator, "range"),
    (TokenType::BinaryOperator, "startsWith"),
    (TokenType::BinaryOperator, "starts with"),
    (TokenType::BinaryOperator, "endsWith"),
    (TokenType::BinaryOperator, "ends with"),
    (TokenType::UnaryOperator, "++"),
    (TokenType::UnaryOperator, "--"),
    (TokenType::LogicalOperator, "&&"),
    (TokenType::LogicalOperator, "||"),
    (TokenType::OtherOperator, "?:"),
    (TokenType::ChainOperator, "~>"),
    (TokenType::TernaryOperator, "?"),
    (TokenType::TernaryOperator, ":"),
    (TokenType::MinusValue, "-"),
];

/// Scans tokens out of an expression on demand.
///
/// The lexer keeps no position of its own: every call names the index to scan
/// from, which lets the parser re-scan the same text with different filters.
pub struct Lexer {
    input: Vec<char>,
    allow_escape: bool,
}

impl Lexer {
    pub fn new(input: &str, allow_escape: bool) -> Self {
        Lexer {
            input: input.chars().collect(),
            allow_escape,
        }
    }

    /// Number of characters in the input.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.input.get(index).copied()
    }

    fn matches_at(&self, index: usize, text: &str) -> bool {
        let mut position = index;
        for ch in text.chars() {
            if self.char_at(position) != Some(ch) {
                return false;
            }
            position += 1;
        }
        true
    }

    fn is_whitespace_at(&self, index: usize) -> bool {
        matches!(self.char_at(index), Some(' ' | '\t' | '\n' | '\r'))
    }

    /// Scan one token at `index`. An empty `filter` accepts every kind.
    ///
    /// Never fails: a character no rule recognizes becomes a one character
    /// [`TokenType::Character`] token.
    pub fn next_token(&self, index: usize, filter: &[TokenType]) -> SimpleToken {
        if accepts(filter, TokenType::NumericValue)
            && let Some(token) = self.read_number(index)
        {
            return token;
        }

        if self.allow_escape
            && accepts(filter, TokenType::Escape)
            && let Some(token) = self.read_escape(index)
        {
            return token;
        }

        for &(kind, text) in KNOWN_TOKENS {
            if accepts(filter, kind) && self.matches_at(index, text) && self.context_allows(kind, index, text) {
                return SimpleToken::new(kind, text, index);
            }
        }

        let ch = self.char_at(index).map(String::from).unwrap_or_default();
        SimpleToken::new(TokenType::Character, ch, index)
    }

    /// Like [`Lexer::next_token`], but also recognizes the `:=` operator and
    /// `$$name` variables of an init block.
    pub fn next_init_token(&self, index: usize, filter: &[TokenType]) -> SimpleToken {
        if accepts(filter, TokenType::InitOperator)
            && self.matches_at(index, ":=")
            && (index == 0 || self.is_whitespace_at(index - 1))
            && (index + 2 >= self.len() || self.is_whitespace_at(index + 2))
        {
            return SimpleToken::new(TokenType::InitOperator, ":=", index);
        }

        if accepts(filter, TokenType::InitVariable) && self.matches_at(index, "$$") {
            let mut end = index + 2;
            while self.char_at(end).is_some_and(is_identifier_char) {
                end += 1;
            }
            if end > index + 2 {
                let text: String = self.input[index..end].iter().collect();
                return SimpleToken::new(TokenType::InitVariable, text, index);
            }
        }

        self.next_token(index, filter)
    }

    fn read_number(&self, index: usize) -> Option<SimpleToken> {
        let mut number = String::new();
        let mut position = index;

        while let Some(ch) = self.char_at(position) {
            if ch.is_ascii_digit() || ((ch == '.' || ch == ',') && !number.is_empty()) {
                number.push(ch);
                position += 1;
            } else {
                break;
            }
        }

        if number.is_empty() {
            None
        } else {
            Some(SimpleToken::new(TokenType::NumericValue, number, index))
        }
    }

    fn read_escape(&self, index: usize) -> Option<SimpleToken> {
        if self.char_at(index) != Some('\\') || index + 1 >= self.len() {
            return None;
        }
        let escaped = match self.char_at(index + 1) {
            Some('n') => "\n",
            Some('t') => "\t",
            Some('r') => "\r",
            Some('}') => "}",
            // keep the backslash and leave the next character alone
            _ => return Some(SimpleToken::new(TokenType::Character, "\\", index)),
        };
        Some(SimpleToken::with_length(TokenType::Character, escaped, index, 2))
    }

    fn context_allows(&self, kind: TokenType, index: usize, text: &str) -> bool {
        let after = index + text.chars().count();
        let followed_by_space = after >= self.len() || self.is_whitespace_at(after);
        match kind {
            TokenType::UnaryOperator => {
                index > 0 && self.char_at(index - 1) == Some('}') && followed_by_space
            }
            TokenType::TernaryOperator | TokenType::ChainOperator | TokenType::OtherOperator => {
                index > 0 && self.is_whitespace_at(index - 1) && followed_by_space
            }
            _ => true,
        }
    }
}

fn accepts(filter: &[TokenType], kind: TokenType) -> bool {
    filter.is_empty() || filter.contains(&kind)
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Scan one token of `expression` starting at character `index`.
pub fn next_token(expression: &str, index: usize, allow_escape: bool, filter: &[TokenType]) -> SimpleToken {
    Lexer::new(expression, allow_escape).next_token(index, filter)
}

/// Whether the text contains a `${` or `$simple{` function start.
pub fn has_function_start_token(expression: &str) -> bool {
    expression.contains("${") || expression.contains("$simple{")
}

/// Whether the text contains a backslash that escaping would act on.
pub fn has_escape_token(expression: &str) -> bool {
    expression.contains('\\')
}

#[test]
fn test_function_delimiters() {
    let lexer = Lexer::new("${body}", true);
    let start = lexer.next_token(0, &[]);
    assert_eq!(start.kind, TokenType::FunctionStart);
    assert_eq!(start.length, 2);
    assert_eq!(lexer.next_token(2, &[]).text, "b");
    assert_eq!(lexer.next_token(6, &[]).kind, TokenType::FunctionEnd);
}

#[test]
fn test_unary_requires_function_end() {
    let lexer = Lexer::new("${x}++ a ++ b", true);
    assert_eq!(lexer.next_token(4, &[]).kind, TokenType::UnaryOperator);
    // "a ++" is not preceded by a function end
    let plus = lexer.next_token(9, &[]);
    assert_eq!(plus.kind, TokenType::Character);
    assert_eq!(plus.text, "+");
}

#[test]
fn test_numeric_with_separators() {
    let token = next_token("12,5.3x", 0, true, &[]);
    assert_eq!(token.kind, TokenType::NumericValue);
    assert_eq!(token.text, "12,5.3");
}

#[test]
fn test_init_tokens() {
    let lexer = Lexer::new(" $$total := 5", true);
    let var = lexer.next_init_token(1, &[]);
    assert_eq!(var.kind, TokenType::InitVariable);
    assert_eq!(var.text, "$$total");
    assert_eq!(lexer.next_init_token(9, &[]).kind, TokenType::InitOperator);
}
