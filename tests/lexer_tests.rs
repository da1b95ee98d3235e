// tests/lexer_tests.rs

use simple_lang::ast::{SimpleToken, TokenType};
use simple_lang::lexer::{Lexer, has_escape_token, has_function_start_token, next_token};

fn token_at(input: &str, index: usize) -> SimpleToken {
    Lexer::new(input, true).next_token(index, &[])
}

fn kind_at(input: &str, index: usize) -> TokenType {
    token_at(input, index).kind
}

// ============================================================================
// Function Delimiters and Quotes
// ============================================================================

#[test]
fn test_function_start_variants() {
    let token = token_at("${body}", 0);
    assert_eq!(token.kind, TokenType::FunctionStart);
    assert_eq!(token.text, "${");

    let token = token_at("$simple{body}", 0);
    assert_eq!(token.kind, TokenType::FunctionStart);
    assert_eq!(token.length, 8);
}

#[test]
fn test_function_end_and_quotes() {
    assert_eq!(kind_at("}", 0), TokenType::FunctionEnd);
    assert_eq!(kind_at("'a'", 0), TokenType::SingleQuote);
    assert_eq!(kind_at("\"a\"", 0), TokenType::DoubleQuote);
}

#[test]
fn test_lone_dollar_is_character() {
    let token = token_at("$5", 0);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "$");
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numeric_values() {
    let test_cases = vec![("42", "42"), ("3.14 ", "3.14"), ("1,5x", "1,5"), ("007", "007")];

    for (input, expected) in test_cases {
        let token = token_at(input, 0);
        assert_eq!(token.kind, TokenType::NumericValue, "input: {}", input);
        assert_eq!(token.text, expected, "input: {}", input);
    }
}

#[test]
fn test_separator_cannot_start_a_number() {
    assert_eq!(kind_at(".5", 0), TokenType::Character);
}

#[test]
fn test_boolean_and_null() {
    assert_eq!(kind_at("true", 0), TokenType::BooleanValue);
    assert_eq!(kind_at("false", 0), TokenType::BooleanValue);
    assert_eq!(kind_at("null", 0), TokenType::NullValue);
}

#[test]
fn test_whitespace_kinds() {
    for input in [" ", "\t", "\n", "\r"] {
        assert_eq!(kind_at(input, 0), TokenType::Whitespace, "input: {:?}", input);
    }
}

// ============================================================================
// Escapes
// ============================================================================

#[test]
fn test_known_escapes() {
    let test_cases = vec![(r"\n", "\n"), (r"\t", "\t"), (r"\r", "\r"), (r"\}", "}")];

    for (input, expected) in test_cases {
        let token = token_at(input, 0);
        assert_eq!(token.kind, TokenType::Character);
        assert_eq!(token.text, expected);
        assert_eq!(token.length, 2, "escape {} should span both characters", input);
    }
}

#[test]
fn test_unknown_escape_keeps_backslash() {
    let lexer = Lexer::new(r"\d+", true);
    let token = lexer.next_token(0, &[]);
    assert_eq!(token.text, "\\");
    assert_eq!(token.length, 1);
    assert_eq!(lexer.next_token(1, &[]).text, "d");
}

#[test]
fn test_escapes_disabled() {
    let token = Lexer::new(r"\n", false).next_token(0, &[]);
    assert_eq!(token.text, "\\");
    assert_eq!(token.length, 1);
}

#[test]
fn test_trailing_backslash() {
    let token = token_at(r"a\", 1);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "\\");
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_binary_operators_longest_first() {
    let test_cases = vec![
        ("== x", "=="),
        ("=~ x", "=~"),
        (">= x", ">="),
        ("> x", ">"),
        ("!=~ x", "!=~"),
        ("!= x", "!="),
        ("not contains x", "not contains"),
        ("!contains x", "!contains"),
        ("!~~ x", "!~~"),
        ("~~ x", "~~"),
        ("not regex x", "not regex"),
        ("!in x", "!in"),
        ("not range x", "not range"),
        ("starts with x", "starts with"),
        ("startsWith x", "startsWith"),
        ("ends with x", "ends with"),
    ];

    for (input, expected) in test_cases {
        let token = token_at(input, 0);
        assert_eq!(token.kind, TokenType::BinaryOperator, "input: {}", input);
        assert_eq!(token.text, expected);
    }
}

#[test]
fn test_logical_operators() {
    assert_eq!(kind_at("&& x", 0), TokenType::LogicalOperator);
    assert_eq!(kind_at("|| x", 0), TokenType::LogicalOperator);
}

#[test]
fn test_expression_operators_need_whitespace_around() {
    assert_eq!(kind_at("a ? b", 2), TokenType::TernaryOperator);
    assert_eq!(kind_at("a : b", 2), TokenType::TernaryOperator);
    assert_eq!(kind_at("a ?: b", 2), TokenType::OtherOperator);
    assert_eq!(kind_at("a ~> b", 2), TokenType::ChainOperator);

    assert_eq!(kind_at("a?b", 1), TokenType::Character);
    assert_eq!(kind_at("a ~>b", 2), TokenType::Character);
    assert_eq!(kind_at("http://host", 4), TokenType::Character);
}

#[test]
fn test_unary_after_function_end() {
    assert_eq!(kind_at("${x}++", 4), TokenType::UnaryOperator);
    assert_eq!(kind_at("${x}-- rest", 4), TokenType::UnaryOperator);
}

#[test]
fn test_unary_without_function_end_is_text() {
    // not preceded by a function end
    let token = token_at("a ++ b", 2);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "+");

    // not followed by whitespace
    assert_ne!(kind_at("${x}++b", 4), TokenType::UnaryOperator);
}

#[test]
fn test_minus_is_tried_last() {
    assert_eq!(kind_at("${x}--5", 4), TokenType::MinusValue);
    assert_eq!(kind_at("-5", 0), TokenType::MinusValue);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_limits_kinds() {
    let lexer = Lexer::new("${body} 42", true);
    let token = lexer.next_token(0, &[TokenType::SingleQuote, TokenType::Eol]);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "$");

    let token = lexer.next_token(8, &[TokenType::FunctionStart]);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "4");
}

#[test]
fn test_filter_without_escape_keeps_backslash() {
    let token = next_token(r"\n", 0, true, &[TokenType::SingleQuote]);
    assert_eq!(token.text, "\\");
}

// ============================================================================
// Init Blocks
// ============================================================================

#[test]
fn test_init_operator_needs_whitespace() {
    let lexer = Lexer::new("a := b", true);
    assert_eq!(lexer.next_init_token(2, &[]).kind, TokenType::InitOperator);

    let lexer = Lexer::new("a:=b", true);
    assert_eq!(lexer.next_init_token(1, &[]).kind, TokenType::Character);
}

#[test]
fn test_init_variable_needs_a_name() {
    let lexer = Lexer::new("$$count_1 $$ ", true);
    let token = lexer.next_init_token(0, &[]);
    assert_eq!(token.kind, TokenType::InitVariable);
    assert_eq!(token.text, "$$count_1");

    let token = lexer.next_init_token(10, &[]);
    assert_eq!(token.kind, TokenType::Character);
    assert_eq!(token.text, "$");
}

#[test]
fn test_plain_lexer_ignores_init_tokens() {
    assert_eq!(kind_at("$$x", 0), TokenType::Character);
}

// ============================================================================
// Pre-checks
// ============================================================================

#[test]
fn test_has_function_start_token() {
    assert!(has_function_start_token("Hello ${body}"));
    assert!(has_function_start_token("$simple{header.foo}"));
    assert!(!has_function_start_token("Hello $body {x}"));
}

#[test]
fn test_has_escape_token() {
    assert!(has_escape_token(r"a\nb"));
    assert!(!has_escape_token("a b"));
}
