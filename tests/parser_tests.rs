// tests/parser_tests.rs

use simple_lang::{
    Expression, Predicate, SimpleIllegalSyntaxError, Value, parse_expression, parse_expression_code, parse_predicate,
    parse_predicate_code,
};

fn expression(text: &str) -> Expression {
    parse_expression(text, true).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e))
}

fn predicate(text: &str) -> Predicate {
    parse_predicate(text, true).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e))
}

fn expression_error(text: &str) -> SimpleIllegalSyntaxError {
    match parse_expression(text, true) {
        Ok(parsed) => panic!("expected {:?} to fail, got {:?}", text, parsed),
        Err(e) => e,
    }
}

fn predicate_error(text: &str) -> SimpleIllegalSyntaxError {
    match parse_predicate(text, true) {
        Ok(parsed) => panic!("expected {:?} to fail, got {:?}", text, parsed),
        Err(e) => e,
    }
}

// ============================================================================
// Expression Shapes
// ============================================================================

#[test]
fn test_empty_expression_is_empty_text() {
    assert!(matches!(expression(""), Expression::Constant(Value::String(s)) if s.is_empty()));
}

#[test]
fn test_plain_text_is_constant() {
    assert!(matches!(expression("Hello"), Expression::Constant(Value::String(s)) if s == "Hello"));
}

#[test]
fn test_single_function() {
    assert!(matches!(expression("${body}"), Expression::Function(_)));
    assert!(matches!(expression("$simple{header.foo}"), Expression::Function(_)));
}

#[test]
fn test_template_concatenates_parts() {
    match expression("a${body}b") {
        Expression::Concat(parts) => assert_eq!(parts.len(), 3),
        other => panic!("expected concat, got {:?}", other),
    }
}

#[test]
fn test_operators_after_text_stay_text() {
    let test_cases = vec!["a ? b : c", "x ~> y", "left ?: right"];

    for text in test_cases {
        assert!(
            matches!(expression(text), Expression::Constant(Value::String(ref s)) if s == text),
            "{} should be literal text",
            text
        );
    }
}

#[test]
fn test_stray_function_end_is_text() {
    assert!(matches!(expression("a } b"), Expression::Constant(Value::String(s)) if s == "a } b"));
}

#[test]
fn test_escapes_in_template_text() {
    assert!(matches!(expression(r"a\nb"), Expression::Constant(Value::String(s)) if s == "a\nb"));

    let raw = parse_expression(r"a\nb", false).unwrap();
    assert!(matches!(raw, Expression::Constant(Value::String(s)) if s == r"a\nb"));
}

#[test]
fn test_embedded_function_is_dynamic() {
    assert!(matches!(
        expression("${header.${header.key}}"),
        Expression::Dynamic { .. }
    ));
}

#[test]
fn test_embedded_function_in_call_compiles_once() {
    assert!(matches!(
        expression("${uppercase(${header.name})}"),
        Expression::Function(_)
    ));
}

#[test]
fn test_operator_shapes() {
    assert!(matches!(expression("${body}++"), Expression::Unary { .. }));
    assert!(matches!(expression("${header.vip} ? 'a' : 'b'"), Expression::Ternary { .. }));
    assert!(matches!(expression("${body} ~> ${trim()}"), Expression::Chain { .. }));
    assert!(matches!(expression("${body} ?: 'x'"), Expression::Elvis { .. }));
}

#[test]
fn test_chain_folds_left_to_right() {
    match expression("${body} ~> ${trim()} ~> ${uppercase()}") {
        Expression::Chain { left, .. } => assert!(matches!(*left, Expression::Chain { .. })),
        other => panic!("expected chain, got {:?}", other),
    }
}

#[test]
fn test_ternary_nests_to_the_right() {
    match expression("${header.a} ? 'x' : ${header.b} ? 'y' : 'z'") {
        Expression::Ternary { when_false, .. } => {
            assert!(matches!(*when_false, Expression::Ternary { .. }))
        }
        other => panic!("expected ternary, got {:?}", other),
    }
}

#[test]
fn test_init_block_shape() {
    match expression("$init{ $$x := ${body} }init$Hello $x") {
        Expression::Initialized { bindings, body } => {
            assert_eq!(bindings.len(), 1);
            assert!(matches!(&bindings[0], Expression::Init { name, .. } if name == "x"));
            assert!(matches!(*body, Expression::Concat(ref parts) if parts.len() == 2));
        }
        other => panic!("expected init bindings, got {:?}", other),
    }
}

#[test]
fn test_init_block_before_single_function() {
    match expression("$init{ $$x := 1 }init$${variable.x}") {
        Expression::Initialized { body, .. } => assert!(matches!(*body, Expression::Function(_))),
        other => panic!("expected init bindings, got {:?}", other),
    }
}

#[test]
fn test_init_value_quote_must_close() {
    let err = expression_error("$init{ $$x := 'open }init$$x");
    assert_eq!(err.message, "single quote has no ending quote");
    assert_eq!(err.index, 14);
}

// ============================================================================
// Predicate Shapes
// ============================================================================

#[test]
fn test_empty_predicate_is_false() {
    assert!(matches!(predicate(""), Predicate::Constant(false)));
}

#[test]
fn test_boolean_predicate() {
    assert!(matches!(predicate("true"), Predicate::Constant(true)));
}

#[test]
fn test_function_predicate_is_truthiness() {
    assert!(matches!(predicate("${header.flag}"), Predicate::Truthy(_)));
}

#[test]
fn test_binary_predicate() {
    assert!(matches!(predicate("${header.age} > 18"), Predicate::Binary(_)));
}

#[test]
fn test_logical_predicate() {
    assert!(matches!(
        predicate("${header.a} == 1 && ${header.b} == 2"),
        Predicate::Logical { .. }
    ));
}

#[test]
fn test_separate_predicates_are_conjoined() {
    match predicate("${header.a} == 1 ${header.b} == 2") {
        Predicate::And(parts) => assert_eq!(parts.len(), 2),
        other => panic!("expected and, got {:?}", other),
    }
}

// ============================================================================
// Unbalanced Blocks
// ============================================================================

#[test]
fn test_unclosed_function() {
    let err = expression_error("${body");
    assert_eq!(err.message, "function has no ending token");
    assert_eq!(err.index, 0);
}

#[test]
fn test_unclosed_outer_function_points_at_outer_start() {
    let err = expression_error("Hello ${header.${body}");
    assert_eq!(err.message, "function has no ending token");
    assert_eq!(err.index, 6);
}

#[test]
fn test_unclosed_quote_operand() {
    let err = expression_error("${body} ?: 'abc");
    assert_eq!(err.message, "single quote has no ending quote");
    assert_eq!(err.index, 11);
}

#[test]
fn test_unclosed_quote_in_predicate() {
    let err = predicate_error("${body} == 'x");
    assert_eq!(err.message, "single quote has no ending quote");
    assert_eq!(err.index, 11);
}

#[test]
fn test_unclosed_function_in_predicate() {
    let err = predicate_error("${header.a} == ${body");
    assert_eq!(err.message, "function has no ending token");
    assert_eq!(err.index, 15);
}

// ============================================================================
// Operator Errors
// ============================================================================

#[test]
fn test_other_operator_unsupported_operand() {
    let err = expression_error("${body} ?: text");
    assert_eq!(err.message, "Other operator ?: does not support token t");
    assert_eq!(err.index, 11);
}

#[test]
fn test_operator_at_end_of_input() {
    let err = expression_error("${body} ?:");
    assert_eq!(err.message, "Expected symbol whiteSpace but reached eol");
    assert_eq!(err.index, 8);
}

#[test]
fn test_ternary_without_colon() {
    let err = expression_error("${body} ? 'a'");
    assert_eq!(err.message, "Ternary operator ? has no matching : token");
    assert_eq!(err.index, 8);
}

#[test]
fn test_colon_without_question_mark() {
    let err = expression_error("${body} : 'b'");
    assert_eq!(err.message, "Ternary operator : has no matching ? token");
    assert_eq!(err.index, 8);
}

#[test]
fn test_unexpected_token_in_predicate() {
    let err = predicate_error("${body} foo");
    assert_eq!(err.message, "Unexpected token f");
    assert_eq!(err.index, 8);
}

#[test]
fn test_binary_operator_unsupported_operand() {
    let err = predicate_error("${body} contains null");
    assert_eq!(err.message, "Binary operator contains does not support token null");
    assert_eq!(err.index, 17);
}

#[test]
fn test_binary_operator_without_left_side() {
    let err = predicate_error("== 5");
    assert_eq!(err.message, "Binary operator == has no left hand side token");
    assert_eq!(err.index, 0);
}

#[test]
fn test_chained_comparison_is_rejected() {
    let err = predicate_error("${a} == 1 == 2");
    assert!(err.message.starts_with("Binary operator == does not support left hand side token"));
    assert_eq!(err.index, 10);
}

#[test]
fn test_logical_operator_at_end() {
    let err = predicate_error("${body} == 5 &&");
    assert_eq!(err.message, "Expected symbol whiteSpace but reached eol");
    assert_eq!(err.index, 13);
}

// ============================================================================
// Compile Errors
// ============================================================================

#[test]
fn test_unknown_function_points_at_function_start() {
    let err = expression_error("Hi ${frobnicate}");
    assert_eq!(err.message, "Unknown function: frobnicate");
    assert_eq!(err.index, 3);
}

#[test]
fn test_invalid_regex_points_at_operand() {
    let err = predicate_error("${body} regex '('");
    assert!(err.message.starts_with("Invalid regex '('"), "{}", err.message);
    assert_eq!(err.index, 14);
}

#[test]
fn test_unknown_type_name() {
    let err = predicate_error("${body} is 'Widget'");
    assert_eq!(err.message, "Unknown type name: Widget");
}

// ============================================================================
// Init Blocks
// ============================================================================

#[test]
fn test_init_block_without_end() {
    let err = expression_error("$init{ $$a := 1");
    assert_eq!(err.message, "init block has no ending token }init$");
    assert_eq!(err.index, 0);
}

#[test]
fn test_init_remainder_error_points_into_full_text() {
    let err = expression_error("$init{ $$a := 1 }init$ ${oops");
    assert_eq!(err.message, "function has no ending token");
    assert_eq!(err.index, 23);
    assert_eq!(err.expression, "$init{ $$a := 1 }init$ ${oops");
}

// ============================================================================
// Error Display
// ============================================================================

#[test]
fn test_error_display_marks_location() {
    let err = expression_error("${body} ?: text");
    assert_eq!(
        err.to_string(),
        "Other operator ?: does not support token t at location 11\n${body} ?: text\n           *"
    );
}

// ============================================================================
// Code Generation
// ============================================================================

#[test]
fn test_expression_code() {
    let code = parse_expression_code("Hello ${body}", true).unwrap();
    assert_eq!(code, r#""Hello " + function(exchange, "body")"#);
}

#[test]
fn test_elvis_code() {
    let code = parse_expression_code("${header.nick} ?: 'anon'", true).unwrap();
    assert_eq!(code, r#"elvis(exchange, function(exchange, "header.nick"), "anon")"#);
}

#[test]
fn test_init_block_code() {
    let code = parse_expression_code("$init{ $$a := 1 }init$ ${variable.a}", true).unwrap();
    assert_eq!(code, r#"init(exchange, "a", 1) + function(exchange, "variable.a")"#);
}

#[test]
fn test_predicate_code() {
    let code = parse_predicate_code("${header.a} == 1 && ${body} contains 'x'", true).unwrap();
    assert_eq!(
        code,
        r#"and(exchange, binary(exchange, "==", function(exchange, "header.a"), 1), binary(exchange, "contains", function(exchange, "body"), "x"))"#
    );
}

#[test]
fn test_separate_predicates_code() {
    let code = parse_predicate_code("${header.a} == 1 ${header.b} == 2", true).unwrap();
    assert_eq!(
        code,
        r#"binary(exchange, "==", function(exchange, "header.a"), 1) && binary(exchange, "==", function(exchange, "header.b"), 2)"#
    );
}

#[test]
fn test_code_reports_syntax_errors() {
    assert!(parse_expression_code("${body", true).is_err());
    assert!(parse_predicate_code("${body} foo", true).is_err());
}
