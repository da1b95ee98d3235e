// tests/operator_tests.rs

use rstest::rstest;
use simple_lang::{EvalError, Exchange, Value, parse_expression, parse_predicate};

fn exchange() -> Exchange {
    Exchange::new("Hello World")
        .with_header("age", 21i64)
        .with_header("limit", 18i64)
        .with_header("delta", -5i64)
        .with_header("name", "Ada")
        .with_header("vip", true)
}

fn matches(text: &str, exchange: &mut Exchange) -> bool {
    parse_predicate(text, true)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e))
        .matches(exchange)
        .unwrap_or_else(|e| panic!("failed to evaluate {:?}: {}", text, e))
}

fn eval(text: &str, exchange: &mut Exchange) -> Result<Value, EvalError> {
    parse_expression(text, true)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e))
        .evaluate(exchange)
}

// ============================================================================
// Binary Operators
// ============================================================================

#[rstest]
#[case("${header.age} == 21", true)]
#[case("${header.age} == '21'", true)]
#[case("${header.age} != 21", false)]
#[case("${header.age} > 18", true)]
#[case("${header.age} >= 21", true)]
#[case("${header.age} < 21", false)]
#[case("${header.age} <= 21", true)]
#[case("${header.age} == ${header.limit}", false)]
#[case("${header.age} > ${header.limit}", true)]
#[case("${header.delta} == -5", true)]
#[case("${header.delta} < 0", true)]
#[case("${header.name} =~ 'ADA'", true)]
#[case("${header.name} !=~ 'ada'", false)]
#[case("${header.vip} == true", true)]
#[case("${header.vip} != false", true)]
#[case("${header.missing} == null", true)]
#[case("${header.name} == null", false)]
#[case("${header.missing} > 5", false)]
fn test_comparisons(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[rstest]
#[case("${body} contains 'World'", true)]
#[case("${body} contains 'world'", false)]
#[case("${body} !contains 'World'", false)]
#[case("${body} not contains 'Moon'", true)]
#[case("${body} ~~ 'world'", true)]
#[case("${body} !~~ 'WORLD'", false)]
#[case("${header.age} contains 2", true)]
#[case("${header.missing} contains 'x'", false)]
fn test_contains(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[rstest]
#[case(r"${body} regex 'Hello \w+'", true)]
#[case(r"${body} regex 'Hello'", false)]
#[case(r"${body} not regex '\d+'", true)]
#[case(r"${body} !regex '.*World'", false)]
#[case("${header.missing} regex '.*'", false)]
fn test_regex(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[rstest]
#[case("${header.name} in 'Ada,Grace'", true)]
#[case("${header.name} in 'Grace, Linus'", false)]
#[case("${header.name} not in 'Grace,Linus'", true)]
#[case("${header.age} !in '20,21,22'", false)]
#[case("${header.age} range '18..30'", true)]
#[case("${header.age} range '22..30'", false)]
#[case("${header.age} !range '18..20'", true)]
#[case("${header.age} not range '0..100'", false)]
fn test_membership_and_range(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[rstest]
#[case("${header.age} is 'Integer'", true)]
#[case("${header.age} is 'java.lang.Integer'", true)]
#[case("${header.name} is 'String'", true)]
#[case("${header.name} not is 'Integer'", true)]
#[case("${header.vip} !is 'Boolean'", false)]
fn test_type_tests(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[rstest]
#[case("${body} startsWith 'Hello'", true)]
#[case("${body} starts with 'World'", false)]
#[case("${body} endsWith 'World'", true)]
#[case("${body} ends with 'Hello'", false)]
#[case("${body} startsWith '${header.name}'", false)]
fn test_prefix_and_suffix(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

// ============================================================================
// Logical Operators
// ============================================================================

#[rstest]
#[case("${header.age} > 18 && ${header.name} == 'Ada'", true)]
#[case("${header.age} > 30 && ${header.name} == 'Ada'", false)]
#[case("${header.age} > 30 || ${header.name} == 'Ada'", true)]
#[case("${header.age} > 30 || ${header.name} == 'Bob'", false)]
#[case("${header.vip} && ${header.name}", true)]
fn test_logical(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &mut exchange()), expected, "{}", text);
}

#[test]
fn test_logical_operators_fold_left_to_right() {
    // (true || false) && false
    let text = "${header.vip} == true || ${header.age} > 30 && ${header.age} > 40";
    assert!(!matches(text, &mut exchange()));
}

// ============================================================================
// Elvis Operator
// ============================================================================

#[rstest]
#[case(Value::Null, "default")]
#[case(Value::from(""), "default")]
#[case(Value::Boolean(false), "default")]
#[case(Value::Integer(0), "default")]
#[case(Value::from("given"), "given")]
fn test_elvis(#[case] body: Value, #[case] expected: &str) {
    let mut exchange = Exchange::new(body);
    assert_eq!(
        eval("${body} ?: 'default'", &mut exchange).unwrap().to_template_text(),
        expected
    );
}

#[test]
fn test_elvis_with_function_fallback() {
    let mut exchange = exchange();
    assert_eq!(
        eval("${header.nick} ?: ${header.name}", &mut exchange).unwrap(),
        Value::from("Ada")
    );
}

// ============================================================================
// Ternary Operator
// ============================================================================

#[rstest]
#[case(Value::Boolean(true), "gold")]
#[case(Value::from("true"), "gold")]
#[case(Value::Boolean(false), "standard")]
#[case(Value::Null, "standard")]
fn test_ternary(#[case] vip: Value, #[case] expected: &str) {
    let mut exchange = Exchange::default().with_header("vip", vip);
    assert_eq!(
        eval("${header.vip} ? 'gold' : 'standard'", &mut exchange).unwrap(),
        Value::from(expected)
    );
}

#[test]
fn test_nested_ternary() {
    let text = "${header.a} ? 'first' : ${header.b} ? 'second' : 'none'";
    let mut exchange = Exchange::default().with_header("b", true);
    assert_eq!(eval(text, &mut exchange).unwrap(), Value::from("second"));
}

// ============================================================================
// Chain Operator
// ============================================================================

#[test]
fn test_chain_feeds_body() {
    let mut exchange = Exchange::new("  hi  ");
    assert_eq!(
        eval("${body} ~> ${trim()} ~> ${uppercase()}", &mut exchange).unwrap(),
        Value::from("HI")
    );
    assert_eq!(exchange.body, Value::from("  hi  "));
}

#[test]
fn test_chain_followed_by_text() {
    let mut exchange = Exchange::new("hi");
    assert_eq!(
        eval("${body} ~> ${uppercase()} there", &mut exchange).unwrap(),
        Value::from("HI there")
    );
}

// ============================================================================
// Unary Operators
// ============================================================================

#[rstest]
#[case("${header.count}++", Value::Integer(5), Value::Integer(6))]
#[case("${header.count}--", Value::Integer(5), Value::Integer(4))]
#[case("${header.count}++", Value::from("41"), Value::Integer(42))]
#[case("${header.count}++", Value::Float(1.5), Value::Float(2.5))]
#[case("${header.count}++", Value::Null, Value::Null)]
fn test_unary(#[case] text: &str, #[case] count: Value, #[case] expected: Value) {
    let mut exchange = Exchange::default().with_header("count", count);
    assert_eq!(eval(text, &mut exchange).unwrap(), expected);
}

#[test]
fn test_unary_does_not_write_back() {
    let mut exchange = Exchange::default().with_header("count", 5i64);
    eval("${header.count}++", &mut exchange).unwrap();
    assert_eq!(exchange.header("count"), Some(&Value::Integer(5)));
}

#[test]
fn test_unary_needs_a_number() {
    let mut exchange = Exchange::default().with_header("count", "many");
    assert!(matches!(
        eval("${header.count}++", &mut exchange),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_unary_in_template() {
    let mut exchange = Exchange::default().with_header("count", 1i64);
    assert_eq!(
        eval("${header.count}++ items", &mut exchange).unwrap(),
        Value::from("2 items")
    );
}
