// End-to-end scenarios against the public API, one per documented
// scope/input/output combination. Each of these also has narrower
// coverage inside the relevant module's #[cfg(test)] block; these tests
// exercise the full parse -> eval pipeline through `stencil::{parse, eval}`
// instead of calling the pass functions directly.

use std::collections::HashMap;
use std::rc::Rc;
use stencil::types::{MapScope, Value, Variable};
use stencil::{eval, parse, EvalConfig, HostValue, ResultType};

fn run(text: &str, scope: &MapScope) -> Result<(ResultType, HostValue), String> {
    let ast = parse(text).map_err(|e| e.to_string())?;
    let config = EvalConfig { scope, extra_semantic_checks: vec![] };
    let result = eval(ast, &config).map_err(|e| e.to_string())?;
    Ok((result.ty, result.value))
}

#[test]
fn s1_variable_interpolation_in_text() {
    let mut scope = MapScope::new();
    scope.define_var("bar", Variable::new(Value::string("baz")));
    let (ty, value) = run("foo #{bar}", &scope).unwrap();
    assert_eq!(ty, ResultType::String);
    assert_eq!(value, HostValue::String("foo baz".to_string()));
}

#[test]
fn s2_integer_arithmetic_embedded_in_text() {
    let (_, value) = run("foo #{42 + 1}", &MapScope::new()).unwrap();
    assert_eq!(value, HostValue::String("foo 43".to_string()));
}

#[test]
fn s3_division_by_zero_is_reported() {
    let err = run("foo #{42/0}", &MapScope::new()).unwrap_err();
    assert!(err.contains("divide by zero"));
}

#[test]
fn s4_list_indexing_both_ends() {
    let mut scope = MapScope::new();
    scope.define_var(
        "foo",
        Variable::new(Value::List(Rc::new(vec![Variable::new(Value::Int(10)), Variable::new(Value::Int(20))]))),
    );
    let (_, value) = run("#{foo[1]} #{foo[0]}", &scope).unwrap();
    assert_eq!(value, HostValue::String("20 10".to_string()));
}

#[test]
fn s5_map_indexing() {
    let mut map = HashMap::new();
    map.insert("bar".to_string(), Variable::new(Value::string("world")));
    let mut scope = MapScope::new();
    scope.define_var("foo", Variable::new(Value::Map(Rc::new(map))));
    let (_, value) = run(r#"#{foo["bar"]}"#, &scope).unwrap();
    assert_eq!(value, HostValue::String("world".to_string()));
}

#[test]
fn s6_single_list_expression_yields_a_list_result() {
    let mut scope = MapScope::new();
    scope.define_var(
        "var.foo",
        Variable::new(Value::List(Rc::new(vec![
            Variable::new(Value::string("Hello")),
            Variable::new(Value::string("World")),
        ]))),
    );
    let (ty, value) = run("#{var.foo}", &scope).unwrap();
    assert_eq!(ty, ResultType::List);
    assert_eq!(
        value,
        HostValue::List(vec![HostValue::String("Hello".to_string()), HostValue::String("World".to_string())])
    );
}

#[test]
fn s7_string_operand_coerces_to_int_for_arithmetic() {
    let mut scope = MapScope::new();
    scope.define_var("bar", Variable::new(Value::string("41")));
    let (_, value) = run("foo #{bar+1}", &scope).unwrap();
    assert_eq!(value, HostValue::String("foo 42".to_string()));
}

#[test]
fn s8_float_arithmetic_with_a_coerced_string_operand() {
    let mut scope = MapScope::new();
    scope.define_var("var.foo", Variable::new(Value::string("42")));
    let (_, value) = run("#{1.5 * var.foo}", &scope).unwrap();
    assert_eq!(value, HostValue::String("63".to_string()));
}

#[test]
fn unknown_variable_is_an_identifier_error_before_anything_evaluates() {
    let err = run("#{nope}", &MapScope::new()).unwrap_err();
    assert!(err.contains("nope"));
}

#[test]
fn extra_semantic_check_can_reject_an_otherwise_valid_tree() {
    let ast = parse("#{1 + 1}").unwrap();
    let scope = MapScope::new();
    let config = EvalConfig {
        scope: &scope,
        extra_semantic_checks: vec![Box::new(|_: &stencil::Expr| Err("no arithmetic allowed here".to_string()))],
    };
    let err = eval(ast, &config).unwrap_err();
    assert!(err.to_string().contains("no arithmetic allowed here"));
}
