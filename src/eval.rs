// Tree-walking evaluator (C8). An ordinary post-order recursion over the
// already-rewritten tree: no explicit value stack, no visitor object —
// each node's `eval_expr` call returns its own `(Value, TypeTag)` or
// bubbles up a `RuntimeError`. By this point `Arithmetic` no longer
// appears in the tree; the type checker has already turned every one into
// a `Call` to `__builtin_IntMath`/`__builtin_FloatMath`.

use crate::ast::Expr;
use crate::pos::Pos;
use crate::types::{Scope, TypeTag, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("{func_name}: {message}")]
    Callback { func_name: String, message: String, pos: Pos },
    #[error("index {index} out of range for list {name} (max {max})")]
    ListIndexOutOfRange { name: String, index: i64, max: i64, pos: Pos },
    #[error("key {key:?} does not exist in map {name}")]
    MapKeyMiss { name: String, key: String, pos: Pos },
    #[error("internal error: {message} at {pos}")]
    Internal { message: String, pos: Pos },
}

/// Evaluates a (type-checked, rewritten) tree against `scope`, returning
/// the single typed result at its root.
pub fn eval_expr(expr: &Expr, scope: &dyn Scope) -> Result<(Value, TypeTag), RuntimeError> {
    match expr {
        Expr::Literal { value, ty, .. } => Ok((value.clone(), *ty)),

        Expr::VariableAccess { name, pos } => {
            let var = scope.lookup_var(name).ok_or_else(|| RuntimeError::Internal {
                message: format!("variable {:?} missing at eval time", name),
                pos: *pos,
            })?;
            Ok((var.value, var.ty))
        }

        Expr::Call { func_name, args, pos } => eval_call(func_name, args, *pos, scope),

        Expr::Index { target, key, pos } => eval_index(target, key, *pos, scope),

        Expr::Arithmetic { pos, .. } => Err(RuntimeError::Internal {
            message: "Arithmetic node present at eval time; type check should have rewritten it to a Call".to_string(),
            pos: *pos,
        }),

        Expr::Output { exprs, pos } => eval_output(exprs, *pos, scope),
    }
}

fn eval_call(func_name: &str, args: &[Expr], pos: Pos, scope: &dyn Scope) -> Result<(Value, TypeTag), RuntimeError> {
    let func = scope.lookup_func(func_name).ok_or_else(|| RuntimeError::Internal {
        message: format!("function {:?} missing at eval time", func_name),
        pos,
    })?;

    let mut arg_values = Vec::with_capacity(args.len());
    for arg in args {
        let (value, _) = eval_expr(arg, scope)?;
        arg_values.push(value);
    }

    let result = (func.callback)(&arg_values).map_err(|message| RuntimeError::Callback {
        func_name: func_name.to_string(),
        message,
        pos,
    })?;
    let ty = result.type_tag();
    Ok((result, ty))
}

fn eval_index(target: &Expr, key: &Expr, pos: Pos, scope: &dyn Scope) -> Result<(Value, TypeTag), RuntimeError> {
    // The grammar only admits `IDENT '[' expr ']'`, and type checking
    // leaves `target` untouched, so it's always a `VariableAccess`; we
    // re-resolve it here (rather than reusing a generic walk) purely to
    // recover the variable's name for the error messages below.
    let target_name = match target {
        Expr::VariableAccess { name, .. } => name.clone(),
        other => {
            return Err(RuntimeError::Internal {
                message: format!("index target is not a variable access: {:?}", other),
                pos,
            })
        }
    };
    let var = scope.lookup_var(&target_name).ok_or_else(|| RuntimeError::Internal {
        message: format!("variable {:?} missing at eval time", target_name),
        pos,
    })?;
    let (key_value, _) = eval_expr(key, scope)?;

    match (&var.value, &key_value) {
        (Value::List(items), Value::Int(i)) => {
            if *i < 0 || *i as usize >= items.len() {
                return Err(RuntimeError::ListIndexOutOfRange {
                    name: target_name,
                    index: *i,
                    max: items.len() as i64 - 1,
                    pos,
                });
            }
            let item = &items[*i as usize];
            Ok((item.value.clone(), item.ty))
        }
        (Value::Map(entries), Value::String(key)) => entries
            .get(key.as_ref())
            .map(|v| (v.value.clone(), v.ty))
            .ok_or_else(|| RuntimeError::MapKeyMiss {
                name: target_name.clone(),
                key: key.to_string(),
                pos,
            }),
        _ => Err(RuntimeError::Internal {
            message: format!("index target {:?} is not indexable by {:?}", var.ty, key_value),
            pos,
        }),
    }
}

fn eval_output(exprs: &[Expr], pos: Pos, scope: &dyn Scope) -> Result<(Value, TypeTag), RuntimeError> {
    if exprs.is_empty() {
        return Ok((Value::string(""), TypeTag::String)); // O1
    }

    let mut results = Vec::with_capacity(exprs.len());
    for e in exprs {
        results.push(eval_expr(e, scope)?);
    }

    if results.len() == 1 && matches!(results[0].1, TypeTag::List | TypeTag::Map) {
        let (value, ty) = results.into_iter().next().unwrap();
        return Ok((value, ty));
    }

    let mut out = String::new();
    for (value, _) in results {
        match value {
            Value::String(s) => out.push_str(&s),
            other => {
                return Err(RuntimeError::Internal {
                    message: format!("non-string value {:?} reached Output concatenation; type check should have coerced it", other),
                    pos,
                })
            }
        }
    }
    Ok((Value::string(out), TypeTag::String))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::parser::parse;
    use crate::typecheck::typecheck;
    use crate::types::{ChainScope, MapScope, Variable};
    use std::collections::HashMap;
    use std::rc::Rc;

    fn run(text: &str, user_scope: &MapScope) -> Result<(Value, TypeTag), RuntimeError> {
        let builtin_scope = builtins::builtins_scope();
        let scope = ChainScope { child: user_scope, parent: &builtin_scope };
        let ast = parse(text).unwrap();
        let checked = typecheck(ast, &scope).unwrap();
        eval_expr(&checked, &scope)
    }

    #[test]
    fn s1_plain_variable_interpolation() {
        let mut scope = MapScope::new();
        scope.define_var("bar", Variable::new(Value::string("baz")));
        let (value, ty) = run("foo #{bar}", &scope).unwrap();
        assert_eq!(ty, TypeTag::String);
        assert_eq!(value, Value::string("foo baz"));
    }

    #[test]
    fn s2_integer_arithmetic() {
        let (value, _) = run("foo #{42 + 1}", &MapScope::new()).unwrap();
        assert_eq!(value, Value::string("foo 43"));
    }

    #[test]
    fn s3_divide_by_zero_is_a_runtime_error() {
        let err = run("foo #{42/0}", &MapScope::new()).unwrap_err();
        assert!(err.to_string().contains("divide by zero"));
    }

    #[test]
    fn s4_list_indexing() {
        let mut scope = MapScope::new();
        scope.define_var(
            "foo",
            Variable::new(Value::List(Rc::new(vec![
                Variable::new(Value::Int(10)),
                Variable::new(Value::Int(20)),
            ]))),
        );
        let (value, _) = run("#{foo[1]} #{foo[0]}", &scope).unwrap();
        assert_eq!(value, Value::string("20 10"));
    }

    #[test]
    fn s5_map_indexing() {
        let mut map = HashMap::new();
        map.insert("bar".to_string(), Variable::new(Value::string("world")));
        let mut scope = MapScope::new();
        scope.define_var("foo", Variable::new(Value::Map(Rc::new(map))));
        let (value, _) = run(r#"#{foo["bar"]}"#, &scope).unwrap();
        assert_eq!(value, Value::string("world"));
    }

    #[test]
    fn s6_single_list_output_preserves_list_type() {
        let mut scope = MapScope::new();
        scope.define_var(
            "var.foo",
            Variable::new(Value::List(Rc::new(vec![
                Variable::new(Value::string("Hello")),
                Variable::new(Value::string("World")),
            ]))),
        );
        let (value, ty) = run("#{var.foo}", &scope).unwrap();
        assert_eq!(ty, TypeTag::List);
        match value {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn s7_string_to_int_coercion_in_arithmetic() {
        let mut scope = MapScope::new();
        scope.define_var("bar", Variable::new(Value::string("41")));
        let (value, _) = run("foo #{bar+1}", &scope).unwrap();
        assert_eq!(value, Value::string("foo 42"));
    }

    #[test]
    fn s8_float_arithmetic_with_string_operand() {
        let mut scope = MapScope::new();
        scope.define_var("var.foo", Variable::new(Value::string("42")));
        let (value, _) = run("#{1.5 * var.foo}", &scope).unwrap();
        assert_eq!(value, Value::string("63"));
    }

    #[test]
    fn list_index_out_of_range_is_a_runtime_error() {
        let mut scope = MapScope::new();
        scope.define_var("foo", Variable::new(Value::List(Rc::new(vec![Variable::new(Value::Int(1))]))));
        let err = run("#{foo[5]}", &scope).unwrap_err();
        assert!(matches!(err, RuntimeError::ListIndexOutOfRange { index: 5, max: 0, .. }));
    }

    #[test]
    fn map_key_miss_is_a_runtime_error() {
        let mut map = HashMap::new();
        map.insert("bar".to_string(), Variable::new(Value::string("world")));
        let mut scope = MapScope::new();
        scope.define_var("foo", Variable::new(Value::Map(Rc::new(map))));
        let err = run(r#"#{foo["nope"]}"#, &scope).unwrap_err();
        assert!(matches!(err, RuntimeError::MapKeyMiss { .. }));
    }

    #[test]
    fn empty_input_yields_empty_string() {
        let (value, ty) = run("", &MapScope::new()).unwrap();
        assert_eq!(ty, TypeTag::String);
        assert_eq!(value, Value::string(""));
    }

    #[test]
    fn plain_text_passes_through_with_escapes_resolved() {
        let (value, _) = run(r"a\#b\\c\nd", &MapScope::new()).unwrap();
        assert_eq!(value, Value::string("a#b\\c\nd"));
    }
}
