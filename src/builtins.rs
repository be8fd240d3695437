// Reserved `__builtin_*` functions: the implicit-conversion coercions the
// type checker inserts, and the two math dispatchers an `Arithmetic` node
// is rewritten into. None of these names are visible to identifier
// checking as user-definable; `builtins_scope` is always layered
// underneath the caller's scope, never merged into it.

use crate::ast::ArithOp;
use crate::types::{Function, MapScope, TypeTag, Value};
use std::rc::Rc;

pub const BOOL_TO_STRING: &str = "__builtin_BoolToString";
pub const FLOAT_TO_INT: &str = "__builtin_FloatToInt";
pub const FLOAT_TO_STRING: &str = "__builtin_FloatToString";
pub const INT_TO_FLOAT: &str = "__builtin_IntToFloat";
pub const INT_TO_STRING: &str = "__builtin_IntToString";
pub const STRING_TO_INT: &str = "__builtin_StringToInt";
pub const STRING_TO_FLOAT: &str = "__builtin_StringToFloat";
pub const STRING_TO_BOOL: &str = "__builtin_StringToBool";
pub const INT_MATH: &str = "__builtin_IntMath";
pub const FLOAT_MATH: &str = "__builtin_FloatMath";

/// The 4x4 implicit-conversion table from §4.5: `from`-type to `to`-type
/// names the builtin the type checker wraps the value in. `None` means no
/// implicit path exists.
pub fn implicit_conversion(from: TypeTag, to: TypeTag) -> Option<&'static str> {
    use TypeTag::*;
    match (from, to) {
        (Int, Float) => Some(INT_TO_FLOAT),
        (Int, String) => Some(INT_TO_STRING),
        (Float, Int) => Some(FLOAT_TO_INT),
        (Float, String) => Some(FLOAT_TO_STRING),
        (String, Int) => Some(STRING_TO_INT),
        (String, Float) => Some(STRING_TO_FLOAT),
        (String, Bool) => Some(STRING_TO_BOOL),
        (Bool, String) => Some(BOOL_TO_STRING),
        _ => None,
    }
}

/// Encodes an `ArithOp` as the `Int` literal smuggled in as the first
/// argument to `__builtin_IntMath`/`__builtin_FloatMath`.
pub fn arith_op_code(op: ArithOp) -> i64 {
    match op {
        ArithOp::Add => 0,
        ArithOp::Sub => 1,
        ArithOp::Mul => 2,
        ArithOp::Div => 3,
        ArithOp::Mod => 4,
    }
}

fn arith_op_from_code(code: i64) -> Option<ArithOp> {
    match code {
        0 => Some(ArithOp::Add),
        1 => Some(ArithOp::Sub),
        2 => Some(ArithOp::Mul),
        3 => Some(ArithOp::Div),
        4 => Some(ArithOp::Mod),
        _ => None,
    }
}

fn expect_int(v: &Value) -> Result<i64, String> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(format!("expected int, got {}", other.type_tag())),
    }
}

fn expect_float(v: &Value) -> Result<f64, String> {
    match v {
        Value::Float(f) => Ok(*f),
        other => Err(format!("expected float, got {}", other.type_tag())),
    }
}

fn expect_string(v: &Value) -> Result<&str, String> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(format!("expected string, got {}", other.type_tag())),
    }
}

fn expect_bool(v: &Value) -> Result<bool, String> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(format!("expected bool, got {}", other.type_tag())),
    }
}

/// `strconv.ParseInt(s, 0, 0)`-equivalent: infers base from a `0x`/`0o`/`0b`
/// prefix, defaults to decimal otherwise.
fn parse_int_any_base(s: &str) -> Result<i64, String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (radix, digits) = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(oct) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8, oct)
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, rest)
    };

    let magnitude =
        i64::from_str_radix(digits, radix).map_err(|e| format!("invalid integer {:?}: {}", s, e))?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_bool_loose(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        other => Err(format!("invalid boolean {:?}", other)),
    }
}

fn math_fn(name: &str, variadic_type: TypeTag, return_type: TypeTag) -> Function {
    let callback: Rc<dyn Fn(&[Value]) -> Result<Value, String>> = if variadic_type == TypeTag::Int {
        Rc::new(|args: &[Value]| -> Result<Value, String> {
            let op = arith_op_from_code(expect_int(&args[0])?)
                .ok_or_else(|| "unrecognized arithmetic op code".to_string())?;
            let mut result = expect_int(&args[1])?;
            for raw in &args[2..] {
                let arg = expect_int(raw)?;
                result = match op {
                    ArithOp::Add => result + arg,
                    ArithOp::Sub => result - arg,
                    ArithOp::Mul => result * arg,
                    ArithOp::Div => {
                        if arg == 0 {
                            return Err("divide by zero".to_string());
                        }
                        result / arg
                    }
                    ArithOp::Mod => {
                        if arg == 0 {
                            return Err("divide by zero".to_string());
                        }
                        result % arg
                    }
                };
            }
            Ok(Value::Int(result))
        })
    } else {
        Rc::new(|args: &[Value]| -> Result<Value, String> {
            let op = arith_op_from_code(expect_int(&args[0])?)
                .ok_or_else(|| "unrecognized arithmetic op code".to_string())?;
            let mut result = expect_float(&args[1])?;
            for raw in &args[2..] {
                let arg = expect_float(raw)?;
                result = match op {
                    ArithOp::Add => result + arg,
                    ArithOp::Sub => result - arg,
                    ArithOp::Mul => result * arg,
                    ArithOp::Div => result / arg,
                    ArithOp::Mod => result % arg,
                };
            }
            Ok(Value::Float(result))
        })
    };

    Function {
        name: name.to_string(),
        arg_types: vec![TypeTag::Int],
        variadic: true,
        variadic_type: Some(variadic_type),
        return_type,
        callback,
    }
}

fn coercion(name: &str, arg_type: TypeTag, return_type: TypeTag, f: impl Fn(&Value) -> Result<Value, String> + 'static) -> Function {
    Function {
        name: name.to_string(),
        arg_types: vec![arg_type],
        variadic: false,
        variadic_type: None,
        return_type,
        callback: Rc::new(move |args: &[Value]| f(&args[0])),
    }
}

/// All ten `__builtin_*` functions, keyed by name, ready to layer
/// underneath a caller's scope.
pub fn all() -> Vec<Function> {
    vec![
        coercion(BOOL_TO_STRING, TypeTag::Bool, TypeTag::String, |v| {
            Ok(Value::string(expect_bool(v)?.to_string()))
        }),
        coercion(FLOAT_TO_INT, TypeTag::Float, TypeTag::Int, |v| {
            Ok(Value::Int(expect_float(v)? as i64))
        }),
        coercion(FLOAT_TO_STRING, TypeTag::Float, TypeTag::String, |v| {
            Ok(Value::string(format_float(expect_float(v)?)))
        }),
        coercion(INT_TO_FLOAT, TypeTag::Int, TypeTag::Float, |v| {
            Ok(Value::Float(expect_int(v)? as f64))
        }),
        coercion(INT_TO_STRING, TypeTag::Int, TypeTag::String, |v| {
            Ok(Value::string(expect_int(v)?.to_string()))
        }),
        coercion(STRING_TO_INT, TypeTag::String, TypeTag::Int, |v| {
            Ok(Value::Int(parse_int_any_base(expect_string(v)?)?))
        }),
        coercion(STRING_TO_FLOAT, TypeTag::String, TypeTag::Float, |v| {
            expect_string(v)?
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid float {:?}: {}", expect_string(v).unwrap_or(""), e))
        }),
        coercion(STRING_TO_BOOL, TypeTag::String, TypeTag::Bool, |v| {
            Ok(Value::Bool(parse_bool_loose(expect_string(v)?)?))
        }),
        math_fn(INT_MATH, TypeTag::Int, TypeTag::Int),
        math_fn(FLOAT_MATH, TypeTag::Float, TypeTag::Float),
    ]
}

/// A scope holding only the ten `__builtin_*` functions, meant to sit as
/// the parent in a `ChainScope` underneath whatever scope the caller
/// supplied.
pub fn builtins_scope() -> MapScope {
    let mut scope = MapScope::new();
    for f in all() {
        scope.funcs.insert(f.name.clone(), f);
    }
    scope
}

/// Shortest round-trippable decimal rendering of `f`, matching
/// `strconv.FormatFloat(f, 'g', -1, 64)`: `63.0` renders as `"63"`.
fn format_float(f: f64) -> String {
    format!("{}", f)
}
