// Flattens the internal `Variable`/`Value` tree (reference-counted,
// homogeneity-checked) into `HostValue`, the plain, owned tree callers get
// back from `eval`. Mirrors the role of `InterfaceToVariable`/
// `VariableToInterface` in the reference implementation: one direction
// per module boundary, never mixed into the evaluator itself.

use crate::types::{TypeTag, Value, Variable};
use std::collections::HashMap;

/// An evaluation result's value, with collections fully owned (no `Rc`)
/// so it can outlive the scope it was produced from.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<HostValue>),
    Map(HashMap<String, HostValue>),
}

impl HostValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }
}

pub fn variable_to_host(var: &Variable) -> HostValue {
    value_to_host(&var.value)
}

pub fn value_to_host(value: &Value) -> HostValue {
    match value {
        Value::String(s) => HostValue::String(s.to_string()),
        Value::Int(i) => HostValue::Int(*i),
        Value::Float(f) => HostValue::Float(*f),
        Value::Bool(b) => HostValue::Bool(*b),
        Value::List(items) => HostValue::List(items.iter().map(variable_to_host).collect()),
        Value::Map(entries) => {
            HostValue::Map(entries.iter().map(|(k, v)| (k.clone(), variable_to_host(v))).collect())
        }
    }
}

/// The closed set of types an evaluation can successfully return.
/// Reuses `TypeTag` rather than duplicating the enum; `Any` never appears
/// here because it only exists as a function-parameter wildcard.
pub type ResultType = TypeTag;
