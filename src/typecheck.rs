// Bottom-up type inference and tree rewriting (C7). Every node computes
// its type from its already-checked children; `Arithmetic` nodes are
// replaced with `Call`s to the math builtins, and any argument/operand/key
// whose type doesn't exactly match what's required is wrapped in a `Call`
// to an implicit-conversion builtin if one exists in `builtins::implicit_conversion`.
//
// Must run after `resolve::check_identifiers` — this pass assumes every
// name in the tree already resolves, and will produce a confusing error
// (or none at all) if that invariant doesn't hold.

use crate::ast::{ArithOp, Expr};
use crate::builtins;
use crate::pos::Pos;
use crate::types::{Scope, TypeTag, Value, Variable};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    #[error("cannot convert {from} to {to} at {pos}")]
    Incompatible { from: TypeTag, to: TypeTag, pos: Pos },
    #[error("list or map elements are not homogeneous at {pos}")]
    NonHomogeneous { pos: Pos },
    #[error("cannot infer element type of an empty collection at {pos}")]
    EmptyCollection { pos: Pos },
    #[error("a list or map value cannot appear in a multi-expression output at {pos}")]
    CollectionInMultiOutput { pos: Pos },
    #[error("cannot index into {ty} at {pos}")]
    NotIndexable { ty: TypeTag, pos: Pos },
    #[error("internal error: {msg} at {pos}")]
    Internal { msg: String, pos: Pos },
}

/// Runs the type-check pass, returning the rewritten tree on success. The
/// root's inferred type is always discoverable again by inspecting the
/// returned `Output` (empty -> String, single List/Map child -> that type,
/// else String).
pub fn typecheck(expr: Expr, scope: &dyn Scope) -> Result<Expr, TypeError> {
    Ok(typecheck_node(expr, scope)?.0)
}

fn typecheck_node(expr: Expr, scope: &dyn Scope) -> Result<(Expr, TypeTag), TypeError> {
    match expr {
        Expr::Literal { value, ty, pos } => Ok((Expr::Literal { value, ty, pos }, ty)),

        Expr::VariableAccess { name, pos } => {
            let var = scope.lookup_var(&name).ok_or_else(|| TypeError::Internal {
                msg: format!("variable {:?} missing at type-check time (identifier check should have caught this)", name),
                pos,
            })?;
            Ok((Expr::VariableAccess { name, pos }, var.ty))
        }

        Expr::Call { func_name, args, pos } => typecheck_call(func_name, args, pos, scope),

        Expr::Index { target, key, pos } => typecheck_index(*target, *key, pos, scope),

        Expr::Arithmetic { op, operands, pos } => typecheck_arithmetic(op, operands, pos, scope),

        Expr::Output { exprs, pos } => typecheck_output(exprs, pos, scope),
    }
}

/// Coerces `(expr, from)` to `to`, wrapping `expr` in a `Call` to the
/// implicit-conversion builtin when `from != to`. Fails if no such
/// conversion is registered.
fn coerce(expr: Expr, from: TypeTag, to: TypeTag, pos: Pos) -> Result<Expr, TypeError> {
    if from == to {
        return Ok(expr);
    }
    let builtin = builtins::implicit_conversion(from, to)
        .ok_or(TypeError::Incompatible { from, to, pos })?;
    Ok(Expr::Call { func_name: builtin.to_string(), args: vec![expr], pos })
}

fn typecheck_call(func_name: String, args: Vec<Expr>, pos: Pos, scope: &dyn Scope) -> Result<(Expr, TypeTag), TypeError> {
    let func = scope.lookup_func(&func_name).ok_or_else(|| TypeError::Internal {
        msg: format!("function {:?} missing at type-check time", func_name),
        pos,
    })?;

    let mut checked = Vec::with_capacity(args.len());
    for (i, arg) in args.into_iter().enumerate() {
        let (arg_expr, arg_ty) = typecheck_node(arg, scope)?;
        let param_ty = if i < func.arg_types.len() {
            func.arg_types[i]
        } else {
            func.variadic_type.unwrap_or(TypeTag::Any)
        };
        let arg_pos = arg_expr.pos();
        let coerced = if param_ty == TypeTag::Any {
            arg_expr
        } else {
            coerce(arg_expr, arg_ty, param_ty, arg_pos)?
        };
        checked.push(coerced);
    }

    Ok((Expr::Call { func_name, args: checked, pos }, func.return_type))
}

/// L1/M1: the shared element/value type of a homogeneous, non-empty
/// list or map, read directly off the scope's current `Value`.
fn homogeneous_element_type(var: &Variable, pos: Pos) -> Result<TypeTag, TypeError> {
    match &var.value {
        Value::List(items) => {
            let mut tys = items.iter().map(|v| v.ty);
            let first = tys.next().ok_or(TypeError::EmptyCollection { pos })?;
            if tys.all(|t| t == first) {
                Ok(first)
            } else {
                Err(TypeError::NonHomogeneous { pos })
            }
        }
        Value::Map(entries) => {
            let mut tys = entries.values().map(|v| v.ty);
            let first = tys.next().ok_or(TypeError::EmptyCollection { pos })?;
            if tys.all(|t| t == first) {
                Ok(first)
            } else {
                Err(TypeError::NonHomogeneous { pos })
            }
        }
        _ => Err(TypeError::NotIndexable { ty: var.ty, pos }),
    }
}

fn typecheck_index(target: Expr, key: Expr, pos: Pos, scope: &dyn Scope) -> Result<(Expr, TypeTag), TypeError> {
    // The grammar only lets `IDENT '[' expr ']'` through, so `target` is
    // always a bare `VariableAccess`.
    let target_name = match &target {
        Expr::VariableAccess { name, .. } => name.clone(),
        other => {
            return Err(TypeError::Internal {
                msg: format!("index target is not a variable access: {:?}", other),
                pos,
            })
        }
    };
    let var = scope.lookup_var(&target_name).ok_or_else(|| TypeError::Internal {
        msg: format!("variable {:?} missing at type-check time", target_name),
        pos,
    })?;

    let element_ty = homogeneous_element_type(&var, pos)?;
    let key_required_ty = match var.ty {
        TypeTag::List => TypeTag::Int,
        TypeTag::Map => TypeTag::String,
        other => return Err(TypeError::NotIndexable { ty: other, pos }),
    };

    let (key_expr, key_ty) = typecheck_node(key, scope)?;
    let key_pos = key_expr.pos();
    let key_expr = coerce(key_expr, key_ty, key_required_ty, key_pos)?;

    let (target_expr, _) = typecheck_node(target, scope)?;
    Ok((Expr::Index { target: Box::new(target_expr), key: Box::new(key_expr), pos }, element_ty))
}

fn typecheck_arithmetic(op: ArithOp, operands: Vec<Expr>, pos: Pos, scope: &dyn Scope) -> Result<(Expr, TypeTag), TypeError> {
    let mut checked: Vec<(Expr, TypeTag)> = Vec::with_capacity(operands.len());
    for operand in operands {
        checked.push(typecheck_node(operand, scope)?);
    }

    let target_ty = if checked.iter().any(|(_, ty)| *ty == TypeTag::Float) {
        TypeTag::Float
    } else {
        TypeTag::Int
    };

    let mut call_args = vec![Expr::literal(Value::Int(builtins::arith_op_code(op)), pos)];
    for (operand_expr, operand_ty) in checked {
        let operand_pos = operand_expr.pos();
        call_args.push(coerce(operand_expr, operand_ty, target_ty, operand_pos)?);
    }

    let func_name = if target_ty == TypeTag::Float {
        builtins::FLOAT_MATH
    } else {
        builtins::INT_MATH
    };

    Ok((Expr::Call { func_name: func_name.to_string(), args: call_args, pos }, target_ty))
}

fn typecheck_output(exprs: Vec<Expr>, pos: Pos, scope: &dyn Scope) -> Result<(Expr, TypeTag), TypeError> {
    if exprs.is_empty() {
        // O1
        return Ok((Expr::Output { exprs: vec![], pos }, TypeTag::String));
    }

    let mut checked: Vec<(Expr, TypeTag)> = Vec::with_capacity(exprs.len());
    for e in exprs {
        checked.push(typecheck_node(e, scope)?);
    }

    if checked.len() == 1 && matches!(checked[0].1, TypeTag::List | TypeTag::Map) {
        // O2: a lone List/Map sub-expression passes its type through.
        let (only_expr, only_ty) = checked.into_iter().next().unwrap();
        return Ok((Expr::Output { exprs: vec![only_expr], pos }, only_ty));
    }

    let mut rewritten = Vec::with_capacity(checked.len());
    for (child_expr, child_ty) in checked {
        if matches!(child_ty, TypeTag::List | TypeTag::Map) {
            return Err(TypeError::CollectionInMultiOutput { pos: child_expr.pos() });
        }
        let child_pos = child_expr.pos();
        rewritten.push(coerce(child_expr, child_ty, TypeTag::String, child_pos)?);
    }

    Ok((Expr::Output { exprs: rewritten, pos }, TypeTag::String))
}
