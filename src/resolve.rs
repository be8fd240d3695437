// Identifier resolution: checks that every `VariableAccess` and `Call`
// refers to something the scope actually has, before the type checker
// does anything with the types involved. Runs once, doesn't rewrite the
// tree, and never inspects builtins (those are only ever introduced by
// the type checker, after this pass has already run).

use crate::ast::Expr;
use crate::pos::Pos;
use crate::types::Scope;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IdentifierError {
    #[error("unknown variable {name:?} at {pos}")]
    UnknownVariable { name: String, pos: Pos },
    #[error("unknown function {name:?} at {pos}")]
    UnknownFunction { name: String, pos: Pos },
    #[error("wrong number of arguments to {name:?} at {pos}: got {got}")]
    Arity { name: String, got: usize, pos: Pos },
}

pub fn check_identifiers(expr: &Expr, scope: &dyn Scope) -> Result<(), IdentifierError> {
    match expr {
        Expr::Literal { .. } => Ok(()),
        Expr::VariableAccess { name, pos } => {
            if scope.lookup_var(name).is_some() {
                Ok(())
            } else {
                Err(IdentifierError::UnknownVariable { name: name.clone(), pos: *pos })
            }
        }
        Expr::Call { func_name, args, pos } => {
            let func = scope
                .lookup_func(func_name)
                .ok_or_else(|| IdentifierError::UnknownFunction { name: func_name.clone(), pos: *pos })?;
            if !func.accepts_arity(args.len()) {
                return Err(IdentifierError::Arity {
                    name: func_name.clone(),
                    got: args.len(),
                    pos: *pos,
                });
            }
            for arg in args {
                check_identifiers(arg, scope)?;
            }
            Ok(())
        }
        Expr::Index { target, key, .. } => {
            check_identifiers(target, scope)?;
            check_identifiers(key, scope)
        }
        Expr::Arithmetic { operands, .. } => {
            for operand in operands {
                check_identifiers(operand, scope)?;
            }
            Ok(())
        }
        Expr::Output { exprs, .. } => {
            for e in exprs {
                check_identifiers(e, scope)?;
            }
            Ok(())
        }
    }
}
