// stencil: embeddable `#{ }` interpolation language.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! Parses host text containing `#{ ... }` interpolations, checks the
//! embedded expressions against a caller-supplied [`Scope`], and
//! evaluates them to a single typed [`HostValue`].
//!
//! ```
//! use stencil::{eval, parse, EvalConfig};
//! use stencil::types::{MapScope, Value, Variable};
//!
//! let mut scope = MapScope::new();
//! scope.define_var("bar", Variable::new(Value::string("baz")));
//!
//! let ast = parse("foo #{bar}").unwrap();
//! let config = EvalConfig { scope: &scope, extra_semantic_checks: vec![] };
//! let result = eval(ast, &config).unwrap();
//! assert_eq!(result.value.as_str(), Some("foo baz"));
//! ```

pub mod ast;
pub mod builtins;
pub mod convert;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod pos;
pub mod resolve;
pub mod typecheck;
pub mod types;

pub use ast::Expr;
pub use convert::{HostValue, ResultType};
pub use error::StopError;
pub use types::Scope;

use types::ChainScope;

/// A single tree visitor run after identifier and type checking, used to
/// enforce whatever extra constraints the caller wants (e.g. "no function
/// calls" for untrusted templates). Returning `Err` aborts the
/// evaluation with that message.
pub type SemanticCheck = Box<dyn Fn(&Expr) -> Result<(), String>>;

/// Caller-supplied inputs to one [`eval`] call.
pub struct EvalConfig<'a> {
    pub scope: &'a dyn Scope,
    pub extra_semantic_checks: Vec<SemanticCheck>,
}

/// The typed result of one evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    pub ty: ResultType,
    pub value: HostValue,
}

/// Lexes and parses `text`, returning the AST rooted at an `Output` node.
/// Does not resolve identifiers or check types — that happens in [`eval`].
pub fn parse(text: &str) -> Result<Expr, StopError> {
    tracing::debug!(chars = text.chars().count(), "parsing");
    Ok(parser::parse(text)?)
}

/// Runs identifier resolution, type checking (with implicit-conversion
/// rewriting), any `extra_semantic_checks`, and evaluation, in that
/// order. The builtins are layered underneath `config.scope` for the
/// duration of this call only; `config.scope` itself is never mutated.
pub fn eval(ast: Expr, config: &EvalConfig) -> Result<EvaluationResult, StopError> {
    let builtin_scope = builtins::builtins_scope();
    let scope = ChainScope { child: config.scope, parent: &builtin_scope };

    tracing::debug!("checking identifiers");
    resolve::check_identifiers(&ast, &scope)?;

    tracing::debug!("type checking");
    let checked = typecheck::typecheck(ast, &scope)?;

    for check in &config.extra_semantic_checks {
        check(&checked).map_err(StopError::Semantic)?;
    }

    tracing::debug!("evaluating");
    let (value, ty) = eval::eval_expr(&checked, &scope)?;

    Ok(EvaluationResult { ty, value: convert::value_to_host(&value) })
}
