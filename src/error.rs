// Aggregate error type for the public API (C9). Each pass has its own
// specific error enum; `StopError` just lets callers handle "anything
// went wrong" without matching on which pass produced it, while still
// supporting `match`/`source()` down into the specific kind.

use crate::resolve::IdentifierError;
use crate::eval::RuntimeError;
use crate::parser::ParseError;
use crate::typecheck::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StopError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("semantic check failed: {0}")]
    Semantic(String),
}
