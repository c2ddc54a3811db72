//! Domain error types.
//!
//! Only these variants ever reach a caller of the turn engine. Failures of
//! the generation and summarization collaborators are absorbed inside the
//! engine (see [`crate::generation`]).

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The story does not exist or is not owned by the caller.
    #[error("story not found: {0}")]
    NotFound(Uuid),

    /// The rewind token is outside every retained node's address range.
    #[error("invalid rewind token: {0}")]
    InvalidRewindToken(i64),

    /// Malformed or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
