use thiserror::Error;

/// Errors surfaced by tree and arena operations.
///
/// Every operation is deterministic for a given tree state, so re-issuing a
/// failed call with corrected arguments is always safe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("NOT_FOUND")]
    NotFound,
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),
    #[error("UNSUPPORTED_OPERATION: {0}")]
    UnsupportedOperation(String),
    /// Internal inconsistency. Never expected to be observed by callers.
    #[error("INVARIANT_VIOLATION: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;

pub(crate) fn invariant<T>(v: Option<T>, what: &str) -> Result<T> {
    v.ok_or_else(|| TreeError::InvariantViolation(what.to_string()))
}
