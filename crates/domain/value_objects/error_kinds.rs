use serde::Serialize;
use std::fmt::Display;

/// Failure taxonomy shared by every booking and access operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input; rejected before any mutation.
    Validation,
    /// Capacity, duplicate booking or wrong lifecycle state. Expected under concurrency.
    Conflict,
    Forbidden,
    /// The store could not complete the operation.
    StorageFailure,
    /// Secondary effect failed; logged and never surfaced.
    BestEffortFailure,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
            ErrorKind::BestEffortFailure => "BEST_EFFORT_FAILURE",
        };
        write!(f, "{}", kind)
    }
}
