use thiserror::Error;

/// Errors a single command can fail with.
///
/// Every error is local to the command that raised it; there is no retry and
/// no cross-command rollback beyond the command's own transaction.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: empty title, negative estimate, sprint end not after
    /// start, unknown status label.
    #[error("{0}")]
    Validation(String),

    /// A referenced task id does not exist. Delete is exempt and succeeds
    /// idempotently.
    #[error("task {0} not found")]
    NotFound(i64),

    /// Starting a sprint while one is open, or closing while already closed.
    #[error("{0}")]
    Conflict(String),

    /// A stored value that cannot be interpreted: an unknown status label or
    /// a malformed date. Surfaced instead of coerced to a default.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
