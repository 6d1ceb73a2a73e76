use thiserror::Error;

use crate::algebra::rewriter::RewriteError;
use crate::transaction::error::LockError;

/// Crate-wide error type. Subsystem errors (`LockError`, `RewriteError`)
/// convert into this via `#[from]`, so callers that don't care which
/// subsystem failed can propagate a single error type with `?`.
#[derive(Error, Debug, Clone)]
pub enum DbError {
    #[error("lock manager error: {0}")]
    Lock(#[from] LockError),

    #[error("projection rewriter error: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("transaction aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
