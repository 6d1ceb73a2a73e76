//! Lock manager and transaction executor errors.

use thiserror::Error;

use crate::common::{BlockId, TransactionId};

pub type LockResult<T> = std::result::Result<T, LockError>;

/// Errors the lock manager and transaction executor can surface.
#[derive(Debug, Error, Clone)]
pub enum LockError {
    /// The lock table could not create a resource record for a new
    /// waiter. Unreachable in practice in safe Rust (there is no
    /// allocator-failure path exposed to this crate); kept so `acquire`
    /// stays fallible at the type level rather than panicking if that ever
    /// changes.
    #[error("failed to acquire lock on block {block} for transaction {txn_id}")]
    AcquireFailed {
        block: BlockId,
        txn_id: TransactionId,
    },

    /// `addresses(table)` returned no blocks for a referenced table.
    #[error("unknown resource: table '{0}' has no addressable blocks")]
    UnknownResource(String),
}
