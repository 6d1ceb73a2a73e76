// Notification sink: lock-release, transaction-finished, and
// all-transactions-finished events, delivered through a plain trait object
// rather than a pub/sub bus.
//
// Delivery is synchronous and advisory, issued while the caller still
// holds the relevant mutex — implementations must not block here.

use crate::common::{BlockId, TransactionId};

pub trait NotificationSink: Send + Sync {
    /// A lock on `block` was released by `txn_id`.
    fn lock_released(&self, _txn_id: TransactionId, _block: BlockId) {}

    /// `txn_id`'s transaction finished with the given outcome.
    fn transaction_finished(&self, _txn_id: TransactionId, _outcome: Outcome) {}

    /// The last outstanding transaction has finished.
    fn all_transactions_finished(&self) {}
}

/// The result of a transaction's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Commit,
    Abort,
}

/// A sink that does nothing, for callers that don't care about
/// notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl NotificationSink for NoopSink {}
