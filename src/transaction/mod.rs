// Transaction execution: locking and the bounded executor.
//
// | Module | Responsibility |
// |--------|----------------|
// | [`types`] | Lock modes, waiters, commands, transaction tasks |
// | [`error`] | Lock and executor error types |
// | [`lock_table`] | Bucketed resource lock records |
// | [`lock_manager`] | Blocking acquire/release protocol |
// | [`notify`] | Observer callbacks for lock/transaction events |
// | [`executor`] | Bounded-concurrency transaction executor |

pub mod error;
pub mod executor;
pub mod lock_manager;
pub mod lock_table;
pub mod notify;
pub mod types;

pub use error::{LockError, LockResult};
pub use executor::{ExecutorConfig, TransactionExecutor};
pub use lock_manager::LockManager;
pub use lock_table::{LockTable, ResourceLockRecord};
pub use notify::{NoopSink, NotificationSink, Outcome};
pub use types::{Command, CommandKind, LockMode, TransactionTask, Waiter};
