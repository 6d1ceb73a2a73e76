// Bounded-concurrency transaction executor.
//
// A fixed-size admission gate bounds how many transactions run
// concurrently; each admitted transaction runs on its own thread, and locks
// are acquired per command — in table order, fail-fast on the first unknown
// table — before an external `CommandExecutor` performs the row-level
// effect. All locks a transaction acquired are released once its command
// sequence finishes, whether it committed or aborted.

use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use crate::common::{BlockId, TransactionId, MAX_CONCURRENT_TRANSACTIONS};
use crate::error::{DbError, Result};
use crate::storage::BlockLocator;
use crate::transaction::error::LockError;
use crate::transaction::lock_manager::LockManager;
use crate::transaction::notify::{NoopSink, NotificationSink, Outcome};
use crate::transaction::types::{Command, TransactionTask};

/// Row-level command execution, external to the lock manager and executor.
/// Given a resolved command whose locks are already held, performs its
/// effect.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &Command) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub max_concurrent_transactions: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transactions: MAX_CONCURRENT_TRANSACTIONS,
        }
    }
}

/// Admits transactions up to a fixed concurrency cap, runs each one's
/// commands under the lock manager's protocol against an external
/// `BlockLocator`/`CommandExecutor` pair, and reports progress through a
/// `NotificationSink`.
pub struct TransactionExecutor {
    lock_manager: Arc<LockManager>,
    locator: Arc<dyn BlockLocator>,
    command_executor: Arc<dyn CommandExecutor>,
    sink: Arc<dyn NotificationSink>,
    admission: Arc<(Mutex<usize>, Condvar)>,
    max_concurrent: usize,
}

impl TransactionExecutor {
    pub fn new(
        lock_manager: Arc<LockManager>,
        locator: Arc<dyn BlockLocator>,
        command_executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self::with_config(
            lock_manager,
            locator,
            command_executor,
            Arc::new(NoopSink),
            ExecutorConfig::default(),
        )
    }

    pub fn with_config(
        lock_manager: Arc<LockManager>,
        locator: Arc<dyn BlockLocator>,
        command_executor: Arc<dyn CommandExecutor>,
        sink: Arc<dyn NotificationSink>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            lock_manager,
            locator,
            command_executor,
            sink,
            admission: Arc::new((Mutex::new(0), Condvar::new())),
            max_concurrent: config.max_concurrent_transactions,
        }
    }

    /// Blocks until a concurrency slot is free, then spawns a worker thread
    /// running `task` under `txn_id` to completion. The returned handle
    /// joins to the transaction's result.
    pub fn submit(&self, txn_id: TransactionId, task: TransactionTask) -> thread::JoinHandle<Result<()>> {
        self.acquire_admission_slot();

        let lock_manager = self.lock_manager.clone();
        let locator = self.locator.clone();
        let command_executor = self.command_executor.clone();
        let sink = self.sink.clone();
        let admission = self.admission.clone();

        thread::spawn(move || {
            info!(txn_id, commands = task.len(), "transaction admitted");
            let result = run_transaction(&lock_manager, locator.as_ref(), command_executor.as_ref(), txn_id, &task);

            let outcome = if result.is_ok() { Outcome::Commit } else { Outcome::Abort };
            if let Err(ref err) = result {
                warn!(txn_id, %err, "transaction aborted");
            }
            sink.transaction_finished(txn_id, outcome);

            let last_active = {
                let mut active = admission.0.lock();
                *active -= 1;
                *active == 0
            };
            admission.1.notify_one();
            if last_active {
                sink.all_transactions_finished();
            }

            result
        })
    }

    fn acquire_admission_slot(&self) {
        let mut active = self.admission.0.lock();
        while *active >= self.max_concurrent {
            self.admission.1.wait(&mut active);
        }
        *active += 1;
    }
}

/// Runs every command in `task` to completion, acquiring each command's
/// locks before invoking the command executor, and releases every lock the
/// transaction acquired regardless of outcome.
fn run_transaction(
    lock_manager: &LockManager,
    locator: &dyn BlockLocator,
    command_executor: &dyn CommandExecutor,
    txn_id: TransactionId,
    task: &TransactionTask,
) -> Result<()> {
    let mut acquired: Vec<BlockId> = Vec::new();

    let result = (|| -> Result<()> {
        for command in &task.commands {
            let blocks = locator.addresses(&command.table);
            if blocks.is_empty() {
                return Err(DbError::Lock(LockError::UnknownResource(command.table.clone())));
            }
            for block in blocks {
                lock_manager.acquire(block, command.kind.lock_mode(), txn_id)?;
                acquired.push(block);
            }
            command_executor
                .execute(command)
                .map_err(DbError::Aborted)?;
        }
        Ok(())
    })();

    lock_manager.release(&acquired, txn_id);
    result
}
