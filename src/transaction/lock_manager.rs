// Lock acquisition and release protocol.
//
// `LockManager` bundles the lock table behind a `parking_lot::Mutex`/
// `Condvar` pair rather than exposing it as a process-wide singleton:
// acquire enqueues a waiter, evaluates the queue, and blocks on the
// condition variable until granted; release removes the releasing
// transaction's waiters, re-evaluates, and broadcasts.
//
// # Compatibility oracle
//
// A naive oracle would compare an entrant only against the queue's literal
// head. That lets a later shared arrival jump a still-waiting exclusive
// request enqueued ahead of it, which breaks FIFO fairness: an exclusive
// waiter must block later shared arrivals from being granted ahead of it.
// This implementation instead extends the granted prefix strictly in queue
// order: a waiter is granted only once every waiter ahead of it is already
// granted and compatible. That degenerates to "compare against the head"
// whenever the prefix hasn't been broken by an ungranted request, and
// blocks everyone behind the first such request otherwise.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::common::{BlockId, TransactionId};
use crate::transaction::error::{LockError, LockResult};
use crate::transaction::lock_table::{LockTable, ResourceLockRecord};
use crate::transaction::notify::{NoopSink, NotificationSink};
use crate::transaction::types::{LockMode, Waiter};

pub struct LockManager {
    table: Mutex<LockTable>,
    condvar: Condvar,
    sink: Arc<dyn NotificationSink>,
}

impl LockManager {
    pub fn new(bucket_count: usize) -> Self {
        Self::with_sink(bucket_count, Arc::new(NoopSink))
    }

    pub fn with_sink(bucket_count: usize, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            table: Mutex::new(LockTable::new(bucket_count)),
            condvar: Condvar::new(),
            sink,
        }
    }

    /// Blocking acquire. Enqueues a waiter, evaluates the oracle, and
    /// blocks on the table-wide condition variable until granted.
    pub fn acquire(&self, block: BlockId, mode: LockMode, txn_id: TransactionId) -> LockResult<()> {
        let mut table = self.table.lock();
        table.get_or_insert(block).waiters.push_back(Waiter::new(txn_id, mode));
        reevaluate(table.lookup_mut(block).ok_or(LockError::AcquireFailed { block, txn_id })?);

        loop {
            let granted = table
                .lookup(block)
                .and_then(|r| r.waiters.iter().find(|w| w.txn_id == txn_id))
                .map(|w| !w.waiting)
                .unwrap_or(false);

            if granted {
                trace!(block, txn_id, ?mode, "lock granted");
                return Ok(());
            }

            debug!(block, txn_id, ?mode, "lock waiting");
            self.condvar.wait(&mut table);
            if let Some(record) = table.lookup_mut(block) {
                reevaluate(record);
            }
        }
    }

    /// Releases every lock `txn_id` holds on `blocks`, re-evaluating each
    /// resource's queue and broadcasting once all releases are applied.
    pub fn release(&self, blocks: &[BlockId], txn_id: TransactionId) {
        let mut table = self.table.lock();
        for &block in blocks {
            let Some(record) = table.lookup_mut(block) else {
                continue;
            };
            record.waiters.retain(|w| w.txn_id != txn_id);
            if record.is_empty() {
                table.remove(block);
            } else {
                reevaluate(record);
            }
            self.sink.lock_released(txn_id, block);
        }
        self.condvar.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_granted(&self, block: BlockId, txn_id: TransactionId) -> bool {
        let table = self.table.lock();
        table
            .lookup(block)
            .and_then(|r| r.waiters.iter().find(|w| w.txn_id == txn_id))
            .map(|w| !w.waiting)
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) fn current_mode(&self, block: BlockId) -> Option<LockMode> {
        let table = self.table.lock();
        table.lookup(block).and_then(|r| r.current_mode)
    }
}

/// Re-derives grant state for every waiter in `record`, extending the
/// granted prefix from the front as far as compatibility allows.
fn reevaluate(record: &mut ResourceLockRecord) {
    let mut prefix_mode: Option<LockMode> = None;
    let mut prefix_txn: Option<TransactionId> = None;
    let mut prefix_open = true;

    for w in record.waiters.iter_mut() {
        if !w.waiting {
            prefix_mode = Some(w.mode);
            prefix_txn = Some(w.txn_id);
            continue;
        }
        if !prefix_open {
            continue;
        }
        let grant = match prefix_mode {
            None => true,
            Some(LockMode::Shared) => w.mode == LockMode::Shared,
            Some(LockMode::Exclusive) => prefix_txn == Some(w.txn_id),
        };
        if grant {
            w.waiting = false;
            prefix_mode = Some(w.mode);
            prefix_txn = Some(w.txn_id);
        } else {
            prefix_open = false;
        }
    }

    record.current_mode = prefix_mode;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::LOCK_TABLE_BUCKETS;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn manager() -> LockManager {
        LockManager::new(LOCK_TABLE_BUCKETS)
    }

    #[test]
    fn l1_shared_coalescing() {
        let lm = manager();
        lm.acquire(100, LockMode::Shared, 1).unwrap();
        lm.acquire(100, LockMode::Shared, 2).unwrap();
        lm.acquire(100, LockMode::Shared, 3).unwrap();
        assert!(lm.is_granted(100, 1));
        assert!(lm.is_granted(100, 2));
        assert!(lm.is_granted(100, 3));
    }

    #[test]
    fn l2_writer_blocks_then_releases() {
        let lm = Arc::new(manager());
        lm.acquire(200, LockMode::Exclusive, 1).unwrap();

        let lm2 = lm.clone();
        let handle = thread::spawn(move || {
            lm2.acquire(200, LockMode::Shared, 2).unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!lm.is_granted(200, 2));

        lm.release(&[200], 1);
        handle.join().unwrap();
        assert!(lm.is_granted(200, 2));
    }

    #[test]
    fn l3_fifo_with_mixed_modes() {
        let lm = Arc::new(manager());
        lm.acquire(300, LockMode::Shared, 1).unwrap();

        let lm_t2 = lm.clone();
        let t2 = thread::spawn(move || lm_t2.acquire(300, LockMode::Exclusive, 2).unwrap());
        thread::sleep(Duration::from_millis(30));

        let lm_t3 = lm.clone();
        let t3 = thread::spawn(move || lm_t3.acquire(300, LockMode::Shared, 3).unwrap());
        thread::sleep(Duration::from_millis(30));

        assert!(!lm.is_granted(300, 2));
        assert!(!lm.is_granted(300, 3), "T3 must not bypass the waiting exclusive T2");

        lm.release(&[300], 1);
        thread::sleep(Duration::from_millis(30));
        assert!(lm.is_granted(300, 2));
        assert!(!lm.is_granted(300, 3));

        lm.release(&[300], 2);
        t2.join().unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(lm.is_granted(300, 3));
        t3.join().unwrap();
    }

    #[test]
    fn current_mode_tracks_the_granted_prefix() {
        let lm = manager();

        lm.acquire(500, LockMode::Shared, 1).unwrap();
        assert_eq!(lm.current_mode(500), Some(LockMode::Shared));

        lm.acquire(500, LockMode::Shared, 2).unwrap();
        assert_eq!(lm.current_mode(500), Some(LockMode::Shared));

        lm.release(&[500], 1);
        lm.release(&[500], 2);
        assert_eq!(lm.current_mode(500), None);

        lm.acquire(500, LockMode::Exclusive, 3).unwrap();
        assert_eq!(lm.current_mode(500), Some(LockMode::Exclusive));

        lm.acquire(500, LockMode::Exclusive, 3).unwrap();
        assert_eq!(lm.current_mode(500), Some(LockMode::Exclusive));
    }

    #[test]
    fn reentrant_exclusive_is_granted() {
        let lm = manager();
        lm.acquire(400, LockMode::Exclusive, 1).unwrap();
        lm.acquire(400, LockMode::Exclusive, 1).unwrap();
        assert!(lm.is_granted(400, 1));
    }

    #[test]
    fn mutual_exclusion_under_contention() {
        let lm = Arc::new(manager());
        let active_exclusive = Arc::new(AtomicUsize::new(0));
        let violations = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for txn in 0..8u64 {
            let lm = lm.clone();
            let active = active_exclusive.clone();
            let violations = violations.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                lm.acquire(1, LockMode::Exclusive, txn).unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                if now > 1 {
                    violations.fetch_add(1, Ordering::SeqCst);
                }
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                lm.release(&[1], txn);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(violations.load(Ordering::SeqCst), 0);
    }
}
