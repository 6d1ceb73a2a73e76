// Configuration for the lock manager and transaction executor.
//
// Loading this from a config file (or environment, or a CLI flag) is left
// to the embedder; this struct only holds the values consulted directly by
// the lock table and the executor, with a `Default` that matches the
// tunables in `common`.

use serde::{Deserialize, Serialize};

use crate::common::{LOCK_TABLE_BUCKETS, MAX_CONCURRENT_TRANSACTIONS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of buckets in the lock table's open hash.
    pub lock_table_buckets: usize,
    /// Maximum number of transactions the executor runs concurrently.
    pub max_concurrent_transactions: usize,
    /// Separator between attribute names inside an attribute-list token.
    pub attr_list_separator: char,
    /// Escape character wrapping an attribute name inside a condition.
    pub condition_attr_escape: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_table_buckets: LOCK_TABLE_BUCKETS,
            max_concurrent_transactions: MAX_CONCURRENT_TRANSACTIONS,
            attr_list_separator: ';',
            condition_attr_escape: '`',
        }
    }
}
