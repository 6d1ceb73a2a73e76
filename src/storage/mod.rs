// Storage collaborator.
//
// On-disk block storage lives outside this crate; the executor only needs
// `addresses(table) -> ordered block identifiers`, exposed here as the
// `BlockLocator` trait. `TableDirectory` is a minimal in-memory stand-in
// used by tests and simple embedders, backed by an `Arc<RwLock<HashMap>>`
// registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::BlockId;

/// The storage-lookup collaborator the transaction executor depends on.
///
/// `addresses(table)` returns the block identifiers a command against
/// `table` must lock. An empty or missing result is treated by the
/// executor as an unknown-resource abort.
pub trait BlockLocator: Send + Sync {
    fn addresses(&self, table: &str) -> Vec<BlockId>;
}

/// A minimal in-memory table-to-blocks directory.
#[derive(Clone, Default)]
pub struct TableDirectory {
    tables: Arc<RwLock<HashMap<String, Vec<BlockId>>>>,
}

impl TableDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, table: impl Into<String>, blocks: Vec<BlockId>) {
        self.tables.write().insert(table.into(), blocks);
    }
}

impl BlockLocator for TableDirectory {
    fn addresses(&self, table: &str) -> Vec<BlockId> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }
}
