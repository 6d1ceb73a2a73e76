// Shared identifiers and constants used across the lock manager and the
// projection rewriter.
//
// Kept deliberately small: just the handful of types and tunables that the
// lock table and the executor both need to agree on.

/// Identity of a transaction. An opaque handle the caller assigns; this
/// crate never interprets it beyond equality and hashing.
pub type TransactionId = u64;

/// Identifier of a storage block (the unit of locking). Defined externally
/// by the storage collaborator; this crate only ever hashes and compares it.
pub type BlockId = u64;

/// Maximum number of transactions the executor runs concurrently.
pub const MAX_CONCURRENT_TRANSACTIONS: usize = 10;

/// Lock-table bucket count. A small prime comfortably above 64 keeps
/// collision chains short without over-allocating for small workloads.
pub const LOCK_TABLE_BUCKETS: usize = 127;

/// Separator between attribute names in an attribute-list token payload.
pub const ATTR_LIST_SEPARATOR: char = ';';

/// Escape character wrapping an attribute name referenced inside a
/// condition's postfix text.
pub const CONDITION_ATTR_ESCAPE: char = '`';
