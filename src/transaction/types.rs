// Core lock-manager and command types: a lock mode, a waiter record, and
// the command shape the executor derives lock requirements from. This is
// deliberately narrow — just what two-phase locking over a resource table
// needs, not a general transaction model with isolation levels or
// savepoints.

use std::fmt;

use crate::common::{BlockId, TransactionId};

/// Lock mode. Shared is compatible with shared; exclusive is compatible
/// with nothing except re-entry by the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    /// Whether `self` may be granted alongside an existing grant of `other`,
    /// ignoring transaction identity (re-entrancy is handled separately by
    /// the compatibility oracle since it also depends on who holds it).
    pub fn compatible_with(self, other: LockMode) -> bool {
        matches!((self, other), (LockMode::Shared, LockMode::Shared))
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => write!(f, "shared"),
            LockMode::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// A waiter in a resource's FIFO queue.
#[derive(Debug, Clone)]
pub struct Waiter {
    pub txn_id: TransactionId,
    pub mode: LockMode,
    /// True while not yet granted; false once granted.
    pub waiting: bool,
}

impl Waiter {
    pub fn new(txn_id: TransactionId, mode: LockMode) -> Self {
        Self {
            txn_id,
            mode,
            waiting: true,
        }
    }
}

/// The kind of a command, determining the lock mode it demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl CommandKind {
    /// Insert/update/delete demand exclusive locks; select demands shared.
    pub fn lock_mode(self) -> LockMode {
        match self {
            CommandKind::Select => LockMode::Shared,
            CommandKind::Insert | CommandKind::Update | CommandKind::Delete => LockMode::Exclusive,
        }
    }
}

/// A single command against a table. Parameters are opaque to the core —
/// they are only ever forwarded to the external row-level command executor.
#[derive(Debug, Clone)]
pub struct Command {
    pub table: String,
    pub kind: CommandKind,
    pub params: String,
}

impl Command {
    pub fn new(table: impl Into<String>, kind: CommandKind, params: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind,
            params: params.into(),
        }
    }
}

/// A transaction's unit of work: the command sequence it executes.
#[derive(Debug, Clone, Default)]
pub struct TransactionTask {
    pub commands: Vec<Command>,
}

impl TransactionTask {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
