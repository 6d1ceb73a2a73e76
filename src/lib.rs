// RelDB core - transaction lock manager and projection equivalence optimizer.
//
// This crate is the hard core of a small relational database engine: a
// hash-bucketed per-resource lock table with a bounded transaction executor,
// and a single-pass rewriter that applies the classical projection
// equivalence rules over a postfix relational-algebra token stream.
//
// Everything else a full engine needs (on-disk storage, row execution,
// the SQL parser, the network layer) is an external collaborator named
// here only by the trait interfaces this crate consumes: [`storage`] and
// [`catalog`] stand in for the storage/catalog collaborators, and
// [`transaction::executor::CommandExecutor`] stands in for row-level
// command execution.

pub mod algebra;
pub mod catalog;
pub mod common;
pub mod config;
pub mod error;
pub mod storage;
pub mod transaction;

pub use config::Config;
pub use error::{DbError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use once_cell::sync::OnceCell;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs a default `tracing` subscriber the first time it's called;
/// later calls are no-ops. Host applications embedding this crate are free
/// to install their own subscriber instead and never call this.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}
