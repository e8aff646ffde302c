// src/store/mod.rs

//! Durable result storage abstraction.
//!
//! Results that are not kept resident are persisted through a
//! [`ResultStore`] and loaded back when a later node consumes them.
//! [`memory::MemoryStore`] keeps everything in a shared map and is used in
//! tests.

use std::fmt;

use anyhow::Result;

use crate::dag::NodeId;

pub mod memory;

pub use memory::MemoryStore;

/// Where a persisted result lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredHandle {
    pub node: NodeId,
    pub location: String,
}

impl fmt::Display for StoredHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.node, self.location)
    }
}

/// Durable storage for node results.
///
/// Shared between the compute thread and the write-behind worker, so
/// implementations must be usable through `&self` from several threads.
pub trait ResultStore<R>: Send + Sync + 'static {
    fn persist(&self, node: NodeId, result: &R) -> Result<StoredHandle>;

    fn load(&self, handle: &StoredHandle) -> Result<R>;
}
