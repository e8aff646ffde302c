// src/exec/backend.rs

//! Pluggable task executor abstraction.
//!
//! The runtime talks to a `TaskExecutor` instead of computing results
//! itself. Production callers wrap their dataframe/SQL engine; tests plug in
//! a fake executor that fabricates results of known sizes.

use anyhow::Result;

use crate::dag::NodeId;

/// Computes node results on the runtime's compute thread.
///
/// Results are moved to background workers once no successor needs them,
/// hence the `Send + 'static` bound on [`Output`](Self::Output).
pub trait TaskExecutor {
    type Output: Send + 'static;

    /// Run `node` over the results of its dependencies, given in the
    /// graph's declaration order.
    fn execute(&mut self, node: NodeId, name: &str, inputs: &[&Self::Output]) -> Result<Self::Output>;

    /// Resident size of a result in bytes.
    fn size_of(&self, output: &Self::Output) -> u64;
}
