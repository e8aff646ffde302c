use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use cachedag::dag::NodeId;
use cachedag::exec::TaskExecutor;

/// Result produced by [`FakeExecutor`]: which node made it, how large it
/// claims to be, and the producers of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeOutput {
    pub node: NodeId,
    pub bytes: u64,
    pub inputs: Vec<NodeId>,
}

/// A fake executor that:
/// - records which nodes were run, and with which inputs
/// - produces results with a fixed size per node
/// - fails on request for selected nodes.
pub struct FakeExecutor {
    sizes: Vec<u64>,
    failing: HashSet<NodeId>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(sizes: Vec<u64>) -> Self {
        Self {
            sizes,
            failing: HashSet::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_on(mut self, node: NodeId) -> Self {
        self.failing.insert(node);
        self
    }

    /// Shared log of executed node names.
    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }
}

impl TaskExecutor for FakeExecutor {
    type Output = FakeOutput;

    fn execute(&mut self, node: NodeId, name: &str, inputs: &[&FakeOutput]) -> Result<FakeOutput> {
        if self.failing.contains(&node) {
            bail!("node '{name}' failed on purpose");
        }

        {
            let mut guard = self.executed.lock().unwrap();
            guard.push(name.to_string());
        }

        Ok(FakeOutput {
            node,
            bytes: self.sizes[node.index()],
            inputs: inputs.iter().map(|input| input.node).collect(),
        })
    }

    fn size_of(&self, output: &FakeOutput) -> u64 {
        output.bytes
    }
}
