// src/dag/order.rs

use std::ops::Deref;

use crate::dag::graph::{NodeId, TaskGraph};
use crate::errors::Result;

/// A total order of all nodes of a graph in which every dependency precedes
/// its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOrder(Vec<NodeId>);

impl ExecutionOrder {
    /// Validate `order` against `graph`.
    pub fn new(graph: &TaskGraph, order: Vec<NodeId>) -> Result<Self> {
        graph.check_order(&order)?;
        Ok(Self(order))
    }

    /// Build from node names, validating against `graph`.
    pub fn from_names<S: AsRef<str>>(graph: &TaskGraph, names: &[S]) -> Result<Self> {
        let order = names
            .iter()
            .map(|name| graph.require(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(graph, order)
    }

    /// Wrap an order the caller has already proven valid.
    pub(crate) fn from_unchecked(order: Vec<NodeId>) -> Self {
        Self(order)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<NodeId> {
        self.0
    }

    /// Position of every node, indexed by id.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.0.len()];
        for (pos, id) in self.0.iter().enumerate() {
            positions[id.0] = pos;
        }
        positions
    }

    pub fn names<'g>(&self, graph: &'g TaskGraph) -> Vec<&'g str> {
        self.0.iter().map(|&id| graph.name(id)).collect()
    }
}

impl Deref for ExecutionOrder {
    type Target = [NodeId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
