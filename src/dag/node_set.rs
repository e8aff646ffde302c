// src/dag/node_set.rs

//! Dense membership sets over [`NodeId`]s.

use std::fmt;

use crate::dag::graph::{NodeId, TaskGraph};

/// A set of nodes backed by a boolean mask sized to the graph.
///
/// Membership tests are O(1), which matters in the peak-memory simulator;
/// iteration yields ids in ascending order, which keeps every strategy
/// deterministic.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct NodeSet {
    mask: Vec<bool>,
    len: usize,
}

/// Nodes whose results stay resident after execution instead of being
/// persisted right away. Sinks never belong to a cache set.
pub type CacheSet = NodeSet;

impl NodeSet {
    /// Empty set able to hold ids `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mask: vec![false; capacity],
            len: 0,
        }
    }

    /// Empty set sized for `graph`.
    pub fn empty_for(graph: &TaskGraph) -> Self {
        Self::with_capacity(graph.len())
    }

    pub fn from_nodes(capacity: usize, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::with_capacity(capacity);
        for id in nodes {
            set.insert(id);
        }
        set
    }

    pub fn capacity(&self) -> usize {
        self.mask.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.mask.get(id.0).copied().unwrap_or(false)
    }

    /// Returns `true` if the id was newly inserted.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if id.0 >= self.mask.len() {
            self.mask.resize(id.0 + 1, false);
        }
        if self.mask[id.0] {
            return false;
        }
        self.mask[id.0] = true;
        self.len += 1;
        true
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.mask.get_mut(id.0) {
            Some(slot) if *slot => {
                *slot = false;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .map(|(ix, _)| NodeId(ix))
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.iter().collect()
    }

    /// Node names in ascending id order, for logs and reports.
    pub fn names<'g>(&self, graph: &'g TaskGraph) -> Vec<&'g str> {
        self.iter().map(|id| graph.name(id)).collect()
    }
}

impl fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.0)).finish()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = NodeId;
    type IntoIter = Box<dyn Iterator<Item = NodeId> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
