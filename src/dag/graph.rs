// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::order::ExecutionOrder;
use crate::errors::{CachedagError, Result};

/// Stable, dense identifier of a node inside a [`TaskGraph`].
///
/// Ids are assigned in insertion order, starting at zero, so they double as
/// indices into per-node vectors (sizes, scores, counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    name: String,
    /// Direct dependencies, in declaration order.
    deps: Vec<NodeId>,
    /// Direct dependents.
    successors: Vec<NodeId>,
}

/// Integer-indexed DAG of tasks.
///
/// Built once through [`TaskGraphBuilder`], which rejects unknown
/// dependencies, self-loops and cycles. Afterwards every lookup is an index
/// into a vector; names are only used at the edges of the system.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<DagNode>,
    by_name: HashMap<String, NodeId>,
    edge_count: usize,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Look up a node id, failing with [`CachedagError::NodeNotFound`].
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.id(name)
            .ok_or_else(|| CachedagError::NodeNotFound(name.to_string()))
    }

    /// Immediate dependencies of a node.
    pub fn dependencies(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].deps
    }

    /// Immediate dependents of a node.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].successors
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.nodes[id.0].successors.len()
    }

    /// Sinks are the outputs of the job: no successors, always persisted.
    pub fn is_sink(&self, id: NodeId) -> bool {
        self.nodes[id.0].successors.is_empty()
    }

    pub fn names<'a>(&'a self, ids: &'a [NodeId]) -> Vec<&'a str> {
        ids.iter().map(|&id| self.name(id)).collect()
    }

    /// Deterministic default execution order.
    pub fn topological_order(&self) -> ExecutionOrder {
        // Acyclicity was checked at build time, so this cannot fail.
        let sorted = toposort(&self.to_petgraph(), None).unwrap_or_default();
        ExecutionOrder::from_unchecked(sorted.into_iter().map(|ix| NodeId(ix.index())).collect())
    }

    /// Verify that `order` is a permutation of all nodes in which every
    /// dependency precedes its dependents.
    pub fn check_order(&self, order: &[NodeId]) -> Result<()> {
        let positions = self.check_permutation(order)?;

        for id in self.nodes() {
            for &dep in self.dependencies(id) {
                if positions[dep.0] > positions[id.0] {
                    return Err(CachedagError::InvalidOrder(format!(
                        "'{}' runs before its dependency '{}'",
                        self.name(id),
                        self.name(dep)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Verify that `order` mentions every node exactly once and return the
    /// position of each node.
    pub fn check_permutation(&self, order: &[NodeId]) -> Result<Vec<usize>> {
        if order.len() != self.len() {
            return Err(CachedagError::InvalidOrder(format!(
                "order has {} entries but graph has {} nodes",
                order.len(),
                self.len()
            )));
        }

        let mut positions = vec![usize::MAX; self.len()];
        for (pos, &id) in order.iter().enumerate() {
            if id.0 >= self.len() {
                return Err(CachedagError::InvalidOrder(format!("unknown node {id}")));
            }
            if positions[id.0] != usize::MAX {
                return Err(CachedagError::InvalidOrder(format!(
                    "node '{}' appears more than once",
                    self.name(id)
                )));
            }
            positions[id.0] = pos;
        }
        Ok(positions)
    }

    fn to_petgraph(&self) -> DiGraph<(), ()> {
        let mut graph = DiGraph::with_capacity(self.len(), self.edge_count);
        for _ in &self.nodes {
            graph.add_node(());
        }
        for (ix, node) in self.nodes.iter().enumerate() {
            for dep in &node.deps {
                graph.add_edge(NodeIndex::new(dep.0), NodeIndex::new(ix), ());
            }
        }
        graph
    }
}

/// Builder for [`TaskGraph`].
///
/// Nodes may be declared in any order; dependencies are resolved by name
/// when [`build`](Self::build) is called.
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
    declared: Vec<(String, Vec<String>)>,
}

impl TaskGraphBuilder {
    /// Declare a node and the names of the nodes it depends on.
    pub fn node<S: AsRef<str>>(mut self, name: &str, after: &[S]) -> Self {
        self.add_node(name, after);
        self
    }

    pub fn add_node<S: AsRef<str>>(&mut self, name: &str, after: &[S]) {
        self.declared.push((
            name.to_string(),
            after.iter().map(|s| s.as_ref().to_string()).collect(),
        ));
    }

    pub fn build(self) -> Result<TaskGraph> {
        let mut by_name = HashMap::with_capacity(self.declared.len());
        for (ix, (name, _)) in self.declared.iter().enumerate() {
            if by_name.insert(name.clone(), NodeId(ix)).is_some() {
                return Err(CachedagError::DuplicateNode(name.clone()));
            }
        }

        let mut nodes: Vec<DagNode> = self
            .declared
            .iter()
            .map(|(name, _)| DagNode {
                name: name.clone(),
                deps: Vec::new(),
                successors: Vec::new(),
            })
            .collect();

        let mut edge_count = 0;
        for (ix, (name, after)) in self.declared.iter().enumerate() {
            for dep_name in after {
                if dep_name == name {
                    return Err(CachedagError::SelfLoop(name.clone()));
                }
                let dep = *by_name.get(dep_name).ok_or_else(|| {
                    CachedagError::NodeNotFound(format!(
                        "'{dep_name}' (dependency of '{name}')"
                    ))
                })?;
                // Keep the first occurrence only.
                if nodes[ix].deps.contains(&dep) {
                    continue;
                }
                nodes[ix].deps.push(dep);
                nodes[dep.0].successors.push(NodeId(ix));
                edge_count += 1;
            }
        }

        let graph = TaskGraph {
            nodes,
            by_name,
            edge_count,
        };

        if let Err(cycle) = toposort(&graph.to_petgraph(), None) {
            let node = NodeId(cycle.node_id().index());
            return Err(CachedagError::DagCycle(format!(
                "cycle detected in task DAG involving node '{}'",
                graph.name(node)
            )));
        }

        Ok(graph)
    }
}
