// src/dag/memory.rs

//! Peak-memory simulation.
//!
//! Walking an order once, a cached node adds its size when it runs and gives
//! it back as soon as its last successor has run. The maximum of the running
//! total is the peak memory of the (order, cache set) pair.

use crate::dag::graph::{NodeId, TaskGraph};
use crate::dag::node_set::NodeSet;

/// Per-node successor counts, computed once and reused across simulations.
#[derive(Debug, Clone)]
pub struct SuccessorCounts {
    initial: Vec<usize>,
    remaining: Vec<usize>,
}

impl SuccessorCounts {
    pub fn new(graph: &TaskGraph) -> Self {
        let initial: Vec<usize> = graph.nodes().map(|id| graph.out_degree(id)).collect();
        Self {
            remaining: initial.clone(),
            initial,
        }
    }

    /// Restore every counter to the node's out-degree and hand out the
    /// scratch buffer.
    pub fn reset(&mut self) -> &mut [usize] {
        self.remaining.copy_from_slice(&self.initial);
        &mut self.remaining
    }

    pub fn initial(&self) -> &[usize] {
        &self.initial
    }
}

/// Peak memory of running `order` while keeping `cache_set` resident.
///
/// `order` must be a valid topological order of `graph`.
/// Pure and O(V + E). Hot loops should hold a [`PeakMemory`] instead, which
/// keeps the successor counters between calls.
pub fn peak_memory(graph: &TaskGraph, order: &[NodeId], sizes: &[u64], cache_set: &NodeSet) -> u64 {
    let mut counts = SuccessorCounts::new(graph);
    simulate(graph, order, sizes, cache_set, counts.reset())
}

/// Reusable peak-memory simulator bound to one graph and one size vector.
#[derive(Debug, Clone)]
pub struct PeakMemory<'a> {
    graph: &'a TaskGraph,
    sizes: &'a [u64],
    counts: SuccessorCounts,
}

impl<'a> PeakMemory<'a> {
    pub fn new(graph: &'a TaskGraph, sizes: &'a [u64]) -> Self {
        Self {
            graph,
            sizes,
            counts: SuccessorCounts::new(graph),
        }
    }

    pub fn evaluate(&mut self, order: &[NodeId], cache_set: &NodeSet) -> u64 {
        simulate(self.graph, order, self.sizes, cache_set, self.counts.reset())
    }

    /// Peak memory with `extra` tentatively added to `cache_set`.
    pub fn evaluate_with(&mut self, order: &[NodeId], cache_set: &mut NodeSet, extra: NodeId) -> u64 {
        let inserted = cache_set.insert(extra);
        let peak = self.evaluate(order, cache_set);
        if inserted {
            cache_set.remove(extra);
        }
        peak
    }
}

fn simulate(
    graph: &TaskGraph,
    order: &[NodeId],
    sizes: &[u64],
    cache_set: &NodeSet,
    remaining: &mut [usize],
) -> u64 {
    let mut current: u64 = 0;
    let mut peak: u64 = 0;

    for &id in order {
        if cache_set.contains(id) {
            current += sizes[id.0];
            peak = peak.max(current);
        }

        for &dep in graph.dependencies(id) {
            remaining[dep.0] -= 1;
            if remaining[dep.0] == 0 && cache_set.contains(dep) {
                current -= sizes[dep.0];
            }
        }
    }

    peak
}
