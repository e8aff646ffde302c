// src/optimize/order/separator.rs

//! Recursive minimum-cut separation.
//!
//! Each slice of the graph is turned into a flow network where every node
//! is split into an entry and an exit vertex joined by an arc of capacity
//! equal to the node's effective weight. Dependency arcs run from the exit
//! of the producer to the entry of the consumer and can never be cut. The
//! super-source feeds the entries of the slice's sources and the entries of
//! the slice's sinks drain into the super-sink, so every source starts on
//! the prefix side and every sink on the suffix side.
//!
//! The minimum cut splits the slice into a prefix and a suffix; both are
//! ordered the same way and concatenated. A slice made of several weakly
//! connected components is first broken into those components, which are
//! ordered one after the other. Slices live on an explicit work list, since
//! a chain-like graph can peel off one node per split.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::dag::{CacheSet, ExecutionOrder, NodeId, TaskGraph};
use crate::optimize::order::flow::FlowNetwork;
use crate::optimize::order::OrderContext;
use crate::optimize::problem::Problem;

const NOT_IN_SLICE: usize = usize::MAX;

pub fn optimize(
    problem: &Problem<'_>,
    cache_set: &CacheSet,
    current: &ExecutionOrder,
    _ctx: &mut OrderContext,
) -> ExecutionOrder {
    let weights = problem.effective_weights(cache_set);
    let mut separator = Separator {
        graph: problem.graph,
        weights: &weights,
        local: vec![NOT_IN_SLICE; problem.graph.len()],
        splits: 0,
    };

    let order = separator.order(current.to_vec());
    debug!(splits = separator.splits, "separator ordering finished");
    ExecutionOrder::from_unchecked(order)
}

struct Separator<'a> {
    graph: &'a TaskGraph,
    weights: &'a [u64],
    /// Index of each node inside the slice being processed.
    local: Vec<usize>,
    splits: usize,
}

impl Separator<'_> {
    /// Order `slice`, whose nodes are given in a valid relative order.
    fn order(&mut self, slice: Vec<NodeId>) -> Vec<NodeId> {
        let mut ordered = Vec::with_capacity(slice.len());
        let mut work = vec![(slice, 0usize)];

        // Last in, first out: a slice is fully ordered before the next one.
        while let Some((slice, depth)) = work.pop() {
            if slice.len() <= 1 || self.is_forced(&slice) {
                ordered.extend(slice);
                continue;
            }

            let components = self.components(&slice);
            if components.len() > 1 {
                work.extend(components.into_iter().rev().map(|c| (c, depth)));
                continue;
            }

            match self.split(&slice, depth) {
                Some((prefix, suffix)) => {
                    work.push((suffix, depth + 1));
                    work.push((prefix, depth + 1));
                }
                None => ordered.extend(slice),
            }
        }

        ordered
    }

    /// True when each node of `slice` directly depends on the one before
    /// it. Such a slice has exactly one valid order.
    fn is_forced(&self, slice: &[NodeId]) -> bool {
        slice
            .windows(2)
            .all(|pair| self.graph.dependencies(pair[1]).contains(&pair[0]))
    }

    /// Weakly connected components of `slice`, numbered by first
    /// appearance. Each keeps the relative order of `slice`.
    fn components(&mut self, slice: &[NodeId]) -> Vec<Vec<NodeId>> {
        let graph = self.graph;
        self.index(slice);

        let mut component = vec![usize::MAX; slice.len()];
        let mut count = 0;
        let mut queue = VecDeque::new();
        for start in 0..slice.len() {
            if component[start] != usize::MAX {
                continue;
            }
            component[start] = count;
            queue.push_back(start);
            while let Some(ix) = queue.pop_front() {
                let id = slice[ix];
                for &other in graph.dependencies(id).iter().chain(graph.successors(id)) {
                    let target = self.local[other.0];
                    if target != NOT_IN_SLICE && component[target] == usize::MAX {
                        component[target] = count;
                        queue.push_back(target);
                    }
                }
            }
            count += 1;
        }

        self.clear(slice);

        let mut groups = vec![Vec::new(); count];
        for (ix, &id) in slice.iter().enumerate() {
            groups[component[ix]].push(id);
        }
        groups
    }

    /// Partition a weakly connected `slice` into (prefix, suffix) along a
    /// minimum cut, or `None` when the cut is degenerate.
    fn split(&mut self, slice: &[NodeId], depth: usize) -> Option<(Vec<NodeId>, Vec<NodeId>)> {
        let graph = self.graph;
        self.index(slice);

        let m = slice.len();
        let source = 2 * m;
        let sink = 2 * m + 1;
        let total: u64 = slice.iter().map(|id| self.weights[id.0]).sum();
        let uncuttable = total.saturating_add(1);

        let mut network = FlowNetwork::new(2 * m + 2);
        for (ix, &id) in slice.iter().enumerate() {
            let entry = 2 * ix;
            let exit = 2 * ix + 1;
            network.add_edge(entry, exit, self.weights[id.0]);

            let mut has_successor = false;
            for &succ in graph.successors(id) {
                let target = self.local[succ.0];
                if target != NOT_IN_SLICE {
                    network.add_edge(exit, 2 * target, uncuttable);
                    has_successor = true;
                }
            }
            if !graph.dependencies(id).iter().any(|d| self.local[d.0] != NOT_IN_SLICE) {
                network.add_edge(source, entry, uncuttable);
            }
            if !has_successor {
                network.add_edge(entry, sink, uncuttable);
            }
        }

        let cut = network.max_flow(source, sink);
        let reachable = network.reachable_from(source);
        let mut in_prefix: Vec<bool> = (0..m).map(|ix| reachable[2 * ix]).collect();

        // Close the suffix under successors so no edge points backwards.
        let mut queue: VecDeque<usize> = (0..m).filter(|&ix| !in_prefix[ix]).collect();
        while let Some(ix) = queue.pop_front() {
            for &succ in graph.successors(slice[ix]) {
                let target = self.local[succ.0];
                if target != NOT_IN_SLICE && in_prefix[target] {
                    in_prefix[target] = false;
                    queue.push_back(target);
                }
            }
        }

        self.clear(slice);

        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        for (ix, &id) in slice.iter().enumerate() {
            if in_prefix[ix] {
                prefix.push(id);
            } else {
                suffix.push(id);
            }
        }

        if prefix.is_empty() || suffix.is_empty() {
            return None;
        }

        self.splits += 1;
        trace!(depth, cut, prefix = prefix.len(), suffix = suffix.len(), "slice separated");

        Some((prefix, suffix))
    }

    fn index(&mut self, slice: &[NodeId]) {
        for (ix, id) in slice.iter().enumerate() {
            self.local[id.0] = ix;
        }
    }

    fn clear(&mut self, slice: &[NodeId]) {
        for id in slice {
            self.local[id.0] = NOT_IN_SLICE;
        }
    }
}
