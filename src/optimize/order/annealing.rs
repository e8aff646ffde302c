// src/optimize/order/annealing.rs

//! Simulated annealing over the storage-time product.
//!
//! A cached node with effective weight `w` stays resident from its own
//! position to the position of its last successor, so it contributes
//! `w * (last_successor - position)` to the storage-time product (unit
//! execution time per node). A move relocates one node inside the window
//! between its latest dependency and its earliest successor, which keeps
//! the order topological. A move's score is the decrease of the product.

use rand::Rng;
use tracing::{debug, trace};

use crate::dag::{CacheSet, ExecutionOrder, NodeId, PeakMemory, TaskGraph};
use crate::optimize::order::OrderContext;
use crate::optimize::problem::Problem;

pub fn optimize(
    problem: &Problem<'_>,
    cache_set: &CacheSet,
    current: &ExecutionOrder,
    ctx: &mut OrderContext,
) -> ExecutionOrder {
    let graph = problem.graph;
    let n = current.len();
    let weights = problem.effective_weights(cache_set);

    let max_weight = weights.iter().copied().max().unwrap_or(0);
    if n < 3 || max_weight == 0 {
        return current.clone();
    }
    let initial_temperature = max_weight as f64 / n as f64;

    let mut state = Annealing {
        graph,
        weights: &weights,
        order: current.to_vec(),
        positions: current.positions(),
        stamp: vec![0; n],
        epoch: 0,
        affected: Vec::new(),
    };
    let mut simulator = PeakMemory::new(graph, problem.sizes);

    let mut score = 0.0;
    let mut best_score = 0.0;
    let mut best_order = current.to_vec();
    let mut accepted = 0usize;
    let mut rolled_back = 0usize;

    for iteration in 0..ctx.annealing_iterations {
        let from = ctx.rng.gen_range(0..n);
        let node = state.order[from];

        let (lo, hi) = state.window(node);
        if hi - lo < 3 {
            continue;
        }
        let to = ctx.rng.gen_range((lo + 1) as usize..hi as usize);
        if to == from {
            continue;
        }

        let delta = state.score_delta(node, to);
        let temperature = initial_temperature / (iteration + 1) as f64;
        if !(delta > 0.0 || ctx.rng.r#gen::<f64>() < (delta / temperature).exp()) {
            continue;
        }

        state.relocate(from, to);
        if simulator.evaluate(&state.order, cache_set) > problem.memory_limit {
            state.relocate(to, from);
            rolled_back += 1;
            continue;
        }

        accepted += 1;
        score += delta;
        if score > best_score {
            best_score = score;
            best_order.copy_from_slice(&state.order);
            trace!(iteration, best_score, "annealing found a better order");
        }
    }

    debug!(
        iterations = ctx.annealing_iterations,
        accepted,
        rolled_back,
        improvement = best_score,
        "annealing finished"
    );

    ExecutionOrder::from_unchecked(best_order)
}

struct Annealing<'a> {
    graph: &'a TaskGraph,
    weights: &'a [u64],
    order: Vec<NodeId>,
    positions: Vec<usize>,
    /// Dedup marks for `affected`, valid when equal to `epoch`.
    stamp: Vec<u64>,
    epoch: u64,
    affected: Vec<NodeId>,
}

impl Annealing<'_> {
    /// Exclusive bounds of the positions `node` may move to: its latest
    /// dependency (or -1) and its earliest successor (or n).
    fn window(&self, node: NodeId) -> (isize, isize) {
        let lo = self
            .graph
            .dependencies(node)
            .iter()
            .map(|d| self.positions[d.0] as isize)
            .max()
            .unwrap_or(-1);
        let hi = self
            .graph
            .successors(node)
            .iter()
            .map(|s| self.positions[s.0] as isize)
            .min()
            .unwrap_or(self.order.len() as isize);
        (lo, hi)
    }

    /// Decrease of the storage-time product if `node` moved to `to`.
    ///
    /// Only the moved node, the nodes it jumps over and their dependencies
    /// can change contribution, so the cost is proportional to the window.
    fn score_delta(&mut self, node: NodeId, to: usize) -> f64 {
        let graph = self.graph;
        let from = self.positions[node.0];
        self.epoch += 1;
        self.affected.clear();

        let (first, last) = if from < to { (from, to) } else { (to, from) };
        for pos in first..=last {
            let moved = self.order[pos];
            self.mark(moved);
            for &dep in graph.dependencies(moved) {
                self.mark(dep);
            }
        }

        let new_position = |id: NodeId, current: usize| -> usize {
            if id == node {
                to
            } else if from < to && current > from && current <= to {
                current - 1
            } else if to < from && current >= to && current < from {
                current + 1
            } else {
                current
            }
        };

        let mut before: i128 = 0;
        let mut after: i128 = 0;
        for &x in &self.affected {
            let weight = self.weights[x.0] as i128;
            let successors = graph.successors(x);
            if weight == 0 || successors.is_empty() {
                continue;
            }
            let pos = self.positions[x.0];
            let last_old = successors.iter().map(|s| self.positions[s.0]).max().unwrap_or(pos);
            let last_new = successors
                .iter()
                .map(|s| new_position(*s, self.positions[s.0]))
                .max()
                .unwrap_or(pos);
            before += weight * (last_old as i128 - pos as i128);
            after += weight * (last_new as i128 - new_position(x, pos) as i128);
        }

        (before - after) as f64
    }

    fn mark(&mut self, id: NodeId) {
        if self.stamp[id.0] != self.epoch {
            self.stamp[id.0] = self.epoch;
            self.affected.push(id);
        }
    }

    /// Move the node at `from` to `to`, shifting the nodes in between by
    /// one position.
    fn relocate(&mut self, from: usize, to: usize) {
        if from < to {
            self.order[from..=to].rotate_left(1);
        } else {
            self.order[to..=from].rotate_right(1);
        }
        let (first, last) = if from < to { (from, to) } else { (to, from) };
        for pos in first..=last {
            self.positions[self.order[pos].0] = pos;
        }
    }
}
