// src/optimize/cache/greedy.rs

//! Capacity-checked sweeps over the execution order.
//!
//! A cached node occupies memory from the step it runs until the step its
//! last successor runs (inclusive). The forward sweep decides at the start
//! of that interval, the backward sweep at its end; both keep the running
//! total within the budget at every decision point, which is enough to keep
//! every step within the budget.

use tracing::trace;

use crate::dag::{NodeId, NodeSet, SuccessorCounts};
use crate::optimize::cache::{CacheSelection, SelectionContext};
use crate::optimize::problem::Problem;

/// Run both sweeps and keep the higher-scoring one (forward wins ties).
pub fn select(
    problem: &Problem<'_>,
    order: &[NodeId],
    excluded: &NodeSet,
    _ctx: &mut SelectionContext,
) -> CacheSelection {
    let forward = CacheSelection::evaluate(problem, order, forward_sweep(problem, order, excluded));
    let backward = CacheSelection::evaluate(problem, order, backward_sweep(problem, order, excluded));

    trace!(
        forward = forward.score,
        backward = backward.score,
        "greedy sweeps compared"
    );

    if backward.score > forward.score {
        backward
    } else {
        forward
    }
}

/// Cache a node when it runs if the resident total leaves room for it.
pub fn forward_sweep(problem: &Problem<'_>, order: &[NodeId], excluded: &NodeSet) -> NodeSet {
    let graph = problem.graph;
    let mut counts = SuccessorCounts::new(graph);
    let remaining = counts.reset();

    let mut cache_set = NodeSet::empty_for(graph);
    let mut current: u64 = 0;

    for &id in order {
        if !excluded.contains(id) && problem.size(id) <= problem.memory_limit - current {
            cache_set.insert(id);
            current += problem.size(id);
        }

        for &dep in graph.dependencies(id) {
            remaining[dep.0] -= 1;
            if remaining[dep.0] == 0 && cache_set.contains(dep) {
                current -= problem.size(dep);
            }
        }
    }

    cache_set
}

/// Walk the order backwards and cache a dependency at the step where it
/// would otherwise be freed (its last consumer), if it fits.
pub fn backward_sweep(problem: &Problem<'_>, order: &[NodeId], excluded: &NodeSet) -> NodeSet {
    let graph = problem.graph;

    let mut position = vec![0usize; graph.len()];
    for (pos, id) in order.iter().enumerate() {
        position[id.0] = pos;
    }

    let mut last_consumer = vec![None; graph.len()];
    for id in graph.nodes() {
        last_consumer[id.0] = graph.successors(id).iter().map(|s| position[s.0]).max();
    }

    let mut cache_set = NodeSet::empty_for(graph);
    let mut current: u64 = 0;

    for (pos, &id) in order.iter().enumerate().rev() {
        for &dep in graph.dependencies(id) {
            if excluded.contains(dep)
                || cache_set.contains(dep)
                || last_consumer[dep.0] != Some(pos)
            {
                continue;
            }
            if problem.size(dep) <= problem.memory_limit - current {
                cache_set.insert(dep);
                current += problem.size(dep);
            }
        }

        // Walking backwards, this is where the node's interval begins.
        if cache_set.contains(id) {
            current -= problem.size(id);
        }
    }

    cache_set
}
