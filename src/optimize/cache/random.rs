// src/optimize/cache/random.rs

//! Random baseline: visit candidates in a random order and keep each one
//! whose inclusion keeps the full-order peak within the budget.

use rand::seq::SliceRandom;

use crate::dag::{NodeId, NodeSet, PeakMemory};
use crate::optimize::cache::{CacheSelection, SelectionContext};
use crate::optimize::problem::Problem;

pub fn select(
    problem: &Problem<'_>,
    order: &[NodeId],
    excluded: &NodeSet,
    ctx: &mut SelectionContext,
) -> CacheSelection {
    let mut candidates: Vec<NodeId> = order
        .iter()
        .copied()
        .filter(|&id| !excluded.contains(id))
        .collect();
    candidates.shuffle(&mut ctx.rng);

    let cache_set = admit_within_budget(problem, order, candidates);
    CacheSelection::evaluate(problem, order, cache_set)
}

/// Add candidates one at a time, re-simulating the whole order for each.
pub(crate) fn admit_within_budget(
    problem: &Problem<'_>,
    order: &[NodeId],
    candidates: impl IntoIterator<Item = NodeId>,
) -> NodeSet {
    let mut simulator = PeakMemory::new(problem.graph, problem.sizes);
    let mut cache_set = NodeSet::empty_for(problem.graph);

    for id in candidates {
        if simulator.evaluate_with(order, &mut cache_set, id) <= problem.memory_limit {
            cache_set.insert(id);
        }
    }

    cache_set
}
