// src/optimize/cache/baseline.rs

//! Reference points: cache everything eligible, or nothing.

use crate::dag::{NodeId, NodeSet};
use crate::optimize::cache::{CacheSelection, SelectionContext};
use crate::optimize::problem::Problem;

/// Cache every node that is not excluded, disregarding the memory limit.
pub fn select_all(
    problem: &Problem<'_>,
    order: &[NodeId],
    excluded: &NodeSet,
    _ctx: &mut SelectionContext,
) -> CacheSelection {
    let cache_set = NodeSet::from_nodes(
        problem.graph.len(),
        problem.graph.nodes().filter(|&id| !excluded.contains(id)),
    );
    CacheSelection::evaluate(problem, order, cache_set)
}

pub fn select_none(
    problem: &Problem<'_>,
    _order: &[NodeId],
    _excluded: &NodeSet,
    _ctx: &mut SelectionContext,
) -> CacheSelection {
    CacheSelection {
        cache_set: NodeSet::empty_for(problem.graph),
        score: 0.0,
        peak_memory: 0,
    }
}
