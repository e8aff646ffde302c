// src/optimize/cache/heuristic.rs

//! Ratio heuristic: try nodes from the highest score-per-byte downwards and
//! keep each one that still fits the budget over the whole order.

use std::cmp::Ordering;

use crate::dag::{NodeId, NodeSet};
use crate::optimize::cache::random::admit_within_budget;
use crate::optimize::cache::{CacheSelection, SelectionContext};
use crate::optimize::problem::Problem;

pub fn select(
    problem: &Problem<'_>,
    order: &[NodeId],
    excluded: &NodeSet,
    _ctx: &mut SelectionContext,
) -> CacheSelection {
    let cache_set = admit_within_budget(problem, order, ranked_candidates(problem, order, excluded));
    CacheSelection::evaluate(problem, order, cache_set)
}

/// Eligible nodes by descending score/size; ties keep execution order.
pub fn ranked_candidates(problem: &Problem<'_>, order: &[NodeId], excluded: &NodeSet) -> Vec<NodeId> {
    let mut ranked: Vec<(NodeId, f64)> = order
        .iter()
        .copied()
        .filter(|&id| !excluded.contains(id))
        .map(|id| (id, ratio(problem, id)))
        .collect();

    // Stable sort keeps the execution order among equal ratios.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.into_iter().map(|(id, _)| id).collect()
}

fn ratio(problem: &Problem<'_>, id: NodeId) -> f64 {
    match problem.size(id) {
        // Zero-size results cost nothing to keep.
        0 => f64::INFINITY,
        size => problem.score(id) / size as f64,
    }
}
