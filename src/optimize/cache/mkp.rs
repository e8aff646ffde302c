// src/optimize/cache/mkp.rs

//! Exact cache selection as a multidimensional knapsack.
//!
//! Simulating "cache everything eligible" over the order exposes every
//! moment where the resident total would exceed the budget. Each such
//! moment yields a [`MaximalSet`]: nodes that cannot all be resident
//! together. One knapsack row per maximal set, all with the budget as
//! capacity, then describes exactly which cache sets fit.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dag::{NodeId, NodeSet, SuccessorCounts};
use crate::optimize::cache::knapsack::{self, KnapsackProblem};
use crate::optimize::cache::{CacheSelection, SelectionContext};
use crate::optimize::problem::Problem;

/// Nodes simultaneously resident at one over-budget point of the simulated
/// order, sorted by id. Cloning shares the underlying slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaximalSet(Arc<[NodeId]>);

impl MaximalSet {
    fn snapshot(live: &BTreeSet<NodeId>) -> Self {
        Self(live.iter().copied().collect())
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn total_size(&self, problem: &Problem<'_>) -> u64 {
        self.0.iter().map(|&id| problem.size(id)).sum()
    }
}

/// Over-budget snapshots of the live eligible set along `order`.
///
/// A snapshot is taken just before a release, when the resident total is
/// above the limit. Snapshots contained in the previous one add no
/// constraint and are skipped.
pub fn find_maximal_sets(problem: &Problem<'_>, order: &[NodeId], excluded: &NodeSet) -> Vec<MaximalSet> {
    let graph = problem.graph;
    let mut counts = SuccessorCounts::new(graph);
    let remaining = counts.reset();

    let mut sets: Vec<MaximalSet> = Vec::new();
    let mut live = BTreeSet::new();
    let mut total: u64 = 0;
    let mut released = Vec::new();

    for &id in order {
        if !excluded.contains(id) {
            live.insert(id);
            total += problem.size(id);
        }

        released.clear();
        for &dep in graph.dependencies(id) {
            remaining[dep.0] -= 1;
            if remaining[dep.0] == 0 && live.contains(&dep) {
                released.push(dep);
            }
        }

        if !released.is_empty() && total > problem.memory_limit {
            push_snapshot(&mut sets, &live);
        }

        for dep in &released {
            live.remove(dep);
            total -= problem.size(*dep);
        }
    }

    // Anything still resident at the end was never released above.
    if total > problem.memory_limit && !live.is_empty() {
        push_snapshot(&mut sets, &live);
    }

    sets
}

fn push_snapshot(sets: &mut Vec<MaximalSet>, live: &BTreeSet<NodeId>) {
    if let Some(previous) = sets.last() {
        if live.iter().all(|&id| previous.contains(id)) {
            return;
        }
    }
    sets.push(MaximalSet::snapshot(live));
}

pub fn select(
    problem: &Problem<'_>,
    order: &[NodeId],
    excluded: &NodeSet,
    ctx: &mut SelectionContext,
) -> CacheSelection {
    let graph = problem.graph;
    let maximal_sets = find_maximal_sets(problem, order, excluded);

    let mut cache_set = NodeSet::from_nodes(
        graph.len(),
        graph.nodes().filter(|&id| !excluded.contains(id)),
    );
    if maximal_sets.is_empty() {
        debug!("no over-budget points, caching every eligible node");
        return CacheSelection::evaluate(problem, order, cache_set);
    }

    let vector_nodes = NodeSet::from_nodes(
        graph.len(),
        maximal_sets.iter().flat_map(|set| set.nodes().iter().copied()),
    )
    .to_vec();

    let mut column_of = vec![usize::MAX; graph.len()];
    for (column, id) in vector_nodes.iter().enumerate() {
        column_of[id.0] = column;
    }

    let min_score = vector_nodes
        .iter()
        .map(|&id| problem.score(id))
        .filter(|score| *score > 0.0)
        .fold(f64::INFINITY, f64::min);
    let scale = if min_score.is_finite() { 1.0 / min_score } else { 1.0 };

    let profits = vector_nodes
        .iter()
        .map(|&id| problem.score(id) * scale)
        .collect();
    let mut knapsack_problem =
        KnapsackProblem::new(profits, vec![problem.memory_limit; maximal_sets.len()]);
    for (row, set) in maximal_sets.iter().enumerate() {
        for &id in set.nodes() {
            knapsack_problem.add_weight(row, column_of[id.0], problem.size(id));
        }
    }

    let solution = knapsack::solve(&knapsack_problem, ctx.solver_timeout);
    if solution.proven_optimal {
        debug!(
            rows = maximal_sets.len(),
            items = vector_nodes.len(),
            explored = solution.explored,
            "knapsack solved to optimality"
        );
    } else {
        warn!(
            rows = maximal_sets.len(),
            items = vector_nodes.len(),
            timeout_ms = ctx.solver_timeout.as_millis() as u64,
            "knapsack search hit its time limit, using best solution found"
        );
    }

    for (column, &id) in vector_nodes.iter().enumerate() {
        if !solution.selected[column] {
            cache_set.remove(id);
        }
    }

    CacheSelection::evaluate(problem, order, cache_set)
}
