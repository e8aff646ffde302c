// src/optimize/problem.rs

//! Inputs shared by every cache-selection and order strategy.

use crate::dag::{peak_memory, CacheSet, NodeId, NodeSet, TaskGraph};
use crate::errors::{CachedagError, Result};

/// One optimization pass worth of inputs: the graph, per-node size (bytes)
/// and score (seconds saved if cached), and the memory budget.
///
/// Sizes and scores are estimates measured elsewhere and stay fixed for the
/// lifetime of a `Problem`.
#[derive(Debug, Clone, Copy)]
pub struct Problem<'a> {
    pub graph: &'a TaskGraph,
    pub sizes: &'a [u64],
    pub scores: &'a [f64],
    pub memory_limit: u64,
}

impl<'a> Problem<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        sizes: &'a [u64],
        scores: &'a [f64],
        memory_limit: u64,
    ) -> Result<Self> {
        if sizes.len() != graph.len() || scores.len() != graph.len() {
            return Err(CachedagError::InvalidInput(format!(
                "expected {} sizes and scores, got {} sizes and {} scores",
                graph.len(),
                sizes.len(),
                scores.len()
            )));
        }
        if let Some((ix, score)) = scores
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(CachedagError::InvalidInput(format!(
                "score of '{}' must be finite and non-negative (got {score})",
                graph.name(NodeId(ix))
            )));
        }

        Ok(Self {
            graph,
            sizes,
            scores,
            memory_limit,
        })
    }

    pub fn size(&self, id: NodeId) -> u64 {
        self.sizes[id.0]
    }

    pub fn score(&self, id: NodeId) -> f64 {
        self.scores[id.0]
    }

    /// Nodes no strategy may cache: larger than the budget, worthless
    /// (score zero), or sinks.
    pub fn excluded_nodes(&self) -> NodeSet {
        NodeSet::from_nodes(
            self.graph.len(),
            self.graph.nodes().filter(|&id| {
                self.size(id) > self.memory_limit
                    || self.score(id) == 0.0
                    || self.graph.is_sink(id)
            }),
        )
    }

    /// Sum of scores over a cache set.
    pub fn aggregate_score(&self, cache_set: &CacheSet) -> f64 {
        cache_set.iter().map(|id| self.score(id)).sum()
    }

    pub fn peak_memory(&self, order: &[NodeId], cache_set: &CacheSet) -> u64 {
        peak_memory(self.graph, order, self.sizes, cache_set)
    }

    /// Resident footprint of each node under `cache_set`: its size when
    /// cached, zero otherwise.
    pub fn effective_weights(&self, cache_set: &CacheSet) -> Vec<u64> {
        self.graph
            .nodes()
            .map(|id| if cache_set.contains(id) { self.size(id) } else { 0 })
            .collect()
    }

    /// Reject cache sets that would keep an output only in memory.
    pub fn check_cache_set(&self, cache_set: &CacheSet) -> Result<()> {
        match cache_set.iter().find(|&id| self.graph.is_sink(id)) {
            Some(sink) => Err(CachedagError::InvalidPlan(format!(
                "sink '{}' must be persisted and cannot be cached",
                self.graph.name(sink)
            ))),
            None => Ok(()),
        }
    }
}
