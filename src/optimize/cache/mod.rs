// src/optimize/cache/mod.rs

//! Cache-selection strategies.
//!
//! Each strategy is a plain function over the same inputs: the problem, the
//! current execution order and the excluded nodes. [`CacheStrategy`] picks
//! the function from a fixed table; there is no strategy object state
//! besides the shared [`SelectionContext`] (random source, solver limits).

pub mod baseline;
pub mod greedy;
pub mod heuristic;
pub mod knapsack;
pub mod mkp;
pub mod random;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::dag::{CacheSet, NodeId, NodeSet};
use crate::optimize::problem::Problem;
use crate::types::CacheStrategy;

/// Result of one cache-selection call.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSelection {
    pub cache_set: CacheSet,
    /// Sum of the (unscaled) scores of `cache_set`.
    pub score: f64,
    /// Peak memory of `cache_set` under the order it was chosen for.
    pub peak_memory: u64,
}

impl CacheSelection {
    pub(crate) fn evaluate(problem: &Problem<'_>, order: &[NodeId], cache_set: CacheSet) -> Self {
        let score = problem.aggregate_score(&cache_set);
        let peak_memory = problem.peak_memory(order, &cache_set);
        Self {
            cache_set,
            score,
            peak_memory,
        }
    }
}

/// Mutable state shared by cache strategies across optimizer iterations.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    pub(crate) rng: StdRng,
    /// Wall-clock limit for the exact knapsack search.
    pub solver_timeout: Duration,
}

impl SelectionContext {
    /// A fixed `seed` makes the random strategy reproducible.
    pub fn new(seed: Option<u64>, solver_timeout: Duration) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, solver_timeout }
    }
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::new(None, Duration::from_secs(10))
    }
}

type SelectFn = fn(&Problem<'_>, &[NodeId], &NodeSet, &mut SelectionContext) -> CacheSelection;

impl CacheStrategy {
    fn selector(self) -> SelectFn {
        match self {
            CacheStrategy::All => baseline::select_all,
            CacheStrategy::None => baseline::select_none,
            CacheStrategy::Greedy => greedy::select,
            CacheStrategy::Random => random::select,
            CacheStrategy::Heuristic => heuristic::select,
            CacheStrategy::Mkp => mkp::select,
        }
    }

    /// Choose a cache set for `order`.
    ///
    /// `excluded` must contain at least [`Problem::excluded_nodes`]; callers
    /// may add more.
    pub fn select(
        self,
        problem: &Problem<'_>,
        order: &[NodeId],
        excluded: &NodeSet,
        ctx: &mut SelectionContext,
    ) -> CacheSelection {
        let selection = (self.selector())(problem, order, excluded, ctx);
        debug!(
            strategy = %self,
            cached = selection.cache_set.len(),
            score = selection.score,
            peak = selection.peak_memory,
            "cache selection finished"
        );
        selection
    }
}
