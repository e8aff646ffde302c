// src/optimize/order/mod.rs

//! Execution-order strategies.
//!
//! Every strategy maps (problem, cache set, current order) to a new valid
//! topological order. Only a node's *effective weight* matters here: its
//! size when cached, zero otherwise.

pub mod annealing;
pub mod flow;
pub mod ma_dfs;
pub mod separator;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::dag::{CacheSet, ExecutionOrder};
use crate::optimize::problem::Problem;
use crate::types::OrderStrategy;

/// Default number of annealing moves per call.
pub const DEFAULT_ANNEALING_ITERATIONS: usize = 10_000;

/// Result of one order-optimization call.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub order: ExecutionOrder,
    /// Peak memory of the cache set under `order`.
    pub peak_memory: u64,
}

/// Mutable state shared by order strategies across optimizer iterations.
#[derive(Debug, Clone)]
pub struct OrderContext {
    pub(crate) rng: StdRng,
    pub annealing_iterations: usize,
}

impl OrderContext {
    pub fn new(seed: Option<u64>, annealing_iterations: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            annealing_iterations,
        }
    }
}

impl Default for OrderContext {
    fn default() -> Self {
        Self::new(None, DEFAULT_ANNEALING_ITERATIONS)
    }
}

type OrderFn = fn(&Problem<'_>, &CacheSet, &ExecutionOrder, &mut OrderContext) -> ExecutionOrder;

fn keep_current(
    _problem: &Problem<'_>,
    _cache_set: &CacheSet,
    current: &ExecutionOrder,
    _ctx: &mut OrderContext,
) -> ExecutionOrder {
    current.clone()
}

impl OrderStrategy {
    fn optimizer(self) -> OrderFn {
        match self {
            OrderStrategy::None => keep_current,
            OrderStrategy::MaDfs => ma_dfs::optimize,
            OrderStrategy::SimulatedAnnealing => annealing::optimize,
            OrderStrategy::Separator => separator::optimize,
        }
    }

    /// Reorder the graph for `cache_set`, starting from `current`.
    pub fn optimize(
        self,
        problem: &Problem<'_>,
        cache_set: &CacheSet,
        current: &ExecutionOrder,
        ctx: &mut OrderContext,
    ) -> OrderResult {
        let order = (self.optimizer())(problem, cache_set, current, ctx);
        let peak_memory = problem.peak_memory(&order, cache_set);
        debug!(strategy = %self, peak = peak_memory, "order optimization finished");
        OrderResult { order, peak_memory }
    }
}
