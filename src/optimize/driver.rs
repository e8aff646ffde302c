// src/optimize/driver.rs

//! Alternating (coordinate-ascent) optimization of cache set and order.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dag::{CacheSet, ExecutionOrder, NodeSet};
use crate::errors::Result;
use crate::optimize::cache::SelectionContext;
use crate::optimize::order::{OrderContext, DEFAULT_ANNEALING_ITERATIONS};
use crate::optimize::problem::Problem;
use crate::types::{CacheStrategy, OrderStrategy};

/// Knobs of the alternating optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub cache_strategy: CacheStrategy,
    pub order_strategy: OrderStrategy,
    pub max_iters: usize,
    /// Seed for the random cache strategy and simulated annealing.
    pub seed: Option<u64>,
    pub annealing_iterations: usize,
    pub solver_timeout: Duration,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            cache_strategy: CacheStrategy::default(),
            order_strategy: OrderStrategy::default(),
            max_iters: 100,
            seed: None,
            annealing_iterations: DEFAULT_ANNEALING_ITERATIONS,
            solver_timeout: Duration::from_secs(10),
        }
    }
}

/// Why the alternating loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The cache strategy could not beat the committed score.
    Converged,
    /// The reordered plan exceeded the budget; the previous plan was kept.
    BudgetViolated,
    /// `max_iters` rounds ran without either of the above.
    IterationLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Converged => "converged",
            Termination::BudgetViolated => "budget violated (reverted)",
            Termination::IterationLimit => "iteration limit reached",
        };
        f.write_str(s)
    }
}

/// Final committed plan and how the optimizer got there.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub cache_set: CacheSet,
    pub order: ExecutionOrder,
    /// Sum of the scores of `cache_set`.
    pub score: f64,
    /// Peak memory of `cache_set` under `order`.
    pub peak_memory: u64,
    pub elapsed: Duration,
    /// Rounds started, including the one that terminated the loop.
    pub iterations: usize,
    pub termination: Termination,
    /// Committed score after each successful round.
    pub history: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct AlternatingOptimizer {
    settings: OptimizerSettings,
}

impl AlternatingOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Alternate cache selection and reordering, starting from `initial`
    /// with nothing cached.
    ///
    /// Fails only when `initial` is not a valid order of the problem's
    /// graph; every way the loop can stop is reported in
    /// [`OptimizationOutcome::termination`].
    pub fn optimize(&self, problem: &Problem<'_>, initial: ExecutionOrder) -> Result<OptimizationOutcome> {
        problem.graph.check_order(&initial)?;

        let settings = &self.settings;
        let started = Instant::now();
        let excluded = problem.excluded_nodes();
        let mut selection_ctx = SelectionContext::new(settings.seed, settings.solver_timeout);
        let mut order_ctx = OrderContext::new(settings.seed, settings.annealing_iterations);

        let mut cache_set = NodeSet::empty_for(problem.graph);
        let mut order = initial;
        let mut score = 0.0;
        let mut peak_memory = 0;
        let mut history = Vec::new();
        let mut iterations = 0;
        let mut termination = Termination::IterationLimit;

        debug!(
            nodes = problem.graph.len(),
            excluded = excluded.len(),
            memory_limit = problem.memory_limit,
            cache_strategy = %settings.cache_strategy,
            order_strategy = %settings.order_strategy,
            "starting alternating optimization"
        );

        while iterations < settings.max_iters {
            iterations += 1;

            let candidate = settings
                .cache_strategy
                .select(problem, &order, &excluded, &mut selection_ctx);
            if candidate.score <= score {
                termination = Termination::Converged;
                break;
            }

            let reordered = settings.order_strategy.optimize(
                problem,
                &candidate.cache_set,
                &order,
                &mut order_ctx,
            );
            if reordered.peak_memory > problem.memory_limit {
                warn!(
                    iteration = iterations,
                    peak = reordered.peak_memory,
                    memory_limit = problem.memory_limit,
                    "reordered plan exceeds the memory limit, keeping previous plan"
                );
                termination = Termination::BudgetViolated;
                break;
            }

            cache_set = candidate.cache_set;
            order = reordered.order;
            score = candidate.score;
            peak_memory = reordered.peak_memory;
            history.push(score);

            debug!(
                iteration = iterations,
                score,
                peak = peak_memory,
                cached = cache_set.len(),
                "committed plan"
            );
        }

        let outcome = OptimizationOutcome {
            cache_set,
            order,
            score,
            peak_memory,
            elapsed: started.elapsed(),
            iterations,
            termination,
            history,
        };

        info!(
            score = outcome.score,
            peak = outcome.peak_memory,
            cached = outcome.cache_set.len(),
            iterations = outcome.iterations,
            termination = %outcome.termination,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "optimization finished"
        );

        Ok(outcome)
    }
}
