// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::TaskGraph;
use crate::engine::RuntimeOptions;
use crate::errors::{CachedagError, Result};
use crate::optimize::{OptimizerSettings, Problem};
use crate::types::{CacheStrategy, OrderStrategy};

/// Plan file as read from TOML, before validation.
///
/// ```toml
/// [plan]
/// memory_limit = 10
/// cache_strategy = "mkp"
/// order_strategy = "separator"
///
/// [runtime]
/// write_behind = true
///
/// [node.B]
/// size = 5
/// score = 3.0
/// after = ["A"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlanFile {
    pub plan: PlanSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    /// All nodes from `[node.<name>]`, keyed by name.
    #[serde(default)]
    pub node: BTreeMap<String, NodeConfig>,
}

/// `[plan]` section: budget and optimizer knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanSection {
    /// Hard ceiling on resident cached bytes.
    pub memory_limit: u64,

    #[serde(default)]
    pub cache_strategy: CacheStrategy,

    #[serde(default)]
    pub order_strategy: OrderStrategy,

    #[serde(default = "default_max_iters")]
    pub max_iters: usize,

    /// Fixes the random strategies for reproducible plans.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_annealing_iterations")]
    pub annealing_iterations: usize,

    /// Wall-clock limit of the exact knapsack search.
    #[serde(default = "default_solver_timeout_ms")]
    pub solver_timeout_ms: u64,
}

fn default_max_iters() -> usize {
    100
}

fn default_annealing_iterations() -> usize {
    10_000
}

fn default_solver_timeout_ms() -> u64 {
    10_000
}

/// `[runtime]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    #[serde(default = "default_true")]
    pub write_behind: bool,

    #[serde(default = "default_true")]
    pub async_release: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            write_behind: true,
            async_release: true,
        }
    }
}

/// `[node.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Estimated result size in bytes.
    #[serde(default)]
    pub size: u64,

    /// Estimated seconds saved if the result is cached.
    #[serde(default)]
    pub score: f64,

    /// Nodes whose results this node consumes.
    #[serde(default)]
    pub after: Vec<String>,
}

/// Values that replace fields of `[plan]`, e.g. from command-line flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    pub cache_strategy: Option<CacheStrategy>,
    pub order_strategy: Option<OrderStrategy>,
    pub memory_limit: Option<u64>,
    pub seed: Option<u64>,
}

/// A validated plan file: the graph is acyclic and every estimate usable.
///
/// Only obtainable through `TryFrom<RawPlanFile>`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    plan: PlanSection,
    runtime: RuntimeSection,
    graph: TaskGraph,
    sizes: Vec<u64>,
    scores: Vec<f64>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        plan: PlanSection,
        runtime: RuntimeSection,
        graph: TaskGraph,
        sizes: Vec<u64>,
        scores: Vec<f64>,
    ) -> Self {
        Self {
            plan,
            runtime,
            graph,
            sizes,
            scores,
        }
    }

    /// Replace `[plan]` fields with the set values of `overrides`.
    pub fn apply_overrides(&mut self, overrides: &PlanOverrides) -> Result<()> {
        if overrides.memory_limit == Some(0) {
            return Err(CachedagError::ConfigError(
                "memory limit override must be > 0".to_string(),
            ));
        }
        if let Some(strategy) = overrides.cache_strategy {
            self.plan.cache_strategy = strategy;
        }
        if let Some(strategy) = overrides.order_strategy {
            self.plan.order_strategy = strategy;
        }
        if let Some(limit) = overrides.memory_limit {
            self.plan.memory_limit = limit;
        }
        if overrides.seed.is_some() {
            self.plan.seed = overrides.seed;
        }
        Ok(())
    }

    pub fn plan(&self) -> &PlanSection {
        &self.plan
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Size estimates indexed by node id.
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Score estimates indexed by node id.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn memory_limit(&self) -> u64 {
        self.plan.memory_limit
    }

    pub fn problem(&self) -> Result<Problem<'_>> {
        Problem::new(&self.graph, &self.sizes, &self.scores, self.plan.memory_limit)
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            cache_strategy: self.plan.cache_strategy,
            order_strategy: self.plan.order_strategy,
            max_iters: self.plan.max_iters,
            seed: self.plan.seed,
            annealing_iterations: self.plan.annealing_iterations,
            solver_timeout: Duration::from_millis(self.plan.solver_timeout_ms),
        }
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            write_behind: self.runtime.write_behind,
            async_release: self.runtime.async_release,
        }
    }
}
