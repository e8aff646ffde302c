// src/engine/mod.rs

//! Execution runtime for an optimized plan.
//!
//! This module ties together:
//! - the plan to run (order + cache set), validated against the graph
//! - the sequential compute loop in [`runtime`]
//! - the write-behind and release workers in [`workers`]
//! - the report handed back to callers, including the measurements that
//!   feed the next optimization pass
//!
//! Failures while running a node are values ([`RunOutcome::Failed`]), not
//! errors: the caller always gets a report.

use std::time::Duration;

use crate::dag::{CacheSet, NodeId, TaskGraph};
use crate::errors::{CachedagError, Result};
use crate::optimize::OptimizationOutcome;

pub mod runtime;
pub mod workers;

pub use runtime::PlanRunner;
pub use workers::{ReleaseMessage, WorkerSummary, WriteMessage};

/// Which background workers the runtime starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Persist released cached results on a background writer.
    pub write_behind: bool,
    /// Drop released cached results on a background worker.
    pub async_release: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            write_behind: true,
            async_release: true,
        }
    }
}

/// A (order, cache set) pair ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    order: Vec<NodeId>,
    cache_set: CacheSet,
}

impl ExecutionPlan {
    /// Check that `order` runs every node exactly once and that no sink is
    /// cached.
    ///
    /// The order is deliberately not checked for topological validity; a
    /// dependency that has not run yet is reported by the runtime as
    /// [`FailureReason::MissingDependency`].
    pub fn new(graph: &TaskGraph, order: Vec<NodeId>, cache_set: CacheSet) -> Result<Self> {
        graph
            .check_permutation(&order)
            .map_err(|err| CachedagError::InvalidPlan(err.to_string()))?;

        for id in cache_set.iter() {
            if id.index() >= graph.len() {
                return Err(CachedagError::InvalidPlan(format!(
                    "cache set refers to unknown node {id}"
                )));
            }
            if graph.is_sink(id) {
                return Err(CachedagError::InvalidPlan(format!(
                    "sink '{}' must be persisted and cannot be cached",
                    graph.name(id)
                )));
            }
        }

        Ok(Self { order, cache_set })
    }

    pub fn from_outcome(graph: &TaskGraph, outcome: &OptimizationOutcome) -> Result<Self> {
        Self::new(graph, outcome.order.to_vec(), outcome.cache_set.clone())
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn cache_set(&self) -> &CacheSet {
        &self.cache_set
    }
}

/// Why a node could not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// An input was neither resident nor persisted.
    MissingDependency { dependency: NodeId },
    Execution(String),
    Persistence(String),
    Load(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The schedule stopped at `node`.
    Failed { node: NodeId, reason: FailureReason },
}

/// A measurement taken while running, consumed by the statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    ResultSize { node: NodeId, bytes: u64 },
    Persisted { node: NodeId, elapsed: Duration },
    Loaded { node: NodeId, elapsed: Duration },
}

#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub outcome: RunOutcome,
    /// Nodes that finished, in execution order.
    pub executed: Vec<NodeId>,
    /// Highest resident total of cached results observed.
    pub peak_memory: u64,
    /// Resident total right after each executed node.
    pub memory_history: Vec<u64>,
    pub elapsed: Duration,
    pub samples: Vec<Sample>,
    /// Background writes that failed; the run itself is unaffected.
    pub persist_failures: Vec<(NodeId, String)>,
    pub persisted_in_background: usize,
    pub released_in_background: usize,
}

impl ExecutionReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}
