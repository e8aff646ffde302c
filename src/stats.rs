// src/stats.rs

//! Rolling measurements that turn past runs into size and score estimates.
//!
//! Caching a result saves one durable write plus one read per consumer, so
//! a node's estimated score is its average persist time plus its successor
//! count times its average load time.

use std::collections::VecDeque;
use std::time::Duration;

use crate::dag::{NodeId, TaskGraph};
use crate::engine::{ExecutionReport, Sample};

/// Number of most recent samples kept per measurement.
pub const DEFAULT_WINDOW: usize = 10;

/// Fixed-capacity window of the most recent samples.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the retained samples, 0 when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct NodeStatistics {
    sizes: RollingWindow,
    persist_secs: RollingWindow,
    load_secs: RollingWindow,
}

impl NodeStatistics {
    pub fn new(window: usize) -> Self {
        Self {
            sizes: RollingWindow::new(window),
            persist_secs: RollingWindow::new(window),
            load_secs: RollingWindow::new(window),
        }
    }

    pub fn record_size(&mut self, bytes: u64) {
        self.sizes.push(bytes as f64);
    }

    pub fn record_persist(&mut self, elapsed: Duration) {
        self.persist_secs.push(elapsed.as_secs_f64());
    }

    pub fn record_load(&mut self, elapsed: Duration) {
        self.load_secs.push(elapsed.as_secs_f64());
    }

    /// Average result size, rounded to whole bytes.
    pub fn average_size(&self) -> u64 {
        self.sizes.average().round() as u64
    }

    pub fn average_persist_secs(&self) -> f64 {
        self.persist_secs.average()
    }

    pub fn average_load_secs(&self) -> f64 {
        self.load_secs.average()
    }

    pub fn score(&self, successors: usize) -> f64 {
        self.average_persist_secs() + successors as f64 * self.average_load_secs()
    }
}

/// Per-node statistics for one graph.
#[derive(Debug, Clone)]
pub struct StatisticsTable {
    nodes: Vec<NodeStatistics>,
    successors: Vec<usize>,
}

impl StatisticsTable {
    pub fn new(graph: &TaskGraph) -> Self {
        Self::with_window(graph, DEFAULT_WINDOW)
    }

    pub fn with_window(graph: &TaskGraph, window: usize) -> Self {
        Self {
            nodes: graph.nodes().map(|_| NodeStatistics::new(window)).collect(),
            successors: graph.nodes().map(|id| graph.out_degree(id)).collect(),
        }
    }

    pub fn node(&self, id: NodeId) -> &NodeStatistics {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeStatistics {
        &mut self.nodes[id.index()]
    }

    pub fn record(&mut self, sample: &Sample) {
        match *sample {
            Sample::ResultSize { node, bytes } => self.node_mut(node).record_size(bytes),
            Sample::Persisted { node, elapsed } => self.node_mut(node).record_persist(elapsed),
            Sample::Loaded { node, elapsed } => self.node_mut(node).record_load(elapsed),
        }
    }

    pub fn ingest(&mut self, report: &ExecutionReport) {
        for sample in &report.samples {
            self.record(sample);
        }
    }

    /// Size estimate per node, indexed by id.
    pub fn sizes(&self) -> Vec<u64> {
        self.nodes.iter().map(NodeStatistics::average_size).collect()
    }

    /// Score estimate per node, indexed by id.
    pub fn scores(&self) -> Vec<f64> {
        self.nodes
            .iter()
            .zip(&self.successors)
            .map(|(stats, &successors)| stats.score(successors))
            .collect()
    }
}
