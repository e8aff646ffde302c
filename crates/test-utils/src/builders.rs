#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Write as _;

use cachedag::config::{NodeConfig, PlanFile, PlanSection, RawPlanFile, RuntimeSection};
use cachedag::dag::{ExecutionOrder, NodeId, NodeSet, TaskGraph};
use cachedag::optimize::Problem;
use cachedag::types::{CacheStrategy, OrderStrategy};

/// Builder for `PlanFile` to simplify test setup.
///
/// Can also render itself as TOML for tests that go through the loader.
pub struct PlanFileBuilder {
    plan: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new(memory_limit: u64) -> Self {
        Self {
            plan: RawPlanFile {
                plan: PlanSection {
                    memory_limit,
                    cache_strategy: CacheStrategy::default(),
                    order_strategy: OrderStrategy::default(),
                    max_iters: 100,
                    seed: Some(7),
                    annealing_iterations: 2_000,
                    solver_timeout_ms: 10_000,
                },
                runtime: RuntimeSection::default(),
                node: BTreeMap::new(),
            },
        }
    }

    pub fn with_node(mut self, name: &str, node: NodeConfig) -> Self {
        self.plan.node.insert(name.to_string(), node);
        self
    }

    pub fn cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.plan.plan.cache_strategy = strategy;
        self
    }

    pub fn order_strategy(mut self, strategy: OrderStrategy) -> Self {
        self.plan.plan.order_strategy = strategy;
        self
    }

    pub fn max_iters(mut self, max_iters: usize) -> Self {
        self.plan.plan.max_iters = max_iters;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.plan.plan.seed = seed;
        self
    }

    pub fn write_behind(mut self, val: bool) -> Self {
        self.plan.runtime.write_behind = val;
        self
    }

    pub fn async_release(mut self, val: bool) -> Self {
        self.plan.runtime.async_release = val;
        self
    }

    pub fn raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }

    /// Render as a plan file.
    pub fn to_toml(&self) -> String {
        let p = &self.plan.plan;
        let mut out = String::new();
        writeln!(out, "[plan]").unwrap();
        writeln!(out, "memory_limit = {}", p.memory_limit).unwrap();
        writeln!(out, "cache_strategy = \"{}\"", p.cache_strategy).unwrap();
        writeln!(out, "order_strategy = \"{}\"", p.order_strategy).unwrap();
        writeln!(out, "max_iters = {}", p.max_iters).unwrap();
        if let Some(seed) = p.seed {
            writeln!(out, "seed = {seed}").unwrap();
        }
        writeln!(out, "annealing_iterations = {}", p.annealing_iterations).unwrap();
        writeln!(out, "solver_timeout_ms = {}", p.solver_timeout_ms).unwrap();
        writeln!(out).unwrap();

        writeln!(out, "[runtime]").unwrap();
        writeln!(out, "write_behind = {}", self.plan.runtime.write_behind).unwrap();
        writeln!(out, "async_release = {}", self.plan.runtime.async_release).unwrap();

        for (name, node) in &self.plan.node {
            writeln!(out).unwrap();
            writeln!(out, "[node.{name}]").unwrap();
            writeln!(out, "size = {}", node.size).unwrap();
            writeln!(out, "score = {:?}", node.score).unwrap();
            let after: Vec<String> = node.after.iter().map(|d| format!("\"{d}\"")).collect();
            writeln!(out, "after = [{}]", after.join(", ")).unwrap();
        }
        out
    }
}

/// Builder for `NodeConfig`.
pub struct NodeConfigBuilder {
    node: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn new(size: u64, score: f64) -> Self {
        Self {
            node: NodeConfig {
                size,
                score,
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.node.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> NodeConfig {
        self.node
    }
}

/// A graph with per-node estimates, owned so tests can borrow a `Problem`.
pub struct Fixture {
    pub graph: TaskGraph,
    pub sizes: Vec<u64>,
    pub scores: Vec<f64>,
}

impl Fixture {
    /// `nodes` are `(name, size, score, after)` in id order.
    pub fn new(nodes: &[(&str, u64, f64, &[&str])]) -> Self {
        let mut builder = TaskGraph::builder();
        for &(name, _, _, after) in nodes {
            builder.add_node(name, after);
        }
        Self {
            graph: builder.build().expect("fixture graph must be valid"),
            sizes: nodes.iter().map(|n| n.1).collect(),
            scores: nodes.iter().map(|n| n.2).collect(),
        }
    }

    /// Edges A->B, A->C, B->D, C->D; sizes 10/5/5/1; scores 0/3/3/0.
    pub fn diamond() -> Self {
        Self::new(&[
            ("A", 10, 0.0, &[]),
            ("B", 5, 3.0, &["A"]),
            ("C", 5, 3.0, &["A"]),
            ("D", 1, 0.0, &["B", "C"]),
        ])
    }

    /// A -> B -> C, every node of size 5 and score 1.
    pub fn chain() -> Self {
        Self::new(&[
            ("A", 5, 1.0, &[]),
            ("B", 5, 1.0, &["A"]),
            ("C", 5, 1.0, &["B"]),
        ])
    }

    pub fn problem(&self, memory_limit: u64) -> Problem<'_> {
        Problem::new(&self.graph, &self.sizes, &self.scores, memory_limit)
            .expect("fixture estimates must be valid")
    }

    pub fn id(&self, name: &str) -> NodeId {
        self.graph.id(name).expect("unknown fixture node")
    }

    pub fn order(&self, names: &[&str]) -> ExecutionOrder {
        ExecutionOrder::from_names(&self.graph, names).expect("invalid fixture order")
    }

    pub fn set(&self, names: &[&str]) -> NodeSet {
        NodeSet::from_nodes(self.graph.len(), names.iter().map(|n| self.id(n)))
    }
}

/// Random DAG description: node `i` may only depend on nodes `< i`.
///
/// `deps[i]` holds arbitrary indices that are reduced modulo `i`.
pub fn layered_fixture(sizes: &[u64], scores: &[f64], deps: &[Vec<usize>]) -> Fixture {
    let n = sizes.len();
    let names: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
    let mut builder = TaskGraph::builder();
    for i in 0..n {
        let mut after: Vec<&str> = Vec::new();
        if i > 0 {
            for d in deps.get(i).into_iter().flatten() {
                let dep = names[d % i].as_str();
                if !after.contains(&dep) {
                    after.push(dep);
                }
            }
        }
        builder.add_node(&names[i], &after);
    }
    Fixture {
        graph: builder.build().expect("layered graph is acyclic"),
        sizes: sizes.to_vec(),
        scores: scores.to_vec(),
    }
}
