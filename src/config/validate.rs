// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::dag::TaskGraph;
use crate::errors::{CachedagError, Result};

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = CachedagError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;

        let mut builder = TaskGraph::builder();
        for (name, node) in &raw.node {
            builder.add_node(name, &node.after);
        }
        let graph = builder.build()?;

        let sizes = raw.node.values().map(|node| node.size).collect();
        let scores = raw.node.values().map(|node| node.score).collect();

        Ok(PlanFile::new_unchecked(raw.plan, raw.runtime, graph, sizes, scores))
    }
}

fn validate_raw_plan(cfg: &RawPlanFile) -> Result<()> {
    ensure_has_nodes(cfg)?;
    validate_plan_section(cfg)?;
    validate_node_estimates(cfg)?;
    validate_node_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_nodes(cfg: &RawPlanFile) -> Result<()> {
    if cfg.node.is_empty() {
        return Err(CachedagError::ConfigError(
            "plan must contain at least one [node.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_plan_section(cfg: &RawPlanFile) -> Result<()> {
    // Strategy names are validated during deserialization.

    if cfg.plan.memory_limit == 0 {
        return Err(CachedagError::ConfigError(
            "[plan].memory_limit must be > 0".to_string(),
        ));
    }
    if cfg.plan.max_iters == 0 {
        return Err(CachedagError::ConfigError(
            "[plan].max_iters must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_node_estimates(cfg: &RawPlanFile) -> Result<()> {
    for (name, node) in cfg.node.iter() {
        if !node.score.is_finite() || node.score < 0.0 {
            return Err(CachedagError::ConfigError(format!(
                "node '{}' has invalid score {} (must be finite and >= 0)",
                name, node.score
            )));
        }
    }
    Ok(())
}

fn validate_node_dependencies(cfg: &RawPlanFile) -> Result<()> {
    for (name, node) in cfg.node.iter() {
        for dep in node.after.iter() {
            if dep == name {
                return Err(CachedagError::ConfigError(format!(
                    "node '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.node.contains_key(dep) {
                return Err(CachedagError::ConfigError(format!(
                    "node '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawPlanFile) -> Result<()> {
    // Edge direction: dep -> node. For
    //   [node.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.node.keys() {
        graph.add_node(name.as_str());
    }

    for (name, node) in cfg.node.iter() {
        for dep in node.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(CachedagError::DagCycle(format!(
            "cycle detected in plan DAG involving node '{}'",
            cycle.node_id()
        ))),
    }
}
