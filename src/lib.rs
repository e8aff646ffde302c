// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod optimize;
pub mod stats;
pub mod store;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PlanFile;
use crate::optimize::{AlternatingOptimizer, OptimizationOutcome};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the plan file, then either prints the DAG
/// (`--dry-run`) or optimizes it and prints the chosen plan.
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut plan = load_and_validate(&config_path)?;
    plan.apply_overrides(&args.overrides())?;
    info!(path = %config_path.display(), nodes = plan.graph().len(), "plan file loaded");

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let outcome = optimize_plan(&plan)?;
    print_outcome(&plan, &outcome);
    Ok(())
}

/// Run the alternating optimizer configured by `plan`, starting from the
/// graph's default topological order.
pub fn optimize_plan(plan: &PlanFile) -> errors::Result<OptimizationOutcome> {
    let problem = plan.problem()?;
    let optimizer = AlternatingOptimizer::new(plan.optimizer_settings());
    optimizer.optimize(&problem, plan.graph().topological_order())
}

fn print_outcome(plan: &PlanFile, outcome: &OptimizationOutcome) {
    let graph = plan.graph();

    println!("cachedag plan");
    println!("  termination: {}", outcome.termination);
    println!("  iterations: {}", outcome.iterations);
    println!("  score: {:.3}", outcome.score);
    println!(
        "  peak memory: {} / {} bytes",
        outcome.peak_memory,
        plan.memory_limit()
    );
    println!("  optimization time: {:.3?}", outcome.elapsed);
    println!();
    println!("cache set ({}): {:?}", outcome.cache_set.len(), outcome.cache_set.names(graph));
    println!("order: {:?}", outcome.order.names(graph));
}

/// Simple dry-run output: print the strategies and every node with its
/// estimates and dependencies.
fn print_dry_run(plan: &PlanFile) {
    let graph = plan.graph();
    let section = plan.plan();

    println!("cachedag dry-run");
    println!("  plan.memory_limit = {}", section.memory_limit);
    println!("  plan.cache_strategy = {}", section.cache_strategy);
    println!("  plan.order_strategy = {}", section.order_strategy);
    println!("  plan.max_iters = {}", section.max_iters);
    if let Some(seed) = section.seed {
        println!("  plan.seed = {}", seed);
    }
    println!();

    println!("nodes ({}):", graph.len());
    for id in graph.nodes() {
        println!("  - {}", graph.name(id));
        println!("      size: {}", plan.sizes()[id.index()]);
        println!("      score: {}", plan.scores()[id.index()]);
        let deps = graph.names(graph.dependencies(id));
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        if graph.is_sink(id) {
            println!("      sink: true");
        }
    }

    debug!("dry-run complete (no optimization)");
}
