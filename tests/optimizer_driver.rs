// tests/optimizer_driver.rs

use std::time::Duration;

use proptest::prelude::*;

use cachedag::errors::CachedagError;
use cachedag::optimize::{AlternatingOptimizer, OptimizerSettings, Termination};
use cachedag::types::{CacheStrategy, OrderStrategy};
use cachedag_test_utils::builders::{layered_fixture, Fixture};
use cachedag_test_utils::init_tracing;

fn settings(cache: CacheStrategy, order: OrderStrategy) -> OptimizerSettings {
    OptimizerSettings {
        cache_strategy: cache,
        order_strategy: order,
        max_iters: 100,
        seed: Some(5),
        annealing_iterations: 500,
        solver_timeout: Duration::from_secs(5),
    }
}

#[test]
fn converges_once_the_score_stops_improving() {
    init_tracing();
    let f = Fixture::diamond();
    let problem = f.problem(10);
    let optimizer = AlternatingOptimizer::new(settings(CacheStrategy::Mkp, OrderStrategy::None));

    let outcome = optimizer
        .optimize(&problem, f.order(&["A", "B", "C", "D"]))
        .expect("valid initial order");

    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.history, vec![6.0]);
    assert_eq!(outcome.cache_set, f.set(&["B", "C"]));
    assert_eq!(outcome.score, 6.0);
    assert_eq!(outcome.peak_memory, 10);
    assert_eq!(outcome.order, f.order(&["A", "B", "C", "D"]));
}

#[test]
fn over_budget_round_is_reverted() {
    init_tracing();
    let f = Fixture::diamond();
    let problem = f.problem(9);
    let optimizer = AlternatingOptimizer::new(settings(CacheStrategy::All, OrderStrategy::None));

    let outcome = optimizer
        .optimize(&problem, f.order(&["A", "B", "C", "D"]))
        .expect("valid initial order");

    assert_eq!(outcome.termination, Termination::BudgetViolated);
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.cache_set.is_empty());
    assert_eq!(outcome.score, 0.0);
    assert_eq!(outcome.peak_memory, 0);
    assert!(outcome.history.is_empty());
}

#[test]
fn stops_at_the_iteration_limit() {
    let f = Fixture::diamond();
    let problem = f.problem(10);
    let mut s = settings(CacheStrategy::Greedy, OrderStrategy::MaDfs);
    s.max_iters = 1;

    let outcome = AlternatingOptimizer::new(s)
        .optimize(&problem, f.order(&["A", "B", "C", "D"]))
        .expect("valid initial order");

    assert_eq!(outcome.termination, Termination::IterationLimit);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.score, 6.0);
    assert_eq!(outcome.order, f.order(&["A", "C", "B", "D"]));
}

#[test]
fn caching_nothing_converges_immediately() {
    let f = Fixture::diamond();
    let problem = f.problem(10);
    let outcome = AlternatingOptimizer::new(settings(CacheStrategy::None, OrderStrategy::SimulatedAnnealing))
        .optimize(&problem, f.order(&["A", "B", "C", "D"]))
        .expect("valid initial order");

    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.cache_set.is_empty());
}

#[test]
fn rejects_an_invalid_initial_order() {
    let f = Fixture::diamond();
    let other = Fixture::chain();
    let problem = f.problem(10);

    let result = AlternatingOptimizer::new(OptimizerSettings::default())
        .optimize(&problem, other.order(&["A", "B", "C"]));

    match result {
        Err(CachedagError::InvalidOrder(_)) => {}
        other => panic!("Expected InvalidOrder error, got: {:?}", other.map(|o| o.score)),
    }
}

#[test]
fn default_settings() {
    let settings = OptimizerSettings::default();
    assert_eq!(settings.cache_strategy, CacheStrategy::Mkp);
    assert_eq!(settings.order_strategy, OrderStrategy::SimulatedAnnealing);
    assert_eq!(settings.max_iters, 100);
    assert_eq!(settings.annealing_iterations, 10_000);
    assert_eq!(settings.solver_timeout, Duration::from_secs(10));
}

#[test]
fn termination_is_human_readable() {
    assert_eq!(Termination::Converged.to_string(), "converged");
    assert_eq!(Termination::BudgetViolated.to_string(), "budget violated (reverted)");
    assert_eq!(Termination::IterationLimit.to_string(), "iteration limit reached");
}

fn instance() -> impl Strategy<Value = (Vec<u64>, Vec<f64>, Vec<Vec<usize>>, u64)> {
    (2usize..=10).prop_flat_map(|n| {
        (
            proptest::collection::vec(1u64..20, n),
            proptest::collection::vec((0u32..10).prop_map(f64::from), n),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            1u64..60,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn committed_plans_are_feasible_and_scores_increase(
        (sizes, scores, deps, limit) in instance(),
        order_ix in 0usize..4,
    ) {
        let order_strategy = [
            OrderStrategy::None,
            OrderStrategy::MaDfs,
            OrderStrategy::SimulatedAnnealing,
            OrderStrategy::Separator,
        ][order_ix];
        let f = layered_fixture(&sizes, &scores, &deps);
        let problem = f.problem(limit);

        let outcome = AlternatingOptimizer::new(settings(CacheStrategy::Mkp, order_strategy))
            .optimize(&problem, f.graph.topological_order())
            .unwrap();

        prop_assert!(outcome.peak_memory <= limit);
        prop_assert!(f.graph.check_order(&outcome.order).is_ok());
        prop_assert_eq!(outcome.peak_memory, problem.peak_memory(&outcome.order, &outcome.cache_set));
        prop_assert!(outcome.history.windows(2).all(|w| w[1] > w[0]));
        prop_assert!(outcome.iterations >= 1 && outcome.iterations <= 100);
        prop_assert_eq!(outcome.history.last().copied().unwrap_or(0.0), outcome.score);
    }
}
