// tests/cache_strategies.rs

use std::time::Duration;

use proptest::prelude::*;

use cachedag::dag::{NodeId, NodeSet};
use cachedag::optimize::cache::{greedy, heuristic, mkp};
use cachedag::optimize::{Problem, SelectionContext};
use cachedag::types::CacheStrategy;
use cachedag_test_utils::builders::{layered_fixture, Fixture};

const BOUNDED: [CacheStrategy; 5] = [
    CacheStrategy::None,
    CacheStrategy::Greedy,
    CacheStrategy::Random,
    CacheStrategy::Heuristic,
    CacheStrategy::Mkp,
];

fn ctx() -> SelectionContext {
    SelectionContext::new(Some(11), Duration::from_secs(5))
}

#[test]
fn diamond_budget_ten_caches_both_branches() {
    let f = Fixture::diamond();
    let problem = f.problem(10);
    let order = f.order(&["A", "B", "C", "D"]);
    let excluded = problem.excluded_nodes();

    assert_eq!(excluded, f.set(&["A", "D"]), "zero-score source and sink are excluded");

    for strategy in [
        CacheStrategy::All,
        CacheStrategy::Greedy,
        CacheStrategy::Random,
        CacheStrategy::Heuristic,
        CacheStrategy::Mkp,
    ] {
        let selection = strategy.select(&problem, &order, &excluded, &mut ctx());
        assert_eq!(selection.cache_set, f.set(&["B", "C"]), "{strategy}");
        assert_eq!(selection.score, 6.0, "{strategy}");
        assert_eq!(selection.peak_memory, 10, "{strategy}");
    }
}

#[test]
fn none_caches_nothing() {
    let f = Fixture::diamond();
    let problem = f.problem(10);
    let order = f.order(&["A", "B", "C", "D"]);

    let selection = CacheStrategy::None.select(&problem, &order, &problem.excluded_nodes(), &mut ctx());
    assert!(selection.cache_set.is_empty());
    assert_eq!(selection.score, 0.0);
    assert_eq!(selection.peak_memory, 0);
}

#[test]
fn all_ignores_the_budget() {
    let f = Fixture::diamond();
    let problem = f.problem(9);
    let order = f.order(&["A", "B", "C", "D"]);

    let selection = CacheStrategy::All.select(&problem, &order, &problem.excluded_nodes(), &mut ctx());
    assert_eq!(selection.cache_set, f.set(&["B", "C"]));
    assert_eq!(selection.peak_memory, 10);
}

#[test]
fn tight_budget_keeps_one_branch() {
    let f = Fixture::diamond();
    let problem = f.problem(9);
    let order = f.order(&["A", "B", "C", "D"]);
    let excluded = problem.excluded_nodes();

    for strategy in [CacheStrategy::Greedy, CacheStrategy::Heuristic, CacheStrategy::Mkp] {
        let selection = strategy.select(&problem, &order, &excluded, &mut ctx());
        assert_eq!(selection.cache_set.len(), 1, "{strategy}");
        assert_eq!(selection.score, 3.0, "{strategy}");
        assert!(selection.peak_memory <= 9, "{strategy}");
    }
}

#[test]
fn nodes_larger_than_the_budget_are_never_cached() {
    let f = Fixture::new(&[
        ("big", 50, 100.0, &[]),
        ("small", 4, 1.0, &["big"]),
        ("out", 1, 0.0, &["small"]),
    ]);
    let problem = f.problem(10);
    let order = f.order(&["big", "small", "out"]);
    let excluded = problem.excluded_nodes();

    assert!(excluded.contains(f.id("big")));
    for strategy in BOUNDED {
        let selection = strategy.select(&problem, &order, &excluded, &mut ctx());
        assert!(!selection.cache_set.contains(f.id("big")), "{strategy}");
        assert!(!selection.cache_set.contains(f.id("out")), "{strategy}");
    }
}

#[test]
fn heuristic_prefers_high_score_per_byte() {
    let f = Fixture::new(&[
        ("X", 10, 10.0, &[]),
        ("Y", 5, 1.0, &[]),
        ("Z", 1, 0.0, &["X", "Y"]),
    ]);
    let problem = f.problem(10);
    let order = f.order(&["X", "Y", "Z"]);
    let excluded = problem.excluded_nodes();

    assert_eq!(
        heuristic::ranked_candidates(&problem, &order, &excluded),
        vec![f.id("X"), f.id("Y")]
    );

    let selection = CacheStrategy::Heuristic.select(&problem, &order, &excluded, &mut ctx());
    assert_eq!(selection.cache_set, f.set(&["X"]));
    assert_eq!(selection.score, 10.0);
}

#[test]
fn greedy_sweeps_respect_the_budget_on_a_chain() {
    let f = Fixture::chain();
    let problem = f.problem(5);
    let order = f.order(&["A", "B", "C"]);
    let excluded = problem.excluded_nodes();

    let forward = greedy::forward_sweep(&problem, &order, &excluded);
    let backward = greedy::backward_sweep(&problem, &order, &excluded);

    // B runs while A is still resident, so only one of them fits.
    assert_eq!(forward, f.set(&["A"]));
    assert_eq!(backward, f.set(&["B"]));
    assert!(problem.peak_memory(&order, &forward) <= 5);
    assert!(problem.peak_memory(&order, &backward) <= 5);
}

#[test]
fn random_is_reproducible_with_a_seed() {
    let sizes = vec![4, 3, 6, 2, 5, 1, 3, 1];
    let scores = vec![2.0, 1.0, 5.0, 3.0, 1.0, 4.0, 2.0, 1.0];
    let deps = vec![vec![], vec![0], vec![0], vec![1, 2], vec![1], vec![3, 4], vec![2], vec![5, 6]];
    let f = layered_fixture(&sizes, &scores, &deps);
    let problem = f.problem(8);
    let order = f.graph.topological_order();
    let excluded = problem.excluded_nodes();

    let a = CacheStrategy::Random.select(&problem, &order, &excluded, &mut ctx());
    let b = CacheStrategy::Random.select(&problem, &order, &excluded, &mut ctx());
    assert_eq!(a, b);
    assert!(a.peak_memory <= 8);
}

#[test]
fn deterministic_strategies_are_idempotent() {
    let sizes = vec![4, 3, 6, 2, 5, 1, 3, 1];
    let scores = vec![2.0, 1.0, 5.0, 3.0, 1.0, 4.0, 2.0, 1.0];
    let deps = vec![vec![], vec![0], vec![0], vec![1, 2], vec![1], vec![3, 4], vec![2], vec![5, 6]];
    let f = layered_fixture(&sizes, &scores, &deps);
    let problem = f.problem(8);
    let order = f.graph.topological_order();
    let excluded = problem.excluded_nodes();

    for strategy in [
        CacheStrategy::All,
        CacheStrategy::None,
        CacheStrategy::Greedy,
        CacheStrategy::Heuristic,
        CacheStrategy::Mkp,
    ] {
        let first = strategy.select(&problem, &order, &excluded, &mut SelectionContext::default());
        let second = strategy.select(&problem, &order, &excluded, &mut SelectionContext::default());
        assert_eq!(first, second, "{strategy}");
    }
}

#[test]
fn maximal_sets_capture_over_budget_points() {
    let f = Fixture::diamond();
    let problem = f.problem(9);
    let order = f.order(&["A", "B", "C", "D"]);

    let sets = mkp::find_maximal_sets(&problem, &order, &problem.excluded_nodes());
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].nodes(), &[f.id("B"), f.id("C")]);
    assert_eq!(sets[0].total_size(&problem), 10);

    let roomy = f.problem(10);
    assert!(mkp::find_maximal_sets(&roomy, &order, &roomy.excluded_nodes()).is_empty());
}

#[test]
fn mkp_without_conflicts_caches_every_eligible_node() {
    let f = Fixture::chain();
    let problem = f.problem(100);
    let order = f.order(&["A", "B", "C"]);

    let selection = CacheStrategy::Mkp.select(&problem, &order, &problem.excluded_nodes(), &mut ctx());
    assert_eq!(selection.cache_set, f.set(&["A", "B"]));
    assert_eq!(selection.score, 2.0);
}

/// Best score over every budget-feasible subset of the eligible nodes.
fn brute_force_best(problem: &Problem<'_>, order: &[NodeId]) -> f64 {
    let eligible: Vec<NodeId> = problem
        .graph
        .nodes()
        .filter(|&id| !problem.excluded_nodes().contains(id))
        .collect();

    let mut best = 0.0f64;
    for mask in 0u32..(1 << eligible.len()) {
        let set = NodeSet::from_nodes(
            problem.graph.len(),
            eligible
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &id)| id),
        );
        if problem.peak_memory(order, &set) <= problem.memory_limit {
            best = best.max(problem.aggregate_score(&set));
        }
    }
    best
}

fn instance_strategy() -> impl Strategy<Value = (Vec<u64>, Vec<f64>, Vec<Vec<usize>>, u64)> {
    (2usize..=9).prop_flat_map(|n| {
        (
            proptest::collection::vec(0u64..20, n),
            proptest::collection::vec((0u32..10).prop_map(f64::from), n),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            1u64..40,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mkp_matches_exhaustive_search((sizes, scores, deps, limit) in instance_strategy()) {
        let f = layered_fixture(&sizes, &scores, &deps);
        let problem = f.problem(limit);
        let order = f.graph.topological_order();

        let selection = CacheStrategy::Mkp.select(&problem, &order, &problem.excluded_nodes(), &mut ctx());
        prop_assert!(selection.peak_memory <= limit);
        prop_assert!((selection.score - brute_force_best(&problem, &order)).abs() < 1e-6);
    }

    #[test]
    fn bounded_strategies_stay_within_budget((sizes, scores, deps, limit) in instance_strategy()) {
        let f = layered_fixture(&sizes, &scores, &deps);
        let problem = f.problem(limit);
        let order = f.graph.topological_order();
        let excluded = problem.excluded_nodes();

        for strategy in BOUNDED {
            let selection = strategy.select(&problem, &order, &excluded, &mut ctx());
            prop_assert!(selection.peak_memory <= limit, "{} exceeded the budget", strategy);
            prop_assert!(selection.cache_set.iter().all(|id| !excluded.contains(id)));
            prop_assert!(problem.check_cache_set(&selection.cache_set).is_ok());
        }
    }

    #[test]
    fn mkp_score_never_drops_when_the_budget_grows(
        (sizes, scores, deps, limit) in instance_strategy(),
        extra in 0u64..20,
    ) {
        let f = layered_fixture(&sizes, &scores, &deps);
        let order = f.graph.topological_order();

        let tight = f.problem(limit);
        let loose = f.problem(limit + extra);
        let a = CacheStrategy::Mkp.select(&tight, &order, &tight.excluded_nodes(), &mut ctx());
        let b = CacheStrategy::Mkp.select(&loose, &order, &loose.excluded_nodes(), &mut ctx());
        prop_assert!(b.score + 1e-6 >= a.score);
    }
}
