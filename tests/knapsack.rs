// tests/knapsack.rs

use std::time::Duration;

use proptest::prelude::*;

use cachedag::optimize::cache::knapsack::{solve, KnapsackProblem};

fn brute_force(problem: &KnapsackProblem) -> f64 {
    let n = problem.item_count();
    let mut best = 0.0f64;
    for mask in 0u32..(1 << n) {
        let selected: Vec<bool> = (0..n).map(|i| mask & (1 << i) != 0).collect();
        if problem.is_feasible(&selected) {
            best = best.max(problem.profit_of(&selected));
        }
    }
    best
}

#[test]
fn single_row_picks_best_combination() {
    // Density order would take item 0 first; the optimum is items 1 and 2.
    let problem = KnapsackProblem::from_rows(
        vec![6.0, 5.0, 5.0],
        &[vec![6, 5, 5]],
        vec![10],
    );

    let solution = solve(&problem, Duration::from_secs(5));
    assert!(solution.proven_optimal);
    assert_eq!(solution.selected, vec![false, true, true]);
    assert_eq!(solution.profit, 10.0);
}

#[test]
fn every_row_constrains_the_selection() {
    let problem = KnapsackProblem::from_rows(
        vec![3.0, 3.0, 3.0],
        &[vec![5, 5, 0], vec![0, 5, 5]],
        vec![9, 9],
    );

    let solution = solve(&problem, Duration::from_secs(5));
    assert_eq!(solution.selected, vec![true, false, true]);
    assert_eq!(solution.profit, 6.0);
    assert!(problem.is_feasible(&solution.selected));
}

#[test]
fn oversized_and_weightless_items() {
    let mut problem = KnapsackProblem::new(vec![100.0, 1.0, 2.0], vec![10]);
    problem.add_weight(0, 0, 11);
    problem.add_weight(0, 1, 4);

    let solution = solve(&problem, Duration::from_secs(5));
    assert_eq!(solution.selected, vec![false, true, true]);
    assert_eq!(solution.profit, 3.0);
}

#[test]
fn zero_time_limit_still_returns_a_feasible_selection() {
    let weights: Vec<Vec<u64>> = (0..3)
        .map(|row| (0..24).map(|item| ((item * 7 + row * 3) % 11 + 1) as u64).collect())
        .collect();
    let profits: Vec<f64> = (0..24).map(|item| ((item * 5) % 13 + 1) as f64).collect();
    let problem = KnapsackProblem::from_rows(profits, &weights, vec![30, 30, 30]);

    let solution = solve(&problem, Duration::ZERO);
    assert!(problem.is_feasible(&solution.selected));
    assert!(solution.profit > 0.0);
}

fn instance() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<u64>>, Vec<u64>)> {
    (1usize..=10, 1usize..=4).prop_flat_map(|(items, rows)| {
        (
            proptest::collection::vec((1u32..20).prop_map(f64::from), items),
            proptest::collection::vec(proptest::collection::vec(0u64..15, items), rows),
            proptest::collection::vec(1u64..40, rows),
        )
    })
}

proptest! {
    #[test]
    fn branch_and_bound_is_exact((profits, weights, capacities) in instance()) {
        let problem = KnapsackProblem::from_rows(profits, &weights, capacities);
        let solution = solve(&problem, Duration::from_secs(5));

        prop_assert!(solution.proven_optimal);
        prop_assert!(problem.is_feasible(&solution.selected));
        prop_assert!((solution.profit - problem.profit_of(&solution.selected)).abs() < 1e-9);
        prop_assert!((solution.profit - brute_force(&problem)).abs() < 1e-9);
    }
}
