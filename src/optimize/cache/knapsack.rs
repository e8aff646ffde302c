// src/optimize/cache/knapsack.rs

//! Exact 0/1 multidimensional knapsack solver (branch and bound).
//!
//! Items are explored in decreasing order of profit per unit of surrogate
//! weight, where an item's surrogate weight is the sum over rows of its
//! weight divided by the row capacity. The surrogate relaxation of the
//! remaining subproblem, solved fractionally, bounds every branch. The
//! search is anytime: when the time limit expires the best feasible
//! selection found so far is returned.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Deadline checks are amortised over this many explored nodes.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// A multidimensional knapsack instance with sparse weight columns.
#[derive(Debug, Clone)]
pub struct KnapsackProblem {
    profits: Vec<f64>,
    /// For every item, its non-zero `(row, weight)` entries.
    columns: Vec<Vec<(usize, u64)>>,
    capacities: Vec<u64>,
}

impl KnapsackProblem {
    /// Instance with the given item profits and row capacities and no
    /// weights yet.
    pub fn new(profits: Vec<f64>, capacities: Vec<u64>) -> Self {
        let columns = vec![Vec::new(); profits.len()];
        Self {
            profits,
            columns,
            capacities,
        }
    }

    /// Instance from a dense `rows x items` weight matrix.
    pub fn from_rows(profits: Vec<f64>, weights: &[Vec<u64>], capacities: Vec<u64>) -> Self {
        let mut problem = Self::new(profits, capacities);
        for (row, row_weights) in weights.iter().enumerate() {
            for (item, &weight) in row_weights.iter().enumerate() {
                problem.add_weight(row, item, weight);
            }
        }
        problem
    }

    pub fn add_weight(&mut self, row: usize, item: usize, weight: u64) {
        if weight > 0 {
            self.columns[item].push((row, weight));
        }
    }

    pub fn item_count(&self) -> usize {
        self.profits.len()
    }

    pub fn row_count(&self) -> usize {
        self.capacities.len()
    }

    /// Whether `selected` satisfies every row.
    pub fn is_feasible(&self, selected: &[bool]) -> bool {
        let mut used = vec![0u64; self.capacities.len()];
        for (item, column) in self.columns.iter().enumerate() {
            if selected[item] {
                for &(row, weight) in column {
                    used[row] += weight;
                }
            }
        }
        used.iter().zip(&self.capacities).all(|(u, c)| u <= c)
    }

    pub fn profit_of(&self, selected: &[bool]) -> f64 {
        self.profits
            .iter()
            .zip(selected)
            .filter(|(_, chosen)| **chosen)
            .map(|(p, _)| *p)
            .sum()
    }
}

/// Outcome of [`solve`].
#[derive(Debug, Clone)]
pub struct KnapsackSolution {
    /// Selection flag per item, in the problem's item order.
    pub selected: Vec<bool>,
    pub profit: f64,
    /// `false` when the time limit cut the search short.
    pub proven_optimal: bool,
    /// Branch-and-bound nodes visited.
    pub explored: u64,
}

#[derive(Debug)]
struct Candidate {
    item: usize,
    profit: f64,
    surrogate: f64,
    column: Vec<(usize, u64)>,
}

struct Search<'a> {
    candidates: &'a [Candidate],
    capacities: &'a [u64],
    /// Profit still available from `candidates[k..]`.
    suffix_profit: Vec<f64>,
    remaining: Vec<u64>,
    chosen: Vec<bool>,
    profit: f64,
    best: Vec<bool>,
    best_profit: f64,
    deadline: Option<Instant>,
    explored: u64,
    timed_out: bool,
}

/// Maximise total profit subject to every row, within `time_limit`.
pub fn solve(problem: &KnapsackProblem, time_limit: Duration) -> KnapsackSolution {
    let deadline = Instant::now().checked_add(time_limit);
    let capacities = &problem.capacities;

    let mut selected = vec![false; problem.item_count()];
    let mut base_profit = 0.0;
    let mut candidates = Vec::new();

    for (item, column) in problem.columns.iter().enumerate() {
        let profit = problem.profits[item];
        if profit <= 0.0 {
            continue;
        }
        if column.iter().any(|&(row, weight)| weight > capacities[row]) {
            continue;
        }
        if column.is_empty() {
            // Weightless items are always worth taking.
            selected[item] = true;
            base_profit += profit;
            continue;
        }
        let surrogate = column
            .iter()
            .map(|&(row, weight)| weight as f64 / capacities[row] as f64)
            .sum();
        candidates.push(Candidate {
            item,
            profit,
            surrogate,
            column: column.clone(),
        });
    }

    candidates.sort_by(|a, b| {
        let da = a.profit / a.surrogate;
        let db = b.profit / b.surrogate;
        db.partial_cmp(&da)
            .unwrap_or(Ordering::Equal)
            .then(a.item.cmp(&b.item))
    });

    let mut suffix_profit = vec![0.0; candidates.len() + 1];
    for k in (0..candidates.len()).rev() {
        suffix_profit[k] = suffix_profit[k + 1] + candidates[k].profit;
    }

    let mut search = Search {
        candidates: &candidates,
        capacities,
        suffix_profit,
        remaining: capacities.clone(),
        chosen: vec![false; candidates.len()],
        profit: 0.0,
        best: vec![false; candidates.len()],
        best_profit: 0.0,
        deadline,
        explored: 0,
        timed_out: false,
    };
    search.seed_with_greedy();
    search.descend(0);

    for (k, candidate) in candidates.iter().enumerate() {
        if search.best[k] {
            selected[candidate.item] = true;
        }
    }

    KnapsackSolution {
        selected,
        profit: base_profit + search.best_profit,
        proven_optimal: !search.timed_out,
        explored: search.explored,
    }
}

impl Search<'_> {
    /// Density-order greedy fill, used as the first incumbent.
    fn seed_with_greedy(&mut self) {
        let mut remaining = self.capacities.to_vec();
        let mut profit = 0.0;
        for (k, candidate) in self.candidates.iter().enumerate() {
            if fits(&candidate.column, &remaining) {
                for &(row, weight) in &candidate.column {
                    remaining[row] -= weight;
                }
                self.best[k] = true;
                profit += candidate.profit;
            }
        }
        self.best_profit = profit;
    }

    fn descend(&mut self, k: usize) {
        if self.timed_out {
            return;
        }
        self.explored += 1;
        if self.explored % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.is_some_and(|d| Instant::now() >= d)
        {
            self.timed_out = true;
            return;
        }

        if self.profit > self.best_profit + tolerance(self.best_profit) {
            self.best_profit = self.profit;
            self.best.copy_from_slice(&self.chosen);
        }

        if k == self.candidates.len() {
            return;
        }
        if self.upper_bound(k) <= self.best_profit + tolerance(self.best_profit) {
            return;
        }

        let candidate = &self.candidates[k];
        if fits(&candidate.column, &self.remaining) {
            for &(row, weight) in &candidate.column {
                self.remaining[row] -= weight;
            }
            self.chosen[k] = true;
            self.profit += candidate.profit;

            self.descend(k + 1);

            self.profit -= candidate.profit;
            self.chosen[k] = false;
            for &(row, weight) in &candidate.column {
                self.remaining[row] += weight;
            }
        }

        self.descend(k + 1);
    }

    /// Fractional surrogate bound for completing the current partial
    /// selection with `candidates[k..]`.
    fn upper_bound(&self, k: usize) -> f64 {
        let mut room: f64 = self
            .remaining
            .iter()
            .zip(self.capacities)
            .filter(|(_, cap)| **cap > 0)
            .map(|(rem, cap)| *rem as f64 / *cap as f64)
            .sum();

        let mut bound = self.profit;
        for candidate in &self.candidates[k..] {
            if candidate.surrogate <= room {
                bound += candidate.profit;
                room -= candidate.surrogate;
            } else {
                bound += candidate.profit * room / candidate.surrogate;
                break;
            }
        }

        bound.min(self.profit + self.suffix_profit[k])
    }
}

fn fits(column: &[(usize, u64)], remaining: &[u64]) -> bool {
    column.iter().all(|&(row, weight)| weight <= remaining[row])
}

fn tolerance(reference: f64) -> f64 {
    1e-9 * reference.abs().max(1.0)
}
