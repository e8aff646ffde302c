// src/types.rs

//! Strategy selectors shared by the config layer and the optimizer.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Policy used to choose the cache set for a fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    /// Cache every eligible node, ignoring the budget.
    All,
    /// Cache nothing.
    None,
    /// Better of a forward and a backward capacity-checked sweep.
    Greedy,
    /// Random visiting order, full peak-memory check per candidate.
    Random,
    /// Descending score-to-size ratio, full peak-memory check per candidate.
    Heuristic,
    /// Exact multidimensional knapsack over the maximal sets.
    Mkp,
}

impl Default for CacheStrategy {
    fn default() -> Self {
        CacheStrategy::Mkp
    }
}

impl FromStr for CacheStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CacheStrategy::All),
            "none" => Ok(CacheStrategy::None),
            "greedy" => Ok(CacheStrategy::Greedy),
            "random" => Ok(CacheStrategy::Random),
            "heuristic" => Ok(CacheStrategy::Heuristic),
            "mkp" => Ok(CacheStrategy::Mkp),
            other => Err(format!(
                "invalid cache_strategy: {other} (expected one of all, none, greedy, random, heuristic, mkp)"
            )),
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheStrategy::All => "all",
            CacheStrategy::None => "none",
            CacheStrategy::Greedy => "greedy",
            CacheStrategy::Random => "random",
            CacheStrategy::Heuristic => "heuristic",
            CacheStrategy::Mkp => "mkp",
        };
        f.write_str(s)
    }
}

/// Policy used to reorder the DAG for a fixed cache set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStrategy {
    /// Keep the current order.
    None,
    /// Memory-aware depth-first search.
    MaDfs,
    /// Simulated annealing over the storage-time product.
    SimulatedAnnealing,
    /// Recursive minimum-cut separation.
    Separator,
}

impl Default for OrderStrategy {
    fn default() -> Self {
        OrderStrategy::SimulatedAnnealing
    }
}

impl FromStr for OrderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(OrderStrategy::None),
            "ma-dfs" | "madfs" => Ok(OrderStrategy::MaDfs),
            "simulated-annealing" | "sa" => Ok(OrderStrategy::SimulatedAnnealing),
            "separator" => Ok(OrderStrategy::Separator),
            other => Err(format!(
                "invalid order_strategy: {other} (expected one of none, ma-dfs, simulated-annealing, separator)"
            )),
        }
    }
}

impl fmt::Display for OrderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStrategy::None => "none",
            OrderStrategy::MaDfs => "ma-dfs",
            OrderStrategy::SimulatedAnnealing => "simulated-annealing",
            OrderStrategy::Separator => "separator",
        };
        f.write_str(s)
    }
}
