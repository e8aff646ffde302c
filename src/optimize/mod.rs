// src/optimize/mod.rs

//! Joint cache-set and execution-order optimization.
//!
//! - [`problem`] bundles the graph, size/score estimates and budget.
//! - [`cache`] holds the cache-selection strategies (fixed order).
//! - [`order`] holds the order strategies (fixed cache set).
//! - [`driver`] alternates between the two until nothing improves.

pub mod cache;
pub mod driver;
pub mod order;
pub mod problem;

pub use cache::{CacheSelection, SelectionContext};
pub use driver::{AlternatingOptimizer, OptimizationOutcome, OptimizerSettings, Termination};
pub use order::{OrderContext, OrderResult};
pub use problem::Problem;
