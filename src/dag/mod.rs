// src/dag/mod.rs

//! DAG representation and the peak-memory model.
//!
//! - [`graph`] holds the integer-indexed task graph and its builder.
//! - [`node_set`] provides dense node sets (cache sets, exclusions).
//! - [`order`] wraps validated topological execution orders.
//! - [`memory`] simulates peak memory for an (order, cache set) pair.

pub mod graph;
pub mod memory;
pub mod node_set;
pub mod order;

pub use graph::{NodeId, TaskGraph, TaskGraphBuilder};
pub use memory::{peak_memory, PeakMemory, SuccessorCounts};
pub use node_set::{CacheSet, NodeSet};
pub use order::ExecutionOrder;
