// src/exec/mod.rs

//! Task computation layer.
//!
//! The core never computes node results itself; it calls a
//! [`TaskExecutor`] supplied by the embedding application.

pub mod backend;

pub use backend::TaskExecutor;
