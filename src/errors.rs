// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CachedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Node '{0}' cannot depend on itself")]
    SelfLoop(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Invalid execution order: {0}")]
    InvalidOrder(String),

    #[error("Invalid optimizer input: {0}")]
    InvalidInput(String),

    #[error("Invalid execution plan: {0}")]
    InvalidPlan(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CachedagError>;
