// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Read and deserialize a plan file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<RawPlanFile> {
    let plan: RawPlanFile = toml::from_str(contents)?;
    Ok(plan)
}

/// Load a plan file and validate it.
///
/// Checks that there is at least one node, that the budget and iteration
/// limit are positive, that scores are finite and non-negative, and that
/// `after` lists only known nodes and form no cycle.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(&path)?;
    PlanFile::try_from(raw)
}

/// `Cachedag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Cachedag.toml")
}
