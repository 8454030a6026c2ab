use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level `simulate` configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateConfig {
    /// Chain seed; replaces the seed of a loaded description when set.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Report output path; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Where the chain comes from.
    #[serde(default)]
    pub chain: ChainToml,

    /// Walk and branching parameters.
    #[serde(default)]
    pub run: RunToml,
}

impl SimulateConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainToml {
    /// `.txt` or `.json` description; a random chain is drawn when absent.
    pub source: Option<PathBuf>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Fixed initial state; the description's own policy when absent.
    pub initial_state: Option<usize>,
}

impl Default for ChainToml {
    fn default() -> Self {
        Self {
            source: None,
            dimension: default_dimension(),
            initial_state: None,
        }
    }
}

fn default_dimension() -> usize {
    4
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunToml {
    /// Steps walked before branching.
    #[serde(default = "default_prefix")]
    pub prefix: usize,
    /// Steps walked by every instance after branching.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Number of branches taken in place.
    #[serde(default = "default_branches")]
    pub branches: usize,
    /// Additional branches, one per listed override state.
    #[serde(default)]
    pub branch_states: Vec<usize>,
}

impl Default for RunToml {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            steps: default_steps(),
            branches: default_branches(),
            branch_states: Vec::new(),
        }
    }
}

fn default_prefix() -> usize {
    10
}
fn default_steps() -> usize {
    10
}
fn default_branches() -> usize {
    2
}
