use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::StateGraphConfig;
use crate::net::engine::DEFAULT_MAX_STEPS;
use crate::net::structure::{DEFAULT_TOKEN_CAP, Weight};
use crate::simulate::{RunConfig, SelectionPolicy};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimConfig {
    #[serde(default = "default_token_cap")]
    pub token_cap: Weight,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub policy: SelectionPolicy,
    #[serde(default)]
    pub batch_max: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub state_limit: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            token_cap: default_token_cap(),
            max_steps: default_max_steps(),
            policy: SelectionPolicy::default(),
            batch_max: 0,
            seed: None,
            state_limit: None,
        }
    }
}

impl SimConfig {
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        if config.token_cap == 0 {
            anyhow::bail!("token_cap must be at least 1");
        }
        Ok(config)
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            policy: self.policy,
            max_steps: self.max_steps,
            batch_max: self.batch_max,
            seed: self.seed,
        }
    }

    pub fn state_graph_config(&self) -> StateGraphConfig {
        StateGraphConfig {
            state_limit: self.state_limit,
        }
    }
}

fn default_token_cap() -> Weight {
    DEFAULT_TOKEN_CAP
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.token_cap, 20);
        assert_eq!(config.max_steps, 100);
    }

    #[test]
    fn partial_file_overrides_named_keys() {
        let config = SimConfig::from_toml_str(
            r#"
            token_cap = 5
            policy = "maximal"
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.token_cap, 5);
        assert_eq!(config.policy, SelectionPolicy::Maximal);
        assert_eq!(config.run_config().seed, Some(42));
        assert_eq!(config.max_steps, 100);
        assert_eq!(config.state_graph_config().state_limit, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(SimConfig::from_toml_str("policy = \"random\"").is_err());
        assert!(SimConfig::from_toml_str("token_cap = 0").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SimConfig::load_from_file("/nonexistent/ptsim.toml").unwrap();
        assert_eq!(config, SimConfig::default());
    }
}
