use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::simulation::SimulationConfig;
use crate::analysis::step_graph::StepGraphConfig;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of distinct steps explored. Unbounded when absent.
    #[serde(default)]
    pub state_limit: Option<usize>,
    /// Maximum number of simulation rounds. Unbounded when absent.
    #[serde(default)]
    pub round_limit: Option<usize>,
    #[serde(default)]
    pub dot_output: Option<PathBuf>,
}

impl EngineConfig {
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
        Ok(toml::from_str(content)?)
    }

    pub fn step_graph(&self) -> StepGraphConfig {
        StepGraphConfig {
            state_limit: self.state_limit,
        }
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            round_limit: self.round_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let config = EngineConfig::load_from_file("does/not/exist.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.step_graph().state_limit, None);
    }

    #[test]
    fn parses_limits() {
        let config = EngineConfig::from_toml_str(
            r#"
            state_limit = 1000
            round_limit = 50
            dot_output = "out/steps.dot"
            "#,
        )
        .unwrap();

        assert_eq!(config.step_graph().state_limit, Some(1000));
        assert_eq!(config.simulation().round_limit, Some(50));
        assert_eq!(config.dot_output, Some(PathBuf::from("out/steps.dot")));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(EngineConfig::from_toml_str("state_limit = \"many\"").is_err());
    }
}
