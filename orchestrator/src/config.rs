use std::{
    fs,
    num::{NonZeroU32, NonZeroUsize},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

const DEFAULT_NAME_PREFIX: &str = "Neural_";

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.to_string()
}

/// The user facing configuration of an `Orchestrator`.
///
/// Loaded as is from JSON, it's only checked once it's turned into `Settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// The amount of shards observations are partitioned across.
    pub shards: usize,
    /// The amount of populations entities are assigned to.
    pub population: u32,
    /// The cumulative entity-steps that have to be exceeded to arm a backward tick.
    pub server_updates: u64,
    /// Evaluation runs never arm a backward tick.
    #[serde(default)]
    pub evaluation: bool,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Upper bound of ticks a single `step` may take, unbounded if missing.
    #[serde(default)]
    pub max_ticks_per_cycle: Option<usize>,
}

impl OrchestratorConfig {
    /// Creates a new training configuration with the default name prefix and no tick bound.
    pub fn new(shards: usize, population: u32, server_updates: u64) -> Self {
        Self {
            shards,
            population,
            server_updates,
            evaluation: false,
            name_prefix: default_name_prefix(),
            max_ticks_per_cycle: None,
        }
    }

    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the document isn't a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| OrchestratorError::InvalidConfig(format!("invalid JSON: {e}")))
    }

    /// Reads and parses a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            OrchestratorError::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
        })?;

        Self::from_json(&content)
    }

    /// Checks the invariants the partitioner and the batch policy rely on.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<Settings> {
        let shards = NonZeroUsize::new(self.shards)
            .ok_or_else(|| invalid("shards must be greater than zero"))?;

        let population = NonZeroU32::new(self.population)
            .ok_or_else(|| invalid("population must be greater than zero"))?;

        let max_ticks_per_cycle = match self.max_ticks_per_cycle {
            Some(max) => Some(
                NonZeroUsize::new(max)
                    .ok_or_else(|| invalid("max_ticks_per_cycle must be greater than zero"))?,
            ),
            None => None,
        };

        Ok(Settings {
            shards,
            population,
            server_updates: self.server_updates,
            evaluation: self.evaluation,
            name_prefix: self.name_prefix.clone(),
            max_ticks_per_cycle,
        })
    }
}

fn invalid(msg: &str) -> OrchestratorError {
    OrchestratorError::InvalidConfig(msg.to_string())
}

/// A validated `OrchestratorConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub shards: NonZeroUsize,
    pub population: NonZeroU32,
    pub server_updates: u64,
    pub evaluation: bool,
    pub name_prefix: String,
    pub max_ticks_per_cycle: Option<NonZeroUsize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults() {
        let config =
            OrchestratorConfig::from_json(r#"{"shards": 2, "population": 3, "server_updates": 10}"#)
                .unwrap();

        assert_eq!(config, OrchestratorConfig::new(2, 3, 10));
        assert_eq!(config.name_prefix, "Neural_");

        let settings = config.validate().unwrap();
        assert_eq!(settings.shards.get(), 2);
        assert_eq!(settings.population.get(), 3);
        assert_eq!(settings.max_ticks_per_cycle, None);
    }

    #[test]
    fn test_zero_shards_is_rejected() {
        let err = OrchestratorConfig::new(0, 1, 10).validate().unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(msg) if msg.contains("shards")));
    }

    #[test]
    fn test_zero_population_is_rejected() {
        let err = OrchestratorConfig::new(1, 0, 10).validate().unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(msg) if msg.contains("population")));
    }

    #[test]
    fn test_zero_tick_bound_is_rejected() {
        let mut config = OrchestratorConfig::new(1, 1, 10);
        config.max_ticks_per_cycle = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        let err = OrchestratorConfig::from_json(r#"{"shards": "two"}"#).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = OrchestratorConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(msg) if msg.contains("cannot read")));
    }
}
