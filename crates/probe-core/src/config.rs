//! probed.toml configuration parser.
//!
//! The deployment mode selects the cluster-state provider; an unrecognized
//! mode fails parsing and is fatal at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which cluster-state provider the daemon runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// In-memory worker set, populated by local registrations.
    Standalone,
    /// Static worker list from `[cluster] workers`.
    Configbased,
    /// Worker set pushed by an external state store.
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbedConfig {
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub mode: DeploymentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Default probe ratio when no task carries a placement preference.
    #[serde(default = "default_probe_ratio")]
    pub probe_ratio_unconstrained: f64,
    /// Default probe ratio when at least one task carries a preference.
    #[serde(default = "default_probe_ratio")]
    pub probe_ratio_constrained: f64,
    /// Exclude preferred workers from probing for small jobs submitted at
    /// probe ratio 3. Workload-placement hint for forcing data replication
    /// onto fresh workers; not part of the placement algorithm proper.
    #[serde(default)]
    pub force_data_spread: bool,
}

fn default_probe_ratio() -> f64 {
    2.0
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            probe_ratio_unconstrained: default_probe_ratio(),
            probe_ratio_constrained: default_probe_ratio(),
            force_data_spread: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Worker addresses (`host:port`) for config-based deployments.
    #[serde(default)]
    pub workers: Vec<String>,
    /// State-store address (`host:port`) for production deployments.
    pub state_store: Option<String>,
}

impl ProbedConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ProbedConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check mode-specific requirements that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.deployment.mode {
            DeploymentMode::Configbased if self.cluster.workers.is_empty() => {
                Err(ConfigError::Invalid(
                    "configbased mode requires [cluster] workers".to_string(),
                ))
            }
            DeploymentMode::Production if self.cluster.state_store.is_none() => {
                Err(ConfigError::Invalid(
                    "production mode requires [cluster] state_store".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
