use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const NUM_EPISODES: usize = 100_000_usize;
pub const TABLE_DIR: &str = "./q_table_archive";

/// Hyperparameters shared by both self-play agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Discount factor, in `[0, 1]`.
    pub gamma: f32,
    /// Learning rate, in `(0, 1]`.
    pub alpha: f32,
    /// Exploration rate, in `[0, 1]`.
    pub epsilon: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            gamma: 0.9,
            alpha: 0.5,
            epsilon: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Progress is logged every this many episodes, a tenth of the run by default.
    pub log_every: Option<usize>,
    pub table_dir: PathBuf,
    /// Start from empty tables instead of loading the saved ones.
    pub fresh: bool,
    /// Also keep a dated copy of every table written.
    pub snapshot: bool,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: NUM_EPISODES,
            log_every: None,
            table_dir: PathBuf::from(TABLE_DIR),
            fresh: false,
            snapshot: false,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn log_every(&self) -> usize {
        self.log_every.unwrap_or(self.episodes / 10).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if !(0.0..=1.0).contains(&agent.gamma) {
            return Err(ConfigError::Validation("agent.gamma must be in [0, 1]".into()));
        }
        if !(agent.alpha > 0.0 && agent.alpha <= 1.0) {
            return Err(ConfigError::Validation("agent.alpha must be in (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&agent.epsilon) {
            return Err(ConfigError::Validation("agent.epsilon must be in [0, 1]".into()));
        }
        if self.training.episodes == 0 {
            return Err(ConfigError::Validation("training.episodes must be > 0".into()));
        }
        Ok(())
    }
}
