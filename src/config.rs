//! Configuration management for hashlink

use crate::error::ChainError;
use crate::miner::MAX_DIFFICULTY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location read by the `hashlink` binary.
pub const DEFAULT_CONFIG_PATH: &str = "hashlink.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Constants a chain is built with. Fixed for the chain's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Leading `'0'` hex characters required of a mined block hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Amount credited to the reward address of each mining round.
    #[serde(default = "default_mining_reward")]
    pub mining_reward: i64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "chain.difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.difficulty
            )));
        }
        if self.mining_reward < 0 {
            return Err(ChainError::ConfigError(format!(
                "chain.mining_reward must not be negative, got {}",
                self.mining_reward
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_difficulty() -> u32 {
    2
}

fn default_mining_reward() -> i64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parses and validates a TOML configuration.
pub fn parse_config(config_str: &str) -> Result<Config, ChainError> {
    let config: Config = toml::from_str(config_str)?;
    config.chain.validate()?;
    if config.logging.level.parse::<tracing::Level>().is_err() {
        return Err(ChainError::ConfigError(format!(
            "logging.level must be one of trace, debug, info, warn, error; got {:?}",
            config.logging.level
        )));
    }
    Ok(config)
}

/// Loads the configuration at `path`, falling back to defaults when the file
/// is missing or empty.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    parse_config(&config_str)
}
