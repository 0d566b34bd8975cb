//! Generator assembly configuration.
//!
//! Every field has a working default, so an empty TOML file describes the
//! standard stack: AES-256 and HMAC(SHA-256) in an entropy pool, wrapped by
//! the X9.31 generator, fed by every source the platform provides.

use crate::entropy::{SourceId, SourceSettings};
use crate::primitives::{CipherAlgorithm, MacAlgorithm};
use crate::rng::{PoolConfig, X931Config};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration consumed by [`make_rng_with`](crate::make_rng_with).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RngConfig {
    /// Wrap the pool in the X9.31 generator.
    pub compliance_wrapper: bool,
    /// Sources to register. Order is irrelevant; assembly sorts by cost.
    pub sources: Vec<SourceId>,
    /// Cipher used by the pool and by the wrapper.
    pub cipher: CipherAlgorithm,
    /// MAC used by the pool.
    pub mac: MacAlgorithm,
    /// Pool policy.
    pub pool: PoolConfig,
    /// Wrapper policy.
    pub x931: X931Config,
    /// Per-source settings.
    pub settings: SourceSettings,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            compliance_wrapper: true,
            sources: SourceId::platform_defaults(),
            cipher: CipherAlgorithm::default(),
            mac: MacAlgorithm::default(),
            pool: PoolConfig::default(),
            x931: X931Config::default(),
            settings: SourceSettings::default(),
        }
    }
}

impl RngConfig {
    /// Validates the pool and wrapper policies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        if self.compliance_wrapper {
            self.x931.validate()?;
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("pool must hold at least one block")]
    EmptyPool,
    #[error("poll buffer must be non-empty")]
    EmptyPollBuffer,
    #[error("{0} interval must be non-zero")]
    ZeroInterval(&'static str),
    #[error("seed threshold of {threshold} bits exceeds pool capacity of {capacity} bits")]
    ThresholdExceedsPool { threshold: usize, capacity: usize },
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Generator assembly.
    #[serde(default)]
    pub rng: RngConfig,
    /// CLI output.
    #[serde(default)]
    pub output: OutputConfig,
}

/// CLI output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Random bytes to print.
    pub bytes: usize,
    /// Print Prometheus metrics after the output.
    pub metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bytes: 32,
            metrics: false,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.rng.validate()?;
        Ok(config)
    }
}
