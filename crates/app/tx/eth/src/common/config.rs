//! YAML chain descriptions for chains outside the well-known list.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Common, CommonError, Hardfork};

/// Chain configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read chain config '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse chain config '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// Validation failed with one or more errors.
    #[error("chain config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),

    #[error(transparent)]
    Common(#[from] CommonError),
}

fn default_hardfork() -> String {
    Hardfork::default().name().to_string()
}

/// A chain described by name, id, fork and explicitly enabled upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    #[serde(default = "default_hardfork")]
    pub hardfork: String,
    #[serde(default)]
    pub eips: Vec<u32>,
}

impl ChainConfig {
    /// Build the registry described by this configuration.
    pub fn into_common(self) -> Result<Common, ConfigError> {
        Common::from_config(&self)
    }
}

impl Common {
    pub fn from_config(config: &ChainConfig) -> Result<Self, ConfigError> {
        let hardfork: Hardfork = config.hardfork.parse()?;
        Ok(Common::custom(config.name.clone(), config.chain_id, hardfork)
            .with_eips(config.eips.iter().copied()))
    }
}

/// Load and validate a chain configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ChainConfig, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    load_config_from_str(&content, &path_str)
}

/// Load and validate a chain configuration from a YAML string.
pub fn load_config_from_str(content: &str, source_name: &str) -> Result<ChainConfig, ConfigError> {
    let config: ChainConfig = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
        path: source_name.to_string(),
        source: e,
    })?;

    validate_config(&config)?;

    tracing::debug!(
        source = source_name,
        name = %config.name,
        chain_id = config.chain_id,
        hardfork = %config.hardfork,
        "loaded chain config"
    );
    Ok(config)
}

/// Collects every problem before failing.
pub fn validate_config(config: &ChainConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push("name cannot be empty".to_string());
    }

    if config.chain_id == 0 {
        errors.push("chain_id must be greater than 0".to_string());
    }

    if config.hardfork.parse::<Hardfork>().is_err() {
        errors.push(format!("hardfork '{}' is not a known fork", config.hardfork));
    }

    let mut seen = BTreeSet::new();
    for eip in &config.eips {
        if *eip == 0 {
            errors.push("eips cannot contain 0".to_string());
        } else if !seen.insert(*eip) {
            errors.push(format!("eip {eip} is listed more than once"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}
