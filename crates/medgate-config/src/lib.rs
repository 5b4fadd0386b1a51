//! Configuration management for medgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (`MEDGATE_*`, `__` between nested keys; highest precedence)
//! 2. medgate.local.toml (gitignored, local overrides)
//! 3. medgate.toml (git-tracked, project config)
//! 4. ~/.config/medgate/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use medgate_abac::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_POLICY_BYTES, PolicyEngine,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Largest `engine.max_policy_bytes` accepted by [`MedgateConfig::validate`].
pub const MAX_POLICY_BYTES_CEILING: usize = 1024 * 1024;

/// Main medgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedgateConfig {
    pub engine: EngineConfig,
    pub audit: AuditConfig,
}

/// Limits and caching for the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Most attributes one request context may hold.
    pub max_attributes: usize,
    /// Compiled policies kept in memory. `0` disables the cache.
    pub cache_capacity: usize,
    /// Largest accepted policy text, in bytes.
    pub max_policy_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_policy_bytes: DEFAULT_MAX_POLICY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Log every decision through `tracing`.
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MedgateConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parses a single TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects limits that would make every request fail, and policy sizes
    /// above [`MAX_POLICY_BYTES_CEILING`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_attributes == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_attributes must be greater than 0".to_string(),
            ));
        }
        if self.engine.max_policy_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_policy_bytes must be greater than 0".to_string(),
            ));
        }
        if self.engine.max_policy_bytes > MAX_POLICY_BYTES_CEILING {
            return Err(ConfigError::ValidationError(format!(
                "engine.max_policy_bytes must be at most {MAX_POLICY_BYTES_CEILING}"
            )));
        }
        Ok(())
    }

    /// Builds a policy engine with these settings.
    pub fn build_engine(&self) -> PolicyEngine {
        let engine = PolicyEngine::new()
            .with_cache_capacity(self.engine.cache_capacity)
            .with_max_attributes(self.engine.max_attributes)
            .with_max_policy_bytes(self.engine.max_policy_bytes);
        if self.audit.enabled {
            engine
        } else {
            engine.without_audit()
        }
    }
}
