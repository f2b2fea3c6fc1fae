//! Configuration for the Trellis substrate
//!
//! Handles loading, validating and merging substrate configuration.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use trellis_core::utils::LogLevel;
use trellis_metadata::StructuralRequirement;
use trellis_security::FailurePolicy;

/// Errors that can occur in configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Logging configuration
///
/// Applied by `SubstrateBuilder::build`, which installs a subscriber unless
/// one is already set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether the substrate installs a log subscriber
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// Minimum level to record
    #[serde(default)]
    pub level: LogLevel,
}

fn default_logging_enabled() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            level: LogLevel::default(),
        }
    }
}

/// Substrate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateConfig {
    /// The marker every resource type descends from
    #[serde(default = "default_root_marker")]
    pub root_marker: String,

    /// What to do when a read names unauthorized attributes
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fields that types implementing a marker must expose
    #[serde(default)]
    pub structural_requirements: Vec<StructuralRequirement>,

    /// Additional configuration
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_root_marker() -> String {
    "Resource".to_string()
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            root_marker: default_root_marker(),
            failure_policy: FailurePolicy::default(),
            logging: LoggingConfig::default(),
            structural_requirements: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

impl SubstrateConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file is not an error: the defaults are used and a
    /// warning is logged.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = SubstrateConfig::default();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());

            if !path.exists() {
                warn!("Configuration file not found: {}", path.display());
                return Ok(config);
            }

            let content = fs::read_to_string(path).context(format!(
                "Failed to read configuration file: {}",
                path.display()
            ))?;

            config = serde_json::from_str(&content).context(format!(
                "Failed to parse configuration file: {}",
                path.display()
            ))?;
        } else {
            info!("No configuration file specified, using defaults");
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.root_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("Root marker cannot be empty".to_string()).into());
        }

        for requirement in &self.structural_requirements {
            if requirement.field.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Structural requirement for {} names no field",
                    requirement.marker
                ))
                .into());
            }
        }

        if self.failure_policy == FailurePolicy::Lenient {
            info!("Unauthorized reads will be served the full authorized set");
        }

        Ok(())
    }

    /// Merge another configuration into this one
    ///
    /// Scalar settings are taken from `other`, requirements are appended
    /// and extra entries from `other` override ours.
    pub fn merge(&mut self, other: SubstrateConfig) {
        self.root_marker = other.root_marker;
        self.failure_policy = other.failure_policy;
        self.logging = other.logging;

        for requirement in other.structural_requirements {
            if !self.structural_requirements.contains(&requirement) {
                self.structural_requirements.push(requirement);
            }
        }

        self.extra.extend(other.extra);
    }
}
