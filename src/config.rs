//! Configuration for a binning run.
//!
//! A [`BinningConfig`] is a plain serde value, typically loaded from a
//! JSON file, naming the observed variables, the aggregators to compose
//! and the supersampling factor. Aggregator parameters are type-tagged:
//! the `type` field selects the descriptor in the
//! [`AggregatorRegistry`](crate::AggregatorRegistry) and the remaining
//! fields are deserialized by that descriptor.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregators::AggregatorRegistry;
use crate::error::{GridbinError, Result};
use crate::manager::BinManager;
use crate::sampling::create_sampling_steps;
use crate::variable::VariableContext;

/// Type-tagged configuration for one aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Type tag selecting the descriptor, e.g. `"AVG"`
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Type-specific parameters, deserialized by the descriptor
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl AggregatorConfig {
    /// Create a config from a type tag and a JSON object of parameters.
    ///
    /// # Panics
    ///
    /// Panics if `params` is neither an object nor null.
    pub fn new(type_tag: impl Into<String>, params: serde_json::Value) -> Self {
        let params = match params {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => panic!("aggregator parameters must be a JSON object, got {}", other),
        };
        Self {
            type_tag: type_tag.into(),
            params,
        }
    }

    /// Deserialize the type-specific parameters.
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.params.clone())).map_err(|e| {
            GridbinError::Config {
                message: format!("Invalid {} aggregator parameters: {}", self.type_tag, e),
            }
        })
    }
}

/// Complete configuration for one binning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Observed variable names, in observation-vector order
    #[serde(default)]
    pub variables: Vec<String>,

    /// Aggregators to compose, in registration order
    #[serde(default)]
    pub aggregators: Vec<AggregatorConfig>,

    /// Sub-pixel samples per pixel axis
    #[serde(default = "default_super_sampling")]
    pub super_sampling: usize,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl BinningConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BinningConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.variables.is_empty() {
            return Err(GridbinError::Config {
                message: "At least one variable is required".to_string(),
            });
        }
        if self.aggregators.is_empty() {
            return Err(GridbinError::Config {
                message: "At least one aggregator is required".to_string(),
            });
        }
        if self.super_sampling == 0 {
            return Err(GridbinError::Config {
                message: "super_sampling must be at least 1".to_string(),
            });
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GridbinError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }
        Ok(())
    }

    /// Build the variable context for this run.
    pub fn variable_context(&self) -> Result<VariableContext> {
        VariableContext::new(self.variables.iter().cloned())
    }

    /// Build the bin manager for this run, resolving every aggregator
    /// type against the given registry.
    pub fn create_bin_manager(&self, registry: &AggregatorRegistry) -> Result<BinManager> {
        let ctx = self.variable_context()?;
        let mut aggregators = Vec::with_capacity(self.aggregators.len());
        for config in &self.aggregators {
            let descriptor =
                registry
                    .descriptor(&config.type_tag)
                    .ok_or_else(|| GridbinError::Config {
                        message: format!("Unsupported aggregator type: {}", config.type_tag),
                    })?;
            aggregators.push(descriptor.create_aggregator(&ctx, config)?);
        }
        BinManager::new(aggregators)
    }

    /// The sub-pixel sampling steps implied by the supersampling factor.
    pub fn sampling_steps(&self) -> Vec<f32> {
        create_sampling_steps(self.super_sampling)
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            aggregators: Vec::new(),
            super_sampling: default_super_sampling(),
            log_level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_super_sampling() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}
