//! Runtime configuration
//!
//! Read from environment variables once at startup.

use serde::Serialize;
use thiserror::Error;

use crate::shopping::AggregatorOptions;

/// Target servings used when a request does not give one
pub const ENV_DEFAULT_PORTION: &str = "DESPENSA_DEFAULT_PORTION";
/// Enables unit mismatch warnings in shopping lists
pub const ENV_REPORT_UNIT_MISMATCH: &str = "DESPENSA_REPORT_UNIT_MISMATCH";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number of servings >= 1, got '{value}'")]
    InvalidPortion { name: &'static str, value: String },

    #[error("{name} must be a boolean (true/false/1/0/yes/no), got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub default_target_portion: Option<f64>,
    pub report_unit_mismatch: bool,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_target_portion = match lookup(ENV_DEFAULT_PORTION) {
            Some(value) if !value.trim().is_empty() => Some(parse_portion(ENV_DEFAULT_PORTION, &value)?),
            _ => None,
        };

        let report_unit_mismatch = match lookup(ENV_REPORT_UNIT_MISMATCH) {
            Some(value) if !value.trim().is_empty() => parse_flag(ENV_REPORT_UNIT_MISMATCH, &value)?,
            _ => false,
        };

        Ok(Self {
            default_target_portion,
            report_unit_mismatch,
        })
    }

    /// Aggregation options derived from this configuration
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            report_unit_mismatch: self.report_unit_mismatch,
        }
    }

    /// Request portion, falling back to the configured default
    pub fn target_portion(&self, requested: Option<f64>) -> Option<f64> {
        requested.or(self.default_target_portion)
    }
}

fn parse_portion(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 1.0)
        .ok_or_else(|| ConfigError::InvalidPortion {
            name,
            value: value.to_string(),
        })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
