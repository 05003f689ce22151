// Generator configuration for channel setup and event weighting
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};

// Process-wide default configuration
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Settings handed to a minimizer backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizerSettings {
    /// Backend names in order of preference; the first available one is used.
    pub preferred: Vec<String>,
    pub max_function_calls: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Seed for stochastic backends. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for MinimizerSettings {
    fn default() -> Self {
        Self {
            preferred: vec!["genetic".to_string(), "simplex".to_string()],
            max_function_calls: 1_000_000,
            max_iterations: 1000,
            tolerance: 1e-4,
            seed: None,
        }
    }
}

/// Settings for the adaptive quadrature used by diagnostic scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
    pub max_subdivisions: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            abs_tolerance: 1e-10,
            rel_tolerance: 1e-7,
            max_subdivisions: 200,
        }
    }
}

/// Configuration container for event weighting.
///
/// A single process-wide default is exposed via the `CONFIG` static and
/// [`Config::global`]. Channel setup and mass sampling take a `&Config`
/// explicitly, so callers are free to build their own instance instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub minimizer: MinimizerSettings,
    /// Multiplier applied to the maximum found by the search.
    pub max_headroom: f64,
    /// Multiplier applied to the grid value substituted after a failed search.
    pub failed_search_margin: f64,
    /// Maximum used when neither the search nor the grid finds a positive weight.
    pub fallback_maximum: f64,
    /// Upper bound on candidate draws per dynamic-mass sampling call.
    pub max_mass_attempts: usize,
    pub integration: IntegrationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            minimizer: MinimizerSettings::default(),
            max_headroom: 1.08,
            failed_search_margin: 1.05,
            fallback_maximum: 1.0,
            max_mass_attempts: 10_000,
            integration: IntegrationSettings::default(),
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the search or the sampler meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.max_headroom >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "max_headroom must be >= 1, got {}",
                self.max_headroom
            )));
        }
        if !(self.fallback_maximum > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "fallback_maximum must be positive, got {}",
                self.fallback_maximum
            )));
        }
        if self.max_mass_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_mass_attempts must be at least 1".to_string(),
            ));
        }
        if self.minimizer.preferred.is_empty() {
            return Err(Error::InvalidConfig(
                "minimizer.preferred must name at least one backend".to_string(),
            ));
        }
        if !(self.minimizer.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "minimizer.tolerance must be positive, got {}",
                self.minimizer.tolerance
            )));
        }
        Ok(())
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
