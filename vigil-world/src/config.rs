//! World-level configuration.
//!
//! Wraps the core [`VigilConfig`] with the settings only a host needs:
//! the RNG seed, telemetry and the static-target scan sweep.
//!
//! ```toml
//! seed = 7
//! scan_step_degrees = 5.0
//!
//! [telemetry]
//! level = "debug"
//! json = true
//!
//! [ai.memory]
//! capacity = 10
//! ```

use serde::{Deserialize, Serialize};
use vigil_core::config::VigilConfig;
use vigil_core::error::{Result, VigilError};

/// Top-level world configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Core AI tuning.
    #[serde(default)]
    pub ai: VigilConfig,

    /// Seed for every agent RNG; each agent mixes in its own id.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Logging setup.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Angle between rays in a static-target sweep.
    #[serde(default = "default_scan_step")]
    pub scan_step_degrees: f32,

    /// Length of each sweep ray.
    #[serde(default = "default_scan_range")]
    pub scan_range: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ai: VigilConfig::default(),
            seed: default_seed(),
            telemetry: TelemetryConfig::default(),
            scan_step_degrees: default_scan_step(),
            scan_range: default_scan_range(),
        }
    }
}

impl WorldConfig {
    /// Parse from a TOML string and validate.
    ///
    /// # Errors
    /// Returns `VigilError::Config` on malformed TOML or out-of-range values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| VigilError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns `VigilError::Io` if the file cannot be read, or
    /// `VigilError::Config` if it does not parse.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check ranges the core config does not cover.
    ///
    /// # Errors
    /// Returns `VigilError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.ai.validate()?;
        if !(self.scan_step_degrees > 0.0 && self.scan_step_degrees <= 90.0) {
            return Err(VigilError::Config(format!(
                "scan_step_degrees must be in (0, 90], got {}",
                self.scan_step_degrees
            )));
        }
        if self.scan_range <= 0.0 {
            return Err(VigilError::Config("scan_range must be positive".into()));
        }
        Ok(())
    }
}

/// Logging setup consumed by [`crate::telemetry::init`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: default_level(), json: false }
    }
}

fn default_seed() -> u64 { 0x5EED }
fn default_scan_step() -> f32 { 5.0 }
fn default_scan_range() -> f32 { 1000.0 }
fn default_level() -> String { "info".into() }
