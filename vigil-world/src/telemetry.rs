//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use vigil_core::error::{Result, VigilError};

use crate::config::TelemetryConfig;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.level` when set.
///
/// # Errors
/// Returns `VigilError::Config` if the level does not parse or a global
/// subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| VigilError::Config(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| VigilError::Config(format!("tracing subscriber: {e}")))?;

    tracing::info!(level = %config.level, json = config.json, "Telemetry initialized");
    Ok(())
}
