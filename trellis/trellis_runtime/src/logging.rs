//! Log subscriber installation.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install a formatting subscriber for the configured level.
///
/// `RUST_LOG` takes precedence over the configured level when set. Records
/// emitted through the `log` facade by the library crates are captured as
/// well. Installing twice is harmless: the first subscriber stays.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("Log subscriber already installed");
    }

    Ok(())
}
