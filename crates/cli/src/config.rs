//! Configuration loading for depotctl.

use anyhow::{Context, Result};
use depot_core::config::AppConfig;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::Path;

/// Prefix for configuration environment variables (`DEPOT_STORAGE__PATH`, ...).
pub const ENV_PREFIX: &str = "DEPOT_";

/// Load configuration from an optional TOML file overlaid with `DEPOT_`
/// environment variables. With neither present, local defaults apply.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        tracing::debug!(config_path = %path.display(), "loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!(config_path = %path.display(), "no config file found, using defaults");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;
    Ok(config)
}
