use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::RunnerConfig;

pub fn init_logging(level: &str, debug: bool) -> anyhow::Result<()> {
    let level = if debug { tracing::Level::DEBUG } else { level.parse().context("invalid log level")? };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())))
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}

/// Resolves the config path: an explicit `--config` flag, else
/// `./config.yaml`, else `$XDG_CONFIG_HOME/wayfarer/config.yaml`.
pub fn resolve_config_path(explicit: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let local = PathBuf::from("config.yaml");
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("could not resolve a config directory")?;
    path.push("wayfarer");
    path.push("config.yaml");
    Ok(path)
}

pub struct LoadedConfig {
    pub config: RunnerConfig,
    pub path: PathBuf,
}

pub fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<LoadedConfig> {
    let path = resolve_config_path(explicit)?;
    let config = RunnerConfig::load(&path)?;
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
    } else {
        tracing::info!(path = %path.display(), "loaded configuration");
    }
    Ok(LoadedConfig { config, path })
}
