use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value as JsonValue};

use crate::config::RunnerConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Get one configuration key (dotted path)
    Get { key: String },
    /// Set one configuration key (dotted path) and persist it
    Set { key: String, value: String },
    /// Write the default configuration to the resolved path
    Reset,
}

pub fn cmd_config(args: ConfigArgs, path: &Path, config: &RunnerConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(config)?;
            match get_key(&json, &key) {
                Some(value) => println!("{}", serde_yaml::to_string(value)?),
                None => bail!("{key} not found in configuration"),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut json = serde_json::to_value(config)?;
            let parsed = serde_json::from_str(&value).unwrap_or_else(|_| JsonValue::String(value.clone()));
            set_key(&mut json, &key, parsed)?;
            let updated: RunnerConfig = serde_json::from_value(json).context("updated value does not fit RunnerConfig")?;
            updated.save(path)?;
            println!("saved {} to {}", key, path.display());
        }
        ConfigAction::Reset => {
            RunnerConfig::default().save(path)?;
            println!("reset configuration at {}", path.display());
        }
    }
    Ok(())
}

fn get_key<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    value.as_object()?.get(key)
}

fn set_key(value: &mut JsonValue, key: &str, new_value: JsonValue) -> Result<()> {
    let map: &mut Map<String, JsonValue> = value.as_object_mut().context("configuration root is not an object")?;
    map.insert(key.to_string(), new_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_a_top_level_key() {
        let mut doc = serde_json::to_value(RunnerConfig::default()).unwrap();
        set_key(&mut doc, "min_confidence", JsonValue::from(0.9)).unwrap();
        assert_eq!(get_key(&doc, "min_confidence"), Some(&JsonValue::from(0.9)));
    }
}
