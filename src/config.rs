//! `RunnerConfig`: the knobs a run is driven by, loaded from `config.yaml`
//! layered with `WAYFARER_`-prefixed environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knowledge-store root, resolver/learning thresholds, and per-step
/// budgets. Mirrors the teacher's own `Config` shape: one flat struct,
/// serialized as YAML, safe to default when no file is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root directory the knowledge store, pattern store, and learning
    /// engine ledgers are persisted under.
    pub knowledge_dir: PathBuf,
    pub min_confidence: f64,
    pub min_keep_threshold: f64,
    pub decay_rate: f64,
    pub stale_after_days: i64,
    pub promotion_threshold: u32,
    pub step_timeout_ms: u64,
    pub recovery_attempt_budget: u32,
    pub cross_domain_lookup: bool,
    pub ai_callback_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from("knowledge"),
            min_confidence: 0.5,
            min_keep_threshold: 0.3,
            decay_rate: 0.01,
            stale_after_days: 90,
            promotion_threshold: 3,
            step_timeout_ms: 10_000,
            recovery_attempt_budget: 3,
            cross_domain_lookup: true,
            ai_callback_timeout_ms: 5_000,
        }
    }
}

impl RunnerConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn ai_callback_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_callback_timeout_ms)
    }

    /// Loads from `path` if it exists, then applies any `WAYFARER_*`
    /// environment overrides (e.g. `WAYFARER_MIN_CONFIDENCE=0.6`). Falls
    /// back to defaults entirely when no file and no overrides are present.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("WAYFARER").separator("_"));
        let merged = builder.build()?;
        // `#[serde(default)]` on the struct fills in anything neither the
        // file nor the environment supplied.
        Ok(merged.try_deserialize()?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_yaml() {
        let config = RunnerConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reloaded: RunnerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reloaded.min_confidence, config.min_confidence);
    }
}
