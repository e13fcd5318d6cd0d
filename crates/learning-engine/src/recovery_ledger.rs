//! Per-domain recovery statistics: how often each `(failure_kind, action)`
//! pair was attempted and how often it actually cleared the blocker.
//! Persisted one file per domain, mirroring the Knowledge Store's layout.

use crate::errors::{read_json, write_json_atomic, LearningEngineError};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub attempts: u64,
    pub successes: u64,
}

impl RecoveryStats {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

pub struct RecoveryLedger {
    /// domain -> (failure_kind:action -> stats)
    by_domain: DashMap<String, HashMap<String, RecoveryStats>>,
    base_dir: Option<PathBuf>,
}

impl RecoveryLedger {
    pub fn new() -> Self {
        Self { by_domain: DashMap::new(), base_dir: None }
    }

    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        Self { by_domain: DashMap::new(), base_dir: Some(base_dir.into()) }
    }

    fn path_for(base_dir: &std::path::Path, domain: &str) -> PathBuf {
        base_dir.join("recovery").join(format!("{domain}_recovery.json"))
    }

    pub fn record(&self, domain: &str, failure_kind: &str, action: &str, success: bool) {
        let key = format!("{failure_kind}:{action}");
        let mut domain_map = self.by_domain.entry(domain.to_string()).or_insert_with(|| self.load_domain(domain));
        let stats = domain_map.entry(key).or_insert_with(RecoveryStats::default);
        stats.attempts += 1;
        if success {
            stats.successes += 1;
        }
    }

    fn load_domain(&self, domain: &str) -> HashMap<String, RecoveryStats> {
        let Some(base_dir) = &self.base_dir else { return HashMap::new() };
        read_json(&Self::path_for(base_dir, domain)).ok().flatten().unwrap_or_default()
    }

    pub fn stats_for(&self, domain: &str, failure_kind: &str, action: &str) -> RecoveryStats {
        self.by_domain
            .get(domain)
            .and_then(|m| m.get(&format!("{failure_kind}:{action}")).copied())
            .unwrap_or_default()
    }

    pub fn persist_domain(&self, domain: &str) -> Result<(), LearningEngineError> {
        let Some(base_dir) = &self.base_dir else { return Ok(()) };
        let Some(map) = self.by_domain.get(domain) else { return Ok(()) };
        write_json_atomic(&Self::path_for(base_dir, domain), &*map)
    }
}

impl Default for RecoveryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_attempts_and_successes_per_pair() {
        let ledger = RecoveryLedger::open(tempfile::tempdir().unwrap().path());
        ledger.record("a.com", "modal_blocking", "dismiss_modal", true);
        ledger.record("a.com", "modal_blocking", "dismiss_modal", false);
        let stats = ledger.stats_for("a.com", "modal_blocking", "dismiss_modal");
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.successes, 1);
    }

    #[test]
    fn persists_domain_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RecoveryLedger::open(dir.path());
        ledger.record("a.com", "timeout", "wait_and_retry", true);
        ledger.persist_domain("a.com").unwrap();
        assert!(dir.path().join("recovery/a.com_recovery.json").exists());
    }
}
