//! Tracks how the selector used for a given `(domain, page, intent)` has
//! changed over time: the first one ever recorded, the current best, and a
//! log of the transitions in between. Persisted as a single file rather than
//! one-per-domain since the whole ledger is small and read as a unit.

use crate::errors::{read_json, write_json_atomic, LearningEngineError};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorEvolution {
    pub original_selector: String,
    pub current_selector: String,
    pub transitions: Vec<Transition>,
    pub total_attempts: u64,
    pub total_successes: u64,
}

impl SelectorEvolution {
    fn new(selector: &str) -> Self {
        Self {
            original_selector: selector.to_string(),
            current_selector: selector.to_string(),
            transitions: Vec::new(),
            total_attempts: 0,
            total_successes: 0,
        }
    }
}

pub struct EvolutionLedger {
    entries: DashMap<String, SelectorEvolution>,
    base_dir: Option<PathBuf>,
}

impl EvolutionLedger {
    pub fn new() -> Self {
        Self { entries: DashMap::new(), base_dir: None }
    }

    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, LearningEngineError> {
        let base_dir = base_dir.into();
        let path = Self::path_for(&base_dir);
        let loaded: Option<HashMap<String, SelectorEvolution>> = read_json(&path)?;
        let entries = DashMap::new();
        for (key, value) in loaded.unwrap_or_default() {
            entries.insert(key, value);
        }
        Ok(Self { entries, base_dir: Some(base_dir) })
    }

    fn path_for(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join("metrics").join("selector_evolution.json")
    }

    /// Records one selector outcome: a success moves `current_selector`
    /// forward, a change-on-failure is recorded as a transition.
    pub fn record(&self, key: &str, selector_value: &str, success: bool) {
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| SelectorEvolution::new(selector_value));
        entry.total_attempts += 1;
        if success {
            entry.total_successes += 1;
            if entry.current_selector != selector_value {
                entry.current_selector = selector_value.to_string();
            }
        } else if entry.current_selector != selector_value {
            entry.transitions.push(Transition {
                timestamp: chrono::Utc::now(),
                from: entry.current_selector.clone(),
                to: selector_value.to_string(),
            });
        }
    }

    pub fn get(&self, key: &str) -> Option<SelectorEvolution> {
        self.entries.get(key).map(|e| e.clone())
    }

    pub fn persist(&self) -> Result<(), LearningEngineError> {
        let Some(base_dir) = &self.base_dir else { return Ok(()) };
        let snapshot: HashMap<String, SelectorEvolution> =
            self.entries.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        write_json_atomic(&Self::path_for(base_dir), &snapshot)
    }
}

impl Default for EvolutionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_seeds_original_and_current() {
        let ledger = EvolutionLedger::new();
        ledger.record("a.com:/:login", "#login", true);
        let evo = ledger.get("a.com:/:login").unwrap();
        assert_eq!(evo.original_selector, "#login");
        assert_eq!(evo.current_selector, "#login");
        assert_eq!(evo.total_successes, 1);
    }

    #[test]
    fn failure_with_a_different_selector_logs_a_transition() {
        let ledger = EvolutionLedger::new();
        ledger.record("a.com:/:login", "#login", true);
        ledger.record("a.com:/:login", "#login-v2", false);
        let evo = ledger.get("a.com:/:login").unwrap();
        assert_eq!(evo.transitions.len(), 1);
        assert_eq!(evo.transitions[0].to, "#login-v2");
        assert_eq!(evo.current_selector, "#login");
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = EvolutionLedger::open(dir.path()).unwrap();
        ledger.record("a.com:/:login", "#login", true);
        ledger.persist().unwrap();

        let reopened = EvolutionLedger::open(dir.path()).unwrap();
        assert_eq!(reopened.get("a.com:/:login").unwrap().original_selector, "#login");
    }
}
