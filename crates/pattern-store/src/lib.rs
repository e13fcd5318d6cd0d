//! Pattern Store (C13): persists named, reusable step sequences the
//! Learning Engine promotes once a fingerprint has proven itself, grouped
//! by category into `patterns/<category>_patterns.json` files.
//!
//! Mirrors the Knowledge Store's persistence idiom: an in-memory
//! [`DashMap`] is authoritative for the running process, and each write
//! goes to a temp file that's renamed into place so a crash never leaves a
//! half-written category file.

pub mod errors;

pub use errors::PatternStoreError;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use wayfarer_core_types::ActionPattern;

/// On-disk shape of a `patterns/<category>_patterns.json` file.
#[derive(Debug, Serialize, Deserialize)]
struct PatternFile {
    patterns: Vec<ActionPattern>,
}

pub struct PatternStore {
    patterns: DashMap<String, ActionPattern>,
    /// Fingerprint -> pattern id, so the Learning Engine can check "have we
    /// already promoted this exact step sequence" in one lookup.
    by_fingerprint: DashMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self {
            patterns: DashMap::new(),
            by_fingerprint: DashMap::new(),
            base_dir: None,
        }
    }

    /// Loads every `patterns/*.json` file under `base_dir` and keeps
    /// `base_dir` for future persists.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, PatternStoreError> {
        let base_dir = base_dir.into();
        let store = Self { patterns: DashMap::new(), by_fingerprint: DashMap::new(), base_dir: Some(base_dir.clone()) };

        let patterns_dir = base_dir.join("patterns");
        if !patterns_dir.exists() {
            return Ok(store);
        }
        let entries = fs::read_dir(&patterns_dir).map_err(|source| PatternStoreError::Read {
            path: patterns_dir.display().to_string(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).map_err(|source| PatternStoreError::Read { path: path.display().to_string(), source })?;
            if bytes.is_empty() {
                continue;
            }
            let file: PatternFile = serde_json::from_slice(&bytes).map_err(|source| PatternStoreError::Parse { path: path.display().to_string(), source })?;
            for pattern in file.patterns {
                store.index(pattern);
            }
        }
        Ok(store)
    }

    fn index(&self, pattern: ActionPattern) {
        self.by_fingerprint.insert(pattern.fingerprint(), pattern.id.clone());
        self.patterns.insert(pattern.id.clone(), pattern);
    }

    pub fn get(&self, id: &str) -> Option<ActionPattern> {
        self.patterns.get(id).map(|p| p.clone())
    }

    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Option<ActionPattern> {
        let id = self.by_fingerprint.get(fingerprint)?;
        self.get(&id)
    }

    /// Every pattern currently held, regardless of category.
    pub fn all(&self) -> Vec<ActionPattern> {
        self.patterns.iter().map(|e| e.value().clone()).collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<ActionPattern> {
        self.patterns.iter().filter(|e| e.value().category == category).map(|e| e.value().clone()).collect()
    }

    /// Every pattern whose applicability predicate matches the given page
    /// context, most confident first.
    pub fn applicable(&self, available_intents: &[String], present_elements: &[String]) -> Vec<ActionPattern> {
        let mut matches: Vec<ActionPattern> = self
            .patterns
            .iter()
            .filter(|e| e.value().applicability.matches(available_intents, present_elements))
            .map(|e| e.value().clone())
            .collect();
        matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        matches
    }

    /// Inserts a newly-promoted pattern or overwrites an existing one with
    /// the same id, then persists its category file.
    pub fn upsert(&self, pattern: ActionPattern) {
        let category = pattern.category.clone();
        self.index(pattern);
        if let Err(err) = self.persist_category(&category) {
            warn!(category, error = %err, "pattern store persist failed after upsert");
        }
    }

    /// Records a usage outcome against a pattern in place and persists.
    pub fn record_usage(&self, id: &str, succeeded: bool) {
        let category = {
            let Some(mut entry) = self.patterns.get_mut(id) else { return };
            entry.record_usage(succeeded);
            entry.category.clone()
        };
        if let Err(err) = self.persist_category(&category) {
            warn!(category, error = %err, "pattern store persist failed after recording usage");
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn category_path(&self, category: &str) -> Option<PathBuf> {
        self.base_dir.as_ref().map(|base| base.join("patterns").join(format!("{category}_patterns.json")))
    }

    fn persist_category(&self, category: &str) -> Result<(), PatternStoreError> {
        let Some(path) = self.category_path(category) else { return Ok(()) };
        let patterns = self.by_category(category);
        write_category_file(&path, &patterns)
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_category_file(path: &Path, patterns: &[ActionPattern]) -> Result<(), PatternStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PatternStoreError::Write { path: path.display().to_string(), source })?;
    }
    let json = serde_json::to_vec_pretty(&PatternFile { patterns: patterns.to_vec() })
        .map_err(|source| PatternStoreError::Parse { path: path.display().to_string(), source })?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|source| PatternStoreError::Write { path: tmp_path.display().to_string(), source })?;
    fs::rename(&tmp_path, path).map_err(|source| PatternStoreError::Write { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core_types::{ApplicabilityPredicate, PatternStep};

    fn sample(id: &str, category: &str) -> ActionPattern {
        ActionPattern {
            id: id.to_string(),
            name: "login flow".to_string(),
            category: category.to_string(),
            applicability: ApplicabilityPredicate {
                required_intents: vec!["login_button".to_string()],
                page_has_elements: vec![],
                page_lacks_elements: vec![],
            },
            steps: vec![
                PatternStep { verb: "fill".to_string(), intent: "username_input".to_string(), variable_slot: Some("username".to_string()) },
                PatternStep { verb: "click".to_string(), intent: "login_button".to_string(), variable_slot: None },
            ],
            variable_names: vec!["username".to_string()],
            success_indicators: vec![],
            failure_indicators: vec![],
            usage_count: 0,
            success_count: 0,
            confidence: 0.8,
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let store = PatternStore::new();
        store.upsert(sample("p1", "auth"));
        assert_eq!(store.get("p1").unwrap().name, "login flow");
    }

    #[test]
    fn find_by_fingerprint_locates_the_pattern() {
        let store = PatternStore::new();
        let pattern = sample("p1", "auth");
        let fingerprint = pattern.fingerprint();
        store.upsert(pattern);
        assert_eq!(store.find_by_fingerprint(&fingerprint).unwrap().id, "p1");
    }

    #[test]
    fn applicable_filters_by_predicate() {
        let store = PatternStore::new();
        store.upsert(sample("p1", "auth"));
        let hits = store.applicable(&["login_button".to_string()], &[]);
        assert_eq!(hits.len(), 1);
        let misses = store.applicable(&["search_box".to_string()], &[]);
        assert!(misses.is_empty());
    }

    #[test]
    fn record_usage_updates_confidence() {
        let store = PatternStore::new();
        store.upsert(sample("p1", "auth"));
        store.record_usage("p1", true);
        store.record_usage("p1", true);
        store.record_usage("p1", false);
        let pattern = store.get("p1").unwrap();
        assert_eq!(pattern.usage_count, 3);
        assert_eq!(pattern.success_count, 2);
    }

    #[test]
    fn persists_to_and_reloads_from_category_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PatternStore::open(dir.path()).unwrap();
        store.upsert(sample("p1", "auth"));
        assert!(dir.path().join("patterns/auth_patterns.json").exists());

        let reopened = PatternStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("p1").unwrap().category, "auth");
    }
}
