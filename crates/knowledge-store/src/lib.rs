//! Knowledge Store (C2): the first and highest-confidence tier of the
//! selector resolution pipeline. Holds what has already worked, keyed by
//! `(domain, page, intent)`, and adjusts confidence in place as the
//! orchestrator reports outcomes.
//!
//! In-memory state is a [`DashMap`] for single-writer-many-readers access
//! from the resolver and the learning engine's batch writer concurrently.
//! Persistence is best-effort JSON-to-disk, one file per domain under
//! `<base_dir>/selectors/<domain>.json`; a write failure is logged and
//! swallowed rather than propagated, since losing a persist is recoverable
//! (the in-memory copy is still authoritative for the running process) but
//! aborting a step over it is not.

pub mod errors;
pub mod synonyms;

pub use errors::KnowledgeStoreError;

use chrono::Utc;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;
use wayfarer_core_types::{ElementRecord, Intent, Selector, SelectorEntry};

/// Success confidence update: `c <- min(1, c + alpha * (1 - c))`.
const ALPHA: f64 = 0.2;
/// Failure confidence update: `c <- max(0, c - beta * c)`.
const BETA: f64 = 0.25;
/// Below this, a selector is a pruning candidate rather than a resolver pick.
const PRUNE_FLOOR: f64 = 0.05;
/// Fuzzy intent match must clear this token-similarity score to count as a hit.
const FUZZY_MATCH_THRESHOLD: f64 = 0.6;

type RecordKey = (String, String, String);

fn record_key(domain: &str, page: &str, element_key: &str) -> RecordKey {
    (domain.to_string(), page.to_string(), element_key.to_string())
}

#[derive(Default)]
struct StoreMetrics {
    lookups: AtomicU64,
    exact_hits: AtomicU64,
    fuzzy_hits: AtomicU64,
    misses: AtomicU64,
    outcomes_recorded: AtomicU64,
    pruned: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct KnowledgeStoreStats {
    pub lookups: u64,
    pub exact_hits: u64,
    pub fuzzy_hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub outcomes_recorded: u64,
    pub pruned: u64,
    pub current_records: u64,
}

/// What the resolver gets back from a lookup: the matched record and whether
/// the match was exact or resolved via fuzzy synonym matching (surfaced so
/// callers can down-weight a fuzzy hit if they want to).
pub struct KnowledgeLookup {
    pub record: ElementRecord,
    pub exact: bool,
}

pub struct KnowledgeStore {
    records: DashMap<RecordKey, ElementRecord>,
    base_dir: Option<PathBuf>,
    metrics: StoreMetrics,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            base_dir: None,
            metrics: StoreMetrics::default(),
        }
    }

    /// Load every `selectors/*.json` file under `base_dir` into memory and
    /// keep `base_dir` for future persists.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, KnowledgeStoreError> {
        let base_dir = base_dir.into();
        let store = Self {
            records: DashMap::new(),
            base_dir: Some(base_dir.clone()),
            metrics: StoreMetrics::default(),
        };

        let selectors_dir = base_dir.join("selectors");
        if !selectors_dir.exists() {
            return Ok(store);
        }
        let entries = fs::read_dir(&selectors_dir).map_err(|source| KnowledgeStoreError::Read {
            path: selectors_dir.display().to_string(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).map_err(|source| KnowledgeStoreError::Read {
                path: path.display().to_string(),
                source,
            })?;
            if bytes.is_empty() {
                continue;
            }
            let records: Vec<ElementRecord> =
                serde_json::from_slice(&bytes).map_err(|source| KnowledgeStoreError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            for record in records {
                let key = record_key(&record.domain, &record.page, &record.element_key);
                store.records.insert(key, record);
            }
        }
        Ok(store)
    }

    /// Exact-key lookup with a fuzzy fallback across every record on the same
    /// `(domain, page)`, scored by synonym-aware token similarity against the
    /// stored `element_key`.
    pub fn lookup(&self, domain: &str, page: &str, intent: &Intent) -> Option<KnowledgeLookup> {
        self.metrics.lookups.fetch_add(1, Ordering::Relaxed);
        let key = record_key(domain, page, intent.as_str());
        if let Some(record) = self.records.get(&key) {
            self.metrics.exact_hits.fetch_add(1, Ordering::Relaxed);
            return Some(KnowledgeLookup { record: record.clone(), exact: true });
        }

        let query_tokens = intent.tokens();
        let mut best: Option<(f64, ElementRecord)> = None;
        for entry in self.records.iter() {
            let (d, p, _) = entry.key();
            if d != domain || p != page {
                continue;
            }
            let candidate_intent = Intent::normalize(&entry.value().element_key);
            let score = synonyms::token_similarity(&query_tokens, &candidate_intent.tokens());
            if score >= FUZZY_MATCH_THRESHOLD && best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, entry.value().clone()));
            }
        }

        match best {
            Some((_, record)) => {
                self.metrics.fuzzy_hits.fetch_add(1, Ordering::Relaxed);
                Some(KnowledgeLookup { record, exact: false })
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Record a resolution outcome against a specific selector, creating the
    /// record/entry if this is the first time it has been seen. Applies the
    /// confidence update formula and re-sorts the record's selector list.
    pub fn record_outcome(
        &self,
        domain: &str,
        page: &str,
        element_key: &str,
        selector: &Selector,
        success: bool,
        source_tier: &str,
        ai_discovered: bool,
    ) {
        let key = record_key(domain, page, element_key);
        let mut record = self
            .records
            .entry(key)
            .or_insert_with(|| ElementRecord::new(domain, page, element_key));

        let entry = match record.find_mut(&selector.value, selector.kind) {
            Some(entry) => entry,
            None => {
                record
                    .selectors
                    .push(SelectorEntry::new(selector.clone(), source_tier, ai_discovered));
                record.selectors.last_mut().expect("just pushed")
            }
        };

        if success {
            entry.successes += 1;
            entry.confidence = (entry.confidence + ALPHA * (1.0 - entry.confidence)).min(1.0);
        } else {
            entry.failures += 1;
            entry.confidence = (entry.confidence - BETA * entry.confidence).max(0.0);
        }
        entry.last_used_at = Some(Utc::now());

        record.updated_at = Utc::now();
        record.resort();
        drop(record);

        self.metrics.outcomes_recorded.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = self.persist_domain(domain) {
            warn!(domain, error = %err, "knowledge store persist failed after recording outcome");
        }
    }

    /// Snapshot an attribute map onto a record, used after a DNA-based
    /// re-match so future lookups can re-derive selectors from the same
    /// attribute fingerprint.
    pub fn snapshot_attributes(
        &self,
        domain: &str,
        page: &str,
        element_key: &str,
        attributes: std::collections::HashMap<String, String>,
    ) {
        let key = record_key(domain, page, element_key);
        let mut record = self
            .records
            .entry(key)
            .or_insert_with(|| ElementRecord::new(domain, page, element_key));
        record.attributes = attributes;
        record.updated_at = Utc::now();
    }

    /// Age-based confidence decay: any selector entry unused for longer than
    /// `stale_after_days` loses `decay_rate` of its remaining confidence.
    /// Intended to run on a schedule from the learning engine, not per-step.
    pub fn apply_decay(&self, stale_after_days: i64, decay_rate: f64) -> u64 {
        let now = Utc::now();
        let mut decayed = 0u64;
        for mut entry in self.records.iter_mut() {
            let mut touched = false;
            for selector in entry.value_mut().selectors.iter_mut() {
                let Some(last_used) = selector.last_used_at else { continue };
                let age_days = (now - last_used).num_days();
                if age_days >= stale_after_days {
                    selector.confidence = (selector.confidence - decay_rate * selector.confidence).max(0.0);
                    touched = true;
                    decayed += 1;
                }
            }
            if touched {
                entry.value_mut().resort();
            }
        }
        decayed
    }

    /// Drop selector entries below [`PRUNE_FLOOR`], and any record left with
    /// zero selectors as a result. Returns the number of selector entries removed.
    pub fn prune(&self) -> u64 {
        let mut removed = 0u64;
        let mut empty_keys = Vec::new();
        for mut entry in self.records.iter_mut() {
            let before = entry.value().selectors.len();
            entry.value_mut().selectors.retain(|s| s.confidence >= PRUNE_FLOOR);
            removed += (before - entry.value().selectors.len()) as u64;
            if entry.value().is_empty() {
                empty_keys.push(entry.key().clone());
            }
        }
        for key in empty_keys {
            self.records.remove(&key);
        }
        self.metrics.pruned.fetch_add(removed, Ordering::Relaxed);
        removed
    }

    /// All records for a domain, for export/backup tooling.
    pub fn export_domain(&self, domain: &str) -> Vec<ElementRecord> {
        self.records
            .iter()
            .filter(|entry| entry.key().0 == domain)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Replace (not merge) every record for `domain` with the given set,
    /// then persist. Used by `wayfarer kb import`.
    pub fn import_domain(&self, domain: &str, records: Vec<ElementRecord>) -> Result<(), KnowledgeStoreError> {
        self.records.retain(|key, _| key.0 != domain);
        for mut record in records {
            record.domain = domain.to_string();
            let key = record_key(&record.domain, &record.page, &record.element_key);
            self.records.insert(key, record);
        }
        self.persist_domain(domain)
    }

    pub fn stats(&self) -> KnowledgeStoreStats {
        let lookups = self.metrics.lookups.load(Ordering::Relaxed);
        let exact_hits = self.metrics.exact_hits.load(Ordering::Relaxed);
        let fuzzy_hits = self.metrics.fuzzy_hits.load(Ordering::Relaxed);
        let misses = self.metrics.misses.load(Ordering::Relaxed);
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            (exact_hits + fuzzy_hits) as f64 / lookups as f64
        };
        KnowledgeStoreStats {
            lookups,
            exact_hits,
            fuzzy_hits,
            misses,
            hit_rate,
            outcomes_recorded: self.metrics.outcomes_recorded.load(Ordering::Relaxed),
            pruned: self.metrics.pruned.load(Ordering::Relaxed),
            current_records: self.records.len() as u64,
        }
    }

    fn domain_path(&self, domain: &str) -> Option<PathBuf> {
        self.base_dir.as_ref().map(|base| base.join("selectors").join(format!("{domain}.json")))
    }

    fn persist_domain(&self, domain: &str) -> Result<(), KnowledgeStoreError> {
        let Some(path) = self.domain_path(domain) else {
            return Ok(());
        };
        write_domain_file(&path, &self.export_domain(domain))
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_domain_file(path: &Path, records: &[ElementRecord]) -> Result<(), KnowledgeStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| KnowledgeStoreError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }
    let json = serde_json::to_vec_pretty(records).map_err(|source| KnowledgeStoreError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|source| KnowledgeStoreError::Write {
        path: tmp_path.display().to_string(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| KnowledgeStoreError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core_types::SelectorKind;

    fn intent(s: &str) -> Intent {
        Intent::normalize(s)
    }

    #[test]
    fn exact_lookup_after_recording_outcome() {
        let store = KnowledgeStore::new();
        let selector = Selector::testid("login-btn");
        store.record_outcome("example.com", "/login", "click_login_button", &selector, true, "kb", false);

        let looked_up = store
            .lookup("example.com", "/login", &intent("click the login button"))
            .expect("record present");
        assert!(looked_up.exact);
        assert_eq!(looked_up.record.best().unwrap().selector.value, "login-btn");
    }

    #[test]
    fn fuzzy_lookup_matches_via_synonym() {
        let store = KnowledgeStore::new();
        let selector = Selector::testid("signin-btn");
        store.record_outcome("example.com", "/login", "click_signin_button", &selector, true, "kb", false);

        let looked_up = store
            .lookup("example.com", "/login", &intent("click login button"))
            .expect("fuzzy match");
        assert!(!looked_up.exact);
    }

    #[test]
    fn success_raises_confidence_failure_lowers_it() {
        let store = KnowledgeStore::new();
        let selector = Selector::css(".btn-submit");
        store.record_outcome("a.com", "/x", "submit", &selector, true, "heuristic", false);
        let after_success = store
            .lookup("a.com", "/x", &intent("submit"))
            .unwrap()
            .record
            .best()
            .unwrap()
            .confidence;

        store.record_outcome("a.com", "/x", "submit", &selector, false, "heuristic", false);
        let after_failure = store
            .lookup("a.com", "/x", &intent("submit"))
            .unwrap()
            .record
            .best()
            .unwrap()
            .confidence;

        assert!(after_failure < after_success);
    }

    #[test]
    fn prune_drops_low_confidence_entries() {
        let store = KnowledgeStore::new();
        let dying = Selector::css(".flaky");
        for _ in 0..10 {
            store.record_outcome("a.com", "/y", "thing", &dying, false, "heuristic", false);
        }
        let removed = store.prune();
        assert!(removed >= 1);
        assert!(store.lookup("a.com", "/y", &intent("thing")).is_none());
    }

    #[test]
    fn decay_reduces_confidence_of_stale_entries() {
        let store = KnowledgeStore::new();
        let selector = Selector::testid("old-one");
        store.record_outcome("a.com", "/z", "old", &selector, true, "kb", false);
        // stale_after_days=0 means "any selector with a last_used_at" decays immediately
        let decayed = store.apply_decay(0, 0.5);
        assert_eq!(decayed, 1);
    }

    #[test]
    fn export_then_import_round_trips_domain() {
        let store = KnowledgeStore::new();
        let selector = Selector::css("#x");
        store.record_outcome("a.com", "/p", "thing", &selector, true, "heuristic", false);
        let exported = store.export_domain("a.com");
        assert_eq!(exported.len(), 1);

        let other = KnowledgeStore::new();
        other.import_domain("a.com", exported).unwrap();
        assert!(other.lookup("a.com", "/p", &intent("thing")).is_some());
    }

    #[test]
    fn open_loads_persisted_domain_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KnowledgeStore::open(tmp.path()).unwrap();
        let selector = Selector::testid("persist-me");
        store.record_outcome("p.com", "/a", "save", &selector, true, "kb", false);

        let reopened = KnowledgeStore::open(tmp.path()).unwrap();
        let looked_up = reopened.lookup("p.com", "/a", &intent("save")).unwrap();
        assert_eq!(looked_up.record.best().unwrap().selector.value, "persist-me");
    }

    #[test]
    fn find_mut_reuses_existing_selector_entry() {
        let mut record = ElementRecord::new("a.com", "/q", "thing");
        record.selectors.push(SelectorEntry::new(Selector::css("#a"), "heuristic", false));
        assert!(record.find_mut("#a", SelectorKind::Css).is_some());
        assert!(record.find_mut("#missing", SelectorKind::Css).is_none());
    }
}
