//! Cross-domain promotion: an AI-discovered selector that succeeds against
//! an intent matching one of a handful of universal keywords (login,
//! search, close...) is copied into a keyword-scoped global file, so a
//! selector shape that works on one site can seed the resolver's AI tier
//! hints on another.

use crate::errors::{read_json, write_json_atomic, LearningEngineError};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Intent substrings common enough across sites to be worth promoting
/// globally rather than keeping purely per-domain.
pub const UNIVERSAL_KEYWORDS: &[&str] =
    &["login", "logout", "submit", "search", "cancel", "close", "save", "delete", "edit", "next", "prev", "back", "menu"];

pub fn matching_keyword(intent: &str) -> Option<&'static str> {
    let lower = intent.to_lowercase();
    UNIVERSAL_KEYWORDS.iter().find(|kw| lower.contains(*kw)).copied()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossDomainEntry {
    pub selector_value: String,
    pub selector_kind: String,
    pub discovered_from: String,
    pub domains_used: Vec<String>,
    pub success_count: u64,
    pub failure_count: u64,
}

pub struct CrossDomainLedger {
    base_dir: Option<PathBuf>,
}

impl CrossDomainLedger {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: Some(base_dir.into()) }
    }

    fn path_for(base_dir: &std::path::Path, keyword: &str) -> PathBuf {
        base_dir.join("global").join(format!("{keyword}_patterns.json"))
    }

    /// Records a successful, AI-discovered selector against `keyword`'s
    /// global file. A no-op if this ledger wasn't opened against a
    /// directory (in-memory-only mode has nothing to promote into).
    pub fn promote(&self, keyword: &str, domain: &str, selector_value: &str, selector_kind: &str) -> Result<(), LearningEngineError> {
        let Some(base_dir) = &self.base_dir else { return Ok(()) };
        let path = Self::path_for(base_dir, keyword);
        let mut entries: HashMap<String, CrossDomainEntry> = read_json(&path)?.unwrap_or_default();

        let entry = entries.entry(selector_value.to_string()).or_insert_with(|| CrossDomainEntry {
            selector_value: selector_value.to_string(),
            selector_kind: selector_kind.to_string(),
            discovered_from: domain.to_string(),
            domains_used: Vec::new(),
            success_count: 0,
            failure_count: 0,
        });
        entry.success_count += 1;
        if !entry.domains_used.iter().any(|d| d == domain) {
            entry.domains_used.push(domain.to_string());
        }

        write_json_atomic(&path, &entries)
    }
}

impl Default for CrossDomainLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_a_universal_keyword_substring() {
        assert_eq!(matching_keyword("click_login_button"), Some("login"));
        assert_eq!(matching_keyword("fill_zip_code"), None);
    }

    #[test]
    fn promote_writes_and_merges_by_selector() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CrossDomainLedger::open(dir.path());
        ledger.promote("login", "a.com", "#login-btn", "css").unwrap();
        ledger.promote("login", "b.com", "#login-btn", "css").unwrap();

        let path = dir.path().join("global/login_patterns.json");
        let saved: HashMap<String, CrossDomainEntry> = read_json(&path).unwrap().unwrap();
        let entry = &saved["#login-btn"];
        assert_eq!(entry.success_count, 2);
        assert_eq!(entry.domains_used, vec!["a.com".to_string(), "b.com".to_string()]);
    }
}
