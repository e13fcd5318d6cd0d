//! `ElementRecord`: the persisted, per-(domain, page, intent) knowledge unit.

use crate::selector::{Selector, SelectorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-selector learned statistics, nested inside an [`ElementRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub selector: Selector,
    pub successes: u32,
    pub failures: u32,
    pub confidence: f64,
    pub last_used_at: Option<DateTime<Utc>>,
    /// Which resolution tier first discovered this selector.
    pub source_tier: String,
    pub ai_discovered: bool,
}

impl SelectorEntry {
    pub fn new(selector: Selector, source_tier: impl Into<String>, ai_discovered: bool) -> Self {
        let confidence = selector.stability_prior();
        Self {
            selector,
            successes: 0,
            failures: 0,
            confidence,
            last_used_at: None,
            source_tier: source_tier.into(),
            ai_discovered,
        }
    }

    pub fn total_observations(&self) -> u32 {
        self.successes + self.failures
    }
}

/// Element attribute snapshot captured at time of first success, kept for
/// future semantic re-matching after a selector goes stale.
pub type AttributeSnapshot = HashMap<String, String>;

/// Persisted per-(domain, page, intent) knowledge: the ranked selector list
/// plus the attribute snapshot used for DNA re-matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRecord {
    pub domain: String,
    pub page: String,
    pub element_key: String,
    pub selectors: Vec<SelectorEntry>,
    pub attributes: AttributeSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ElementRecord {
    pub fn new(domain: impl Into<String>, page: impl Into<String>, element_key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.into(),
            page: page.into(),
            element_key: element_key.into(),
            selectors: Vec::new(),
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sort selectors by confidence descending, stable (lexicographic) tie-break.
    pub fn resort(&mut self) {
        self.selectors.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.selector.value.cmp(&b.selector.value))
        });
    }

    pub fn best(&self) -> Option<&SelectorEntry> {
        self.selectors.first()
    }

    pub fn find_mut(&mut self, value: &str, kind: SelectorKind) -> Option<&mut SelectorEntry> {
        self.selectors
            .iter_mut()
            .find(|e| e.selector.value == value && e.selector.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorKind;

    #[test]
    fn resort_orders_by_confidence_desc() {
        let mut record = ElementRecord::new("example.com", "/login", "login_button");
        let mut low = SelectorEntry::new(Selector::css(".btn"), "heuristic", false);
        low.confidence = 0.3;
        let mut high = SelectorEntry::new(Selector::testid("login"), "kb", false);
        high.confidence = 0.9;
        record.selectors.push(low);
        record.selectors.push(high);
        record.resort();
        assert_eq!(record.selectors[0].selector.kind, SelectorKind::Testid);
    }
}
