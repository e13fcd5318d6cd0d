//! `ElementDna`: a derived, multi-field fingerprint used for similarity matching.

use serde::{Deserialize, Serialize};

/// Fields extracted from a concrete DOM element, used to generate
/// alternative selectors after a known one stops matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementDna {
    pub semantic_type: Option<String>,
    pub tag: Option<String>,
    pub test_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub role: Option<String>,
    pub visible_text: Option<String>,
    pub label_text: Option<String>,
    pub autocomplete: Option<String>,
    pub required: bool,
    pub has_dynamic_id: bool,
    pub has_framework_classes: bool,
}

impl ElementDna {
    /// Weighted similarity in [0, 1]; semantic-type match dominates the sum.
    pub fn similarity(&self, other: &ElementDna) -> f64 {
        let mut score = 0.0;
        let mut weight_total = 0.0;

        let mut add = |weight: f64, a: &Option<String>, b: &Option<String>| {
            weight_total += weight;
            if let (Some(a), Some(b)) = (a, b) {
                if a.eq_ignore_ascii_case(b) {
                    score += weight;
                }
            }
        };

        // Semantic type dominates: weight far above any single field.
        add(4.0, &self.semantic_type, &other.semantic_type);
        add(1.5, &self.test_id, &other.test_id);
        add(1.2, &self.id, &other.id);
        add(1.0, &self.name, &other.name);
        add(1.0, &self.aria_label, &other.aria_label);
        add(0.8, &self.placeholder, &other.placeholder);
        add(0.8, &self.role, &other.role);
        add(0.6, &self.visible_text, &other.visible_text);
        add(0.6, &self.label_text, &other.label_text);
        add(0.3, &self.tag, &other.tag);

        if weight_total == 0.0 {
            return 0.0;
        }
        (score / weight_total).clamp(0.0, 1.0)
    }

    /// Stable attributes present on this DNA, as candidate selectors to try
    /// when a known selector stops matching.
    pub fn stable_attribute_candidates(&self) -> Vec<(String, String)> {
        let mut candidates = Vec::new();
        if let Some(tid) = &self.test_id {
            candidates.push(("testid".to_string(), tid.clone()));
        }
        if !self.has_dynamic_id {
            if let Some(id) = &self.id {
                candidates.push(("id".to_string(), id.clone()));
            }
        }
        if let Some(name) = &self.name {
            candidates.push(("name".to_string(), name.clone()));
        }
        if let Some(label) = &self.aria_label {
            candidates.push(("aria_label".to_string(), label.clone()));
        }
        if let Some(placeholder) = &self.placeholder {
            candidates.push(("placeholder".to_string(), placeholder.clone()));
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_type_match_dominates() {
        let a = ElementDna {
            semantic_type: Some("LOGIN_BUTTON".into()),
            tag: Some("button".into()),
            ..Default::default()
        };
        let b = ElementDna {
            semantic_type: Some("LOGIN_BUTTON".into()),
            tag: Some("a".into()),
            ..Default::default()
        };
        let c = ElementDna {
            semantic_type: Some("SUBMIT_BUTTON".into()),
            tag: Some("button".into()),
            ..Default::default()
        };
        assert!(a.similarity(&b) > a.similarity(&c));
    }

    #[test]
    fn dynamic_id_excluded_from_candidates() {
        let dna = ElementDna {
            id: Some("el-38291".into()),
            has_dynamic_id: true,
            test_id: Some("submit-btn".into()),
            ..Default::default()
        };
        let candidates = dna.stable_attribute_candidates();
        assert!(candidates.iter().all(|(k, _)| k != "id"));
        assert!(candidates.iter().any(|(k, _)| k == "testid"));
    }
}
