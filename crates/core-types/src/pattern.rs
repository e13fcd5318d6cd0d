//! `ActionPattern`: a promoted, reusable, ordered step sequence.

use serde::{Deserialize, Serialize};

/// A single step inside a promoted pattern, with slots for the variables a
/// caller must supply when replaying it (e.g. the username/password values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStep {
    pub verb: String,
    pub intent: String,
    /// Name of the variable slot this step's value comes from, if any
    /// (e.g. `"username"`); `None` for steps with no parameterized value.
    pub variable_slot: Option<String>,
}

/// A requirement on the page a pattern's applicability predicate checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicabilityPredicate {
    pub required_intents: Vec<String>,
    pub page_has_elements: Vec<String>,
    pub page_lacks_elements: Vec<String>,
}

impl ApplicabilityPredicate {
    pub fn matches(&self, available_intents: &[String], present_elements: &[String]) -> bool {
        let intents_ok = self
            .required_intents
            .iter()
            .all(|i| available_intents.iter().any(|a| a == i));
        let has_ok = self
            .page_has_elements
            .iter()
            .all(|e| present_elements.iter().any(|p| p == e));
        let lacks_ok = self
            .page_lacks_elements
            .iter()
            .all(|e| !present_elements.iter().any(|p| p == e));
        intents_ok && has_ok && lacks_ok
    }
}

/// A named, reusable step sequence promoted by the Learning Engine once a
/// fingerprint has occurred often enough with a high enough success rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPattern {
    pub id: String,
    pub name: String,
    pub category: String,
    pub applicability: ApplicabilityPredicate,
    pub steps: Vec<PatternStep>,
    pub variable_names: Vec<String>,
    pub success_indicators: Vec<String>,
    pub failure_indicators: Vec<String>,
    pub usage_count: u32,
    pub success_count: u32,
    pub confidence: f64,
}

impl ActionPattern {
    pub fn fingerprint(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("{}:{}", s.verb, s.intent))
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn record_usage(&mut self, succeeded: bool) {
        self.usage_count += 1;
        if succeeded {
            self.success_count += 1;
        }
        self.confidence = if self.usage_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.usage_count as f64
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_concatenates_verb_intent_pairs() {
        let pattern = ActionPattern {
            id: "p1".into(),
            name: "login_flow".into(),
            category: "auth".into(),
            applicability: ApplicabilityPredicate {
                required_intents: vec![],
                page_has_elements: vec![],
                page_lacks_elements: vec![],
            },
            steps: vec![
                PatternStep {
                    verb: "fill".into(),
                    intent: "username_input".into(),
                    variable_slot: Some("username".into()),
                },
                PatternStep {
                    verb: "click".into(),
                    intent: "login_button".into(),
                    variable_slot: None,
                },
            ],
            variable_names: vec!["username".into()],
            success_indicators: vec![],
            failure_indicators: vec![],
            usage_count: 0,
            success_count: 0,
            confidence: 0.0,
        };
        assert_eq!(pattern.fingerprint(), "fill:username_input|click:login_button");
    }
}
