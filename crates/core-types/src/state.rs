//! `PageState`: the snapshot post-action verification diffs against.

use serde::{Deserialize, Serialize};

/// A snapshot of observable page state, taken before and after an action so
/// the Pre/Post Action Checker can tell whether anything actually happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    /// Hash over "stable" DOM structure -- ephemeral ids/timestamps excluded
    /// by the caller before hashing, so re-renders with fresh React keys
    /// don't register as spurious diffs.
    pub dom_hash: u64,
    pub visible_errors: Vec<String>,
    pub visible_blockers: Vec<String>,
    pub interactive_count: usize,
}

impl PageState {
    pub fn new(url: impl Into<String>, dom_hash: u64, interactive_count: usize) -> Self {
        Self {
            url: url.into(),
            dom_hash,
            visible_errors: Vec::new(),
            visible_blockers: Vec::new(),
            interactive_count,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.visible_errors = errors;
        self
    }

    pub fn with_blockers(mut self, blockers: Vec<String>) -> Self {
        self.visible_blockers = blockers;
        self
    }

    pub fn has_blocker(&self) -> bool {
        !self.visible_blockers.is_empty()
    }

    /// Diff against a prior snapshot: did this action have any observable
    /// effect, and which error indicators are newly visible?
    pub fn diff(&self, previous: &PageState) -> StateDiff {
        let had_effect = self.url != previous.url
            || self.dom_hash != previous.dom_hash
            || self.interactive_count != previous.interactive_count;
        let new_errors: Vec<String> = self
            .visible_errors
            .iter()
            .filter(|e| !previous.visible_errors.contains(e))
            .cloned()
            .collect();
        StateDiff {
            action_had_effect: had_effect,
            url_changed: self.url != previous.url,
            new_errors,
        }
    }
}

/// Result of comparing two [`PageState`] snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub action_had_effect: bool,
    pub url_changed: bool,
    pub new_errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_no_op_detected_when_nothing_changed() {
        let before = PageState::new("https://a.com/x", 42, 10);
        let after = PageState::new("https://a.com/x", 42, 10);
        let diff = after.diff(&before);
        assert!(!diff.action_had_effect);
        assert!(diff.new_errors.is_empty());
    }

    #[test]
    fn url_change_counts_as_effect() {
        let before = PageState::new("https://a.com/x", 42, 10);
        let after = PageState::new("https://a.com/y", 42, 10);
        assert!(after.diff(&before).action_had_effect);
        assert!(after.diff(&before).url_changed);
    }

    #[test]
    fn new_error_indicator_surfaces() {
        let before = PageState::new("https://a.com/x", 1, 1);
        let after = PageState::new("https://a.com/x", 1, 1).with_errors(vec![".error-toast".into()]);
        let diff = after.diff(&before);
        assert_eq!(diff.new_errors, vec![".error-toast".to_string()]);
    }
}
