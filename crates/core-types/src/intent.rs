//! Normalized intent: the stable key every selector is learned and looked up under.

use serde::{Deserialize, Serialize};
use std::fmt;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "on", "in", "to", "of", "for", "with", "and", "please", "now",
];

/// A normalized, hashable descriptor of the element a step targets.
///
/// Produced from a raw human phrase ("click the login button") by
/// lowercasing, stripping stop words, and collapsing separators. Stable
/// across runs and used as the Knowledge Store key -- raw phrases are kept
/// only for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent(String);

impl Intent {
    /// Normalize a raw phrase into an `Intent`.
    ///
    /// Normalization is idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .filter(|t| !STOP_WORDS.contains(t))
            .collect();
        Intent(tokens.join("_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> Vec<&str> {
        if self.0.is_empty() {
            Vec::new()
        } else {
            self.0.split('_').collect()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Intent {
    fn from(raw: &str) -> Self {
        Intent::normalize(raw)
    }
}

impl From<String> for Intent {
    fn from(raw: String) -> Self {
        Intent::normalize(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_phrase_to_tokens() {
        let intent = Intent::normalize("Click the Login Button");
        assert_eq!(intent.as_str(), "click_login_button");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = Intent::normalize("fill the Email Address");
        let twice = Intent::normalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_phrase_yields_empty_intent() {
        let intent = Intent::normalize("   ");
        assert!(intent.is_empty());
    }

    #[test]
    fn collapses_separators_and_case() {
        let a = Intent::normalize("Sign-In Button!!");
        let b = Intent::normalize("sign_in button");
        assert_eq!(a, b);
    }
}
