//! Detecting when a step's `target` is already a selector rather than a
//! natural-language intent, and extracting a synthetic intent from it so KB
//! and the Heuristic/Semantic tiers still get a chance to outrank it.

use wayfarer_core_types::Intent;

const SELECTOR_PREFIXES: &[char] = &['#', '.', '['];

/// True if `target` looks like it's already expressed as a selector rather
/// than a phrase: a CSS prefix, an XPath, or text containing combinators.
pub fn looks_like_selector(target: &str) -> bool {
    let trimmed = target.trim();
    if trimmed.starts_with("//") || trimmed.starts_with("(//") {
        return true;
    }
    if trimmed.starts_with(|c| SELECTOR_PREFIXES.contains(&c)) {
        return true;
    }
    trimmed.contains(" > ") || trimmed.contains(":has-text(") || trimmed.contains("[data-")
}

/// Pull a synthetic intent phrase out of a raw selector string, e.g.
/// `[data-test*="sign-in"]` -> "sign in", `#login-button` -> "login button".
pub fn extract_intent(target: &str) -> Intent {
    let cleaned: String = target
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    Intent::normalize(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_id_selector_detected() {
        assert!(looks_like_selector("#login-button"));
    }

    #[test]
    fn attribute_selector_detected() {
        assert!(looks_like_selector("[data-test*=\"sign-in\"]"));
    }

    #[test]
    fn plain_phrase_not_detected() {
        assert!(!looks_like_selector("click the login button"));
    }

    #[test]
    fn intent_extracted_from_attribute_selector() {
        let intent = extract_intent("[data-test*=\"signup-btn\"]");
        assert!(intent.as_str().contains("signup"));
        assert!(intent.as_str().contains("btn"));
    }
}
