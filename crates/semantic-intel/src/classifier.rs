//! Intent -> SemanticType classification: a regex/keyword table, the same
//! shape as the teacher's content-type classifier (compiled `regex::Regex`
//! sets scored against normalized text) but aimed at a single normalized
//! intent string instead of a page's full text.

use crate::models::SemanticType;
use once_cell::sync::Lazy;
use regex::Regex;
use wayfarer_core_types::Intent;

struct IntentPattern {
    pattern: Regex,
    semantic_type: SemanticType,
}

static INTENT_PATTERNS: Lazy<Vec<IntentPattern>> = Lazy::new(|| {
    vec![
        IntentPattern {
            pattern: Regex::new(r"(enter|type|fill).*(email)").unwrap(),
            semantic_type: SemanticType::EmailInput,
        },
        IntentPattern {
            pattern: Regex::new(r"(enter|type|fill).*(user|username)").unwrap(),
            semantic_type: SemanticType::UsernameInput,
        },
        IntentPattern {
            pattern: Regex::new(r"(enter|type|fill).*(pass|password)").unwrap(),
            semantic_type: SemanticType::PasswordInput,
        },
        IntentPattern {
            pattern: Regex::new(r"(search|find|look_up|lookup)").unwrap(),
            semantic_type: SemanticType::SearchInput,
        },
        IntentPattern {
            pattern: Regex::new(r"(quantity|qty|amount)").unwrap(),
            semantic_type: SemanticType::QuantityInput,
        },
        IntentPattern {
            pattern: Regex::new(r"(add|put).*(cart|basket)").unwrap(),
            semantic_type: SemanticType::AddToCart,
        },
        IntentPattern {
            pattern: Regex::new(r"(checkout|check_out|place_order)").unwrap(),
            semantic_type: SemanticType::CheckoutButton,
        },
        IntentPattern {
            pattern: Regex::new(r"(log_?in|sign_?in)").unwrap(),
            semantic_type: SemanticType::LoginButton,
        },
        IntentPattern {
            pattern: Regex::new(r"(log_?out|sign_?out)").unwrap(),
            semantic_type: SemanticType::LogoutButton,
        },
        IntentPattern {
            pattern: Regex::new(r"(remove|delete|trash).*(item|product|row)").unwrap(),
            semantic_type: SemanticType::RemoveItem,
        },
        IntentPattern {
            pattern: Regex::new(r"(submit|confirm|send)").unwrap(),
            semantic_type: SemanticType::SubmitButton,
        },
    ]
});

/// Every semantic type the intent's normalized form matches, most-specific
/// patterns first (declaration order above is specificity order).
pub fn classify_intent(intent: &Intent) -> Vec<SemanticType> {
    INTENT_PATTERNS
        .iter()
        .filter(|p| p.pattern.is_match(intent.as_str()))
        .map(|p| p.semantic_type)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(s: &str) -> Intent {
        Intent::normalize(s)
    }

    #[test]
    fn email_phrase_classifies_as_email_input() {
        let types = classify_intent(&intent("enter your email address"));
        assert_eq!(types, vec![SemanticType::EmailInput]);
    }

    #[test]
    fn add_to_cart_phrase_classifies_correctly() {
        let types = classify_intent(&intent("add item to cart"));
        assert!(types.contains(&SemanticType::AddToCart));
    }

    #[test]
    fn unrelated_phrase_yields_no_match() {
        let types = classify_intent(&intent("take a screenshot"));
        assert!(types.is_empty());
    }

    #[test]
    fn login_and_generic_submit_can_both_match() {
        let types = classify_intent(&intent("click login submit"));
        assert!(types.contains(&SemanticType::LoginButton));
    }
}
