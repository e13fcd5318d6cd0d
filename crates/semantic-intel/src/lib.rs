//! Semantic Intelligence (C5): maps a normalized intent to the semantic
//! element roles it could be targeting, and scans page HTML for elements
//! matching those roles. Competes with the Heuristic Engine inside the
//! resolver's parallel tier -- a semantic-type match ranks above a raw
//! attribute heuristic at equal score, since it encodes *meaning* rather
//! than just attribute overlap.

pub mod classifier;
pub mod errors;
pub mod models;

pub use classifier::classify_intent;
pub use errors::{Result, SemanticError};
pub use models::{MatchedAttrKind, SemanticMatch, SemanticType};

use wayfarer_core_types::{ElementDna, Intent, Selector, SelectorKind};
use wayfarer_heuristic_engine::{parse_elements, ParsedElement};

/// Scan `html` for elements matching any semantic type implied by `intent`,
/// in order of the intent's classified types. Each page element is tested
/// against every candidate semantic type's signature.
pub fn scan_page(html: &str, intent: &Intent) -> Vec<SemanticMatch> {
    let wanted = classifier::classify_intent(intent);
    if wanted.is_empty() {
        return Vec::new();
    }
    let elements = parse_elements(html);
    let mut matches = Vec::new();
    for element in &elements {
        for semantic_type in &wanted {
            if let Some((kind, value)) = signature_match(element, *semantic_type) {
                let selector = attr_selector(kind, &value, element);
                matches.push(SemanticMatch {
                    semantic_type: *semantic_type,
                    confidence: kind.confidence(),
                    selector,
                    matched_via: kind,
                    dna: extract_dna(element, Some(*semantic_type)),
                });
            }
        }
    }
    matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

/// If `element` matches `semantic_type`'s signature, return the kind of
/// attribute that matched and its value (used to build the selector and to
/// rank confidence via [`MatchedAttrKind`]).
fn signature_match(element: &ParsedElement, semantic_type: SemanticType) -> Option<(MatchedAttrKind, String)> {
    let testid = element.attributes.get("data-testid").or_else(|| element.attributes.get("data-test"));
    if let Some(tid) = testid {
        if matches_semantic_hint(element, semantic_type, tid) {
            return Some((MatchedAttrKind::TestId, tid.clone()));
        }
    }

    let input_type = element.attributes.get("type").cloned().unwrap_or_default();
    let name = element.attributes.get("name").cloned().unwrap_or_default();
    let id = element.attributes.get("id").cloned().unwrap_or_default();
    let placeholder = element.attributes.get("placeholder").cloned().unwrap_or_default();
    let text = element.visible_text.to_lowercase();
    let is_clickable = matches!(element.tag.as_str(), "button" | "a") || element.attributes.get("role").map(|r| r == "button").unwrap_or(false);

    let signature_hit = match semantic_type {
        SemanticType::PasswordInput => input_type == "password",
        SemanticType::EmailInput => input_type == "email" || name.contains("email") || placeholder.to_lowercase().contains("email"),
        SemanticType::UsernameInput => name.contains("user") || placeholder.to_lowercase().contains("user"),
        SemanticType::SearchInput => input_type == "search" || name.contains("search") || placeholder.to_lowercase().contains("search"),
        SemanticType::QuantityInput => name.contains("qty") || name.contains("quantity") || id.contains("qty"),
        SemanticType::SubmitButton => input_type == "submit" || (is_clickable && (text.contains("submit") || text.contains("confirm"))),
        SemanticType::LoginButton => is_clickable && (text.contains("log in") || text.contains("login") || text.contains("sign in")),
        SemanticType::LogoutButton => is_clickable && (text.contains("log out") || text.contains("logout") || text.contains("sign out")),
        SemanticType::AddToCart => is_clickable && (text.contains("add to cart") || text.contains("add to basket")),
        SemanticType::CheckoutButton => is_clickable && (text.contains("checkout") || text.contains("check out")),
        SemanticType::RemoveItem => is_clickable && (text.contains("remove") || text.contains("delete")),
    };

    if !signature_hit {
        return None;
    }

    if !id.is_empty() {
        Some((MatchedAttrKind::Id, id))
    } else if !name.is_empty() {
        Some((MatchedAttrKind::Name, name))
    } else if !input_type.is_empty() {
        Some((MatchedAttrKind::Type, input_type))
    } else if !placeholder.is_empty() {
        Some((MatchedAttrKind::Placeholder, placeholder))
    } else {
        Some((MatchedAttrKind::Text, element.visible_text.clone()))
    }
}

fn matches_semantic_hint(_element: &ParsedElement, semantic_type: SemanticType, testid_value: &str) -> bool {
    let v = testid_value.to_lowercase();
    let keyword = match semantic_type {
        SemanticType::PasswordInput => "pass",
        SemanticType::EmailInput => "email",
        SemanticType::UsernameInput => "user",
        SemanticType::SearchInput => "search",
        SemanticType::QuantityInput => "qty",
        SemanticType::SubmitButton => "submit",
        SemanticType::LoginButton => "login",
        SemanticType::LogoutButton => "logout",
        SemanticType::AddToCart => "cart",
        SemanticType::CheckoutButton => "checkout",
        SemanticType::RemoveItem => "remove",
    };
    v.contains(keyword)
}

fn attr_selector(kind: MatchedAttrKind, value: &str, element: &ParsedElement) -> Selector {
    match kind {
        MatchedAttrKind::TestId => Selector::new(format!("[data-testid=\"{value}\"]"), SelectorKind::Css),
        MatchedAttrKind::Id => Selector::new(format!("#{value}"), SelectorKind::Css),
        MatchedAttrKind::Name => Selector::new(format!("[name=\"{value}\"]"), SelectorKind::Css),
        MatchedAttrKind::Type => Selector::new(format!("{}[type=\"{value}\"]", element.tag), SelectorKind::Css),
        MatchedAttrKind::Placeholder => Selector::new(format!("[placeholder=\"{value}\"]"), SelectorKind::Css),
        MatchedAttrKind::Text => Selector::text(value.to_string()),
    }
}

/// Extract an [`ElementDna`] fingerprint from a matched element, used by the
/// resolver to generate alternatives after a selector goes stale.
pub fn extract_dna(element: &ParsedElement, semantic_type: Option<SemanticType>) -> ElementDna {
    let id = element.attributes.get("id").cloned();
    let has_dynamic_id = id.as_ref().map(|v| looks_dynamic(v)).unwrap_or(false);
    let class = element.attributes.get("class").cloned().unwrap_or_default();
    ElementDna {
        semantic_type: semantic_type.map(|t| t.name().to_string()),
        tag: Some(element.tag.clone()),
        test_id: element.attributes.get("data-testid").or_else(|| element.attributes.get("data-test")).cloned(),
        id,
        name: element.attributes.get("name").cloned(),
        aria_label: element.attributes.get("aria-label").cloned(),
        placeholder: element.attributes.get("placeholder").cloned(),
        role: element.attributes.get("role").cloned(),
        visible_text: if element.visible_text.is_empty() { None } else { Some(element.visible_text.clone()) },
        label_text: None,
        autocomplete: element.attributes.get("autocomplete").cloned(),
        required: element.attributes.contains_key("required"),
        has_dynamic_id,
        has_framework_classes: class.contains("Mui") || class.contains("ant-") || class.contains("css-"),
    }
}

fn looks_dynamic(value: &str) -> bool {
    let digit_run = value.chars().filter(|c| c.is_ascii_digit()).count();
    digit_run >= 4 || value.starts_with("react-") || value.starts_with(":r")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(s: &str) -> Intent {
        Intent::normalize(s)
    }

    #[test]
    fn finds_password_input_by_type() {
        let html = r#"<input type="password" id="pwd"/>"#;
        let matches = scan_page(html, &intent("enter your password"));
        assert!(matches.iter().any(|m| m.semantic_type == SemanticType::PasswordInput));
    }

    #[test]
    fn testid_match_ranks_above_text_match() {
        let html = r#"<button data-testid="add-to-cart-btn">Add to Cart</button>"#;
        let matches = scan_page(html, &intent("add to cart"));
        assert_eq!(matches[0].matched_via, MatchedAttrKind::TestId);
    }

    #[test]
    fn dna_marks_dynamic_id_as_unstable() {
        let html = r#"<div id="el-48213" data-testid="login-btn">Login</div>"#;
        let matches = scan_page(html, &intent("click login"));
        let m = matches.iter().find(|m| m.semantic_type == SemanticType::LoginButton).unwrap();
        assert!(m.dna.has_dynamic_id);
    }

    #[test]
    fn no_semantic_types_classified_yields_no_matches() {
        let html = r#"<div>hello</div>"#;
        let matches = scan_page(html, &intent("observe weather"));
        assert!(matches.is_empty());
    }

    #[test]
    fn framework_class_flagged_in_dna() {
        let html = r#"<button class="MuiButton-root" id="ok">Submit</button>"#;
        let matches = scan_page(html, &intent("submit"));
        assert!(matches.iter().any(|m| m.dna.has_framework_classes));
    }
}
