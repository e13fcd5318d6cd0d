//! Heuristic Engine (C4): given intent tokens and page HTML, emits scored
//! selector candidates from attribute and visible-text matches. No state,
//! no learning -- a pure scoring function over the current page.

mod parse;

pub use parse::{parse_elements, ParsedElement};

use wayfarer_core_types::{Intent, Selector, SelectorKind};

const SCORE_TEST_ATTR: f64 = 0.6;
const SCORE_ID: f64 = 0.5;
const SCORE_NAMED_ATTR: f64 = 0.4;
const SCORE_VALUE_ATTR: f64 = 0.35;
const SCORE_CLASS: f64 = 0.2;
const SCORE_DATA_ATTR: f64 = 0.3;
const SCORE_TAG_MATCH: f64 = 0.2;
const SCORE_TEXT: f64 = 0.35;

const MAX_CANDIDATES: usize = 8;
const INTERACTIVE_TEXT_TAGS: &[&str] = &["button", "a"];

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicCandidate {
    pub selector: Selector,
    pub score: f64,
}

/// Score every element in `html` against `intent`'s tokens and return up to
/// [`MAX_CANDIDATES`] deduplicated candidates, highest score first.
pub fn scan(html: &str, intent: &Intent) -> Vec<HeuristicCandidate> {
    let tokens = intent.tokens();
    if tokens.is_empty() {
        return Vec::new();
    }

    let elements = parse_elements(html);
    let mut candidates: Vec<HeuristicCandidate> = Vec::new();

    for element in &elements {
        let mut raw_score = 0.0;
        let mut matched_tokens = 0;
        let mut best_attr: Option<(&'static str, String)> = None;

        for token in &tokens {
            let mut token_matched = false;

            if element.attr_contains("testid", token) || element.attr_contains("test", token) {
                raw_score += SCORE_TEST_ATTR;
                token_matched = true;
                best_attr.get_or_insert(("testid", attr_value_containing(element, &["data-testid", "data-test"], token)));
            }
            if let Some(id) = element.attributes.get("id") {
                if id.to_lowercase().contains(token) {
                    raw_score += SCORE_ID;
                    token_matched = true;
                    best_attr.get_or_insert(("id", id.clone()));
                }
            }
            for key in ["name", "aria-label", "title", "placeholder"] {
                if element.attr_contains(key, token) {
                    raw_score += SCORE_NAMED_ATTR;
                    token_matched = true;
                    if let Some(v) = element.attributes.get(key) {
                        best_attr.get_or_insert((leak_key(key), v.clone()));
                    }
                }
            }
            if element.attr_contains("value", token) {
                raw_score += SCORE_VALUE_ATTR;
                token_matched = true;
            }
            if element.attr_contains("class", token) {
                raw_score += SCORE_CLASS;
                token_matched = true;
                if let Some(v) = element.attributes.get("class") {
                    best_attr.get_or_insert(("class", v.clone()));
                }
            }
            if element.any_data_attr_contains(token) {
                raw_score += SCORE_DATA_ATTR;
                token_matched = true;
            }
            if element.tag == *token {
                raw_score += SCORE_TAG_MATCH;
                token_matched = true;
            }
            if element.visible_text.to_lowercase().contains(token) {
                raw_score += SCORE_TEXT;
                token_matched = true;
            }

            if token_matched {
                matched_tokens += 1;
            }
        }

        if matched_tokens == 0 {
            continue;
        }

        let multiplier = match matched_tokens {
            1 => 1.0,
            2 => 1.2,
            _ => 1.3,
        };
        let score = raw_score * multiplier;

        if let Some((kind, value)) = best_attr {
            candidates.push(HeuristicCandidate { selector: attr_selector(kind, &value), score });
        } else if !element.visible_text.is_empty() {
            candidates.push(HeuristicCandidate {
                selector: Selector::new(format!("{}:has-text('{}')", element.tag, element.visible_text), SelectorKind::Css),
                score,
            });
        } else {
            candidates.push(HeuristicCandidate { selector: Selector::new(element.tag.clone(), SelectorKind::Css), score });
        }

        if INTERACTIVE_TEXT_TAGS.contains(&element.tag.as_str()) && !element.visible_text.is_empty() {
            candidates.push(HeuristicCandidate { selector: Selector::text(element.visible_text.clone()), score: score * 0.95 });
        }
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    dedup_by_selector(&mut candidates);
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn leak_key(key: &str) -> &'static str {
    match key {
        "name" => "name",
        "aria-label" => "aria-label",
        "title" => "title",
        "placeholder" => "placeholder",
        _ => "attr",
    }
}

fn attr_value_containing(element: &ParsedElement, keys: &[&str], _token: &str) -> String {
    for key in keys {
        if let Some(v) = element.attributes.get(*key) {
            return v.clone();
        }
    }
    element.attributes.values().next().cloned().unwrap_or_default()
}

fn attr_selector(kind: &str, value: &str) -> Selector {
    match kind {
        "testid" => Selector::new(format!("[data-testid=\"{value}\"]"), SelectorKind::Css),
        "id" => Selector::new(format!("#{value}"), SelectorKind::Css),
        "class" => Selector::new(format!(".{}", value.split_whitespace().next().unwrap_or(value)), SelectorKind::Css),
        other => Selector::new(format!("[{other}=\"{value}\"]"), SelectorKind::Css),
    }
}

fn dedup_by_selector(candidates: &mut Vec<HeuristicCandidate>) {
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.selector.value.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(s: &str) -> Intent {
        Intent::normalize(s)
    }

    #[test]
    fn testid_match_scores_highest() {
        let html = r#"<button data-testid="login-submit">Log In</button><div class="login">x</div>"#;
        let results = scan(html, &intent("click login"));
        assert!(!results.is_empty());
        assert!(results[0].selector.value.contains("data-testid"));
    }

    #[test]
    fn multi_token_match_outscores_single_token() {
        let html = r#"<button id="submit-order-btn">Submit Order</button><button id="submit">Submit</button>"#;
        let results = scan(html, &intent("submit order"));
        let multi = results.iter().find(|c| c.selector.value.contains("submit-order")).unwrap();
        let single = results.iter().find(|c| c.selector.value == "#submit").unwrap();
        assert!(multi.score > single.score);
    }

    #[test]
    fn button_text_emits_both_containment_and_text_selector() {
        let html = r#"<button class="btn">Add to Cart</button>"#;
        let results = scan(html, &intent("add to cart"));
        assert!(results.iter().any(|c| c.selector.kind == SelectorKind::Text));
    }

    #[test]
    fn caps_output_at_eight_candidates() {
        let mut html = String::new();
        for i in 0..20 {
            html.push_str(&format!(r#"<button id="login-{i}" class="login">Login {i}</button>"#));
        }
        let results = scan(&html, &intent("login"));
        assert!(results.len() <= 8);
    }

    #[test]
    fn no_match_yields_empty() {
        let html = r#"<div class="unrelated">Nothing here</div>"#;
        let results = scan(html, &intent("checkout payment"));
        assert!(results.is_empty());
    }

    #[test]
    fn empty_intent_yields_no_candidates() {
        let html = r#"<button id="a">A</button>"#;
        let results = scan(html, &intent("   "));
        assert!(results.is_empty());
    }
}
