//! Minimal element enumeration over a serialized HTML fragment using
//! compiled regexes rather than a DOM tree library -- the same technique the
//! teacher's semantic perceiver uses to scan HTML/text (compiled
//! `regex::Regex` tables over the raw string) instead of parsing a tree.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<([a-zA-Z][\w-]*)((?:\s+[\w:-]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s/>]+))?)*)\s*/?>([^<]{0,160})"#)
        .expect("valid tag regex")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)"|([\w:-]+)\s*=\s*'([^']*)'"#).expect("valid attr regex")
});

#[derive(Debug, Clone)]
pub struct ParsedElement {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub visible_text: String,
}

impl ParsedElement {
    pub fn attr_contains(&self, key_substr: &str, token: &str) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| k.contains(key_substr) && v.to_lowercase().contains(token))
    }

    pub fn any_data_attr_contains(&self, token: &str) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| k.starts_with("data-") && v.to_lowercase().contains(token))
    }
}

/// Scan raw HTML into a flat list of elements with their attributes and a
/// short window of following visible text. Not a real parser: tags are
/// matched independently of nesting, which is sufficient for attribute and
/// nearby-text scoring but does not reconstruct a DOM tree.
pub fn parse_elements(html: &str) -> Vec<ParsedElement> {
    let mut elements = Vec::new();
    for caps in TAG_RE.captures_iter(html) {
        let tag = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
        let attrs_raw = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let text_raw = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        let mut attributes = HashMap::new();
        for attr_caps in ATTR_RE.captures_iter(attrs_raw) {
            if let (Some(k), Some(v)) = (attr_caps.get(1), attr_caps.get(2)) {
                attributes.insert(k.as_str().to_lowercase(), v.as_str().to_string());
            } else if let (Some(k), Some(v)) = (attr_caps.get(3), attr_caps.get(4)) {
                attributes.insert(k.as_str().to_lowercase(), v.as_str().to_string());
            }
        }

        let visible_text = strip_tags(text_raw).trim().to_string();
        elements.push(ParsedElement { tag, attributes, visible_text });
    }
    elements
}

fn strip_tags(s: &str) -> String {
    s.chars().filter(|c| *c != '<' && *c != '>').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attributes_and_text() {
        let html = r#"<button id="login-btn" class="btn primary">Log In</button>"#;
        let elements = parse_elements(html);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag, "button");
        assert_eq!(elements[0].attributes.get("id").unwrap(), "login-btn");
        assert_eq!(elements[0].visible_text, "Log In");
    }

    #[test]
    fn data_testid_detected_as_data_attr() {
        let html = r#"<input data-testid="email-field" placeholder="Email"/>"#;
        let elements = parse_elements(html);
        assert!(elements[0].any_data_attr_contains("email"));
        assert!(elements[0].attr_contains("placeholder", "email"));
    }
}
