//! Selector value/kind pair, and the stability prior derived from its form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The grammar a [`Selector`] value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Css,
    Xpath,
    Text,
    Role,
    Placeholder,
    Label,
    Testid,
}

impl SelectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorKind::Css => "css",
            SelectorKind::Xpath => "xpath",
            SelectorKind::Text => "text",
            SelectorKind::Role => "role",
            SelectorKind::Placeholder => "placeholder",
            SelectorKind::Label => "label",
            SelectorKind::Testid => "testid",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A concrete locator: a value in a given grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub value: String,
    pub kind: SelectorKind,
}

impl Selector {
    pub fn new(value: impl Into<String>, kind: SelectorKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(value, SelectorKind::Css)
    }

    pub fn testid(value: impl Into<String>) -> Self {
        Self::new(value, SelectorKind::Testid)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(value, SelectorKind::Text)
    }

    /// Base confidence before any observed outcomes, derived purely from the
    /// selector's form. `data-testid` is most stable; positional/class-chain
    /// selectors are penalized; anything that looks dynamically generated
    /// (a long run of digits/hex, a hash-like fragment) is penalized further.
    pub fn stability_prior(&self) -> f64 {
        let base = match self.kind {
            SelectorKind::Testid => 0.98,
            SelectorKind::Label => 0.88,
            SelectorKind::Role => 0.86,
            SelectorKind::Placeholder => 0.82,
            SelectorKind::Text => 0.65,
            SelectorKind::Css => self.css_prior(),
            SelectorKind::Xpath => self.xpath_prior(),
        };
        if self.looks_dynamic() {
            (base * 0.6).max(0.1)
        } else {
            base
        }
    }

    fn css_prior(&self) -> f64 {
        let v = &self.value;
        if v.contains("[data-testid") || v.contains("[data-test") {
            0.95
        } else if v.contains("[id=") || v.starts_with('#') {
            0.85
        } else if v.contains("[name=") {
            0.80
        } else if v.contains("[aria-label") {
            0.85
        } else if v.starts_with('.') || v.contains(" > ") || v.contains(">") {
            0.5
        } else {
            0.55
        }
    }

    fn xpath_prior(&self) -> f64 {
        if self.value.contains("contains(@data-testid") {
            0.9
        } else if self.value.contains("position()") || self.value.contains('[') && self.value.contains(']') && self.value.chars().any(|c| c.is_ascii_digit()) {
            0.3
        } else {
            0.45
        }
    }

    /// Heuristic for "this fragment looks auto-generated and will break on
    /// the next deploy": long hex/digit runs, css-in-js style hashed class
    /// names (`css-1a2b3c4`, `sc-hGsFaZ`), or an id that is mostly digits.
    fn looks_dynamic(&self) -> bool {
        let v = self.value.to_lowercase();
        let digit_run = v
            .chars()
            .collect::<Vec<_>>()
            .windows(6)
            .any(|w| w.iter().filter(|c| c.is_ascii_hexdigit()).count() >= 6);
        digit_run || v.contains("css-") || v.contains("__webpack") || v.contains(":r")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testid_has_highest_prior() {
        let s = Selector::testid("[data-testid=\"login\"]");
        assert!(s.stability_prior() > Selector::css(".btn.primary").stability_prior());
    }

    #[test]
    fn dynamic_looking_fragment_is_penalized() {
        let stable = Selector::css("#login-button");
        let dynamic = Selector::css("#a1b2c3d4e5f6");
        assert!(dynamic.stability_prior() < stable.stability_prior());
    }

    #[test]
    fn xpath_positional_has_low_prior() {
        let s = Selector::new("//div[3]/button[2]", SelectorKind::Xpath);
        assert!(s.stability_prior() <= 0.35);
    }
}
