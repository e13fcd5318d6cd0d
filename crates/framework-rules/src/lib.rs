//! Framework Rule Table (C3): static, pre-seeded selector pattern catalogs
//! for recognized UI component libraries, plus a universal table that
//! applies when no framework is detected or a component class has no
//! framework-specific entry. No state -- this is "day zero" knowledge that
//! works before anything has been learned.

mod catalog;

pub use catalog::{ComponentClass, Framework};

use wayfarer_core_types::{Intent, Selector, SelectorKind};

/// One candidate selector pattern with its relevance, before intent-slot
/// substitution has been scored against anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCandidate {
    pub selector: Selector,
    pub relevance: f64,
    pub framework: Option<Framework>,
    pub component: ComponentClass,
}

/// Classify which component class an intent is most likely targeting, based
/// on keyword overlap. Returns `None` if nothing in the intent's tokens maps
/// to a known component class.
pub fn classify_component(intent: &Intent) -> Option<ComponentClass> {
    let tokens = intent.tokens();
    ComponentClass::ALL
        .iter()
        .copied()
        .filter_map(|class| {
            let hits = tokens.iter().filter(|t| class.keywords().contains(t)).count();
            if hits > 0 {
                Some((class, hits))
            } else {
                None
            }
        })
        .max_by_key(|(_, hits)| *hits)
        .map(|(class, _)| class)
}

/// Produce ranked selector candidates for an intent, optionally scoped to a
/// detected framework. Always includes the universal table's entries for the
/// matched component class; framework-specific entries (when a framework is
/// given and it has a catalog entry for the class) are ranked above them.
pub fn candidates(intent: &Intent, framework: Option<Framework>) -> Vec<RuleCandidate> {
    let Some(component) = classify_component(intent) else {
        return Vec::new();
    };
    let slot_text = slot_fill_text(intent, component);

    let mut out = Vec::new();
    if let Some(fw) = framework {
        for pattern in catalog::framework_patterns(fw, component) {
            out.push(RuleCandidate {
                selector: instantiate(pattern, &slot_text),
                relevance: pattern.relevance,
                framework: Some(fw),
                component,
            });
        }
    }
    for pattern in catalog::universal_patterns(component) {
        out.push(RuleCandidate {
            selector: instantiate(pattern, &slot_text),
            relevance: pattern.relevance,
            framework: None,
            component,
        });
    }

    out.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// The tokens left over after removing the component-class keyword become
/// the text/label/name slot value -- e.g. "click submit order" with
/// component `button` leaves "order" as the fill text.
fn slot_fill_text(intent: &Intent, component: ComponentClass) -> String {
    intent
        .tokens()
        .into_iter()
        .filter(|t| !component.keywords().contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn instantiate(pattern: &catalog::Pattern, slot_text: &str) -> Selector {
    let value = pattern.template.replace("{text}", slot_text).replace("{label}", slot_text).replace("{name}", slot_text);
    Selector::new(value, SelectorKind::Css)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(s: &str) -> Intent {
        Intent::normalize(s)
    }

    #[test]
    fn classifies_button_component_from_keywords() {
        let component = classify_component(&intent("click submit button"));
        assert_eq!(component, Some(ComponentClass::Button));
    }

    #[test]
    fn classifies_text_field_from_fill_keywords() {
        let component = classify_component(&intent("fill email address"));
        assert_eq!(component, Some(ComponentClass::TextField));
    }

    #[test]
    fn material_candidates_rank_above_universal() {
        let results = candidates(&intent("click submit button"), Some(Framework::MaterialUi));
        assert!(!results.is_empty());
        assert!(results.iter().any(|c| c.framework == Some(Framework::MaterialUi)));
        assert!(results.iter().any(|c| c.framework.is_none()));
        // framework-specific entries should not rank below every universal one
        let best_material = results.iter().find(|c| c.framework == Some(Framework::MaterialUi)).unwrap();
        let worst_universal = results.iter().filter(|c| c.framework.is_none()).last().unwrap();
        assert!(best_material.relevance >= worst_universal.relevance);
    }

    #[test]
    fn no_framework_falls_back_to_universal_only() {
        let results = candidates(&intent("click login button"), None);
        assert!(!results.is_empty());
        assert!(results.iter().all(|c| c.framework.is_none()));
    }

    #[test]
    fn unmatched_intent_yields_no_candidates() {
        let results = candidates(&intent("observe the weather"), Some(Framework::Bootstrap));
        assert!(results.is_empty());
    }

    #[test]
    fn text_slot_is_filled_from_remaining_tokens() {
        let results = candidates(&intent("click submit order"), Some(Framework::AntDesign));
        assert!(results.iter().any(|c| c.selector.value.contains("order")));
    }
}
