//! Token synonym table used to fuzzy-match an incoming intent against a
//! stored `element_key` when no exact match exists -- e.g. "submit" the
//! order should find a record keyed `click_confirm_order`.

const GROUPS: &[&[&str]] = &[
    &["submit", "confirm", "send", "proceed", "continue"],
    &["login", "signin", "sign"],
    &["logout", "signout"],
    &["remove", "delete", "trash"],
    &["add", "create", "new"],
    &["edit", "update", "modify"],
    &["search", "find", "lookup", "query"],
    &["close", "dismiss", "cancel"],
    &["open", "show", "expand"],
    &["email", "mail"],
    &["pass", "password", "pwd"],
    &["phone", "mobile", "telephone"],
];

fn canonical(token: &str) -> &str {
    for group in GROUPS {
        if group.contains(&token) {
            return group[0];
        }
    }
    token
}

/// Jaccard similarity between two token sets after synonym canonicalization.
pub fn token_similarity(a: &[&str], b: &[&str]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let canon_a: std::collections::HashSet<&str> = a.iter().map(|t| canonical(t)).collect();
    let canon_b: std::collections::HashSet<&str> = b.iter().map(|t| canonical(t)).collect();
    let intersection = canon_a.intersection(&canon_b).count();
    let union = canon_a.union(&canon_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_collapse_to_same_canonical_form() {
        assert_eq!(canonical("signin"), canonical("login"));
        assert_eq!(canonical("send"), canonical("submit"));
    }

    #[test]
    fn identical_token_sets_are_fully_similar() {
        let a = vec!["click", "login", "button"];
        let b = vec!["click", "login", "button"];
        assert_eq!(token_similarity(&a, &b), 1.0);
    }

    #[test]
    fn synonym_tokens_still_score_similarity() {
        let a = vec!["click", "signin", "button"];
        let b = vec!["click", "login", "button"];
        assert!(token_similarity(&a, &b) > 0.9);
    }

    #[test]
    fn disjoint_token_sets_score_zero() {
        let a = vec!["click", "logout"];
        let b = vec!["fill", "email"];
        assert_eq!(token_similarity(&a, &b), 0.0);
    }
}
