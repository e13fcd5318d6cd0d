//! Failure classification: turns a driver error message plus page context
//! into a [`FailureKind`] the strategy table can look up.

/// The failure taxonomy the recovery handler strategizes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ElementNotFound,
    ElementNotVisible,
    ElementNotEnabled,
    StaleElement,
    ElementIntercepted,
    Timeout,
    NavigationError,
    ModalBlocking,
    CookieBanner,
    LoadingSpinner,
    Unknown,
}

impl FailureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::ElementNotFound => "element_not_found",
            FailureKind::ElementNotVisible => "element_not_visible",
            FailureKind::ElementNotEnabled => "element_not_enabled",
            FailureKind::StaleElement => "stale_element",
            FailureKind::ElementIntercepted => "element_intercepted",
            FailureKind::Timeout => "timeout",
            FailureKind::NavigationError => "navigation_error",
            FailureKind::ModalBlocking => "modal_blocking",
            FailureKind::CookieBanner => "cookie_banner",
            FailureKind::LoadingSpinner => "loading_spinner",
            FailureKind::Unknown => "unknown",
        }
    }
}

/// Page-state hints gathered by the Pre/Post Action Checker, consulted when
/// the raw error message alone doesn't pin down a failure kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureContext {
    pub has_modal: bool,
    pub has_cookie_banner: bool,
    pub is_loading: bool,
}

/// Classifies a driver error message (+ context) into a [`FailureKind`].
/// Message substrings are checked in the same priority order the original
/// recovery handler used, with the context-derived overlay hints as a
/// fallback when the message itself is uninformative.
pub fn classify(message: &str, context: FailureContext) -> FailureKind {
    let lower = message.to_lowercase();

    if contains_any(&lower, &["no element", "not found", "unable to locate"]) {
        return FailureKind::ElementNotFound;
    }
    if contains_any(&lower, &["not visible", "hidden", "display: none"]) {
        return FailureKind::ElementNotVisible;
    }
    if contains_any(&lower, &["disabled", "not enabled", "readonly"]) {
        return FailureKind::ElementNotEnabled;
    }
    if contains_any(&lower, &["stale", "detached", "no longer attached"]) {
        return FailureKind::StaleElement;
    }
    if contains_any(&lower, &["intercepted", "covered", "obscured", "other element"]) {
        return FailureKind::ElementIntercepted;
    }
    if lower.contains("timeout") {
        return FailureKind::Timeout;
    }
    if contains_any(&lower, &["navigation", "net::", "err_"]) {
        return FailureKind::NavigationError;
    }

    if context.has_modal {
        return FailureKind::ModalBlocking;
    }
    if context.has_cookie_banner {
        return FailureKind::CookieBanner;
    }
    if context.is_loading {
        return FailureKind::LoadingSpinner;
    }

    FailureKind::Unknown
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_not_found_classifies_correctly() {
        assert_eq!(classify("element not found: #login", FailureContext::default()), FailureKind::ElementNotFound);
    }

    #[test]
    fn message_timeout_takes_priority_over_context() {
        let ctx = FailureContext { has_modal: true, ..Default::default() };
        assert_eq!(classify("operation timed out", ctx), FailureKind::Timeout);
    }

    #[test]
    fn context_modal_used_when_message_uninformative() {
        let ctx = FailureContext { has_modal: true, ..Default::default() };
        assert_eq!(classify("driver error: unexpected", ctx), FailureKind::ModalBlocking);
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(classify("driver error: unexpected", FailureContext::default()), FailureKind::Unknown);
    }
}
