//! Pre/Post Action Checker (C8): cheap, DOM-only gating around a step.
//!
//! The pre-check clears non-critical overlays (cookie banners), refuses to
//! proceed while a critical blocker (modal, loading spinner) is still up,
//! and snapshots a [`PageState`]. The post-check diffs a fresh snapshot
//! against that baseline so the orchestrator can tell a silent no-op from a
//! step that actually did something.

pub mod errors;
pub mod overlays;

pub use errors::CheckerError;

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, warn};
use wayfarer_core_types::{ExecRoute, PageState, Selector, StateDiff};
use wayfarer_driver::Driver;

/// Result of [`ActionChecker::pre_check`].
#[derive(Debug, Clone)]
pub struct PreCheckResult {
    /// `false` if a critical blocker (modal, loading indicator) is still
    /// visible after the auto-dismiss pass.
    pub ready: bool,
    /// Selectors successfully clicked away during this pass.
    pub dismissed: Vec<String>,
    /// Selectors still blocking readiness.
    pub blocking: Vec<String>,
    pub state: PageState,
}

/// Result of [`ActionChecker::post_check`].
#[derive(Debug, Clone)]
pub struct PostCheckResult {
    pub diff: StateDiff,
    pub state: PageState,
    /// `true` when the action had no observable effect and isn't one of the
    /// verbs expected to be a no-op (a pure wait or an assertion).
    pub silent_no_op: bool,
}

pub struct ActionChecker {
    driver: Arc<dyn Driver>,
}

impl ActionChecker {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Detects visible overlays, auto-dismisses the non-critical ones
    /// (cookie banners), and reports whether a critical blocker remains.
    pub async fn pre_check(&self, route: &ExecRoute) -> Result<PreCheckResult, CheckerError> {
        let mut dismissed = Vec::new();
        let mut blocking = Vec::new();

        for raw in overlays::COOKIE_BANNER_SELECTORS {
            let selector = Selector::css(*raw);
            if self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                match self.driver.click(route, &selector, false).await {
                    Ok(()) => {
                        debug!(selector = *raw, "dismissed cookie banner");
                        dismissed.push((*raw).to_string());
                    }
                    Err(err) => warn!(selector = *raw, error = %err, "cookie banner dismiss click failed"),
                }
            }
        }

        for raw in overlays::MODAL_DISMISS_SELECTORS {
            let selector = Selector::css(*raw);
            if !self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                continue;
            }
            let _ = self.driver.click(route, &selector, false).await;
            if self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                warn!(selector = *raw, "modal still visible after dismiss attempt");
                blocking.push((*raw).to_string());
            } else {
                dismissed.push((*raw).to_string());
            }
        }

        for raw in overlays::LOADING_INDICATORS {
            let selector = Selector::css(*raw);
            if self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                blocking.push((*raw).to_string());
            }
        }

        let state = self.snapshot(route).await?;
        Ok(PreCheckResult { ready: blocking.is_empty(), dismissed, blocking, state })
    }

    /// Takes a fresh snapshot and diffs it against `before`. `verb_is_passive`
    /// should be `true` for pure wait/assertion verbs, which are expected to
    /// leave the page untouched and therefore never get flagged as a silent
    /// no-op.
    pub async fn post_check(&self, route: &ExecRoute, before: &PageState, verb_is_passive: bool) -> Result<PostCheckResult, CheckerError> {
        let state = self.snapshot(route).await?;
        let diff = state.diff(before);
        let silent_no_op = !verb_is_passive && !diff.action_had_effect;
        if silent_no_op {
            warn!(url = %state.url, "action produced no observable effect");
        }
        Ok(PostCheckResult { diff, state, silent_no_op })
    }

    /// Snapshots URL, a stable-content hash, interactive element count, and
    /// currently visible error/blocker indicators.
    pub async fn snapshot(&self, route: &ExecRoute) -> Result<PageState, CheckerError> {
        let url = self.driver.page_url(route).await?;
        let content = self.driver.page_content(route).await?;
        let dom_hash = content_hash(&content);
        let interactive_count = wayfarer_heuristic_engine::parse_elements(&content)
            .iter()
            .filter(|el| is_interactive_tag(&el.tag))
            .count();

        let mut visible_errors = Vec::new();
        for raw in overlays::ERROR_INDICATORS {
            let selector = Selector::css(*raw);
            if self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                visible_errors.push((*raw).to_string());
            }
        }
        let mut visible_blockers = Vec::new();
        for raw in overlays::MODAL_DISMISS_SELECTORS.iter().chain(overlays::LOADING_INDICATORS) {
            let selector = Selector::css(*raw);
            if self.driver.is_visible(route, &selector).await.unwrap_or(false) {
                visible_blockers.push((*raw).to_string());
            }
        }

        Ok(PageState::new(url, dom_hash, interactive_count).with_errors(visible_errors).with_blockers(visible_blockers))
    }
}

fn is_interactive_tag(tag: &str) -> bool {
    matches!(tag, "a" | "button" | "input" | "select" | "textarea" | "option" | "label")
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_driver::mock::{MockDriver, MockElement};

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    #[tokio::test]
    async fn pre_check_dismisses_cookie_banner_and_reports_ready() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_content("p", "<button>Log in</button>")
                .with_element("p", "#cookie-accept", MockElement::visible_enabled("cookie-accept")),
        );
        let checker = ActionChecker::new(driver);
        let result = checker.pre_check(&route()).await.unwrap();
        assert!(result.ready);
        assert!(result.dismissed.iter().any(|s| s == "#cookie-accept"));
    }

    #[tokio::test]
    async fn pre_check_reports_not_ready_when_modal_persists() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_content("p", "<div class=\"modal\">stuck</div>")
                .with_element("p", ".modal-close", MockElement::visible_enabled("modal-close")),
        );
        let checker = ActionChecker::new(driver);
        let result = checker.pre_check(&route()).await.unwrap();
        assert!(!result.ready);
        assert!(result.blocking.iter().any(|s| s == ".modal-close"));
    }

    #[tokio::test]
    async fn post_check_flags_silent_no_op() {
        let driver = Arc::new(
            MockDriver::new().with_page("p", "https://example.com").with_content("p", "<div>static</div>"),
        );
        let checker = ActionChecker::new(driver);
        let before = checker.snapshot(&route()).await.unwrap();
        let result = checker.post_check(&route(), &before, false).await.unwrap();
        assert!(result.silent_no_op);
        assert!(!result.diff.action_had_effect);
    }

    #[tokio::test]
    async fn post_check_does_not_flag_passive_verbs() {
        let driver = Arc::new(
            MockDriver::new().with_page("p", "https://example.com").with_content("p", "<div>static</div>"),
        );
        let checker = ActionChecker::new(driver);
        let before = checker.snapshot(&route()).await.unwrap();
        let result = checker.post_check(&route(), &before, true).await.unwrap();
        assert!(!result.silent_no_op);
    }

    #[tokio::test]
    async fn post_check_detects_url_change() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com/a"));
        let checker = ActionChecker::new(driver.clone());
        let before = checker.snapshot(&route()).await.unwrap();
        driver.navigate(&route(), "https://example.com/b", wayfarer_driver::WaitUntil::Load).await.unwrap();
        let result = checker.post_check(&route(), &before, false).await.unwrap();
        assert!(result.diff.action_had_effect);
        assert!(result.diff.url_changed);
    }
}
