//! Recovery Handler (C10): classifies a failure, looks up (or reuses a
//! previously-successful) recovery action, and executes it against the live
//! page via the driver. Budgeted to 3 attempts per (failure kind, selector).

pub mod errors;
pub mod failure;
pub mod strategy;

pub use errors::RecoveryError;
pub use failure::{classify, FailureContext, FailureKind};
pub use strategy::{default_strategy, RecoveryAction};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use wayfarer_action_checker::overlays::{COOKIE_BANNER_SELECTORS, LOADING_INDICATORS, MODAL_DISMISS_SELECTORS};
use wayfarer_core_types::{ExecRoute, Selector};
use wayfarer_driver::{Driver, WaitState, WaitUntil};

const MAX_RECOVERY_ATTEMPTS: u32 = 3;
const MODAL_SETTLE: Duration = Duration::from_millis(500);
const ESCAPE_SETTLE: Duration = Duration::from_millis(300);
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const INDICATOR_HIDDEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one [`RecoveryHandler::attempt_recovery`] call.
#[derive(Debug, Clone)]
pub struct RecoveryResult {
    pub success: bool,
    pub action_taken: RecoveryAction,
    pub details: String,
    /// Whether the caller should retry the action that originally failed.
    pub should_retry_original: bool,
}

pub struct RecoveryHandler {
    driver: Arc<dyn Driver>,
    attempts: DashMap<(FailureKind, String), u32>,
    /// The last action that successfully recovered from a given failure
    /// kind -- tried first on the next occurrence.
    successful: DashMap<FailureKind, RecoveryAction>,
}

impl RecoveryHandler {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver, attempts: DashMap::new(), successful: DashMap::new() }
    }

    /// Resets attempt counters. Called at step boundaries so budgets don't
    /// leak across unrelated steps.
    pub fn reset(&self) {
        self.attempts.clear();
    }

    pub async fn attempt_recovery(&self, route: &ExecRoute, kind: FailureKind, selector: Option<&Selector>) -> RecoveryResult {
        let key = (kind, selector.map(|s| s.value.clone()).unwrap_or_else(|| "general".to_string()));
        let count = self.attempts.get(&key).map(|v| *v).unwrap_or(0);
        if count >= MAX_RECOVERY_ATTEMPTS {
            return RecoveryResult {
                success: false,
                action_taken: RecoveryAction::None,
                details: "max recovery attempts exceeded".to_string(),
                should_retry_original: false,
            };
        }
        self.attempts.insert(key, count + 1);

        let mut ordered: Vec<RecoveryAction> = Vec::new();
        if let Some(prior) = self.successful.get(&kind) {
            ordered.push(*prior);
        }
        for action in default_strategy(kind) {
            if !ordered.contains(action) {
                ordered.push(*action);
            }
        }

        for action in ordered {
            match self.execute_action(route, action, selector).await {
                Ok(true) => {
                    self.successful.insert(kind, action);
                    debug!(kind = kind.name(), action = action.name(), "recovery succeeded");
                    return RecoveryResult {
                        success: true,
                        action_taken: action,
                        details: format!("recovery succeeded via {}", action.name()),
                        should_retry_original: true,
                    };
                }
                Ok(false) => continue,
                Err(err) => {
                    warn!(kind = kind.name(), action = action.name(), error = %err, "recovery action errored");
                    continue;
                }
            }
        }

        RecoveryResult {
            success: false,
            action_taken: RecoveryAction::None,
            details: "all recovery actions failed".to_string(),
            should_retry_original: false,
        }
    }

    async fn execute_action(&self, route: &ExecRoute, action: RecoveryAction, selector: Option<&Selector>) -> Result<bool, RecoveryError> {
        match action {
            RecoveryAction::WaitAndRetry => {
                sleep(Duration::from_secs(1)).await;
                Ok(true)
            }
            RecoveryAction::ScrollIntoView => self.scroll_into_view(route, selector).await,
            RecoveryAction::DismissModal => self.dismiss_modal(route).await,
            RecoveryAction::DismissCookieBanner => self.dismiss_cookie_banner(route).await,
            RecoveryAction::WaitForLoading => self.wait_for_loading(route).await,
            RecoveryAction::RefreshPage => self.refresh_page(route).await,
            RecoveryAction::ClearOverlays => self.clear_overlays(route).await,
            RecoveryAction::JsClick => self.js_click(route, selector).await,
            RecoveryAction::None => Ok(false),
        }
    }

    async fn scroll_into_view(&self, route: &ExecRoute, selector: Option<&Selector>) -> Result<bool, RecoveryError> {
        if let Some(selector) = selector {
            if self.driver.scroll_into_view(route, selector).await.is_ok() {
                return Ok(true);
            }
        }
        self.driver.page_evaluate(route, "window.scrollBy(0, 300)").await?;
        Ok(true)
    }

    async fn dismiss_modal(&self, route: &ExecRoute) -> Result<bool, RecoveryError> {
        for raw in MODAL_DISMISS_SELECTORS {
            let candidate = Selector::css(*raw);
            if self.driver.is_visible(route, &candidate).await.unwrap_or(false)
                && self.driver.click(route, &candidate, false).await.is_ok()
            {
                sleep(MODAL_SETTLE).await;
                return Ok(true);
            }
        }
        if self.driver.keyboard_press(route, "Escape").await.is_ok() {
            sleep(ESCAPE_SETTLE).await;
            return Ok(true);
        }
        Ok(false)
    }

    async fn dismiss_cookie_banner(&self, route: &ExecRoute) -> Result<bool, RecoveryError> {
        for raw in COOKIE_BANNER_SELECTORS {
            let candidate = Selector::css(*raw);
            if self.driver.is_visible(route, &candidate).await.unwrap_or(false)
                && self.driver.click(route, &candidate, false).await.is_ok()
            {
                sleep(MODAL_SETTLE).await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn wait_for_loading(&self, route: &ExecRoute) -> Result<bool, RecoveryError> {
        let _ = self.driver.wait_for_load_state(route, WaitUntil::NetworkIdle, NETWORK_IDLE_TIMEOUT).await;
        for raw in LOADING_INDICATORS {
            let candidate = Selector::css(*raw);
            let _ = self.driver.wait_for(route, &candidate, WaitState::Hidden, INDICATOR_HIDDEN_TIMEOUT).await;
        }
        Ok(true)
    }

    async fn refresh_page(&self, route: &ExecRoute) -> Result<bool, RecoveryError> {
        let url = self.driver.page_url(route).await?;
        self.driver.navigate(route, &url, WaitUntil::Load).await?;
        sleep(Duration::from_secs(1)).await;
        Ok(true)
    }

    async fn clear_overlays(&self, route: &ExecRoute) -> Result<bool, RecoveryError> {
        let script = r#"
            document.querySelectorAll('.overlay, .modal-backdrop, [class*="overlay"], [class*="backdrop"]').forEach((el) => {
                if (el.style.position === 'fixed' || el.style.position === 'absolute') { el.style.display = 'none'; }
            });
            document.querySelectorAll('[style*="position: fixed"]').forEach((el) => {
                if (parseInt(el.style.zIndex || '0', 10) > 100) { el.style.display = 'none'; }
            });
        "#;
        self.driver.page_evaluate(route, script).await?;
        Ok(true)
    }

    async fn js_click(&self, route: &ExecRoute, selector: Option<&Selector>) -> Result<bool, RecoveryError> {
        let Some(selector) = selector else { return Ok(false) };
        let script = format!("document.querySelector('{}').click()", selector.value.replace('\'', "\\'"));
        self.driver.page_evaluate(route, &script).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_driver::mock::{MockDriver, MockElement};

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    #[tokio::test]
    async fn dismisses_modal_via_catalog_selector() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", ".modal-close", MockElement::visible_enabled("close")),
        );
        let handler = RecoveryHandler::new(driver);
        let result = handler.attempt_recovery(&route(), FailureKind::ModalBlocking, None).await;
        assert!(result.success);
        assert_eq!(result.action_taken, RecoveryAction::DismissModal);
    }

    #[tokio::test]
    async fn budget_exhausts_after_three_attempts() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com"));
        let handler = RecoveryHandler::new(driver);
        let selector = Selector::css("#flaky");
        for _ in 0..3 {
            handler.attempt_recovery(&route(), FailureKind::Unknown, Some(&selector)).await;
        }
        let result = handler.attempt_recovery(&route(), FailureKind::Unknown, Some(&selector)).await;
        assert!(!result.success);
        assert!(!result.should_retry_original);
    }

    #[tokio::test]
    async fn successful_action_is_tried_first_next_time() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", ".modal-close", MockElement::visible_enabled("close")),
        );
        let handler = RecoveryHandler::new(driver);
        handler.attempt_recovery(&route(), FailureKind::ModalBlocking, None).await;
        assert_eq!(handler.successful.get(&FailureKind::ModalBlocking).map(|v| *v), Some(RecoveryAction::DismissModal));
    }
}
