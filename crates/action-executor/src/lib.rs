//! Action Executor (C9): turns a resolved verb + candidate selector list
//! into concrete driver calls. Owns candidate retry, click's navigation
//! detection, the fill protocol, and assertion polling; knows nothing about
//! *how* a selector was resolved -- that's the selector-resolver's job.

pub mod errors;

pub use errors::ExecutorError;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use wayfarer_core_types::{ExecRoute, Selector, Verb};
use wayfarer_driver::{Driver, DriverError, SelectOption, WaitState, WaitUntil};
use wayfarer_spa_coordinator::SpaCoordinator;

/// Default per-step timeout (§4.8).
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);
const NAV_GRACE: Duration = Duration::from_secs(3);
const ASSERT_POLL: Duration = Duration::from_millis(200);
const ASSERT_TIMEOUT: Duration = Duration::from_secs(10);
const TYPE_CHAR_DELAY: Duration = Duration::from_millis(30);

/// Result of a successful [`ActionExecutor::execute`] call.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// The candidate selector that actually succeeded. `None` for
    /// non-locator verbs (navigate, wait, assert_url, screenshot).
    pub selector_used: Option<Selector>,
    pub attempts: u32,
}

pub struct ActionExecutor {
    driver: Arc<dyn Driver>,
    spa: Arc<SpaCoordinator>,
}

impl ActionExecutor {
    pub fn new(driver: Arc<dyn Driver>, spa: Arc<SpaCoordinator>) -> Self {
        Self { driver, spa }
    }

    /// Executes `verb` against `route`. For locator-driven verbs,
    /// `candidates` must be ordered primary-first; alternatives are tried in
    /// order until one succeeds. `value` carries the verb's payload (text to
    /// type, url to navigate to, option to select, ...); `expected` carries
    /// an assertion's expectation.
    pub async fn execute(
        &self,
        route: &ExecRoute,
        verb: Verb,
        candidates: &[Selector],
        value: Option<&str>,
        expected: Option<&str>,
        timeout: Duration,
    ) -> Result<ExecOutcome, ExecutorError> {
        if !verb.is_locator_driven() {
            self.execute_non_locator(route, verb, value, expected, timeout).await?;
            return Ok(ExecOutcome { selector_used: None, attempts: 0 });
        }

        if candidates.is_empty() {
            return Err(ExecutorError::NoCandidates);
        }

        let mut attempts = 0u32;
        let mut last_err: Option<DriverError> = None;
        for selector in candidates {
            attempts += 1;
            if self.driver.wait_for(route, selector, WaitState::Visible, timeout).await.is_err() {
                debug!(selector = %selector.value, "candidate never became visible, trying next");
                last_err = Some(DriverError::NotVisible(selector.value.clone()));
                continue;
            }
            match self.apply_locator_verb(route, verb, selector, value, expected, timeout).await {
                Ok(()) => return Ok(ExecOutcome { selector_used: Some(selector.clone()), attempts }),
                Err(ExecutorError::Driver(err)) => {
                    warn!(selector = %selector.value, error = %err, "candidate failed, trying next");
                    last_err = Some(err);
                }
                Err(other) => return Err(other),
            }
        }

        Err(ExecutorError::AllCandidatesFailed {
            attempts,
            last: last_err.unwrap_or_else(|| DriverError::Other("no candidate was attempted".to_string())),
        })
    }

    async fn execute_non_locator(
        &self,
        route: &ExecRoute,
        verb: Verb,
        value: Option<&str>,
        expected: Option<&str>,
        timeout: Duration,
    ) -> Result<(), ExecutorError> {
        match verb {
            Verb::Navigate => {
                let url = value.ok_or_else(|| ExecutorError::AssertionFailed("navigate requires a url value".into()))?;
                self.driver.navigate(route, url, WaitUntil::Load).await?;
                Ok(())
            }
            Verb::Wait => {
                let millis: u64 = value.and_then(|v| v.parse().ok()).unwrap_or(1_000);
                sleep(Duration::from_millis(millis)).await;
                Ok(())
            }
            Verb::WaitForNavigation => {
                self.driver.wait_for_load_state(route, WaitUntil::Load, timeout).await?;
                Ok(())
            }
            Verb::AssertUrl => {
                let expected = expected.ok_or_else(|| ExecutorError::AssertionFailed("assert_url requires an expected value".into()))?;
                self.poll_until(ASSERT_TIMEOUT, || async {
                    Ok(self.driver.page_url(route).await? == expected)
                })
                .await
                .map_err(|_| ExecutorError::AssertionFailed(format!("url never matched {expected}")))
            }
            Verb::Screenshot => {
                let path = value.ok_or_else(|| ExecutorError::AssertionFailed("screenshot requires a path value".into()))?;
                self.driver.screenshot(route, path).await?;
                Ok(())
            }
            other => unreachable!("{other:?} is locator-driven, should not reach execute_non_locator"),
        }
    }

    async fn apply_locator_verb(
        &self,
        route: &ExecRoute,
        verb: Verb,
        selector: &Selector,
        value: Option<&str>,
        expected: Option<&str>,
        timeout: Duration,
    ) -> Result<(), ExecutorError> {
        match verb {
            Verb::Click => self.click_with_nav_detection(route, selector, timeout).await,
            Verb::DoubleClick => Ok(self.driver.double_click(route, selector).await?),
            Verb::Fill => self.fill_like_user(route, selector, value.unwrap_or("")).await,
            Verb::Type => Ok(self.driver.type_text(route, selector, value.unwrap_or(""), TYPE_CHAR_DELAY).await?),
            Verb::Select => Ok(self.driver.select_option(route, selector, SelectOption::Value(value.unwrap_or("").to_string())).await?),
            Verb::Check => Ok(self.driver.check(route, selector).await?),
            Verb::Uncheck => Ok(self.driver.uncheck(route, selector).await?),
            Verb::Hover => Ok(self.driver.hover(route, selector).await?),
            Verb::PressKey => Ok(self.driver.press(route, selector, value.unwrap_or("Enter")).await?),
            Verb::Scroll => Ok(self.driver.scroll_into_view(route, selector).await?),
            Verb::UploadFile => Ok(self.driver.upload_file(route, selector, value.unwrap_or("")).await?),
            Verb::WaitForElement => Ok(()),
            Verb::AssertVisible => self.assert_visible(route, selector).await,
            Verb::AssertText => self.assert_text(route, selector, expected.unwrap_or("")).await,
            Verb::AssertValue => self.assert_value(route, selector, expected.unwrap_or("")).await,
            other => unreachable!("{other:?} is not locator-driven, should not reach apply_locator_verb"),
        }
    }

    /// Snapshots the URL, clicks, and waits for a load if the URL moved,
    /// otherwise waits for the DOM to settle -- a click that opens a modal
    /// or triggers an in-place re-render shouldn't stall on a navigation
    /// that never comes.
    async fn click_with_nav_detection(&self, route: &ExecRoute, selector: &Selector, timeout: Duration) -> Result<(), ExecutorError> {
        let before_url = self.driver.page_url(route).await?;
        self.driver.click(route, selector, false).await?;
        let after_url = self.driver.page_url(route).await?;
        if after_url != before_url {
            if self.driver.wait_for_load_state(route, WaitUntil::Load, timeout).await.is_err() {
                warn!(selector = %selector.value, "post-click navigation wait timed out");
            }
        } else if self.spa.wait_for_render_stable(route, NAV_GRACE).await.is_err() {
            debug!(selector = %selector.value, "post-click render-stable wait timed out");
        }
        Ok(())
    }

    /// Emulates a real user filling a field: focus via click, select-all,
    /// type character by character, then blur with Tab -- this triggers
    /// framework input validators that a bare value assignment wouldn't.
    async fn fill_like_user(&self, route: &ExecRoute, selector: &Selector, text: &str) -> Result<(), ExecutorError> {
        self.driver.click(route, selector, false).await?;
        self.driver.press(route, selector, "Control+a").await?;
        self.driver.type_text(route, selector, text, TYPE_CHAR_DELAY).await?;
        self.driver.keyboard_press(route, "Tab").await?;
        Ok(())
    }

    async fn assert_visible(&self, route: &ExecRoute, selector: &Selector) -> Result<(), ExecutorError> {
        self.poll_until(ASSERT_TIMEOUT, || async { Ok(self.driver.is_visible(route, selector).await?) })
            .await
            .map_err(|_| ExecutorError::AssertionFailed(format!("{} never became visible", selector.value)))
    }

    async fn assert_text(&self, route: &ExecRoute, selector: &Selector, expected: &str) -> Result<(), ExecutorError> {
        self.poll_until(ASSERT_TIMEOUT, || async {
            Ok(self.driver.text_content(route, selector).await?.contains(expected))
        })
        .await
        .map_err(|_| ExecutorError::AssertionFailed(format!("{} text never contained {expected:?}", selector.value)))
    }

    async fn assert_value(&self, route: &ExecRoute, selector: &Selector, expected: &str) -> Result<(), ExecutorError> {
        self.poll_until(ASSERT_TIMEOUT, || async {
            Ok(self.driver.input_value(route, selector).await? == expected)
        })
        .await
        .map_err(|_| ExecutorError::AssertionFailed(format!("{} value never became {expected:?}", selector.value)))
    }

    /// Polls `check` every [`ASSERT_POLL`] until it returns `Ok(true)` or
    /// `timeout` elapses.
    async fn poll_until<F, Fut>(&self, timeout: Duration, check: F) -> Result<(), ()>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<bool, DriverError>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if check().await.unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(());
            }
            sleep(ASSERT_POLL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_driver::mock::{MockDriver, MockElement};

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    fn executor(driver: Arc<MockDriver>) -> ActionExecutor {
        ActionExecutor::new(driver.clone(), Arc::new(SpaCoordinator::new(driver)))
    }

    #[tokio::test]
    async fn click_falls_through_candidates_until_one_is_visible() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", "#hidden", MockElement::hidden())
                .with_element("p", "#visible", MockElement::visible_enabled("go").navigating_to("https://example.com/next")),
        );
        let candidates = vec![Selector::css("#hidden"), Selector::css("#visible")];
        let outcome = executor(driver)
            .execute(&route(), Verb::Click, &candidates, None, None, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(outcome.selector_used.unwrap().value, "#visible");
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn all_candidates_failing_returns_error() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com"));
        let candidates = vec![Selector::css("#missing")];
        let err = executor(driver)
            .execute(&route(), Verb::Click, &candidates, None, None, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::AllCandidatesFailed { .. }));
    }

    #[tokio::test]
    async fn fill_runs_the_focus_select_type_blur_protocol() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", "#email", MockElement::visible_enabled("")),
        );
        let candidates = vec![Selector::css("#email")];
        executor(driver.clone())
            .execute(&route(), Verb::Fill, &candidates, Some("me@example.com"), None, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(driver.input_value(&route(), &Selector::css("#email")).await.unwrap(), "me@example.com");
    }

    #[tokio::test]
    async fn navigate_is_not_locator_driven() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com"));
        let outcome = executor(driver.clone())
            .execute(&route(), Verb::Navigate, &[], Some("https://example.com/login"), None, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(outcome.selector_used.is_none());
        assert_eq!(driver.page_url(&route()).await.unwrap(), "https://example.com/login");
    }

    #[tokio::test]
    async fn assert_text_polls_until_match() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", "#status", MockElement::visible_enabled("Saved")),
        );
        let candidates = vec![Selector::css("#status")];
        executor(driver)
            .execute(&route(), Verb::AssertText, &candidates, None, Some("Saved"), Duration::from_millis(50))
            .await
            .unwrap();
    }
}
