//! An in-memory [`Driver`] implementation for tests: no real browser, just a
//! small virtual-DOM model keyed by selector value. Lets the resolver,
//! executor, and orchestrator crates exercise the full pipeline without a
//! headless browser.

use crate::errors::DriverError;
use crate::types::{BoundingBox, SelectOption, WaitState, WaitUntil};
use crate::Driver;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use wayfarer_core_types::{ExecRoute, Selector};

#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub visible: bool,
    pub enabled: bool,
    pub text: String,
    pub value: String,
    pub attributes: HashMap<String, String>,
    /// If set, clicking this element navigates the page to this URL.
    pub navigates_to: Option<String>,
    /// If `Some`, the next N attempts to act on this element fail with the
    /// given error before succeeding -- used to exercise recovery.
    pub fails_until_attempt: u32,
    attempts: u32,
}

impl MockElement {
    pub fn visible_enabled(text: impl Into<String>) -> Self {
        Self {
            visible: true,
            enabled: true,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn navigating_to(mut self, url: impl Into<String>) -> Self {
        self.navigates_to = Some(url.into());
        self
    }

    pub fn failing_first(mut self, attempts: u32) -> Self {
        self.fails_until_attempt = attempts;
        self
    }
}

#[derive(Debug, Clone, Default)]
struct MockPage {
    url: String,
    content: String,
    elements: HashMap<String, MockElement>,
}

#[derive(Default)]
struct MockState {
    pages: HashMap<String, MockPage>,
}

/// Builder-configured, thread-safe mock driver.
#[derive(Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page_id: impl Into<String>, url: impl Into<String>) -> Self {
        let mut state = self.state.lock().unwrap();
        state.pages.entry(page_id.into()).or_default().url = url.into();
        drop(state);
        self
    }

    pub fn with_content(self, page_id: impl Into<String>, html: impl Into<String>) -> Self {
        let mut state = self.state.lock().unwrap();
        state.pages.entry(page_id.into()).or_default().content = html.into();
        drop(state);
        self
    }

    pub fn with_element(self, page_id: impl Into<String>, selector_value: impl Into<String>, el: MockElement) -> Self {
        let mut state = self.state.lock().unwrap();
        state
            .pages
            .entry(page_id.into())
            .or_default()
            .elements
            .insert(selector_value.into(), el);
        drop(state);
        self
    }

    pub fn set_visible(&self, page_id: &str, selector_value: &str, visible: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(el) = state
            .pages
            .get_mut(page_id)
            .and_then(|p| p.elements.get_mut(selector_value))
        {
            el.visible = visible;
        }
    }

    pub fn current_url(&self, page_id: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(page_id)
            .map(|p| p.url.clone())
            .unwrap_or_default()
    }

    fn with_element_mut<T>(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        f: impl FnOnce(&mut MockElement) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut state = self.state.lock().unwrap();
        let page = state
            .pages
            .get_mut(&route.page_id)
            .ok_or_else(|| DriverError::NotFound(route.page_id.clone()))?;
        let el = page
            .elements
            .get_mut(&selector.value)
            .ok_or_else(|| DriverError::NotFound(selector.value.clone()))?;
        el.attempts += 1;
        if el.attempts <= el.fails_until_attempt {
            return Err(DriverError::Intercepted(selector.value.clone()));
        }
        f(el)
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, route: &ExecRoute, url: &str, _wait_until: WaitUntil) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.pages.entry(route.page_id.clone()).or_default().url = url.to_string();
        Ok(())
    }

    async fn wait_for(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        state: WaitState,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        let visible = self.is_visible(route, selector).await?;
        match state {
            WaitState::Visible | WaitState::Attached => {
                if visible {
                    Ok(())
                } else {
                    Err(DriverError::Timeout(selector.value.clone()))
                }
            }
            WaitState::Hidden | WaitState::Detached => {
                if !visible {
                    Ok(())
                } else {
                    Err(DriverError::Timeout(selector.value.clone()))
                }
            }
            WaitState::Enabled => {
                if self.is_enabled(route, selector).await? {
                    Ok(())
                } else {
                    Err(DriverError::Timeout(selector.value.clone()))
                }
            }
        }
    }

    async fn click(&self, route: &ExecRoute, selector: &Selector, _force: bool) -> Result<(), DriverError> {
        let navigates_to = self.with_element_mut(route, selector, |el| {
            if !el.visible {
                return Err(DriverError::NotVisible(selector.value.clone()));
            }
            Ok(el.navigates_to.clone())
        })?;
        if let Some(url) = navigates_to {
            self.navigate(route, &url, WaitUntil::Load).await?;
        }
        Ok(())
    }

    async fn fill(&self, route: &ExecRoute, selector: &Selector, text: &str) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |el| {
            if !el.enabled {
                return Err(DriverError::NotEnabled(selector.value.clone()));
            }
            el.value = text.to_string();
            Ok(())
        })
    }

    async fn type_text(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        text: &str,
        _delay: Duration,
    ) -> Result<(), DriverError> {
        self.fill(route, selector, text).await
    }

    async fn press(&self, route: &ExecRoute, selector: &Selector, _key: &str) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |_| Ok(()))
    }

    async fn check(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |el| {
            el.attributes.insert("checked".into(), "true".into());
            Ok(())
        })
    }

    async fn uncheck(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |el| {
            el.attributes.remove("checked");
            Ok(())
        })
    }

    async fn select_option(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        option: SelectOption,
    ) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |el| {
            el.value = match option {
                SelectOption::Value(v) => v,
                SelectOption::Label(l) => l,
                SelectOption::Index(i) => i.to_string(),
            };
            Ok(())
        })
    }

    async fn hover(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |_| Ok(()))
    }

    async fn double_click(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError> {
        self.click(route, selector, false).await
    }

    async fn scroll_into_view(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |_| Ok(()))
    }

    async fn upload_file(&self, route: &ExecRoute, selector: &Selector, path: &str) -> Result<(), DriverError> {
        self.with_element_mut(route, selector, |el| {
            el.value = path.to_string();
            Ok(())
        })
    }

    async fn bounding_box(&self, route: &ExecRoute, selector: &Selector) -> Result<Option<BoundingBox>, DriverError> {
        if self.is_visible(route, selector).await? {
            Ok(Some(BoundingBox { x: 0.0, y: 0.0, width: 100.0, height: 20.0 }))
        } else {
            Ok(None)
        }
    }

    async fn is_visible(&self, route: &ExecRoute, selector: &Selector) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&route.page_id)
            .and_then(|p| p.elements.get(&selector.value))
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn is_enabled(&self, route: &ExecRoute, selector: &Selector) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&route.page_id)
            .and_then(|p| p.elements.get(&selector.value))
            .map(|e| e.enabled)
            .unwrap_or(false))
    }

    async fn input_value(&self, route: &ExecRoute, selector: &Selector) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .get(&route.page_id)
            .and_then(|p| p.elements.get(&selector.value))
            .map(|e| e.value.clone())
            .ok_or_else(|| DriverError::NotFound(selector.value.clone()))
    }

    async fn text_content(&self, route: &ExecRoute, selector: &Selector) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .get(&route.page_id)
            .and_then(|p| p.elements.get(&selector.value))
            .map(|e| e.text.clone())
            .ok_or_else(|| DriverError::NotFound(selector.value.clone()))
    }

    async fn get_attribute(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&route.page_id)
            .and_then(|p| p.elements.get(&selector.value))
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    async fn evaluate_on(&self, _route: &ExecRoute, _selector: &Selector, _script: &str) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    async fn page_evaluate(&self, _route: &ExecRoute, _script: &str) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    async fn page_content(&self, route: &ExecRoute) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&route.page_id)
            .map(|p| p.content.clone())
            .unwrap_or_default())
    }

    async fn page_url(&self, route: &ExecRoute) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&route.page_id)
            .map(|p| p.url.clone())
            .unwrap_or_default())
    }

    async fn wait_for_load_state(
        &self,
        _route: &ExecRoute,
        _state: WaitUntil,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn keyboard_press(&self, _route: &ExecRoute, _key: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn screenshot(&self, _route: &ExecRoute, _path: &str) -> Result<(), DriverError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s1", "p1")
    }

    #[tokio::test]
    async fn click_triggers_navigation() {
        let driver = MockDriver::new()
            .with_page("p1", "https://example.com/a")
            .with_element("p1", "#next", MockElement::visible_enabled("Next").navigating_to("https://example.com/b"));
        let route = route();
        driver.click(&route, &Selector::css("#next"), false).await.unwrap();
        assert_eq!(driver.page_url(&route).await.unwrap(), "https://example.com/b");
    }

    #[tokio::test]
    async fn hidden_element_fails_click() {
        let driver = MockDriver::new()
            .with_page("p1", "https://example.com")
            .with_element("p1", "#hidden", MockElement::hidden());
        let err = driver.click(&route(), &Selector::css("#hidden"), false).await.unwrap_err();
        assert!(matches!(err, DriverError::NotVisible(_)));
    }

    #[tokio::test]
    async fn fails_until_attempt_then_succeeds() {
        let driver = MockDriver::new()
            .with_page("p1", "https://example.com")
            .with_element(
                "p1",
                "#flaky",
                MockElement::visible_enabled("Flaky").failing_first(2),
            );
        let route = route();
        let sel = Selector::css("#flaky");
        assert!(driver.click(&route, &sel, false).await.is_err());
        assert!(driver.click(&route, &sel, false).await.is_err());
        assert!(driver.click(&route, &sel, false).await.is_ok());
    }
}
