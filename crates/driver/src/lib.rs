//! Driver Adapter contract (C1): a thin capability surface over a
//! Playwright-like browser automation library.
//!
//! This crate does not implement a browser driver. It specifies the trait
//! every other crate in the workspace programs against, so the core agent
//! stays portable across any concrete driver meeting the contract -- a real
//! CDP/WebDriver client, a headless-shell wrapper, or (for tests) the
//! [`mock::MockDriver`] in this crate.

pub mod errors;
pub mod mock;
pub mod types;

pub use errors::DriverError;
pub use types::{BoundingBox, SelectOption, WaitState, WaitUntil};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use wayfarer_core_types::{ExecRoute, Selector};

/// The capability surface every concrete driver must expose. Mirrors a
/// Playwright `Locator`/`Page` split, flattened into selector-scoped calls so
/// the trait stays object-safe (`Arc<dyn Driver>`).
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, route: &ExecRoute, url: &str, wait_until: WaitUntil) -> Result<(), DriverError>;

    async fn wait_for(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        state: WaitState,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn click(&self, route: &ExecRoute, selector: &Selector, force: bool) -> Result<(), DriverError>;
    async fn fill(&self, route: &ExecRoute, selector: &Selector, text: &str) -> Result<(), DriverError>;
    async fn type_text(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        text: &str,
        delay: Duration,
    ) -> Result<(), DriverError>;
    async fn press(&self, route: &ExecRoute, selector: &Selector, key: &str) -> Result<(), DriverError>;
    async fn check(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError>;
    async fn uncheck(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError>;
    async fn select_option(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        option: SelectOption,
    ) -> Result<(), DriverError>;
    async fn hover(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError>;
    async fn double_click(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError>;
    async fn scroll_into_view(&self, route: &ExecRoute, selector: &Selector) -> Result<(), DriverError>;
    async fn upload_file(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        path: &str,
    ) -> Result<(), DriverError>;

    async fn bounding_box(&self, route: &ExecRoute, selector: &Selector) -> Result<Option<BoundingBox>, DriverError>;
    async fn is_visible(&self, route: &ExecRoute, selector: &Selector) -> Result<bool, DriverError>;
    async fn is_enabled(&self, route: &ExecRoute, selector: &Selector) -> Result<bool, DriverError>;
    async fn input_value(&self, route: &ExecRoute, selector: &Selector) -> Result<String, DriverError>;
    async fn text_content(&self, route: &ExecRoute, selector: &Selector) -> Result<String, DriverError>;
    async fn get_attribute(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError>;
    async fn evaluate_on(
        &self,
        route: &ExecRoute,
        selector: &Selector,
        script: &str,
    ) -> Result<Value, DriverError>;

    async fn page_evaluate(&self, route: &ExecRoute, script: &str) -> Result<Value, DriverError>;
    async fn page_content(&self, route: &ExecRoute) -> Result<String, DriverError>;
    async fn page_url(&self, route: &ExecRoute) -> Result<String, DriverError>;
    async fn wait_for_load_state(
        &self,
        route: &ExecRoute,
        state: WaitUntil,
        timeout: Duration,
    ) -> Result<(), DriverError>;
    async fn keyboard_press(&self, route: &ExecRoute, key: &str) -> Result<(), DriverError>;
    async fn screenshot(&self, route: &ExecRoute, path: &str) -> Result<(), DriverError>;
}

/// Result of the AI callback contract (§6): injected, best-effort, MAY time
/// out. The resolver treats a timeout identically to "no result."
#[async_trait]
pub trait AiResolverCallback: Send + Sync {
    async fn resolve(&self, request: AiResolutionRequest) -> Option<AiResolutionResponse>;
}

#[derive(Debug, Clone)]
pub struct AiResolutionRequest {
    pub intent: String,
    /// First N KB of page HTML, bounded per the contract (≤5 KB).
    pub page_snippet: String,
    pub available_ids: Vec<String>,
    pub context_kv: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AiResolutionResponse {
    pub selector: Selector,
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub alternatives: Vec<Selector>,
}
