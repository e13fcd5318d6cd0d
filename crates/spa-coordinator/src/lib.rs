//! SPA Coordinator (C7): detects the SPA framework a page runs, caches that
//! result per page, and provides the wait primitives the orchestrator needs
//! before acting on a SPA -- hydration, render-stability, network-idle,
//! route-change, and a best-effort shadow-DOM walker.

pub mod signatures;

pub use signatures::SpaFramework;

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use wayfarer_core_types::{ExecRoute, Selector};
use wayfarer_driver::{Driver, DriverError, WaitUntil};

const RENDER_STABLE_POLL: Duration = Duration::from_millis(100);
const RENDER_STABLE_STREAK: u32 = 3;

pub struct SpaCoordinator {
    driver: Arc<dyn Driver>,
    framework_cache: DashMap<String, Option<SpaFramework>>,
}

impl SpaCoordinator {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver, framework_cache: DashMap::new() }
    }

    /// Detect (and cache) the SPA framework for this page, fetching page
    /// content once per page id.
    pub async fn detect_framework(&self, route: &ExecRoute) -> Result<Option<SpaFramework>, DriverError> {
        if let Some(cached) = self.framework_cache.get(&route.page_id) {
            return Ok(*cached);
        }
        let content = self.driver.page_content(route).await?;
        let framework = signatures::detect(&content);
        self.framework_cache.insert(route.page_id.clone(), framework);
        if let Some(fw) = framework {
            debug!(page = %route.page_id, framework = fw.name(), "spa framework detected");
        }
        Ok(framework)
    }

    /// Framework-specific readiness check. Without a devtools bridge this is
    /// necessarily approximate: we poll `page_content` for the framework's
    /// own root-mount marker to settle, and otherwise just wait out a grace
    /// period -- mirrors the spec's "framework-specific readiness check"
    /// without assuming a concrete driver gives us hook access.
    pub async fn wait_for_hydration(&self, route: &ExecRoute, timeout: Duration) -> Result<(), DriverError> {
        let Some(_framework) = self.detect_framework(route).await? else {
            return Ok(());
        };
        let deadline = Instant::now() + timeout;
        let mut last_len = self.driver.page_content(route).await?.len();
        loop {
            sleep(Duration::from_millis(50)).await;
            let len = self.driver.page_content(route).await?.len();
            if len == last_len {
                return Ok(());
            }
            last_len = len;
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout("hydration".to_string()));
            }
        }
    }

    /// Waits until the page content hash is unchanged for
    /// [`RENDER_STABLE_STREAK`] consecutive [`RENDER_STABLE_POLL`] intervals.
    /// Stands in for a real mutation-observer bridge.
    pub async fn wait_for_render_stable(&self, route: &ExecRoute, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        let mut streak = 0u32;
        let mut last_hash = content_hash(&self.driver.page_content(route).await?);
        while streak < RENDER_STABLE_STREAK {
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout("render_stable".to_string()));
            }
            sleep(RENDER_STABLE_POLL).await;
            let hash = content_hash(&self.driver.page_content(route).await?);
            if hash == last_hash {
                streak += 1;
            } else {
                streak = 0;
                last_hash = hash;
            }
        }
        Ok(())
    }

    pub async fn wait_for_network_idle(&self, route: &ExecRoute, timeout: Duration) -> Result<(), DriverError> {
        self.driver.wait_for_load_state(route, WaitUntil::NetworkIdle, timeout).await
    }

    /// Combined wait: network-idle, then render-stable. Timeouts in either
    /// leg are folded into the combined result since callers typically treat
    /// this as a single best-effort gate.
    pub async fn wait_for_spa_idle(&self, route: &ExecRoute, timeout: Duration) -> Result<(), DriverError> {
        let half = timeout / 2;
        let _ = self.wait_for_network_idle(route, half).await;
        self.wait_for_render_stable(route, half).await
    }

    /// Polls `page_url` until it differs from `from_url`.
    pub async fn wait_for_route_change(&self, route: &ExecRoute, from_url: &str, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.driver.page_url(route).await?;
            if url != from_url {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout("route_change".to_string()));
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    /// Runs the pre-action ordering guarantee: network-idle -> hydration
    /// (only if this page is a detected SPA) -> render-stable. A timeout in
    /// any step is logged and swallowed -- never fatal to the calling step.
    pub async fn run_pre_action_sequence(&self, route: &ExecRoute, per_step_timeout: Duration) {
        if let Err(err) = self.wait_for_network_idle(route, per_step_timeout).await {
            warn!(page = %route.page_id, error = %err, "network-idle wait timed out, proceeding");
        }
        match self.detect_framework(route).await {
            Ok(Some(_)) => {
                if let Err(err) = self.wait_for_hydration(route, per_step_timeout).await {
                    warn!(page = %route.page_id, error = %err, "hydration wait timed out, proceeding");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(page = %route.page_id, error = %err, "framework detection failed, proceeding"),
        }
        if let Err(err) = self.wait_for_render_stable(route, per_step_timeout).await {
            warn!(page = %route.page_id, error = %err, "render-stable wait timed out, proceeding");
        }
    }

    /// Best-effort shadow-DOM walker: if `selector` matches nothing at the
    /// top level, ask the driver to evaluate a script that recurses through
    /// every shadow root looking for it. Returns the same selector (the
    /// concrete driver is expected to pierce shadow roots when asked to act
    /// on it) only if the walk found a match.
    pub async fn pierce_shadow_dom(&self, route: &ExecRoute, selector: &Selector) -> Result<Option<Selector>, DriverError> {
        if self.driver.is_visible(route, selector).await.unwrap_or(false) {
            return Ok(Some(selector.clone()));
        }
        let script = shadow_walk_script(&selector.value);
        let found = self.driver.page_evaluate(route, &script).await?;
        if found.as_bool().unwrap_or(false) {
            Ok(Some(selector.clone()))
        } else {
            Ok(None)
        }
    }
}

fn content_hash(content: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

fn shadow_walk_script(selector_value: &str) -> String {
    format!(
        "(function walk(root){{if(root.querySelector('{selector_value}'))return true;\
         const all=root.querySelectorAll('*');for(const el of all){{if(el.shadowRoot&&walk(el.shadowRoot))return true;}}\
         return false;}})(document)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_driver::mock::{MockDriver, MockElement};

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    #[tokio::test]
    async fn detects_and_caches_framework() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://app.example.com")
                .with_content("p", "<script>window.__NEXT_DATA__={}</script>"),
        );
        let coordinator = SpaCoordinator::new(driver);
        let route = route();
        let first = coordinator.detect_framework(&route).await.unwrap();
        assert_eq!(first, Some(SpaFramework::React));
        let second = coordinator.detect_framework(&route).await.unwrap();
        assert_eq!(second, Some(SpaFramework::React));
    }

    #[tokio::test]
    async fn render_stable_resolves_once_content_settles() {
        let driver = Arc::new(
            MockDriver::new().with_page("p", "https://example.com").with_content("p", "<div>static</div>"),
        );
        let coordinator = SpaCoordinator::new(driver);
        let result = coordinator.wait_for_render_stable(&route(), Duration::from_millis(500)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pierce_shadow_dom_returns_selector_when_visible_normally() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com")
                .with_element("p", "#visible", MockElement::visible_enabled("x")),
        );
        let coordinator = SpaCoordinator::new(driver);
        let found = coordinator.pierce_shadow_dom(&route(), &Selector::css("#visible")).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn route_change_detects_url_update() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com/a"));
        driver.navigate(&route(), "https://example.com/b", WaitUntil::Load).await.unwrap();
        let coordinator = SpaCoordinator::new(driver);
        let result = coordinator.wait_for_route_change(&route(), "https://example.com/a", Duration::from_millis(200)).await;
        assert!(result.is_ok());
    }
}
