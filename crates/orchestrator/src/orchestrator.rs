//! The Step Orchestrator (C11): drives one [`StepSpec`] at a time through
//! resolve -> pre-check -> dispatch -> post-check -> recover-on-failure,
//! reporting a [`StepResult`] per step and an [`ExecutionResult`] for the
//! whole run. Recovery is budgeted by the recovery handler itself; the
//! orchestrator only ever retries the original action once per step.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use wayfarer_action_checker::ActionChecker;
use wayfarer_action_executor::ActionExecutor;
use wayfarer_core_types::{
    ExecRoute, ExecutionEvent, ExecutionResult, Intent, Outcome, PageKey, RecoveryOutcomeEvent,
    RunMetrics, Selector, StepOutcome, StepResult, StepSpec, TestStatus, Tier,
};
use wayfarer_driver::Driver;
use wayfarer_event_bus::{EventBus, InMemoryBus};
use wayfarer_recovery_handler::{classify, FailureContext, RecoveryHandler};
use wayfarer_selector_resolver::{PageContext, SelectorResolver};
use wayfarer_spa_coordinator::SpaCoordinator;

use crate::control::{OrchestratorState, RunControl};

/// Tunables for a run; defaults match the per-step timeout the Action
/// Executor itself defaults to.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub step_timeout: Duration,
    pub inter_step_delay: Duration,
    pub recovery_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_timeout: wayfarer_action_executor::DEFAULT_STEP_TIMEOUT,
            inter_step_delay: Duration::ZERO,
            recovery_enabled: true,
        }
    }
}

pub struct StepOrchestrator {
    driver: Arc<dyn Driver>,
    resolver: Arc<SelectorResolver>,
    checker: Arc<ActionChecker>,
    executor: Arc<ActionExecutor>,
    recovery: Arc<RecoveryHandler>,
    #[allow(dead_code)]
    spa: Arc<SpaCoordinator>,
    events: Arc<InMemoryBus<ExecutionEvent>>,
    recovery_events: Arc<InMemoryBus<RecoveryOutcomeEvent>>,
    control: Arc<RunControl>,
    config: OrchestratorConfig,
}

impl StepOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver: Arc<dyn Driver>,
        resolver: Arc<SelectorResolver>,
        checker: Arc<ActionChecker>,
        executor: Arc<ActionExecutor>,
        recovery: Arc<RecoveryHandler>,
        spa: Arc<SpaCoordinator>,
        events: Arc<InMemoryBus<ExecutionEvent>>,
        recovery_events: Arc<InMemoryBus<RecoveryOutcomeEvent>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            driver,
            resolver,
            checker,
            executor,
            recovery,
            spa,
            events,
            recovery_events,
            control: RunControl::new(),
            config,
        }
    }

    /// A handle callers can use to pause/resume/stop this orchestrator from
    /// another task while [`Self::run_test`] is in flight.
    pub fn control(&self) -> Arc<RunControl> {
        self.control.clone()
    }

    /// Runs every step of `steps` in order against `route`, honoring
    /// pause/stop requests at step boundaries, and returns the aggregated
    /// test report.
    pub async fn run_test(&self, route: &ExecRoute, domain: &str, test_id: &str, steps: &[StepSpec]) -> ExecutionResult {
        self.control.set_state(OrchestratorState::Running);
        let started = Instant::now();

        let mut per_step = Vec::with_capacity(steps.len());
        let mut passed = 0u32;
        let mut failed = 0u32;
        let mut recovered = 0u32;
        let mut stopped_early = false;

        for step in steps {
            self.control.wait_if_paused().await;
            if self.control.is_stopped() {
                stopped_early = true;
                per_step.push(skipped_step(step));
                continue;
            }

            let result = self.run_step(route, domain, step).await;
            match result.status {
                StepOutcome::Passed => passed += 1,
                StepOutcome::Recovered => recovered += 1,
                StepOutcome::Failed => failed += 1,
                StepOutcome::Skipped => {}
            }
            per_step.push(result);

            if !self.config.inter_step_delay.is_zero() {
                tokio::time::sleep(self.config.inter_step_delay).await;
            }
        }

        let status = if stopped_early {
            TestStatus::Cancelled
        } else if failed > 0 {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };
        self.control.set_state(match status {
            TestStatus::Passed => OrchestratorState::Completed,
            TestStatus::Failed | TestStatus::Cancelled => OrchestratorState::Failed,
        });

        ExecutionResult {
            test_id: test_id.to_string(),
            status,
            total_steps: steps.len() as u32,
            passed,
            failed,
            recovered,
            duration_ms: started.elapsed().as_millis() as u64,
            per_step,
            metrics: self.run_metrics(recovered, steps.len()),
        }
    }

    fn run_metrics(&self, recovered: u32, total_steps: usize) -> RunMetrics {
        let snapshot = self.resolver.counters().snapshot();
        let total: u64 = snapshot.iter().map(|(_, v)| *v).sum();
        let ai_calls = snapshot.iter().find(|(name, _)| *name == "ai").map(|(_, v)| *v).unwrap_or(0);
        let kb_hits = snapshot.iter().find(|(name, _)| *name == "knowledge_base").map(|(_, v)| *v).unwrap_or(0);
        RunMetrics {
            ai_calls: ai_calls as u32,
            kb_hits: kb_hits as u32,
            ai_dependency_pct: if total > 0 { ai_calls as f64 / total as f64 * 100.0 } else { 0.0 },
            recovery_rate: if total_steps > 0 { recovered as f64 / total_steps as f64 * 100.0 } else { 0.0 },
        }
    }

    /// Runs the seven-stage sequence for a single step. Never returns an
    /// `Err`: every failure mode is captured in the returned [`StepResult`]
    /// so one bad step can't unwind the whole run.
    async fn run_step(&self, route: &ExecRoute, domain: &str, step: &StepSpec) -> StepResult {
        let started = Instant::now();
        let intent = Intent::normalize(&step.target);

        let page_url = self.driver.page_url(route).await.unwrap_or_default();
        let page_key = PageKey::from_url(&page_url);
        let html = self.driver.page_content(route).await.ok();

        // 1. Resolve target.
        let resolution = self
            .resolver
            .resolve(route, domain, &page_key.page, &step.target, PageContext { html: html.as_deref(), framework: None })
            .await;

        if resolution.is_failed() && step.action.is_locator_driven() {
            return self.finish(step, started, resolution.tier, None, StepOutcome::Failed, Some("selector resolution failed".to_string()));
        }

        // 2. Pre-check: clear non-critical overlays, refuse on a blocker.
        let pre = match self.checker.pre_check(route).await {
            Ok(pre) => pre,
            Err(err) => {
                return self.finish(
                    step,
                    started,
                    resolution.tier,
                    resolution.selector.as_ref(),
                    StepOutcome::Failed,
                    Some(format!("pre-check error: {err}")),
                )
            }
        };

        if !pre.ready && !self.recover_blocker(route, domain, &pre.blocking, resolution.selector.as_ref()).await {
            return self.finish(
                step,
                started,
                resolution.tier,
                resolution.selector.as_ref(),
                StepOutcome::Failed,
                Some(format!("blocked by: {}", pre.blocking.join(", "))),
            );
        }

        // 3. Dispatch to the action executor with the full candidate list.
        let candidates = candidate_list(&resolution);
        let first_attempt = self
            .executor
            .execute(route, step.action, &candidates, step.value.as_deref(), step.expected.as_deref(), self.config.step_timeout)
            .await;

        let (outcome, was_recovered, error) = match first_attempt {
            Ok(outcome) => (Some(outcome), false, None),
            // 5. On hard failure, classify and hand off to recovery; retry
            // the original action once if recovery says it's safe to.
            Err(err) if self.config.recovery_enabled => {
                self.control.set_state(OrchestratorState::Recovering);
                let kind = classify(&err.to_string(), FailureContext::default());
                let recovery = self.recovery.attempt_recovery(route, kind, resolution.selector.as_ref()).await;
                self.control.set_state(OrchestratorState::Running);
                self.publish_recovery_outcome(domain, kind, &recovery).await;

                if recovery.should_retry_original {
                    match self
                        .executor
                        .execute(route, step.action, &candidates, step.value.as_deref(), step.expected.as_deref(), self.config.step_timeout)
                        .await
                    {
                        Ok(outcome) => (Some(outcome), true, None),
                        Err(retry_err) => (None, false, Some(retry_err.to_string())),
                    }
                } else {
                    (None, false, Some(format!("{err} ({})", recovery.details)))
                }
            }
            Err(err) => (None, false, Some(err.to_string())),
        };

        // 4. Post-check: diff against the pre-check snapshot.
        let silent_no_op = match self
            .checker
            .post_check(route, &pre.state, step.action.is_pure_wait() || step.action.is_assertion())
            .await
        {
            Ok(post) => post.silent_no_op,
            Err(err) => {
                warn!(step = step.step_number, error = %err, "post-check failed, continuing without it");
                false
            }
        };
        if silent_no_op && outcome.is_some() {
            warn!(step = step.step_number, target = %step.target, "step produced no observable page change");
        }

        let success = outcome.is_some();
        let selector_used = outcome.as_ref().and_then(|o| o.selector_used.clone()).or_else(|| resolution.selector.clone());

        // The Knowledge Store has a single writer: the Learning Engine,
        // batching off this event. The orchestrator never writes it directly.
        let latency_ms = started.elapsed().as_millis() as u64;
        if let Some(selector) = &selector_used {
            let event = ExecutionEvent::new(
                chrono::Utc::now(),
                domain,
                page_key.page.clone(),
                intent.clone(),
                selector,
                if success { Outcome::Success } else { Outcome::Fail },
                latency_ms,
                matches!(resolution.tier, Tier::Ai),
                resolution.tier,
            );
            if let Err(err) = self.events.publish(event).await {
                debug!(error = %err, "no learning-engine subscriber for this execution event");
            }
        }

        let status = if success {
            if was_recovered {
                StepOutcome::Recovered
            } else {
                StepOutcome::Passed
            }
        } else {
            StepOutcome::Failed
        };

        self.finish_with_duration(step, latency_ms, resolution.tier, selector_used, status, error)
    }

    /// Attempts recovery for whatever the pre-check flagged as blocking.
    /// Returns `true` once a follow-up pre-check reports the page is ready.
    async fn recover_blocker(&self, route: &ExecRoute, domain: &str, blocking: &[String], selector: Option<&Selector>) -> bool {
        if !self.config.recovery_enabled {
            return false;
        }
        self.control.set_state(OrchestratorState::Recovering);
        let is_loading = blocking.iter().any(|s| s.contains("spinner") || s.contains("loading"));
        let context = FailureContext { has_modal: !is_loading, has_cookie_banner: false, is_loading };
        let kind = classify("blocked by overlay", context);
        let recovery = self.recovery.attempt_recovery(route, kind, selector).await;
        self.control.set_state(OrchestratorState::Running);
        self.publish_recovery_outcome(domain, kind, &recovery).await;
        if !recovery.success {
            return false;
        }
        self.checker.pre_check(route).await.map(|pre| pre.ready).unwrap_or(false)
    }

    async fn publish_recovery_outcome(
        &self,
        domain: &str,
        kind: wayfarer_recovery_handler::FailureKind,
        recovery: &wayfarer_recovery_handler::RecoveryResult,
    ) {
        let event = RecoveryOutcomeEvent {
            timestamp: chrono::Utc::now(),
            domain: domain.to_string(),
            failure_kind: kind.name().to_string(),
            action_taken: recovery.action_taken.name().to_string(),
            success: recovery.success,
        };
        if let Err(err) = self.recovery_events.publish(event).await {
            debug!(error = %err, "no learning-engine subscriber for this recovery event");
        }
    }

    fn finish(
        &self,
        step: &StepSpec,
        started: Instant,
        tier: Tier,
        selector: Option<&Selector>,
        status: StepOutcome,
        error: Option<String>,
    ) -> StepResult {
        self.finish_with_duration(step, started.elapsed().as_millis() as u64, tier, selector.cloned(), status, error)
    }

    fn finish_with_duration(
        &self,
        step: &StepSpec,
        duration_ms: u64,
        tier: Tier,
        selector: Option<Selector>,
        status: StepOutcome,
        error: Option<String>,
    ) -> StepResult {
        StepResult {
            number: step.step_number,
            action: step.action,
            target: step.target.clone(),
            status,
            selector_used: selector.map(|s| s.value),
            tier,
            duration_ms,
            error,
        }
    }
}

fn candidate_list(resolution: &wayfarer_core_types::ResolutionResult) -> Vec<Selector> {
    let mut candidates = Vec::new();
    if let Some(primary) = &resolution.selector {
        candidates.push(primary.clone());
    }
    for alt in &resolution.alternatives {
        if !candidates.contains(&alt.selector) {
            candidates.push(alt.selector.clone());
        }
    }
    candidates
}

fn skipped_step(step: &StepSpec) -> StepResult {
    StepResult {
        number: step.step_number,
        action: step.action,
        target: step.target.clone(),
        status: StepOutcome::Skipped,
        selector_used: None,
        tier: Tier::Failed,
        duration_ms: 0,
        error: Some("run stopped before this step".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core_types::{SelectorKind, Verb};
    use wayfarer_driver::mock::{MockDriver, MockElement};
    use wayfarer_knowledge_store::KnowledgeStore;

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    fn build(driver: Arc<MockDriver>) -> StepOrchestrator {
        let knowledge = Arc::new(KnowledgeStore::new());
        let resolver = Arc::new(SelectorResolver::new(knowledge, None, Default::default()));
        let checker = Arc::new(ActionChecker::new(driver.clone()));
        let spa = Arc::new(SpaCoordinator::new(driver.clone()));
        let executor = Arc::new(ActionExecutor::new(driver.clone(), spa.clone()));
        let recovery = Arc::new(RecoveryHandler::new(driver.clone()));
        let events = InMemoryBus::<ExecutionEvent>::new(16);
        let recovery_events = InMemoryBus::<RecoveryOutcomeEvent>::new(16);
        StepOrchestrator::new(driver, resolver, checker, executor, recovery, spa, events, recovery_events, OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn passes_a_clean_click_step() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com/login")
                .with_element("p", "#login-button", MockElement::visible_enabled("Log in")),
        );
        let orchestrator = build(driver);
        let steps = vec![StepSpec { step_number: 1, action: Verb::Click, target: "#login-button".to_string(), value: None, expected: None }];

        let result = orchestrator.run_test(&route(), "example.com", "t1", &steps).await;

        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.passed, 1);
        assert_eq!(result.per_step[0].status, StepOutcome::Passed);
    }

    #[tokio::test]
    async fn resolution_failure_marks_step_failed_without_panicking() {
        let driver = Arc::new(MockDriver::new().with_page("p", "https://example.com/login"));
        let orchestrator = build(driver);
        let steps = vec![StepSpec { step_number: 1, action: Verb::Click, target: "#nowhere".to_string(), value: None, expected: None }];

        let result = orchestrator.run_test(&route(), "example.com", "t1", &steps).await;

        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.failed, 1);
    }

    #[tokio::test]
    async fn stop_request_skips_remaining_steps() {
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com/login")
                .with_element("p", "#a", MockElement::visible_enabled("a"))
                .with_element("p", "#b", MockElement::visible_enabled("b")),
        );
        let orchestrator = build(driver);
        let control = orchestrator.control();
        control.stop();
        let steps = vec![
            StepSpec { step_number: 1, action: Verb::Click, target: "#a".to_string(), value: None, expected: None },
            StepSpec { step_number: 2, action: Verb::Click, target: "#b".to_string(), value: None, expected: None },
        ];

        let result = orchestrator.run_test(&route(), "example.com", "t1", &steps).await;

        assert_eq!(result.status, TestStatus::Cancelled);
        assert!(result.per_step.iter().all(|s| s.status == StepOutcome::Skipped));
    }

    #[tokio::test]
    async fn blocked_step_attempts_recovery_before_failing() {
        // The mock driver never actually hides an element on click, so a
        // persistent modal can't be dismissed here -- this exercises the
        // recovery attempt path and confirms it still reports a clean
        // failure (rather than panicking) once recovery can't clear it.
        let driver = Arc::new(
            MockDriver::new()
                .with_page("p", "https://example.com/login")
                .with_element("p", ".modal-close", MockElement::visible_enabled("close"))
                .with_element("p", "#login-button", MockElement::visible_enabled("Log in")),
        );
        let orchestrator = build(driver);
        let steps = vec![StepSpec { step_number: 1, action: Verb::Click, target: "#login-button".to_string(), value: None, expected: None }];

        let result = orchestrator.run_test(&route(), "example.com", "t1", &steps).await;

        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.per_step[0].error.as_ref().unwrap().contains("blocked"));
    }

    #[test]
    fn selector_kind_is_reachable_from_resolution_result() {
        let selector = Selector::new("#x", SelectorKind::Css);
        assert_eq!(selector.kind, SelectorKind::Css);
    }
}
