//! Learning Engine (C12): the sole writer to the Knowledge Store. Consumes
//! [`ExecutionEvent`]s and [`RecoveryOutcomeEvent`]s off the event bus,
//! batches them before mutating the Knowledge Store, maintains a selector
//! evolution ledger and a per-domain recovery ledger, mines the rolling
//! action buffer for recurring step sequences, and runs the scheduled
//! decay/prune maintenance pass.

pub mod cross_domain;
pub mod errors;
pub mod evolution;
pub mod mining;
pub mod recovery_ledger;

pub use errors::LearningEngineError;
pub use evolution::{EvolutionLedger, SelectorEvolution};
pub use mining::{BufferedAction, MiningConfig, PatternMiner};
pub use recovery_ledger::{RecoveryLedger, RecoveryStats};

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wayfarer_core_types::{ExecutionEvent, Outcome, RecoveryOutcomeEvent};
use wayfarer_event_bus::InMemoryBus;
use wayfarer_knowledge_store::KnowledgeStore;
use wayfarer_pattern_store::PatternStore;

use cross_domain::CrossDomainLedger;

#[derive(Debug, Clone, Copy)]
pub struct LearningEngineConfig {
    /// Events are batched before the Knowledge Store is touched.
    pub batch_size: usize,
    pub mining: MiningConfig,
    /// Run `apply_decay` + `prune` every Nth flush (a stand-in for "daily",
    /// since nothing here schedules by wall-clock).
    pub maintenance_every_n_flushes: u32,
    pub stale_after_days: i64,
    pub decay_rate: f64,
}

impl Default for LearningEngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            mining: MiningConfig::default(),
            maintenance_every_n_flushes: 20,
            stale_after_days: 90,
            decay_rate: 0.01,
        }
    }
}

pub struct LearningEngine {
    knowledge: Arc<KnowledgeStore>,
    patterns: Arc<PatternStore>,
    evolution: EvolutionLedger,
    recovery_ledger: RecoveryLedger,
    cross_domain: CrossDomainLedger,
    miner: PatternMiner,
    config: LearningEngineConfig,
    flushes_since_maintenance: AtomicU32,
}

impl LearningEngine {
    pub fn new(knowledge: Arc<KnowledgeStore>, patterns: Arc<PatternStore>, config: LearningEngineConfig) -> Self {
        Self {
            knowledge,
            patterns,
            evolution: EvolutionLedger::new(),
            recovery_ledger: RecoveryLedger::new(),
            cross_domain: CrossDomainLedger::new(),
            miner: PatternMiner::new(config.mining),
            config,
            flushes_since_maintenance: AtomicU32::new(0),
        }
    }

    /// Loads the evolution ledger from `base_dir` and points the recovery
    /// and cross-domain ledgers at it for future persists.
    pub fn open(
        knowledge: Arc<KnowledgeStore>,
        patterns: Arc<PatternStore>,
        base_dir: impl Into<PathBuf>,
        config: LearningEngineConfig,
    ) -> Result<Self, LearningEngineError> {
        let base_dir = base_dir.into();
        let evolution = EvolutionLedger::open(&base_dir)?;
        Ok(Self {
            knowledge,
            patterns,
            evolution,
            recovery_ledger: RecoveryLedger::open(&base_dir),
            cross_domain: CrossDomainLedger::open(&base_dir),
            miner: PatternMiner::new(config.mining),
            config,
            flushes_since_maintenance: AtomicU32::new(0),
        })
    }

    /// Spawns the two background workers that drain the event buses. Returns
    /// immediately; the workers run until their bus is dropped.
    pub fn spawn(
        self: Arc<Self>,
        execution_bus: Arc<InMemoryBus<ExecutionEvent>>,
        recovery_bus: Arc<InMemoryBus<RecoveryOutcomeEvent>>,
    ) {
        let execution_rx = wayfarer_event_bus::to_mpsc(execution_bus, 256);
        let recovery_rx = wayfarer_event_bus::to_mpsc(recovery_bus, 256);

        let engine = self.clone();
        tokio::spawn(async move { engine.run_execution_worker(execution_rx).await });

        let engine = self;
        tokio::spawn(async move { engine.run_recovery_worker(recovery_rx).await });
    }

    async fn run_execution_worker(&self, mut rx: mpsc::Receiver<ExecutionEvent>) {
        let mut batch = Vec::with_capacity(self.config.batch_size);
        while let Some(event) = rx.recv().await {
            batch.push(event);
            if batch.len() >= self.config.batch_size {
                self.process_execution_batch(std::mem::take(&mut batch));
            }
        }
        if !batch.is_empty() {
            self.process_execution_batch(batch);
        }
    }

    async fn run_recovery_worker(&self, mut rx: mpsc::Receiver<RecoveryOutcomeEvent>) {
        while let Some(event) = rx.recv().await {
            self.process_recovery_event(&event);
        }
    }

    /// Processes one batch of selector-resolution events: writes each into
    /// the Knowledge Store (the only place that happens), updates the
    /// evolution ledger and the action buffer, considers each for
    /// cross-domain promotion, then mines and persists.
    fn process_execution_batch(&self, events: Vec<ExecutionEvent>) {
        if events.is_empty() {
            return;
        }
        for event in &events {
            self.process_execution_event(event);
        }
        self.flush();
    }

    fn process_execution_event(&self, event: &ExecutionEvent) {
        let success = matches!(event.outcome, Outcome::Success);
        let selector = wayfarer_core_types::Selector::new(event.selector_value.clone(), event.selector_kind);

        self.knowledge.record_outcome(
            &event.domain,
            &event.page,
            event.intent.as_str(),
            &selector,
            success,
            event.tier.name(),
            event.ai_assisted,
        );

        let evolution_key = format!("{}:{}:{}", event.domain, event.page, event.intent);
        self.evolution.record(&evolution_key, &event.selector_value, success);

        self.miner.record(BufferedAction {
            domain: event.domain.clone(),
            verb: "interact".to_string(),
            intent: event.intent.as_str().to_string(),
            success,
        });

        if event.ai_assisted && success {
            if let Some(keyword) = cross_domain::matching_keyword(event.intent.as_str()) {
                if let Err(err) = self.cross_domain.promote(keyword, &event.domain, &event.selector_value, event.selector_kind.name()) {
                    warn!(keyword, error = %err, "cross-domain promotion persist failed");
                }
            }
        }
    }

    fn process_recovery_event(&self, event: &RecoveryOutcomeEvent) {
        self.recovery_ledger.record(&event.domain, &event.failure_kind, &event.action_taken, event.success);
        if let Err(err) = self.recovery_ledger.persist_domain(&event.domain) {
            warn!(domain = %event.domain, error = %err, "recovery ledger persist failed");
        }
    }

    /// Forces processing: mines and promotes patterns, persists the
    /// evolution ledger, and runs decay/prune maintenance on schedule.
    pub fn flush(&self) {
        let promoted = self.miner.mine_and_promote(&self.patterns);
        if !promoted.is_empty() {
            info!(count = promoted.len(), "promoted new action patterns");
        }
        if let Err(err) = self.evolution.persist() {
            warn!(error = %err, "selector evolution ledger persist failed");
        }

        let n = self.flushes_since_maintenance.fetch_add(1, Ordering::Relaxed) + 1;
        if n >= self.config.maintenance_every_n_flushes {
            self.flushes_since_maintenance.store(0, Ordering::Relaxed);
            self.run_maintenance();
        }
    }

    fn run_maintenance(&self) {
        let decayed = self.knowledge.apply_decay(self.config.stale_after_days, self.config.decay_rate);
        let pruned = self.knowledge.prune();
        debug!(decayed, pruned, "knowledge store maintenance pass complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core_types::{SelectorKind, Tier};

    fn event(domain: &str, intent: &str, success: bool, ai_assisted: bool) -> ExecutionEvent {
        ExecutionEvent::new(
            chrono::Utc::now(),
            domain,
            "/",
            wayfarer_core_types::Intent::normalize(intent),
            &wayfarer_core_types::Selector::new("#x", SelectorKind::Css),
            if success { Outcome::Success } else { Outcome::Fail },
            12,
            ai_assisted,
            Tier::Heuristic,
        )
    }

    fn engine() -> LearningEngine {
        LearningEngine::new(Arc::new(KnowledgeStore::new()), Arc::new(PatternStore::new()), LearningEngineConfig::default())
    }

    #[test]
    fn processing_an_event_writes_through_to_the_knowledge_store() {
        let engine = engine();
        engine.process_execution_event(&event("a.com", "login button", true, false));

        let looked_up = engine.knowledge.lookup("a.com", "/", &wayfarer_core_types::Intent::normalize("login button"));
        assert!(looked_up.is_some());
    }

    #[test]
    fn evolution_ledger_tracks_the_first_selector_seen() {
        let engine = engine();
        engine.process_execution_event(&event("a.com", "login button", true, false));
        let evo = engine.evolution.get("a.com:/:login_button").unwrap();
        assert_eq!(evo.original_selector, "#x");
    }

    #[test]
    fn ai_assisted_success_on_a_universal_keyword_is_not_fatal_without_a_base_dir() {
        let engine = engine();
        engine.process_execution_event(&event("a.com", "login button", true, true));
    }

    #[test]
    fn flush_promotes_patterns_once_mined() {
        let engine = engine();
        for _ in 0..3 {
            engine.process_execution_event(&event("a.com", "submit form", true, false));
        }
        engine.flush();
    }
}
