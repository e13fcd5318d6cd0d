use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use wayfarer_action_checker::ActionChecker;
use wayfarer_action_executor::ActionExecutor;
use wayfarer_core_types::{ExecRoute, ExecutionEvent, ExecutionResult, RecoveryOutcomeEvent, StepSpec};
use wayfarer_driver::{mock::MockDriver, Driver};
use wayfarer_event_bus::InMemoryBus;
use wayfarer_knowledge_store::KnowledgeStore;
use wayfarer_learning_engine::{LearningEngine, LearningEngineConfig};
use wayfarer_orchestrator::{OrchestratorConfig, StepOrchestrator};
use wayfarer_pattern_store::PatternStore;
use wayfarer_recovery_handler::RecoveryHandler;
use wayfarer_selector_resolver::{ResolverConfig, SelectorResolver};
use wayfarer_spa_coordinator::SpaCoordinator;

use crate::config::RunnerConfig;

#[derive(Args)]
pub struct RunArgs {
    /// JSON file holding an ordered list of step specs
    pub steps: PathBuf,

    /// Domain (knowledge-store partition key) the run executes against
    #[arg(short, long)]
    pub domain: String,

    /// Test id surfaced in the execution result; defaults to the steps file's stem
    #[arg(short, long)]
    pub test_id: Option<String>,
}

/// One entry written under `training/` per run: the raw step list next to
/// the result it produced, for an offline learner to consume later.
#[derive(Serialize)]
struct TrainingBatch<'a> {
    source: &'static str,
    recorded_at: chrono::DateTime<chrono::Utc>,
    domain: &'a str,
    steps: &'a [StepSpec],
    result: &'a ExecutionResult,
}

pub async fn cmd_run(args: RunArgs, config: &RunnerConfig, json_output: bool) -> Result<()> {
    let raw = std::fs::read(&args.steps).with_context(|| format!("reading {}", args.steps.display()))?;
    let steps: Vec<StepSpec> = serde_json::from_slice(&raw).context("parsing step specs")?;
    let test_id = args.test_id.unwrap_or_else(|| {
        args.steps.file_stem().and_then(|s| s.to_str()).unwrap_or("run").to_string()
    });

    let knowledge = Arc::new(KnowledgeStore::open(&config.knowledge_dir)?);
    let patterns = Arc::new(PatternStore::open(&config.knowledge_dir)?);

    let driver: Arc<dyn Driver> = Arc::new(MockDriver::new());
    let resolver = Arc::new(SelectorResolver::new(
        knowledge.clone(),
        None,
        ResolverConfig { min_kb_confidence: config.min_confidence, ..ResolverConfig::default() },
    ));
    let checker = Arc::new(ActionChecker::new(driver.clone()));
    let spa = Arc::new(SpaCoordinator::new(driver.clone()));
    let executor = Arc::new(ActionExecutor::new(driver.clone(), spa.clone()));
    let recovery = Arc::new(RecoveryHandler::new(driver.clone()));

    let events = InMemoryBus::<ExecutionEvent>::new(256);
    let recovery_events = InMemoryBus::<RecoveryOutcomeEvent>::new(256);

    let learning_config = LearningEngineConfig {
        stale_after_days: config.stale_after_days,
        decay_rate: config.decay_rate,
        mining: wayfarer_learning_engine::MiningConfig { promotion_occurrences: config.promotion_threshold, ..Default::default() },
        ..Default::default()
    };
    let learning = Arc::new(LearningEngine::open(knowledge.clone(), patterns.clone(), &config.knowledge_dir, learning_config)?);
    learning.clone().spawn(events.clone(), recovery_events.clone());

    let orchestrator = StepOrchestrator::new(
        driver,
        resolver,
        checker,
        executor,
        recovery,
        spa,
        events,
        recovery_events,
        OrchestratorConfig { step_timeout: config.step_timeout(), ..OrchestratorConfig::default() },
    );

    let route = ExecRoute::main_frame(uuid::Uuid::new_v4().to_string(), "page-1");
    let result = orchestrator.run_test(&route, &args.domain, &test_id, &steps).await;

    // Batches don't flush on a timer; force one now so this run's outcomes
    // land in the knowledge store before the process exits.
    learning.flush();

    write_training_batch(&config.knowledge_dir, &args.domain, &steps, &result)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }

    Ok(())
}

fn write_training_batch(knowledge_dir: &std::path::Path, domain: &str, steps: &[StepSpec], result: &ExecutionResult) -> Result<()> {
    let batch = TrainingBatch { source: "cli", recorded_at: chrono::Utc::now(), domain, steps, result };
    let dir = knowledge_dir.join("training");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("batch_cli_{}.json", batch.recorded_at.timestamp_millis()));
    std::fs::write(&path, serde_json::to_vec_pretty(&batch)?)?;
    Ok(())
}

fn print_human(result: &ExecutionResult) {
    println!(
        "{} -- {:?} ({}/{} passed, {} recovered, {}ms)",
        result.test_id, result.status, result.passed, result.total_steps, result.recovered, result.duration_ms
    );
    for step in &result.per_step {
        let tier = step.selector_used.as_deref().map(|s| format!(" via {s}")).unwrap_or_default();
        println!("  [{:>2}] {:?} {:?}{tier} ({}ms)", step.number, step.action, step.status, step.duration_ms);
        if let Some(err) = &step.error {
            println!("       error: {err}");
        }
    }
    println!(
        "metrics: ai_calls={} kb_hits={} ai_dependency_pct={:.1} recovery_rate={:.2}",
        result.metrics.ai_calls, result.metrics.kb_hits, result.metrics.ai_dependency_pct, result.metrics.recovery_rate
    );
}
