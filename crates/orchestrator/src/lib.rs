//! Step Orchestrator (C11): the per-step state machine that drives a test
//! case through resolve -> pre-check -> dispatch -> post-check -> recover,
//! wiring together the Selector Resolver, the Pre/Post Action Checker, the
//! Action Executor, and the Recovery Handler.

pub mod control;
pub mod errors;
pub mod orchestrator;

pub use control::{OrchestratorState, RunControl};
pub use errors::OrchestratorError;
pub use orchestrator::{OrchestratorConfig, StepOrchestrator};
