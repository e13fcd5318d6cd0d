//! Orchestrator error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("driver error: {0}")]
    Driver(#[from] wayfarer_driver::DriverError),
    #[error("checker error: {0}")]
    Checker(#[from] wayfarer_action_checker::CheckerError),
    #[error("run was stopped before any step executed")]
    StoppedBeforeStart,
}
