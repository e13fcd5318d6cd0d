//! Driver-level error taxonomy (§7): what the Recovery Handler classifies.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("element not visible: {0}")]
    NotVisible(String),

    #[error("element not enabled: {0}")]
    NotEnabled(String),

    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("element intercepted by another node: {0}")]
    Intercepted(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("driver error: {0}")]
    Other(String),
}

impl DriverError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::Timeout(_) | DriverError::Stale(_) | DriverError::Network(_)
        )
    }
}
