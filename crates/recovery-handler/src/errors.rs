//! Error types for recovery execution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("driver error during recovery: {0}")]
    Driver(#[from] wayfarer_driver::DriverError),
}
