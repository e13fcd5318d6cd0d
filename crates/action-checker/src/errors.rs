//! Error types for pre/post action checking.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("driver error during check: {0}")]
    Driver(#[from] wayfarer_driver::DriverError),
}

