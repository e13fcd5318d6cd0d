//! Error types for step execution.

use thiserror::Error;
use wayfarer_driver::DriverError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no candidate selector was supplied for a locator-driven verb")]
    NoCandidates,

    #[error("candidate never became visible: {0}")]
    NeverVisible(String),

    #[error("all {attempts} candidate(s) failed, last error: {last}")]
    AllCandidatesFailed { attempts: u32, last: DriverError },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}
