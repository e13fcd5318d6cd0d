//! Step input/output schemas: what the test-case collaborator feeds in, and
//! what the orchestrator emits back out.

use crate::resolution::Tier;
use serde::{Deserialize, Serialize};

/// The action verbs the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Navigate,
    Click,
    Fill,
    Type,
    Select,
    Check,
    Uncheck,
    Hover,
    DoubleClick,
    PressKey,
    Scroll,
    UploadFile,
    Wait,
    WaitForElement,
    WaitForNavigation,
    AssertUrl,
    AssertVisible,
    AssertText,
    AssertValue,
    Screenshot,
}

impl Verb {
    /// Verbs that need a resolved DOM locator to act on.
    pub fn is_locator_driven(&self) -> bool {
        !matches!(
            self,
            Verb::Navigate
                | Verb::Wait
                | Verb::WaitForNavigation
                | Verb::AssertUrl
                | Verb::Screenshot
        )
    }

    /// Verbs that assert an expectation rather than perform an action --
    /// these are allowed to have no observable side effect without it being
    /// flagged as a silent no-op.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Verb::AssertUrl | Verb::AssertVisible | Verb::AssertText | Verb::AssertValue
        )
    }

    pub fn is_pure_wait(&self) -> bool {
        matches!(self, Verb::Wait | Verb::WaitForElement | Verb::WaitForNavigation)
    }
}

/// One step of a test case, as ingested from the test-case authoring
/// collaborator (out of scope here; only the schema is specified).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub step_number: u32,
    pub action: Verb,
    /// A human intent phrase ("click login button") or a raw selector.
    pub target: String,
    pub value: Option<String>,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Recovered,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Failed,
    Recovered,
    Skipped,
}

/// Per-step result emitted in the final test report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub number: u32,
    pub action: Verb,
    pub target: String,
    pub status: StepOutcome,
    pub selector_used: Option<String>,
    pub tier: Tier,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Aggregate counters surfaced in the final test report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub ai_calls: u32,
    pub kb_hits: u32,
    pub ai_dependency_pct: f64,
    pub recovery_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Cancelled,
}

/// The full execution-result schema emitted for one test case run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub test_id: String,
    pub status: TestStatus,
    pub total_steps: u32,
    pub passed: u32,
    pub failed: u32,
    pub recovered: u32,
    pub duration_ms: u64,
    pub per_step: Vec<StepResult>,
    pub metrics: RunMetrics,
}
