//! `ExecutionEvent`: the immutable record the Learning Engine consumes.

use crate::intent::Intent;
use crate::resolution::Tier;
use crate::selector::{Selector, SelectorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Fail,
}

/// One immutable fact produced by resolving or executing a step. Consumed
/// asynchronously by the Learning Engine; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub timestamp: DateTime<Utc>,
    pub domain: String,
    pub page: String,
    pub intent: Intent,
    pub selector_value: String,
    pub selector_kind: SelectorKind,
    pub outcome: Outcome,
    pub latency_ms: u64,
    pub ai_assisted: bool,
    pub tier: Tier,
    pub context_kv: HashMap<String, String>,
}

impl ExecutionEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        domain: impl Into<String>,
        page: impl Into<String>,
        intent: Intent,
        selector: &Selector,
        outcome: Outcome,
        latency_ms: u64,
        ai_assisted: bool,
        tier: Tier,
    ) -> Self {
        Self {
            timestamp,
            domain: domain.into(),
            page: page.into(),
            intent,
            selector_value: selector.value.clone(),
            selector_kind: selector.kind,
            outcome,
            latency_ms,
            ai_assisted,
            tier,
            context_kv: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_kv.insert(key.into(), value.into());
        self
    }

    pub fn fingerprint_key(&self) -> String {
        format!("{}:{}", self.domain, self.intent)
    }
}

/// One attempted recovery, published so the Learning Engine can keep a
/// ledger of which recovery action works for which failure kind, per domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryOutcomeEvent {
    pub timestamp: DateTime<Utc>,
    pub domain: String,
    pub failure_kind: String,
    pub action_taken: String,
    pub success: bool,
}

impl RecoveryOutcomeEvent {
    pub fn ledger_key(&self) -> String {
        format!("{}:{}:{}", self.domain, self.failure_kind, self.action_taken)
    }
}
