//! `ResolutionResult`: the output of the selector resolution pipeline.

use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which pipeline stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    KnowledgeBase,
    FrameworkRule,
    Heuristic,
    Ai,
    Fallback,
    Failed,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::KnowledgeBase => "knowledge_base",
            Tier::FrameworkRule => "framework_rule",
            Tier::Heuristic => "heuristic",
            Tier::Ai => "ai",
            Tier::Fallback => "fallback",
            Tier::Failed => "failed",
        }
    }
}

/// A scored alternative considered during resolution but not selected as primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub selector: Selector,
    pub confidence: f64,
    pub tier: Tier,
}

/// The outcome of resolving one intent to a locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub selector: Option<Selector>,
    pub confidence: f64,
    pub tier: Tier,
    pub alternatives: Vec<Alternative>,
    pub metadata: HashMap<String, String>,
}

impl ResolutionResult {
    pub fn failed() -> Self {
        Self {
            selector: None,
            confidence: 0.0,
            tier: Tier::Failed,
            alternatives: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn new(selector: Selector, confidence: f64, tier: Tier) -> Self {
        Self {
            selector: Some(selector),
            confidence,
            tier,
            alternatives: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<Alternative>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.tier, Tier::Failed) || self.selector.is_none()
    }
}
