//! Selector Resolver (C6): orchestrates the 5-tier resolution pipeline --
//! KnowledgeBase, FrameworkRule, Heuristic+Semantic (parallel), AI,
//! Fallback -- and returns a `ResolutionResult` with confidence and
//! alternatives. Never fails: the lowest tier always produces *something*,
//! down to `Tier::Failed` if every tier comes up empty.

pub mod errors;
pub mod raw_selector;
pub mod resolver;

pub use errors::ResolverError;
pub use resolver::{ResolverConfig, SelectorResolver, TierCounters};
