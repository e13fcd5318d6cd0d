//! Error types for the resolver crate. The resolution pipeline itself never
//! fails -- `resolve()` always returns a `ResolutionResult`, falling all the
//! way to `Tier::Failed` rather than propagating an error -- but fetching
//! the page content to feed the Semantic/Heuristic tiers can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("failed to read page content: {0}")]
    PageContentUnavailable(String),
}
