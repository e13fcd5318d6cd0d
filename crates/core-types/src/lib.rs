//! Shared types for the wayfarer browser test agent.
//!
//! Every crate in the workspace builds on the vocabulary defined here: the
//! normalized `Intent` a step resolves against, the `Selector` a resolution
//! produces, the persisted `ElementRecord`, and the event/pattern/step types
//! that cross component boundaries. Keeping these in one crate means every
//! cross-module edge passes a structured value instead of a string.

pub mod dna;
pub mod element;
pub mod event;
pub mod intent;
pub mod pattern;
pub mod resolution;
pub mod route;
pub mod selector;
pub mod state;
pub mod step;

pub use dna::ElementDna;
pub use element::{ElementRecord, SelectorEntry};
pub use event::{ExecutionEvent, Outcome, RecoveryOutcomeEvent};
pub use intent::Intent;
pub use pattern::{ActionPattern, ApplicabilityPredicate, PatternStep};
pub use resolution::{ResolutionResult, Tier};
pub use route::{ExecRoute, PageKey};
pub use selector::{Selector, SelectorKind};
pub use state::{PageState, StateDiff};
pub use step::{ExecutionResult, StepOutcome, StepResult, StepSpec, StepStatus, Verb};
