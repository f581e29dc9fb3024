//! Resolution Engine (spec.md §4.5, component C5): the orchestration layer
//! that turns one parsed [`step_parser::Action`] into an actual DOM
//! interaction by trying, in order, a previously learned selector, then the
//! Selector Strategy Generator's candidates, then (if enabled) the AI
//! Locator Adapter — short-circuiting on the first candidate whose
//! element-level sub-strategies (`attempt.rs`) succeed.

mod attempt;
mod engine;
mod error;

pub use attempt::{CheckAction, ClickAction, ElementAction, FillAction};
pub use engine::{FailureOutcome, ResolutionConfig, ResolutionEngine, ResolutionOutcome, SuccessOutcome};
pub use error::StepFailureKind;
