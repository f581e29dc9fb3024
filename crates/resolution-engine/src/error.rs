//! The step-level error taxonomy (spec.md §7). Every step failure —
//! regardless of which component first observed it — is classified into
//! exactly one of these, so every event and report shares one vocabulary
//! (ambient-stack decision, see SPEC_FULL.md "Error handling").

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum StepFailureKind {
    #[error("line could not be lifted to an Action")]
    ParseError,
    #[error("%Name% placeholder had no matching dataset column")]
    PlaceholderUnresolved,
    #[error("dataset depleted for the requested row preference")]
    NoDataAvailable,
    #[error("all candidates (and AI, if enabled) failed to resolve the target")]
    ElementNotFound,
    #[error("target resolved but every action sub-strategy failed")]
    ElementNotActionable,
    #[error("expected text was not present within the verification window")]
    VerifyFailed,
    #[error("per-action or per-session deadline expired")]
    Timeout,
    #[error("initial navigation failed")]
    NavigationFailed,
    #[error("underlying driver raised an unclassified error")]
    DriverError,
    #[error("coordinator cancellation")]
    Cancelled,
}
