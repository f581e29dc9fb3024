//! The concrete event vocabulary (spec.md §4.9) carried on the bus, plus the
//! per-Session [`Metrics`] accumulator (§3) that `SessionEnd` reports.

use chrono::{DateTime, Utc};
use runner_core_types::SessionId;
use serde::{Deserialize, Serialize};

/// Which tier resolved the element (spec.md GLOSSARY, "Via").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Via {
    Learned,
    Traditional,
    Ai,
}

/// Per-Session counters accumulated over a run (spec.md §3, "Metrics").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub wall_time_ms: u64,
    pub step_count: u32,
    pub steps_succeeded: u32,
    pub steps_failed: u32,
    pub selectors_reused: u32,
    pub selectors_learned: u32,
    pub ai_invocations: u32,
    pub ai_successes: u32,
}

/// Typed progress events, each carrying a monotonic timestamp and, where
/// applicable, a `session_id` (spec.md §4.9). Serialized with `type` as the
/// JSON tag (snake_case, as §6.5 permits) so wire consumers can match on it
/// without a separate envelope type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunnerEvent {
    StepStart {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        n: usize,
        action_kind: String,
        target: Option<String>,
    },
    StepEnd {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        n: usize,
        ok: bool,
        via: Option<Via>,
        selector: Option<String>,
        error: Option<String>,
    },
    SelectorLearned {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        key: String,
        selector: String,
    },
    SelectorReused {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        key: String,
    },
    AiInvoked {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        key: String,
        hit: bool,
    },
    SessionEnd {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
        ok: bool,
        metrics: Metrics,
    },
    /// Coordinator-level; carries no `session_id` since it summarizes across
    /// every Session in the run (§4.9).
    ProgressPercent {
        timestamp: DateTime<Utc>,
        completed: usize,
        total: usize,
    },
}

impl RunnerEvent {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            RunnerEvent::StepStart { session_id, .. }
            | RunnerEvent::StepEnd { session_id, .. }
            | RunnerEvent::SelectorLearned { session_id, .. }
            | RunnerEvent::SelectorReused { session_id, .. }
            | RunnerEvent::AiInvoked { session_id, .. }
            | RunnerEvent::SessionEnd { session_id, .. } => Some(session_id),
            RunnerEvent::ProgressPercent { .. } => None,
        }
    }
}
