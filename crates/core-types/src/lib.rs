//! Shared identifiers, action vocabulary, and small utilities used across every
//! crate in the resolution-and-action core.
//!
//! Kept deliberately thin: each crate still owns its own error enum (see the
//! teacher's one-`thiserror`-enum-per-crate convention), this crate only hosts
//! what would otherwise be duplicated verbatim in three or more places.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one Session (C7) within a Parallel Coordinator (C8) run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of action kinds the step parser can produce (spec.md §3).
///
/// `Unknown` is deliberately absent: it is a parse failure, not an action to
/// dispatch, and is represented by `ParseError` at the step-parser boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Click,
    Fill,
    FillTextarea,
    Select,
    Check,
    Upload,
    Wait,
    Verify,
}

impl ActionKind {
    /// Wire/on-disk name used in the learning store (spec.md §6.2).
    pub fn wire_name(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::FillTextarea => "textarea",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::Upload => "upload",
            ActionKind::Wait => "wait",
            ActionKind::Verify => "verify",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Some(match name {
            "click" => ActionKind::Click,
            "fill" => ActionKind::Fill,
            "textarea" => ActionKind::FillTextarea,
            "select" => ActionKind::Select,
            "check" => ActionKind::Check,
            "upload" => ActionKind::Upload,
            "wait" => ActionKind::Wait,
            "verify" => ActionKind::Verify,
            _ => return None,
        })
    }
}

/// Row selection preference for the Placeholder/Data Consumer (C6).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPreference {
    Positive,
    Negative,
    Mixed,
}

impl RowPreference {
    pub fn accepts(self, scenario: Scenario) -> bool {
        matches!(
            (self, scenario),
            (RowPreference::Mixed, _)
                | (RowPreference::Positive, Scenario::Positive)
                | (RowPreference::Negative, Scenario::Negative)
        )
    }
}

/// The `Scenario Type` column of the data row CSV (spec.md §6.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Scenario {
    Positive,
    Negative,
}

impl Scenario {
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Positive => "Positive",
            Scenario::Negative => "Negative",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Positive" => Some(Scenario::Positive),
            "Negative" => Some(Scenario::Negative),
            _ => None,
        }
    }
}

/// Normalize a raw target string into a Learning Store key.
///
/// Lowercases, collapses internal whitespace/punctuation runs to a single
/// `_`, per the GLOSSARY's "Normalized key" definition.
pub fn normalize_key(target: &str) -> String {
    let lowered = target.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_sep = false;
    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_punctuation() {
        assert_eq!(normalize_key("Recently Viewed"), "recently_viewed");
        assert_eq!(
            normalize_key("Form 2: Sustainability Start"),
            "form_2_sustainability_start"
        );
        assert_eq!(normalize_key("  Loud   Spaces  "), "loud_spaces");
    }

    #[test]
    fn row_preference_accepts() {
        assert!(RowPreference::Mixed.accepts(Scenario::Positive));
        assert!(RowPreference::Mixed.accepts(Scenario::Negative));
        assert!(RowPreference::Positive.accepts(Scenario::Positive));
        assert!(!RowPreference::Positive.accepts(Scenario::Negative));
        assert!(RowPreference::Negative.accepts(Scenario::Negative));
        assert!(!RowPreference::Negative.accepts(Scenario::Positive));
    }

    #[test]
    fn action_kind_wire_round_trip() {
        for kind in [
            ActionKind::Click,
            ActionKind::Fill,
            ActionKind::FillTextarea,
            ActionKind::Select,
            ActionKind::Check,
            ActionKind::Upload,
            ActionKind::Wait,
            ActionKind::Verify,
        ] {
            assert_eq!(ActionKind::from_wire_name(kind.wire_name()), Some(kind));
        }
    }
}
