use runner_core_types::ActionKind;

/// A typed step record (spec.md §3). Immutable once produced by the parser;
/// consumed exactly once by the Resolution Engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Fill {
        target: String,
        value: String,
    },
    FillTextarea {
        target: String,
        value: String,
    },
    Click {
        target: String,
    },
    Select {
        target: String,
        option: String,
    },
    Check {
        target: String,
        state: bool,
    },
    Upload {
        target: Option<String>,
        file_path: String,
    },
    Wait {
        seconds: f64,
    },
    Verify {
        text: String,
    },
    /// Parsing failed; surfaces as a step error (never an exception).
    Unknown {
        raw: String,
    },
}

impl Action {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Action::Fill { .. } => Some(ActionKind::Fill),
            Action::FillTextarea { .. } => Some(ActionKind::FillTextarea),
            Action::Click { .. } => Some(ActionKind::Click),
            Action::Select { .. } => Some(ActionKind::Select),
            Action::Check { .. } => Some(ActionKind::Check),
            Action::Upload { .. } => Some(ActionKind::Upload),
            Action::Wait { .. } => Some(ActionKind::Wait),
            Action::Verify { .. } => Some(ActionKind::Verify),
            Action::Unknown { .. } => None,
        }
    }

    /// The logical target string this action resolves against, if any.
    /// `Wait` and `Verify` (the latter checks document-wide text, not a
    /// single anchor) have no resolvable target.
    pub fn target(&self) -> Option<&str> {
        match self {
            Action::Fill { target, .. }
            | Action::FillTextarea { target, .. }
            | Action::Click { target }
            | Action::Select { target, .. }
            | Action::Check { target, .. } => Some(target),
            Action::Upload { target, .. } => target.as_deref(),
            Action::Wait { .. } | Action::Verify { .. } | Action::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Action::Unknown { .. })
    }
}

/// One line from a parsed test script.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// 1-based line number in the source script (for diagnostics).
    pub line_number: usize,
    pub raw: String,
    pub action: Action,
}
