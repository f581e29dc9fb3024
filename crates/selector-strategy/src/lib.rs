//! Selector Strategy Generator (spec.md §4.2, component C2).
//!
//! `(target, action, context)` → an ordered, finite candidate list. The
//! order is not an optimization detail, it is the contract: callers must
//! reproduce it faithfully (§4.2). This crate only generates candidates; it
//! never touches a page or a driver.

mod candidate;
mod click;
mod fill;
mod misc;
mod select;

pub use candidate::{Candidate, CandidateKind};

use runner_core_types::ActionKind;

/// Framework hints for candidate generation. Salesforce Lightning (LWC/SLDS)
/// is the only framework this generator currently targets (§4.2); the enum
/// exists so a future framework can be added without reshaping call sites.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum FrameworkHint {
    #[default]
    SalesforceLightning,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct Context {
    pub framework: FrameworkHint,
}

/// Generate the candidate list for action kinds whose candidates depend on
/// a single target string: Click, Fill, FillTextarea, Check.
///
/// `Select`, `Upload`, and `Verify` have multi-phase or differently-shaped
/// contracts (§4.2.3, §4.2.4) and are generated by their own dedicated
/// functions below instead of being folded into this one signature.
pub fn generate(target: &str, kind: ActionKind, _context: &Context) -> Vec<Candidate> {
    match kind {
        ActionKind::Click => click::generate(target),
        ActionKind::Fill | ActionKind::FillTextarea => fill::generate(target),
        ActionKind::Check => misc::generate_check(target),
        ActionKind::Select | ActionKind::Upload | ActionKind::Wait | ActionKind::Verify => {
            Vec::new()
        }
    }
}

/// Select is two-phase: the trigger element, then (once the option list is
/// open) the option itself.
pub fn generate_select_trigger(target: &str, _context: &Context) -> Vec<Candidate> {
    select::generate_trigger(target)
}

pub fn generate_select_option(option: &str, _context: &Context) -> Vec<Candidate> {
    select::generate_option(option)
}

/// Upload is two-phase: an activating button (Phase A), then a direct file
/// input (Phase B) if no button could be activated (§4.2.4).
pub fn generate_upload_button(target: Option<&str>, _context: &Context) -> Vec<Candidate> {
    misc::generate_upload_button(target)
}

pub fn generate_upload_input(target: Option<&str>, _context: &Context) -> Vec<Candidate> {
    misc::generate_upload_input(target)
}

/// Verify has no DOM-query candidate list; it is a text-presence predicate
/// over the rendered document (§4.2.4).
pub fn verify_text_query(text: &str) -> String {
    misc::verify_text_query(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_dispatches_by_action_kind() {
        let ctx = Context::default();
        assert!(!generate("Submit", ActionKind::Click, &ctx).is_empty());
        assert!(!generate("County", ActionKind::Fill, &ctx).is_empty());
        assert!(!generate("County", ActionKind::FillTextarea, &ctx).is_empty());
        assert!(!generate("Terms", ActionKind::Check, &ctx).is_empty());
    }

    #[test]
    fn generate_is_deterministic() {
        let ctx = Context::default();
        let a = generate("Submit", ActionKind::Click, &ctx);
        let b = generate("Submit", ActionKind::Click, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn select_and_upload_use_dedicated_entry_points() {
        let ctx = Context::default();
        assert!(!generate_select_trigger("Status", &ctx).is_empty());
        assert!(!generate_select_option("Yes", &ctx).is_empty());
        assert!(!generate_upload_button(Some("Resume"), &ctx).is_empty());
        assert!(!generate_upload_input(None, &ctx).is_empty());
    }
}
