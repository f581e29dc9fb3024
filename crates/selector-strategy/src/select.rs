//! Select/combobox candidate ordering (spec.md §4.2.3).
//!
//! Selecting an option is two-phase: first the Resolution Engine locates and
//! opens the trigger ([`generate_trigger`]), then, once the option list is
//! visible, it matches the option text ([`generate_option`]). Keeping the
//! phases as separate candidate lists lets the engine wait for the list to
//! render between them without the generator needing session/DOM access.

use crate::candidate::{css_quote, xpath_literal, Candidate};

/// Candidates for the trigger element of `Select{target, option}`. Ordering
/// satisfies P4: any `input[role='combobox']` candidate strictly precedes
/// any button-based dropdown candidate.
pub fn generate_trigger(target: &str) -> Vec<Candidate> {
    let q = css_quote(target);
    let t = xpath_literal(target);

    vec![
        // 1. Native <select>, matched by label or name.
        Candidate::css(format!("select[aria-label='{q}']")),
        Candidate::css(format!("select[name='{q}']")),
        // 2. Framework component.
        Candidate::css(format!("lightning-combobox[data-label='{q}']")),
        // 3. Input-role combobox (LWC dominant pattern).
        Candidate::css(format!("text='{q}' >> xpath=following::input[@role='combobox'][1]")),
        Candidate::xpath(format!(
            "//*[normalize-space(text())={t}]//following::input[@role='combobox'][1]"
        )),
        Candidate::css(format!("input[role='combobox'][aria-label*='{q}']")),
        // 4. Div-role combobox.
        Candidate::css(format!("div[role='combobox'][aria-label*='{q}']")),
        // 5. Button-based dropdowns (lowest; historically over-elevated).
        Candidate::css(format!("button[aria-label*='{q}']")),
    ]
}

/// Candidates for the option once the list is open, matched against option
/// text `V`.
pub fn generate_option(option: &str) -> Vec<Candidate> {
    let q = css_quote(option);
    vec![
        Candidate::css(format!("[role='listbox'] [role='option']:has-text('{q}')")),
        Candidate::css(format!("span.slds-listbox__option-text:has-text('{q}')")),
        Candidate::css(format!("div.slds-listbox__option:has-text('{q}')")),
        Candidate::css(format!("[data-label='{q}']")),
    ]
}
