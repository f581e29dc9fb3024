//! Fill / FillTextarea candidate ordering (spec.md §4.2.2).

use crate::candidate::{css_quote, xpath_literal, Candidate};

/// Candidates shared by `Fill{target}` and `FillTextarea{target}` — the
/// priority list does not distinguish between the two field kinds, each
/// tier simply emits both the `input` and `textarea` variant (§4.2.2).
pub fn generate(target: &str) -> Vec<Candidate> {
    let q = css_quote(target);
    let t_exact = xpath_literal(target);

    vec![
        // 1. Direct-attribute.
        Candidate::css(format!("input[placeholder='{q}']")),
        Candidate::css(format!("input[aria-label='{q}']")),
        Candidate::css(format!("textarea[placeholder='{q}']")),
        Candidate::css(format!("textarea[aria-label='{q}']")),
        // 2. Framework component + inner field.
        Candidate::css_chain([format!("lightning-input[data-label='{q}']"), "input".into()]),
        Candidate::css_chain([
            format!("lightning-textarea[data-label='{q}']"),
            "textarea".into(),
        ]),
        // 3. XPath label-anchored navigation (primary for long labels).
        Candidate::xpath(format!(
            "//*[normalize-space(text())={t_exact}]//following::input[1]"
        )),
        Candidate::xpath(format!(
            "//*[normalize-space(text())={t_exact}]//following::textarea[1]"
        )),
        Candidate::xpath(format!(
            "//*[contains(normalize-space(text()), {t_exact})]//following::input[1]"
        )),
        Candidate::xpath(format!(
            "//*[contains(normalize-space(text()), {t_exact})]//following::textarea[1]"
        )),
        // 4. Form-element grouping.
        Candidate::css_chain([format!("div.slds-form-element:has-text('{q}')"), "input".into()]),
        Candidate::css_chain([
            format!("div.slds-form-element:has-text('{q}')"),
            "textarea".into(),
        ]),
        // 5. Last resort.
        Candidate::css("textarea.slds-textarea"),
    ]
}
