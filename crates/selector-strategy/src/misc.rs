//! Check, Upload, and Verify candidate ordering (spec.md §4.2.4).

use crate::candidate::{css_quote, xpath_literal, Candidate};

/// Candidates for `Check{target, state}`. The candidate list is independent
/// of the desired checked state; the Resolution Engine decides whether to
/// click based on current vs. desired state (§4.5).
pub fn generate_check(target: &str) -> Vec<Candidate> {
    let q = css_quote(target);
    let t = xpath_literal(target);
    vec![
        Candidate::css(format!("input[type=checkbox][aria-label='{q}']")),
        Candidate::css_chain([
            format!("label:has-text('{q}')"),
            "input[type=checkbox]".into(),
        ]),
        Candidate::xpath(format!(
            "//*[normalize-space(text())={t}]//following::input[@type='checkbox'][1]"
        )),
    ]
}

/// Phase A of `Upload{target, file_path}`: a user-visible button that opens
/// a file chooser. `target` is used when present; otherwise the generic
/// "Upload Files"/"Upload" labels are tried.
pub fn generate_upload_button(target: Option<&str>) -> Vec<Candidate> {
    let mut out = Vec::new();
    if let Some(t) = target {
        let q = css_quote(t);
        out.push(Candidate::css(format!("button:has-text('{q}')")));
        out.push(Candidate::css(format!("a:has-text('{q}')")));
    }
    out.push(Candidate::css("button:has-text('Upload Files')"));
    out.push(Candidate::css("button:has-text('Upload')"));
    out
}

/// Phase B of `Upload{target, file_path}`: a direct `input[type=file]`,
/// tried when no upload button could be activated.
pub fn generate_upload_input(target: Option<&str>) -> Vec<Candidate> {
    let mut out = Vec::new();
    if let Some(t) = target {
        let q = css_quote(t);
        let x = xpath_literal(t);
        out.push(Candidate::css(format!("input[type=file][aria-label='{q}']")));
        out.push(Candidate::css(format!("input[type=file][name='{q}']")));
        out.push(Candidate::css(format!("input[type=file]#{q}")));
        out.push(Candidate::xpath(format!(
            "//*[normalize-space(text())={x}]//following::input[@type='file'][1]"
        )));
    }
    out.push(Candidate::css("input[type=file]"));
    out
}

/// Verify is a text-presence predicate, not a DOM query to click through, so
/// there is a single candidate: the literal text to look for.
pub fn verify_text_query(text: &str) -> String {
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_candidates_in_order() {
        let c = generate_check("Terms");
        assert_eq!(c[0].render(), "input[type=checkbox][aria-label='Terms']");
        assert_eq!(c[1].render(), "label:has-text('Terms') >> input[type=checkbox]");
    }

    #[test]
    fn upload_button_falls_back_to_generic_labels() {
        let c = generate_upload_button(None);
        assert_eq!(c[0].render(), "button:has-text('Upload Files')");
        assert_eq!(c[1].render(), "button:has-text('Upload')");
    }

    #[test]
    fn upload_button_tries_target_first() {
        let c = generate_upload_button(Some("Resume"));
        assert_eq!(c[0].render(), "button:has-text('Resume')");
        assert!(c.iter().any(|x| x.render() == "button:has-text('Upload Files')"));
    }

    #[test]
    fn upload_input_has_bare_fallback() {
        let c = generate_upload_input(None);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].render(), "input[type=file]");
    }
}
