//! Click-target candidate ordering (spec.md §4.2.1).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::candidate::{css_quote, xpath_literal, Candidate};

static FORM_ROW_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Form \d+: .+$").unwrap());

/// Candidates for `Click{target}`, in the exact order §4.2.1 mandates. When
/// `target` matches the `Form N: Name` shape, the row-aware extension is
/// prepended — it MUST precede the generic click candidates (§4.2.1, last
/// paragraph).
pub fn generate(target: &str) -> Vec<Candidate> {
    let mut out = Vec::new();

    if FORM_ROW_TARGET.is_match(target) {
        out.extend(row_aware_candidates(target));
    }

    out.extend(generic_click_candidates(target));
    out
}

/// The row-aware extension: locate a `<p>` whose subtree text contains `T`,
/// then hop to the following Start/Edit span, then rise to the enclosing
/// link. The `[2]` index is intentional (§4.2.1): the first matching span in
/// document order belongs to the *preceding* row, not this one.
fn row_aware_candidates(target: &str) -> Vec<Candidate> {
    let t = xpath_literal(target);
    vec![
        Candidate::xpath(format!(
            "//p[contains(normalize-space(.), {t})]/following::span[normalize-space(text())='Start' or normalize-space(text())='Edit'][2]/ancestor::a[1]"
        )),
        Candidate::xpath(format!(
            "//p[contains(normalize-space(.), {t})]/following::a[contains(., 'Start') or contains(., 'Edit')][1]"
        )),
    ]
}

fn generic_click_candidates(target: &str) -> Vec<Candidate> {
    let q = css_quote(target);
    let t = xpath_literal(target);
    vec![
        // 1. Tag-targeted text-click elements.
        Candidate::css(format!("button:has-text('{q}')")),
        Candidate::css(format!("a:has-text('{q}')")),
        Candidate::css(format!("lightning-button:has-text('{q}')")),
        // 2. XPath whole-subtree normalized text equality.
        Candidate::xpath(format!("//span[normalize-space(.)={t}]")),
        Candidate::xpath(format!("//div[normalize-space(.)={t}]")),
        Candidate::xpath(format!("//a[normalize-space(.)={t}]")),
        Candidate::xpath(format!("//button[normalize-space(.)={t}]")),
        Candidate::xpath(format!(
            "//*[normalize-space(.)={t} and not(self::script) and not(self::style)]"
        )),
        // 3. Framework-known text containers.
        Candidate::css(format!("span.slds-page-header__title:has-text('{q}')")),
        Candidate::css(format!("span.slds-truncate:has-text('{q}')")),
        Candidate::css(format!("h1:has-text('{q}')")),
        Candidate::css(format!("h2:has-text('{q}')")),
        // 4. List/menu role containers.
        Candidate::css(format!("li:has-text('{q}')")),
        Candidate::css(format!("[role='option']:has-text('{q}')")),
        Candidate::css(format!("[role='menuitem']:has-text('{q}')")),
        Candidate::css(format!("[role='listitem']:has-text('{q}')")),
        // 5. Attribute-title selectors.
        Candidate::css(format!("a[title='{q}']")),
        Candidate::css(format!("span[title='{q}']")),
        // 6. Generic text-engine.
        Candidate::css(format!("text='{q}'")),
        Candidate::css(format!("text=/{q}/i")),
        Candidate::css(format!("span:has-text('{q}')")),
        Candidate::css(format!("div:has-text('{q}')")),
        // 7. Attribute fallbacks (deprioritized).
        Candidate::css(format!("[title='{q}']")),
        Candidate::css(format!("[aria-label='{q}']")),
        Candidate::css(format!("[data-label='{q}']")),
        // 8. Last resort.
        Candidate::css(format!("*:has-text('{q}')")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateKind;

    #[test]
    fn plain_target_has_no_row_aware_prefix() {
        let c = generate("Recently Viewed");
        assert_eq!(c[0].render(), "button:has-text('Recently Viewed')");
    }

    #[test]
    fn row_aware_candidates_precede_generic_ones() {
        let c = generate("Form 2: Sustainability Start");
        assert_eq!(c[0].kind, CandidateKind::XPath);
        assert!(c[0].render().contains("following::span"));
        assert!(c[0].render().contains("[2]/ancestor::a[1]"));
        assert!(c[1].render().contains("following::a"));
        assert_eq!(c[2].render(), "button:has-text('Form 2: Sustainability Start')");
    }

    #[test]
    fn full_ordering_matches_contract() {
        let c = generate("Submit");
        let rendered: Vec<String> = c.iter().map(|x| x.render()).collect();
        assert_eq!(rendered[0], "button:has-text('Submit')");
        assert_eq!(rendered[1], "a:has-text('Submit')");
        assert_eq!(rendered[2], "lightning-button:has-text('Submit')");
        assert_eq!(rendered.last().unwrap(), "*:has-text('Submit')");
        assert!(rendered.contains(&"[data-label='Submit']".to_string()));
    }
}
