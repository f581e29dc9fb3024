//! `%Name%` token expansion (spec.md §4.6, "Expansion").

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::UnknownPlaceholder;
use crate::row::DataRow;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([^%]+)%").unwrap());

/// Replace every `%Name%` in `text` with `row`'s value for `Name`. Fails on
/// the first token absent from the row's columns (order-stable: left to
/// right in `text`).
pub fn expand(text: &str, row: &DataRow) -> Result<String, UnknownPlaceholder> {
    if !PLACEHOLDER.is_match(text) {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let name = &caps[1];
        let value = row
            .get(name)
            .ok_or_else(|| UnknownPlaceholder(name.to_string()))?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner_core_types::Scenario;

    fn row() -> DataRow {
        DataRow {
            scenario: Scenario::Positive,
            used: false,
            fields: vec![
                ("County".to_string(), "Loudoun".to_string()),
                ("Status".to_string(), "Active".to_string()),
            ],
        }
    }

    #[test]
    fn expands_single_token() {
        assert_eq!(expand("%County%", &row()).unwrap(), "Loudoun");
    }

    #[test]
    fn expands_multiple_tokens_in_one_string() {
        assert_eq!(
            expand("County: %County%, Status: %Status%", &row()).unwrap(),
            "County: Loudoun, Status: Active"
        );
    }

    #[test]
    fn text_with_no_tokens_passes_through_unchanged() {
        assert_eq!(expand("Submit", &row()).unwrap(), "Submit");
    }

    #[test]
    fn unknown_column_fails() {
        let err = expand("%Missing%", &row()).unwrap_err();
        assert_eq!(err.0, "Missing");
    }
}
