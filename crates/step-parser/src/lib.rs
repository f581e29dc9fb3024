//! Step Parser (spec.md §4.1, component C1).
//!
//! Lifts each line of a natural-language test script into a typed `Step`.
//! Blank lines and `#`-prefixed comment lines are skipped entirely; every
//! other line always produces a `Step`, falling back to `Action::Unknown`
//! rather than failing the whole script (P1, parser totality).

mod action;
mod parser;
mod quotes;

pub use action::{Action, Step};
pub use parser::parse_action;

/// Parse a single already-trimmed, non-blank, non-comment line.
///
/// Returns `None` for lines that carry no step (blank, or `#` comment);
/// callers iterating a script should prefer [`parse_script`], which applies
/// that filtering and tracks line numbers for diagnostics.
pub fn parse_line(line: &str) -> Option<Action> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(parse_action(trimmed))
}

/// Parse a whole script into an ordered list of steps, 1-based line numbers
/// preserved for error reporting.
pub fn parse_script(text: &str) -> Vec<Step> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let action = parse_line(raw)?;
            Some(Step {
                line_number: idx + 1,
                raw: raw.trim().to_string(),
                action,
            })
        })
        .collect()
}
