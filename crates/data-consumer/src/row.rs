//! One row of the data CSV (spec.md §6.3): a scenario tag, a `used` flag,
//! and the field columns beyond `Scenario Type`/`Data Used`, in file order.

use runner_core_types::Scenario;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataRow {
    pub scenario: Scenario,
    pub used: bool,
    /// `(column name, value)` pairs, file-order preserved so rewrites don't
    /// reshuffle columns.
    pub fields: Vec<(String, String)>,
}

impl DataRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }
}

/// The file's literal convention wraps every cell in single quotes
/// (`'Positive'`, `'False'`, `'val1'`) rather than using CSV-standard
/// double-quote escaping. Strip a matching pair if present; leave the value
/// untouched otherwise so a hand-edited unquoted cell still parses.
pub(crate) fn unquote(cell: &str) -> String {
    let bytes = cell.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        cell[1..cell.len() - 1].to_string()
    } else {
        cell.to_string()
    }
}

pub(crate) fn quote(value: &str) -> String {
    format!("'{value}'")
}

pub(crate) fn parse_bool_cell(cell: &str) -> bool {
    unquote(cell).eq_ignore_ascii_case("true")
}

pub(crate) fn format_bool_cell(value: bool) -> String {
    quote(if value { "True" } else { "False" })
}
