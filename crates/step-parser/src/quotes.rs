//! Quote-pair extraction (spec.md §4.1, §6.1).
//!
//! Quoted substrings are pulled out of the line first and replaced with a
//! sentinel token before verb matching, so the verb/template regexes never
//! have to deal with arbitrary punctuation inside a quoted value. Embedded
//! quote characters are escaped by doubling, e.g. `"say ""hi"" now"`.

/// Sentinel markers use `\u{1}` (unprintable, never legitimately present in a
/// test script) so they cannot collide with user text.
const SENTINEL: char = '\u{1}';

pub struct Tokenized {
    /// The line with every quoted span replaced by `\u{1}<index>\u{1}`.
    pub residual: String,
    /// The dequoted content of each quoted span, indexed by position.
    pub quotes: Vec<String>,
}

/// Extract quoted substrings from `line`. Paired double-quotes are preferred;
/// if the line contains no paired double-quotes, paired single-quotes are
/// used as a fallback (spec.md §4.1).
pub fn tokenize(line: &str) -> Tokenized {
    let quote_char = if has_paired(line, '"') {
        '"'
    } else if has_paired(line, '\'') {
        '\''
    } else {
        return Tokenized {
            residual: line.to_string(),
            quotes: Vec::new(),
        };
    };

    let mut residual = String::with_capacity(line.len());
    let mut quotes = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == quote_char {
            let mut content = String::new();
            i += 1;
            loop {
                if i >= chars.len() {
                    // Unterminated quote: treat the rest of the line as content.
                    break;
                }
                if chars[i] == quote_char {
                    if i + 1 < chars.len() && chars[i + 1] == quote_char {
                        content.push(quote_char);
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                content.push(chars[i]);
                i += 1;
            }
            residual.push(SENTINEL);
            residual.push_str(&quotes.len().to_string());
            residual.push(SENTINEL);
            quotes.push(content);
        } else {
            residual.push(chars[i]);
            i += 1;
        }
    }

    Tokenized { residual, quotes }
}

fn has_paired(line: &str, quote: char) -> bool {
    line.chars().filter(|&c| c == quote).count() >= 2
}

/// Resolve a captured slot (possibly a sentinel referencing a quoted string,
/// possibly a literal unquoted word run) into its final string value.
pub fn resolve_slot(raw: &str, quotes: &[String]) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    if chars.next() == Some(SENTINEL) {
        let rest: String = chars.collect();
        if let Some(digits) = rest.strip_suffix(SENTINEL) {
            if let Ok(idx) = digits.parse::<usize>() {
                if let Some(value) = quotes.get(idx) {
                    return value.clone();
                }
            }
        }
    }
    trimmed.to_string()
}
