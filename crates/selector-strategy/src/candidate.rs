//! Internal selector DSL (spec.md §4.2, REDESIGN FLAGS "Selector DSL").
//!
//! Rather than hard-coding one driver's selector syntax into the strategy
//! templates below, every candidate is built as a small `Candidate` value
//! and only turned into a string at the boundary. A driver crate that wants
//! native `>>`-chain/XPath support can render candidates as-is; a driver
//! that can't express one dialect can still walk `parts` itself.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CandidateKind {
    /// A chain of engine-native fragments, joined by ` >> ` when rendered.
    CssChain,
    /// An XPath expression, rendered with the `xpath=` prefix.
    XPath,
}

/// One candidate DOM query, in the order the Resolution Engine should try
/// it relative to its siblings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub parts: Vec<String>,
}

impl Candidate {
    pub fn css_chain<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: CandidateKind::CssChain,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn css(part: impl Into<String>) -> Self {
        Self::css_chain([part.into()])
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::XPath,
            parts: vec![expr.into()],
        }
    }

    /// Render to the engine-native wire form (`>>`-joined chain, or an
    /// `xpath=`-prefixed expression) that §4.2 describes. Drivers MAY
    /// re-lower this into their own dialect as long as equivalence holds.
    pub fn render(&self) -> String {
        match self.kind {
            CandidateKind::CssChain => self.parts.join(" >> "),
            CandidateKind::XPath => format!("xpath={}", self.parts.join("")),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Quote `text` for embedding in a `has-text('...')`/`[attr='...']` CSS-like
/// fragment. Candidate generation never receives attacker-controlled input
/// beyond step authors' own scripts, so this only needs to keep a literal
/// single-quote from truncating the fragment.
pub fn css_quote(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Build an XPath string literal for `text`, using `concat()` when the text
/// itself contains both quote characters (the standard XPath 1.0 trick,
/// since XPath has no escape sequence).
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let mut pieces = Vec::new();
        for (i, chunk) in text.split('\'').enumerate() {
            if i > 0 {
                pieces.push("\"'\"".to_string());
            }
            if !chunk.is_empty() {
                pieces.push(format!("'{}'", chunk));
            }
        }
        format!("concat({})", pieces.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_css_chain_joined_by_double_arrow() {
        let c = Candidate::css_chain(["lightning-input[data-label='T']", "input"]);
        assert_eq!(c.render(), "lightning-input[data-label='T'] >> input");
    }

    #[test]
    fn renders_xpath_with_prefix() {
        let c = Candidate::xpath("//span[normalize-space(.)='T']");
        assert_eq!(c.render(), "xpath=//span[normalize-space(.)='T']");
    }

    #[test]
    fn xpath_literal_plain() {
        assert_eq!(xpath_literal("Start"), "'Start'");
    }

    #[test]
    fn xpath_literal_with_apostrophe() {
        assert_eq!(xpath_literal("O'Brien"), "\"O'Brien\"");
    }

    #[test]
    fn xpath_literal_with_both_quotes_uses_concat() {
        let lit = xpath_literal("say 'hi' \"now\"");
        assert!(lit.starts_with("concat("));
    }
}
