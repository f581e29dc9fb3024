//! Recognizes the natural-language surface forms of spec.md §4.1 and lifts
//! them into `Action` records. Verb recognition is case-insensitive; quoted
//! substrings are extracted first (see `quotes`) so each verb pattern only
//! has to match sentinel tokens and a handful of delimiter words.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::action::Action;
use crate::quotes::{resolve_slot, tokenize};

struct Pattern {
    regex: Regex,
    build: fn(&regex::Captures<'_>, &[String]) -> Action,
}

fn slot(caps: &regex::Captures<'_>, name: &str, quotes: &[String]) -> String {
    resolve_slot(caps.name(name).map(|m| m.as_str()).unwrap_or(""), quotes)
}

static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        // --- Fill / FillTextarea -------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^type\s+(?P<v>.+?)\s+into\s+textarea\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::FillTextarea {
                target: slot(c, "t", q),
                value: slot(c, "v", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^fill\s+textarea\s+(?P<t>.+?)\s+with\s+(?P<v>.+)$").unwrap(),
            build: |c, q| Action::FillTextarea {
                target: slot(c, "t", q),
                value: slot(c, "v", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^type\s+(?P<v>.+?)\s+into\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Fill {
                target: slot(c, "t", q),
                value: slot(c, "v", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^fill\s+(?P<t>.+?)\s+with\s+(?P<v>.+)$").unwrap(),
            build: |c, q| Action::Fill {
                target: slot(c, "t", q),
                value: slot(c, "v", q),
            },
        },
        // --- Click ----------------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^click\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Click {
                target: slot(c, "t", q),
            },
        },
        // --- Wait -------------------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^wait\s+for\s+(?P<n>[0-9]+(?:\.[0-9]+)?)\s+seconds?$")
                .unwrap(),
            build: |c, _q| Action::Wait {
                seconds: c.name("n").unwrap().as_str().parse().unwrap_or(0.0),
            },
        },
        // --- Select -----------------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^select\s+(?P<v>.+?)\s+from\s+dropdown\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Select {
                target: slot(c, "t", q),
                option: slot(c, "v", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^select\s+(?P<v>.+?)\s+from\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Select {
                target: slot(c, "t", q),
                option: slot(c, "v", q),
            },
        },
        // --- Check / Uncheck ----------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^uncheck\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Check {
                target: slot(c, "t", q),
                state: false,
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^check\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Check {
                target: slot(c, "t", q),
                state: true,
            },
        },
        // --- Upload ---------------------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^upload\s+file\s+(?P<p>.+?)\s+to\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Upload {
                target: Some(slot(c, "t", q)),
                file_path: slot(c, "p", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^upload\s+(?P<p>.+?)\s+to\s+(?P<t>.+)$").unwrap(),
            build: |c, q| Action::Upload {
                target: Some(slot(c, "t", q)),
                file_path: slot(c, "p", q),
            },
        },
        Pattern {
            regex: Regex::new(r"(?i)^upload\s+(?P<p>.+)$").unwrap(),
            build: |c, q| Action::Upload {
                target: None,
                file_path: slot(c, "p", q),
            },
        },
        // --- Verify -----------------------------------------------------------------------
        Pattern {
            regex: Regex::new(r"(?i)^verify\s+(?P<s>.+?)\s+is\s+visible$").unwrap(),
            build: |c, q| Action::Verify { text: slot(c, "s", q) },
        },
        Pattern {
            regex: Regex::new(r"(?i)^verify\s+(?P<s>.+)$").unwrap(),
            build: |c, q| Action::Verify { text: slot(c, "s", q) },
        },
    ]
});

/// Parse one non-blank, non-comment line into an `Action`.
///
/// Never panics or returns an `Err` (P1, Parser totality): unrecognized
/// input becomes `Action::Unknown`.
pub fn parse_action(raw: &str) -> Action {
    let tokenized = tokenize(raw.trim());
    let residual = tokenized.residual.trim();
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.regex.captures(residual) {
            return (pattern.build)(&caps, &tokenized.quotes);
        }
    }
    Action::Unknown {
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fill_with_quotes() {
        let a = parse_action(r#"Type "Loudoun" into "County""#);
        assert_eq!(
            a,
            Action::Fill {
                target: "County".into(),
                value: "Loudoun".into()
            }
        );
    }

    #[test]
    fn parses_fill_with_unquoted_delimiters() {
        let a = parse_action("fill Username with password1");
        assert_eq!(
            a,
            Action::Fill {
                target: "Username".into(),
                value: "password1".into()
            }
        );
    }

    #[test]
    fn parses_textarea_variant() {
        let a = parse_action(
            r#"Type "Loudoun" into textarea "Please specify the names of the counties served.""#,
        );
        assert_eq!(
            a,
            Action::FillTextarea {
                target: "Please specify the names of the counties served.".into(),
                value: "Loudoun".into()
            }
        );
    }

    #[test]
    fn parses_click() {
        assert_eq!(
            parse_action(r#"Click "Recently Viewed""#),
            Action::Click {
                target: "Recently Viewed".into()
            }
        );
        assert_eq!(
            parse_action("click Recently Viewed"),
            Action::Click {
                target: "Recently Viewed".into()
            }
        );
    }

    #[test]
    fn parses_wait_integer_and_decimal() {
        assert_eq!(
            parse_action("Wait for 5 seconds"),
            Action::Wait { seconds: 5.0 }
        );
        assert_eq!(
            parse_action("wait for 1.5 seconds"),
            Action::Wait { seconds: 1.5 }
        );
    }

    #[test]
    fn parses_select() {
        assert_eq!(
            parse_action(r#"Select "Yes" from Dropdown "Changes to Target Population""#),
            Action::Select {
                target: "Changes to Target Population".into(),
                option: "Yes".into()
            }
        );
        assert_eq!(
            parse_action(r#"Select "Yes" from "Status""#),
            Action::Select {
                target: "Status".into(),
                option: "Yes".into()
            }
        );
    }

    #[test]
    fn parses_check_and_uncheck() {
        assert_eq!(
            parse_action(r#"Check "Terms""#),
            Action::Check {
                target: "Terms".into(),
                state: true
            }
        );
        assert_eq!(
            parse_action(r#"Uncheck "Terms""#),
            Action::Check {
                target: "Terms".into(),
                state: false
            }
        );
    }

    #[test]
    fn parses_upload_variants() {
        assert_eq!(
            parse_action(r#"Upload file "/tmp/a.pdf" to "Resume""#),
            Action::Upload {
                target: Some("Resume".into()),
                file_path: "/tmp/a.pdf".into()
            }
        );
        assert_eq!(
            parse_action(r#"Upload "/tmp/a.pdf" to "Resume""#),
            Action::Upload {
                target: Some("Resume".into()),
                file_path: "/tmp/a.pdf".into()
            }
        );
        assert_eq!(
            parse_action(r#"Upload "/tmp/a.pdf""#),
            Action::Upload {
                target: None,
                file_path: "/tmp/a.pdf".into()
            }
        );
    }

    #[test]
    fn parses_verify_variants() {
        assert_eq!(
            parse_action(r#"Verify "Welcome" is visible"#),
            Action::Verify {
                text: "Welcome".into()
            }
        );
        assert_eq!(
            parse_action(r#"Verify "Welcome""#),
            Action::Verify {
                text: "Welcome".into()
            }
        );
    }

    #[test]
    fn unrecognized_line_becomes_unknown() {
        let a = parse_action("frobnicate the whatsit");
        assert_eq!(
            a,
            Action::Unknown {
                raw: "frobnicate the whatsit".into()
            }
        );
    }

    #[test]
    fn placeholders_survive_parsing() {
        assert_eq!(
            parse_action(r#"Type "%Username%" into "Username""#),
            Action::Fill {
                target: "Username".into(),
                value: "%Username%".into()
            }
        );
    }

    #[test]
    fn totality_never_panics_on_arbitrary_input() {
        for line in ["", "   ", "\"", "''''", "click", "wait for abc seconds", "曲线"] {
            let _ = parse_action(line);
        }
    }
}
