//! Pruning the page snapshot down to what fits the model's context budget
//! (spec.md §4.4): "the full DOM is pruned to elements whose text or
//! attributes mention `T` and their ancestors up to a configured depth".
//!
//! This is a small hand-rolled tree walk rather than a full HTML parser —
//! good enough for the well-formed serialized-DOM snapshots the browser
//! driver produces, not meant as a general-purpose HTML sanitizer.

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug)]
enum Node {
    Element {
        open_tag: String,
        tag_name: String,
        close_tag: Option<String>,
        children: Vec<Node>,
    },
    Text(String),
}

fn push_child(stack: &mut [(String, String, Vec<Node>)], roots: &mut Vec<Node>, node: Node) {
    if let Some(top) = stack.last_mut() {
        top.2.push(node);
    } else {
        roots.push(node);
    }
}

fn parse(html: &str) -> Vec<Node> {
    let mut stack: Vec<(String, String, Vec<Node>)> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut chars = html.char_indices().peekable();
    let bytes = html.as_bytes();

    while let Some((i, c)) = chars.next() {
        if c == '<' {
            let Some(end) = html[i..].find('>') else {
                break;
            };
            let tag_raw = &html[i..i + end + 1];
            for _ in 0..tag_raw[1..].chars().count() {
                chars.next();
            }

            if let Some(name) = tag_raw.strip_prefix("</") {
                let name = name.trim_end_matches('>').trim().to_lowercase();
                if let Some(pos) = stack.iter().rposition(|(n, _, _)| *n == name) {
                    while stack.len() > pos {
                        let (tag_name, open_tag, children) = stack.pop().unwrap();
                        let node = Node::Element {
                            open_tag,
                            tag_name,
                            close_tag: Some(tag_raw.to_string()),
                            children,
                        };
                        if let Some(top) = stack.last_mut() {
                            top.2.push(node);
                        } else {
                            roots.push(node);
                        }
                    }
                }
                continue;
            }

            if tag_raw.starts_with("<!") {
                continue;
            }

            let self_closing = tag_raw.ends_with("/>");
            let name_end = tag_raw[1..]
                .find(|ch: char| ch.is_whitespace() || ch == '/' || ch == '>')
                .map(|p| p + 1)
                .unwrap_or(tag_raw.len() - 1);
            let tag_name = tag_raw[1..name_end].to_lowercase();

            if self_closing || VOID_ELEMENTS.contains(&tag_name.as_str()) {
                push_child(
                    &mut stack,
                    &mut roots,
                    Node::Element {
                        open_tag: tag_raw.to_string(),
                        tag_name,
                        close_tag: None,
                        children: Vec::new(),
                    },
                );
            } else {
                stack.push((tag_name, tag_raw.to_string(), Vec::new()));
            }
        } else {
            let start = i;
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if next == '<' {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            let text = &bytes[start..end];
            let text = std::str::from_utf8(text).unwrap_or_default();
            if !text.trim().is_empty() {
                push_child(&mut stack, &mut roots, Node::Text(text.to_string()));
            }
        }
    }

    // Any still-open tags at EOF are flushed without a matching close tag.
    while let Some((tag_name, open_tag, children)) = stack.pop() {
        let node = Node::Element {
            open_tag,
            tag_name,
            close_tag: None,
            children,
        };
        if let Some(top) = stack.last_mut() {
            top.2.push(node);
        } else {
            roots.push(node);
        }
    }

    roots
}

fn node_mentions(node: &Node, needle: &str) -> bool {
    match node {
        Node::Text(t) => t.to_lowercase().contains(needle),
        Node::Element { open_tag, .. } => open_tag.to_lowercase().contains(needle),
    }
}

fn subtree_mentions(node: &Node, needle: &str) -> bool {
    if node_mentions(node, needle) {
        return true;
    }
    if let Node::Element { children, .. } = node {
        children.iter().any(|c| subtree_mentions(c, needle))
    } else {
        false
    }
}

/// Render `node`, keeping only the branches whose subtree mentions `needle`.
/// Stops climbing past `depth` ancestor levels above a true match by simply
/// not recursing once `depth` reaches zero and nothing matched locally.
fn render_pruned(node: &Node, needle: &str, depth: usize, out: &mut String) {
    match node {
        Node::Text(t) => {
            if t.to_lowercase().contains(needle) {
                out.push_str(t.trim());
                out.push(' ');
            }
        }
        Node::Element {
            open_tag,
            close_tag,
            children,
            ..
        } => {
            if !subtree_mentions(node, needle) {
                return;
            }
            out.push_str(open_tag);
            if depth == 0 {
                out.push_str("...");
            } else {
                for child in children {
                    render_pruned(child, needle, depth - 1, out);
                }
            }
            if let Some(close) = close_tag {
                out.push_str(close);
            }
        }
    }
}

/// Prune `html` to the elements whose text or attributes mention `target`
/// (case-insensitive), plus up to `max_depth` levels of their ancestors,
/// then hard-cap the result to `max_len` bytes. Falls back to a plain
/// truncation if nothing in the document mentions `target`, so the AI
/// adapter still receives *something* to reason about.
pub fn prune_snapshot(html: &str, target: &str, max_depth: usize, max_len: usize) -> String {
    let needle = target.to_lowercase();
    let roots = parse(html);

    let mut out = String::new();
    for root in &roots {
        render_pruned(root, &needle, max_depth, &mut out);
    }

    if out.trim().is_empty() {
        out = html.chars().take(max_len).collect();
    } else if out.len() > max_len {
        out.truncate(max_len);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_elements_mentioning_target() {
        let html = "<div><button>Submit</button><button>Cancel</button></div>";
        let pruned = prune_snapshot(html, "Submit", 3, 10_000);
        assert!(pruned.contains("Submit"));
        assert!(!pruned.contains("Cancel"));
    }

    #[test]
    fn keeps_ancestor_chain_up_to_depth() {
        let html = "<section><div class=\"card\"><span>Recently Viewed</span></div></section>";
        let pruned = prune_snapshot(html, "Recently Viewed", 2, 10_000);
        assert!(pruned.contains("section"));
        assert!(pruned.contains("card"));
        assert!(pruned.contains("Recently Viewed"));
    }

    #[test]
    fn falls_back_to_truncation_when_no_match() {
        let html = "<div><span>Nothing relevant here</span></div>";
        let pruned = prune_snapshot(html, "Submit", 2, 8);
        assert_eq!(pruned.len(), 8);
    }

    #[test]
    fn respects_max_len_hard_cap() {
        let html = format!("<div>{}</div>", "Submit ".repeat(5000));
        let pruned = prune_snapshot(&html, "Submit", 5, 200);
        assert!(pruned.len() <= 200);
    }
}
