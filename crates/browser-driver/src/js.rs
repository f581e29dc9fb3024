//! Small JS snippets injected via `Page::evaluate`.
//!
//! Candidate strings use the §4.2 dialect (`>>`-joined fragments with
//! `:has-text(...)`, or an `xpath=`-prefixed expression) which no native
//! browser API understands directly, so every query runs through this tiny
//! in-page resolver instead of `Page::find_element`. A matched element is
//! tagged with a `data-sr-ref` attribute so later calls (click, fill, ...)
//! can re-fetch the *live* node instead of holding a remote-object handle
//! that goes stale across re-renders.

const RESOLVER_PRELUDE: &str = r#"
function __srMatchesHasText(el, text) {
  return (el.textContent || '').includes(text);
}
function __srHasTextQuery(scopeEl, selector, text) {
  const base = selector ? Array.from(scopeEl.querySelectorAll(selector)) : [scopeEl];
  return base.find((el) => __srMatchesHasText(el, text)) || null;
}
function __srParseHasText(segment) {
  const m = segment.match(/^(.*):has-text\('((?:[^'\\]|\\.)*)'\)$/);
  if (!m) return null;
  return { selector: m[1], text: m[2].replace(/\\'/g, "'") };
}
function __srResolveSegment(scopeEl, segment) {
  segment = segment.trim();
  const hasText = __srParseHasText(segment);
  if (hasText) {
    return __srHasTextQuery(scopeEl, hasText.selector, hasText.text);
  }
  const textEq = segment.match(/^text='((?:[^'\\]|\\.)*)'$/);
  if (textEq) {
    const needle = textEq[1].replace(/\\'/g, "'");
    return __srHasTextQuery(scopeEl, '*', needle);
  }
  const textRe = segment.match(/^text=\/(.*)\/i$/);
  if (textRe) {
    const re = new RegExp(textRe[1], 'i');
    const all = Array.from(scopeEl.querySelectorAll('*'));
    return all.find((el) => re.test(el.textContent || '')) || null;
  }
  return scopeEl.querySelector(segment);
}
function __srResolveChain(chain) {
  const parts = chain.split(' >> ');
  let scope = document;
  let node = document.body;
  for (const part of parts) {
    node = __srResolveSegment(scope, part);
    if (!node) return null;
    scope = node;
  }
  return node;
}
function __srResolveXPath(expr) {
  const result = document.evaluate(expr, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
  return result.singleNodeValue;
}
function __srResolveCandidate(candidate) {
  if (candidate.startsWith('xpath=')) {
    return __srResolveXPath(candidate.slice('xpath='.length));
  }
  return __srResolveChain(candidate);
}
function __srTagAndReturnRef(node) {
  if (!node) return null;
  let ref = node.getAttribute('data-sr-ref');
  if (!ref) {
    ref = 'sr-' + Math.random().toString(36).slice(2) + Date.now().toString(36);
    node.setAttribute('data-sr-ref', ref);
  }
  return ref;
}
function __srByRef(ref) {
  return document.querySelector('[data-sr-ref="' + ref + '"]');
}
"#;

fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Resolve `candidate` and return the matched element's `data-sr-ref`, or
/// `null` if nothing matched.
pub fn resolve_candidate(candidate: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\n__srTagAndReturnRef(__srResolveCandidate({}));",
        string_literal(candidate)
    )
}

pub fn ref_exists(ref_id: &str) -> String {
    format!("{RESOLVER_PRELUDE}\n!!__srByRef({});", string_literal(ref_id))
}

pub fn click_standard(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); if (el) {{ el.scrollIntoView({{block:'center'}}); el.click(); }} !!el;",
        string_literal(ref_id)
    )
}

pub fn click_scripted(ref_id: &str) -> String {
    // Same as standard but via HTMLElement.prototype.click, bypassing any
    // overridden onclick handlers that intercept synthetic events.
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); if (el) {{ HTMLElement.prototype.click.call(el); }} !!el;",
        string_literal(ref_id)
    )
}

pub fn click_force(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  const r = el.getBoundingClientRect();\n  const x = r.left + r.width / 2, y = r.top + r.height / 2;\n  ['mousedown','mouseup','click'].forEach((type) => {{\n    el.dispatchEvent(new MouseEvent(type, {{bubbles: true, cancelable: true, clientX: x, clientY: y}}));\n  }});\n}}\n!!el;",
        string_literal(ref_id)
    )
}

pub fn click_synthesized_mouse_event(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  el.dispatchEvent(new PointerEvent('pointerdown', {{bubbles: true}}));\n  el.dispatchEvent(new PointerEvent('pointerup', {{bubbles: true}}));\n  el.dispatchEvent(new MouseEvent('click', {{bubbles: true, cancelable: true}}));\n}}\n!!el;",
        string_literal(ref_id)
    )
}

pub fn is_disabled_or_readonly(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); el ? (el.disabled === true || el.readOnly === true) : false;",
        string_literal(ref_id)
    )
}

pub fn clear_disabled_readonly(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); if (el) {{ el.removeAttribute('disabled'); el.removeAttribute('readonly'); }} !!el;",
        string_literal(ref_id)
    )
}

pub fn fill_native(ref_id: &str, value: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{ el.focus(); el.value = ''; el.value = {}; el.dispatchEvent(new Event('input', {{bubbles: true}})); el.dispatchEvent(new Event('change', {{bubbles: true}})); }}\n!!el;",
        string_literal(ref_id),
        string_literal(value)
    )
}

pub fn fill_keystroke(ref_id: &str, value: &str) -> String {
    // Keystroke-by-keystroke typing via `beforeinput`/`input`, simulating a
    // focus + select-all + backspace + type sequence (§4.5).
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  el.focus();\n  if (typeof el.select === 'function') {{ el.select(); }}\n  el.value = '';\n  const text = {};\n  for (const ch of text) {{\n    el.value += ch;\n    el.dispatchEvent(new InputEvent('input', {{bubbles: true, data: ch}}));\n  }}\n  el.dispatchEvent(new Event('change', {{bubbles: true}}));\n}}\n!!el;",
        string_literal(ref_id),
        string_literal(value)
    )
}

pub fn fill_scripted_dispatch(ref_id: &str, value: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  const proto = el.tagName === 'TEXTAREA' ? window.HTMLTextAreaElement.prototype : window.HTMLInputElement.prototype;\n  const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;\n  setter.call(el, {});\n  el.dispatchEvent(new Event('input', {{bubbles: true}}));\n  el.dispatchEvent(new Event('change', {{bubbles: true}}));\n  el.dispatchEvent(new Event('blur', {{bubbles: true}}));\n  el.dispatchEvent(new CustomEvent('valuechange', {{bubbles: true, detail: {}}}));\n}}\n!!el;",
        string_literal(ref_id),
        string_literal(value),
        string_literal(value)
    )
}

pub fn read_value(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); el ? (el.value || '') : '';",
        string_literal(ref_id)
    )
}

pub fn is_native_select(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); el ? el.tagName === 'SELECT' : false;",
        string_literal(ref_id)
    )
}

pub fn select_native_value(ref_id: &str, option_text: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  const opt = Array.from(el.options).find((o) => o.textContent.trim() === {} );\n  if (opt) {{ el.value = opt.value; el.dispatchEvent(new Event('change', {{bubbles: true}})); }}\n}}\n!!el;",
        string_literal(ref_id),
        string_literal(option_text)
    )
}

pub fn is_checked(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({}); el ? el.checked === true : false;",
        string_literal(ref_id)
    )
}

pub fn click_associated_label(ref_id: &str) -> String {
    format!(
        "{RESOLVER_PRELUDE}\nconst el = __srByRef({});\nif (el) {{\n  const label = el.id ? document.querySelector('label[for=\"' + el.id + '\"]') : el.closest('label');\n  (label || el).click();\n}}\n!!el;",
        string_literal(ref_id)
    )
}

pub fn text_present(text: &str) -> String {
    format!(
        "(function() {{ const needle = {}; return (document.body.innerText || '').includes(needle); }})();",
        string_literal(text)
    )
}

pub fn dom_snapshot() -> &'static str {
    "document.documentElement.outerHTML;"
}

pub fn page_fingerprint() -> &'static str {
    "(location.href + '#' + (document.title || '') + '#' + (document.body ? document.body.children.length : 0));"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_quotes() {
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn snippets_embed_the_candidate_as_a_json_string() {
        let js = resolve_candidate("button:has-text('Submit')");
        assert!(js.contains("has-text('Submit')"));
    }
}
