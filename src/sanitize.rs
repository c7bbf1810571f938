// src/sanitize.rs
//! Markup sanitization profiles.
//!
//! Two pure string-to-string profiles, both safe on adversarial or
//! malformed input:
//!
//! - **HTML fragment**: [`sanitize_html`] parses the fragment with the HTML5
//!   parser and rebuilds the markup, dropping `<script>` and `<style>`
//!   elements (content included), comments, and every `on*` event-handler
//!   attribute.
//! - **SVG**: [`sanitize_svg`] applies pattern-based stripping of the same
//!   vectors plus the XML declaration and doctype prologue. SVG stays on the
//!   pattern path because the HTML5 fragment parser rewrites self-closing
//!   SVG elements.
//!
//! The rule set is defensive-default: when in doubt it strips. The pattern
//! profile is best-effort and can be bypassed by sufficiently malformed
//! nesting; it is the documented baseline, not a complete XSS defense. The
//! tree-based profile is the primary boundary for live HTML.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

/// Elements whose entire subtree is removed, content included.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// HTML void elements, emitted without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Closed `<script>` blocks, content included.
static SCRIPT_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script[^>]*>").expect("valid regex"));

/// Closed `<style>` blocks, content included.
static STYLE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style[^>]*>").expect("valid regex"));

/// Stray or unclosed `<script>`/`<style>` tags left after block removal.
static STRAY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(script|style)\b[^>]*>").expect("valid regex"));

/// `on*` event-handler attributes: double-quoted, single-quoted or unquoted.
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
});

/// XML declaration prologue, e.g. `<?xml version="1.0"?>`.
static XML_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<\?xml.*?\?>").expect("valid regex"));

/// Doctype prologue, e.g. `<!DOCTYPE svg ...>`.
static DOCTYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!doctype[^>]*>").expect("valid regex"));

/// Sanitize an HTML fragment (tree-based profile).
///
/// Parses the input, walks the tree and re-serializes it, dropping script
/// and style subtrees, comments and event-handler attributes. Text and
/// attribute values are re-escaped on output, so the result is stable under
/// repeated sanitization.
///
/// Never fails; empty or whitespace-only input yields an empty string.
#[must_use]
pub fn sanitize_html(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::new();
    write_children(fragment.root_element(), &mut out);
    out
}

/// Sanitize an SVG document (pattern profile).
///
/// Applies the script/style/event-handler stripping rules and additionally
/// removes any XML declaration and doctype prologue, since the result is
/// expected to be embedded as an isolated image resource (for example as a
/// data URL) rather than inlined as live DOM.
#[must_use]
pub fn sanitize_svg(input: &str) -> String {
    // Stripping can splice adjacent text into a new match (e.g. a style
    // block separating the halves of a script tag), so the pass repeats
    // until it reaches a fixpoint. Each pass only deletes, so it
    // terminates.
    let mut clean = input.to_string();
    loop {
        let next = svg_pass(&clean);
        if next == clean {
            break;
        }
        clean = next;
    }
    clean.trim().to_string()
}

/// One application of the SVG stripping rules.
fn svg_pass(input: &str) -> String {
    let without_prologue = DOCTYPE_RE.replace_all(input, "");
    let without_prologue = XML_DECL_RE.replace_all(&without_prologue, "");
    let without_scripts = SCRIPT_BLOCK_RE.replace_all(&without_prologue, "");
    let without_blocks = STYLE_BLOCK_RE.replace_all(&without_scripts, "");
    let without_tags = STRAY_TAG_RE.replace_all(&without_blocks, "");
    EVENT_ATTR_RE.replace_all(&without_tags, "").into_owned()
}

/// Sanitize a single parsed element in place, without re-parsing. Used by
/// the decomposer when it already holds a tree node.
pub(crate) fn sanitize_element(element: ElementRef) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

/// Escape a bare text run the same way the tree serializer does.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::new();
    push_escaped_text(text, &mut out);
    out
}

/// Escape a value for use inside a double-quoted attribute, the same way
/// the tree serializer does.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::new();
    push_escaped_attr(value, &mut out);
    out
}

/// Serialize the sanitized children of `element` into `out`.
fn write_children(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_escaped_text(text, out);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            write_element(child_element, out);
        }
        // Comments, doctypes and processing instructions are dropped.
    }
}

/// Serialize one sanitized element into `out`.
fn write_element(element: ElementRef, out: &mut String) {
    let name = element.value().name();

    if STRIPPED_ELEMENTS.contains(&name) {
        log::debug!("sanitizer dropped <{name}> element");
        return;
    }

    out.push('<');
    out.push_str(name);

    for (attr, value) in element.value().attrs() {
        if is_event_handler(attr) {
            log::debug!("sanitizer dropped {attr} attribute on <{name}>");
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped_attr(value, out);
        out.push('"');
    }

    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// True for `on`-prefixed attribute names such as `onclick` or `ONLOAD`.
fn is_event_handler(attr: &str) -> bool {
    attr.len() > 2 && attr[..2].eq_ignore_ascii_case("on")
}

fn push_escaped_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_block_stripped() {
        let clean = sanitize_html("<p>hi</p><script>alert(1)</script>");
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("alert"));
        assert!(clean.contains("<p>hi</p>"));
    }

    #[test]
    fn test_style_block_stripped() {
        let clean = sanitize_html("<style>p { color: red }</style><p>x</p>");
        assert!(!clean.contains("<style"));
        assert!(!clean.contains("color"));
        assert!(clean.contains("<p>x</p>"));
    }

    #[test]
    fn test_event_handler_stripped() {
        let clean = sanitize_html("<div onclick=\"evil()\">x</div>");
        assert!(!clean.to_lowercase().contains("onclick"));
        assert_eq!(clean, "<div>x</div>");
    }

    #[test]
    fn test_event_handler_case_insensitive() {
        let clean = sanitize_html("<div ONCLICK='evil()' onMouseOver=evil>x</div>");
        assert!(!clean.to_lowercase().contains("onclick"));
        assert!(!clean.to_lowercase().contains("onmouseover"));
        assert!(clean.contains('x'));
    }

    #[test]
    fn test_benign_attributes_kept() {
        let clean = sanitize_html("<a href=\"https://example.com\" title=\"once\">link</a>");
        assert!(clean.contains("href=\"https://example.com\""));
        assert!(clean.contains("title=\"once\""));
        // "once" starts with "on" only inside the value, never a handler
        assert!(clean.contains(">link</a>"));
    }

    #[test]
    fn test_comments_dropped() {
        let clean = sanitize_html("<p>a</p><!-- secret --><p>b</p>");
        assert_eq!(clean, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_void_elements_not_closed() {
        let clean = sanitize_html("<p>line<br>break</p><img src=\"pic.png\" alt=\"p\">");
        assert!(clean.contains("<br>"));
        assert!(!clean.contains("</br>"));
        assert!(clean.contains("<img src=\"pic.png\" alt=\"p\">"));
        assert!(!clean.contains("</img>"));
    }

    #[test]
    fn test_text_escaping_stable() {
        let clean = sanitize_html("<p>a &amp; b &lt; c</p>");
        assert_eq!(clean, "<p>a &amp; b &lt; c</p>");
    }

    #[test]
    fn test_html_idempotent() {
        let inputs = [
            "<p>hi</p><script>alert(1)</script>",
            "<div onclick=\"evil()\"><b>x</b> & y</div>",
            "<ul><li>one</li><li>two</li></ul>",
            "plain text with < angle",
            "<table><tr><td>a</td></tr></table>",
        ];
        for input in inputs {
            let once = sanitize_html(input);
            let twice = sanitize_html(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_html(""), "");
        assert_eq!(sanitize_html("   \n\t"), "");
    }

    #[test]
    fn test_never_panics_on_malformed_input() {
        for input in [
            "<p><div></p></div>",
            "<<<>>>",
            "<script><script></script>",
            "<a href='unterminated",
            "\u{0}\u{fffd}<p>",
        ] {
            let _ = sanitize_html(input);
            let _ = sanitize_svg(input);
        }
    }

    #[test]
    fn test_svg_prologue_stripped() {
        let svg = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"svg11.dtd\">\n<svg xmlns=\"http://www.w3.org/2000/svg\"><circle r=\"5\"/></svg>";
        let clean = sanitize_svg(svg);
        assert!(!clean.contains("<?xml"));
        assert!(!clean.to_lowercase().contains("doctype"));
        assert!(clean.starts_with("<svg"));
        assert!(clean.contains("<circle r=\"5\"/>"));
    }

    #[test]
    fn test_svg_script_and_handlers_stripped() {
        let svg = "<svg onload=\"evil()\"><script>steal()</script><rect width=\"4\"/></svg>";
        let clean = sanitize_svg(svg);
        assert!(!clean.to_lowercase().contains("onload"));
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("steal"));
        assert!(clean.contains("<rect width=\"4\"/>"));
    }

    #[test]
    fn test_svg_unclosed_script_tag_stripped() {
        let clean = sanitize_svg("<svg><script src=\"x.js\"><rect/></svg>");
        assert!(!clean.contains("<script"));
        assert!(clean.contains("<rect/>"));
    }

    #[test]
    fn test_svg_idempotent() {
        let svg = "<?xml version=\"1.0\"?><svg onclick='x'><style>.a{}</style><text>hi</text></svg>";
        let once = sanitize_svg(svg);
        let twice = sanitize_svg(&once);
        assert_eq!(once, twice);
        assert!(once.contains("<text>hi</text>"));
    }
}
