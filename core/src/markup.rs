//! Plain-text rendering of the doc-string markup subset.
//!
//! Descriptor and record doc strings may carry a small HTML-like markup
//! subset. [`render_doc`] converts it to plain text with a single
//! left-to-right tolerant scan: malformed or mismatched tags degrade
//! gracefully instead of failing, mirroring the line-oriented way usage text
//! is consumed. [`render_summary`] is the lighter variant for one-line
//! summaries: it decodes character references and the paragraph marker only.
//!
//! Neither function validates its output; callers that emit usage text run
//! [`assert_plain_ascii`] on the rendered result, which treats non-ASCII
//! content or an unresolvable character reference as a fatal authoring error.
//!
//! # Examples
//!
//! ```
//! use optbind_core::markup::render_doc;
//!
//! assert_eq!(render_doc("hi</th>bye"), "hi\tbye");
//! assert_eq!(render_doc("hi<li>bye"), "hi - bye");
//! assert_eq!(
//!     render_doc(r#"<a href="https://example.org"> notes</ a >"#),
//!     " notes (https://example.org)"
//! );
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']*)["']"#).expect("href pattern"));

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z]+);").expect("entity pattern"));

/// Converts the full markup subset into plain text.
///
/// Paragraph breaks, line breaks, headings, preformatted-block delimiters,
/// list delimiters, and horizontal rules become newlines; list items gain a
/// `" - "` prefix; table-header closes become tabs; anchors become their
/// inner text followed by `" (address)"`; unrecognized tags are removed; and
/// named character references are decoded last.
pub fn render_doc(markup: &str) -> String {
    let mut out = String::new();
    let mut pending_anchor: Option<String> = None;
    let mut rest = markup;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) => {
                apply_tag(&after[..close], &mut out, &mut pending_anchor);
                rest = &after[close + 1..];
            }
            None => {
                // Unterminated tag: keep the text untouched.
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    decode_entities(&out)
}

/// Converts the one-line-summary subset: character references plus the
/// paragraph-break marker. Every other tag passes through untouched.
pub fn render_summary(markup: &str) -> String {
    decode_entities(&markup.replace("<p>", "\n"))
}

/// Asserts that rendered usage text is printable ASCII.
///
/// # Panics
///
/// Panics when `text` contains an unresolved `&name;` character reference or
/// any character outside printable ASCII plus newline and tab. Both can only
/// originate from the record's own static doc text, so this is an authoring
/// mistake, not a user-input error.
pub fn assert_plain_ascii(context: &str, text: &str) {
    if let Some(reference) = ENTITY.find(text) {
        panic!(
            "unresolvable character reference {} in {context}",
            reference.as_str()
        );
    }
    if let Some(c) = text
        .chars()
        .find(|&c| c != '\n' && c != '\t' && !(' '..='~').contains(&c))
    {
        panic!("non-ASCII character {c:?} in {context}");
    }
}

/// Applies one tag's textual effect. `body` is the text between the angle
/// brackets; stray whitespace inside the delimiters is tolerated.
fn apply_tag(body: &str, out: &mut String, pending_anchor: &mut Option<String>) {
    let trimmed = body.trim();
    let (is_close, inner) = match trimmed.strip_prefix('/') {
        Some(inner) => (true, inner.trim_start()),
        None => (false, trimmed),
    };
    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/').trim_end();
    let name: String = inner
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();

    if is_close {
        match name.as_str() {
            "th" => out.push('\t'),
            "li" | "p" | "br" | "hr" | "pre" | "ul" | "h1" | "h2" | "h3" | "h4" => out.push('\n'),
            "a" => close_anchor(out, pending_anchor),
            _ => {}
        }
    } else {
        match name.as_str() {
            "li" => out.push_str(" - "),
            "p" | "br" | "hr" | "pre" | "ul" | "h1" | "h2" | "h3" | "h4" => out.push('\n'),
            "a" => {
                if self_closing {
                    close_anchor(out, pending_anchor);
                } else if let Some(caps) = HREF.captures(inner) {
                    *pending_anchor = Some(caps[1].to_string());
                }
                // An anchor without an address is simply removed.
            }
            _ => {}
        }
    }
}

fn close_anchor(out: &mut String, pending_anchor: &mut Option<String>) {
    if let Some(address) = pending_anchor.take() {
        out.push_str(" (");
        out.push_str(&address);
        out.push(')');
    }
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| match &caps[1] {
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "amp" => "&".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            // Left in place for assert_plain_ascii to flag.
            _ => caps[0].to_string(),
        })
        .into_owned()
}
