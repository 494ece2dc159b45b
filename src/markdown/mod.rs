//! Renders the small markdown dialect used by bot replies into HTML.
//!
//! Rendering is a pure function of the input text. Streamed replies are
//! re-rendered from the full accumulated text after every fragment, so
//! partial input (an unterminated code fence, a dangling `**`) has to
//! produce balanced HTML on its own.
//!
//! Block structure (fences, headings, lists, quotes, line breaks) is
//! handled in [`block`], spans inside a line in [`inline`].

pub mod block;
pub mod inline;

/// Render markdown `text` to an HTML fragment.
pub fn render(text: &str) -> String {
    let nodes = block::parse(text);
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    for node in nodes.iter() {
        block::render(node, &mut out);
    }
    out
}

/// Escape text for use in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
