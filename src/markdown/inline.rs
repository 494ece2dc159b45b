//! Spans within a single line.
//!
//! A recursive-descent scan: at each position try a code span, strong,
//! emphasis, strikethrough and link in that order, otherwise take one
//! character of text. Delimited spans parse their contents again, code
//! spans never do.

use super::escape_html;

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    Link { text: Vec<Inline>, href: String },
}

pub fn parse(input: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < input.len() {
        if let Some((node, consumed)) = parse_span(input, pos) {
            if !text.is_empty() {
                nodes.push(Inline::Text(std::mem::take(&mut text)));
            }
            nodes.push(node);
            pos += consumed;
            continue;
        }
        let Some(ch) = input[pos..].chars().next() else {
            break;
        };
        text.push(ch);
        pos += ch.len_utf8();
    }

    if !text.is_empty() {
        nodes.push(Inline::Text(text));
    }
    nodes
}

fn parse_span(input: &str, pos: usize) -> Option<(Inline, usize)> {
    let rest = &input[pos..];

    if rest.starts_with('`') {
        return code_span(rest);
    }
    if rest.starts_with("**") {
        if let Some((inner, consumed)) = delimited(rest, "**") {
            return Some((Inline::Strong(parse(inner)), consumed));
        }
    }
    if rest.starts_with("__") && opens_word(input, pos) {
        if let Some((inner, consumed)) = delimited(rest, "__") {
            return Some((Inline::Strong(parse(inner)), consumed));
        }
    }
    if rest.starts_with('*') {
        if let Some((inner, consumed)) = emphasis(rest, '*') {
            return Some((Inline::Emphasis(parse(inner)), consumed));
        }
    }
    if rest.starts_with('_') && opens_word(input, pos) {
        if let Some((inner, consumed)) = emphasis(rest, '_') {
            return Some((Inline::Emphasis(parse(inner)), consumed));
        }
    }
    if rest.starts_with("~~") {
        if let Some((inner, consumed)) = delimited(rest, "~~") {
            return Some((Inline::Strike(parse(inner)), consumed));
        }
    }
    if rest.starts_with('[') {
        return link(rest);
    }
    None
}

// Underscores in the middle of a word (snake_case) are plain text.
fn opens_word(input: &str, pos: usize) -> bool {
    input[..pos]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric())
}

/// Byte length of the code span `rest` opens, backticks included.
fn code_span_len(rest: &str) -> Option<usize> {
    let close = rest[1..].find('`')?;
    (close > 0).then_some(close + 2)
}

fn code_span(rest: &str) -> Option<(Inline, usize)> {
    let len = code_span_len(rest)?;
    Some((Inline::Code(rest[1..len - 1].to_string()), len))
}

/// First `delim` in `body` that is not inside a code span.
fn find_outside_code(body: &str, delim: &str) -> Option<usize> {
    let mut i = 0;
    while i < body.len() {
        let rest = &body[i..];
        if rest.starts_with(delim) {
            return Some(i);
        }
        if rest.starts_with('`') {
            if let Some(len) = code_span_len(rest) {
                i += len;
                continue;
            }
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Non-empty content between `delim` and the next `delim`.
fn delimited<'a>(rest: &'a str, delim: &str) -> Option<(&'a str, usize)> {
    let body = &rest[delim.len()..];
    let close = find_outside_code(body, delim)?;
    if close == 0 {
        return None;
    }
    Some((&body[..close], close + delim.len() * 2))
}

/// Single-character emphasis. Doubled markers inside the span belong
/// to a nested strong span and are skipped when looking for the close,
/// as are code spans.
fn emphasis(rest: &str, marker: char) -> Option<(&str, usize)> {
    let body = &rest[1..];
    let bytes = body.as_bytes();
    let m = marker as u8;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'`' {
            if let Some(len) = code_span_len(&body[i..]) {
                i += len;
                continue;
            }
        } else if bytes[i] == m {
            if bytes.get(i + 1) == Some(&m) {
                i += 2;
                continue;
            }
            if i == 0 {
                return None;
            }
            return Some((&body[..i], i + 2));
        }
        i += 1;
    }
    None
}

fn link(rest: &str) -> Option<(Inline, usize)> {
    let close_text = rest.find(']')?;
    if close_text <= 1 {
        return None;
    }
    let after = &rest[close_text + 1..];
    let url_body = after.strip_prefix('(')?;
    let close_url = url_body.find(')')?;
    if close_url == 0 {
        return None;
    }
    let node = Inline::Link {
        text: parse(&rest[1..close_text]),
        href: url_body[..close_url].to_string(),
    };
    Some((node, close_text + 2 + close_url + 1))
}

pub fn render(nodes: &[Inline], out: &mut String) {
    for node in nodes.iter() {
        match node {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Strong(children) => {
                out.push_str("<strong>");
                render(children, out);
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                render(children, out);
                out.push_str("</em>");
            }
            Inline::Strike(children) => {
                out.push_str("<del>");
                render(children, out);
                out.push_str("</del>");
            }
            Inline::Link { text, href } => {
                out.push_str(&format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                    escape_html(href)
                ));
                render(text, out);
                out.push_str("</a>");
            }
        }
    }
}
