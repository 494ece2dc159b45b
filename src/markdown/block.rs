//! Block level structure: fenced code, headings, list runs, quotes and
//! the line breaks between them.
//!
//! Fences are split out of the text first so their contents are never
//! looked at again. What remains is classified line by line. A newline
//! in the source becomes a [`Node::Break`] except between two items of
//! the same list.

use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;
use super::inline::{self, Inline};

const FENCE: &str = "```";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3}) (.*)$").expect("Invalid heading pattern"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*+-] (.+)$").expect("Invalid list item pattern"));
static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^> (.+)$").expect("Invalid blockquote pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Code { lang: String, code: String },
    Heading { level: usize, content: Vec<Inline> },
    List(Vec<Vec<Inline>>),
    Quote(Vec<Inline>),
    Line(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Block),
    Break,
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Fence { lang: &'a str, code: &'a str },
}

/// Split `text` on code fences. The language tag is the run of ASCII
/// letters right after the opening fence, followed by at most one
/// newline. A fence that never closes runs to the end of the text.
fn split_fences(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        let after = &rest[open + FENCE.len()..];
        let lang_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        let lang = &after[..lang_len];
        let body = &after[lang_len..];
        let body = body.strip_prefix('\n').unwrap_or(body);

        match body.find(FENCE) {
            Some(close) => {
                segments.push(Segment::Fence {
                    lang,
                    code: &body[..close],
                });
                rest = &body[close + FENCE.len()..];
            }
            None => {
                segments.push(Segment::Fence { lang, code: body });
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

fn classify(line: &str) -> Block {
    if let Some(caps) = HEADING.captures(line) {
        return Block::Heading {
            level: caps[1].len(),
            content: inline::parse(&caps[2]),
        };
    }
    if let Some(caps) = LIST_ITEM.captures(line) {
        return Block::List(vec![inline::parse(&caps[1])]);
    }
    if let Some(caps) = QUOTE.captures(line) {
        return Block::Quote(inline::parse(&caps[1]));
    }
    Block::Line(inline::parse(line))
}

/// Append the nodes for a text segment. The first line only counts as
/// the start of a line when the segment starts the document; text that
/// directly follows a closing fence does not.
fn parse_lines(text: &str, at_line_start: bool, nodes: &mut Vec<Node>) {
    for (n, line) in text.split('\n').enumerate() {
        if n > 0 {
            nodes.push(Node::Break);
        }
        let block = if n > 0 || at_line_start {
            classify(line)
        } else {
            Block::Line(inline::parse(line))
        };
        push_block(nodes, block);
    }
}

/// Push a block, folding a single list item into the list right before
/// it when only a line break separates them.
fn push_block(nodes: &mut Vec<Node>, block: Block) {
    if let Block::List(items) = block {
        if let [.., Node::Block(Block::List(_)), Node::Break] = nodes.as_slice() {
            nodes.pop();
            if let Some(Node::Block(Block::List(run))) = nodes.last_mut() {
                run.extend(items);
                return;
            }
        }
        nodes.push(Node::Block(Block::List(items)));
        return;
    }
    nodes.push(Node::Block(block));
}

pub fn parse(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (i, segment) in split_fences(text).into_iter().enumerate() {
        match segment {
            Segment::Text(t) => parse_lines(t, i == 0, &mut nodes),
            Segment::Fence { lang, code } => {
                let lang = if lang.is_empty() {
                    String::from("text")
                } else {
                    lang.to_lowercase()
                };
                nodes.push(Node::Block(Block::Code {
                    lang,
                    code: code.trim().to_string(),
                }));
            }
        }
    }
    nodes
}

pub fn render(node: &Node, out: &mut String) {
    match node {
        Node::Break => out.push_str("<br>"),
        Node::Block(Block::Code { lang, code }) => {
            out.push_str(&format!(
                r#"<div class="code-block-container" data-lang="{lang}"><div class="code-block-header"><span class="code-block-language">{lang}</span><button class="copy-code-btn">Copy</button></div><pre><code class="language-{lang}">{code}</code></pre></div>"#,
                lang = lang,
                code = escape_html(code),
            ));
        }
        Node::Block(Block::Heading { level, content }) => {
            out.push_str(&format!("<h{}>", level));
            inline::render(content, out);
            out.push_str(&format!("</h{}>", level));
        }
        Node::Block(Block::List(items)) => {
            out.push_str("<ul>");
            for item in items.iter() {
                out.push_str("<li>");
                inline::render(item, out);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        Node::Block(Block::Quote(content)) => {
            out.push_str("<blockquote>");
            inline::render(content, out);
            out.push_str("</blockquote>");
        }
        Node::Block(Block::Line(content)) => inline::render(content, out),
    }
}
