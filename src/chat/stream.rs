//! Decoding of the `/chat` response body.
//!
//! The body is newline-delimited JSON, one record per line, each tagged
//! with a `type`:
//!
//! ```text
//! {"type": "content", "data": "Hel"}
//! {"type": "content", "data": "lo"}
//! {"type": "chat_id", "data": "6f1c..."}
//! ```
//!
//! Chunk boundaries from the transport don't line up with lines (or
//! with UTF-8 characters), so bytes are buffered until a newline
//! arrives. A bad line is reported as [`Decoded::Malformed`] and the
//! stream carries on.

use anyhow::{Error, Result, anyhow};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    /// A fragment of the bot's reply
    Content(String),
    /// The id of the session the exchange was stored in
    ChatId(String),
    /// A record type this client doesn't know about
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Record(StreamRecord),
    Malformed { line: String, reason: String },
}

#[derive(Deserialize)]
struct RawRecord {
    r#type: String,
    #[serde(default)]
    data: Value,
}

pub fn parse_record(line: &str) -> Result<StreamRecord, Error> {
    let raw: RawRecord = serde_json::from_str(line)?;
    match raw.r#type.as_str() {
        "content" => {
            let text = raw
                .data
                .as_str()
                .ok_or_else(|| anyhow!("Content record without text data"))?;
            Ok(StreamRecord::Content(text.to_string()))
        }
        "chat_id" => match raw.data {
            Value::String(id) if !id.is_empty() => Ok(StreamRecord::ChatId(id)),
            Value::Number(n) => Ok(StreamRecord::ChatId(n.to_string())),
            other => Err(anyhow!("Chat id record with invalid data: {}", other)),
        },
        other => Ok(StreamRecord::Other(other.to_string())),
    }
}

/// Splits a byte stream into lines, holding on to a trailing partial
/// line until the rest of it arrives.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk and return every line it completed, without the
    /// newline.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=end).collect();
            line.pop();
            lines.push(line);
        }
        lines
    }

    /// The unterminated last line, if any bytes are left.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

/// Decode one line. Blank lines are skipped.
pub fn decode_line(line: &[u8]) -> Option<Decoded> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Decoded::Malformed {
                line: String::from_utf8_lossy(line).into_owned(),
                reason: e.to_string(),
            });
        }
    };
    if text.is_empty() {
        return None;
    }
    match parse_record(text) {
        Ok(record) => Some(Decoded::Record(record)),
        Err(e) => Some(Decoded::Malformed {
            line: text.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Turn a stream of byte chunks into a stream of decoded lines in
/// arrival order. A transport error is yielded once and ends the
/// stream.
pub fn decode<S, B, E>(chunks: S) -> impl Stream<Item = Result<Decoded, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut decoder = LineDecoder::new();
        let mut failed = false;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in decoder.push(bytes.as_ref()) {
                        if let Some(decoded) = decode_line(&line) {
                            yield Ok(decoded);
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            if let Some(line) = decoder.finish() {
                if let Some(decoded) = decode_line(&line) {
                    yield Ok(decoded);
                }
            }
        }
    }
}
