//! HTML for the chat page, as a pure function of the controller's
//! state.

use anyhow::{Error, Result};
use chrono::{DateTime, NaiveDateTime};
use serde_json::json;

use super::models::{ClientState, Transcript};
use crate::core::templates::{Template, templates};

/// Calendar date of a session's `created_at`, or the raw value when it
/// isn't a timestamp this client understands.
pub fn session_date(created_at: &str) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(created_at) {
        return dt.format("%Y-%m-%d").to_string();
    }
    created_at.to_string()
}

pub fn render_transcript(transcript: &Transcript, loading: bool) -> Result<String, Error> {
    let messages: Vec<_> = transcript
        .iter()
        .map(|msg| {
            json!({
                "sender": msg.sender.as_str(),
                "is_error": msg.is_error,
                "html": msg.html,
                "time": msg.timestamp.format("%H:%M").to_string(),
            })
        })
        .collect();

    let html = templates().render(
        &Template::Transcript.to_string(),
        &json!({"messages": messages, "loading": loading}),
    )?;
    Ok(html)
}

pub fn render_sidebar(state: &ClientState) -> Result<String, Error> {
    let sessions: Vec<_> = state
        .sessions
        .iter()
        .map(|session| {
            json!({
                "id": session.id,
                "title": session.title,
                "date": session_date(&session.created_at),
                "active": state.is_current(&session.id),
                "editing": state.editing.as_deref() == Some(session.id.as_str()),
            })
        })
        .collect();

    let html = templates().render(&Template::Sidebar.to_string(), &json!({"sessions": sessions}))?;
    Ok(html)
}
