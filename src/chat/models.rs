//! The client-side models for a chat page: the transcript being shown
//! and the state that gates what the user can do next.

use chrono::{DateTime, Local};

use crate::api::public::{ChatSession, Role};
use crate::markdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl From<&Role> for Sender {
    fn from(role: &Role) -> Self {
        match role {
            Role::User => Sender::User,
            Role::Bot => Sender::Bot,
        }
    }
}

/// One entry in the transcript. `content` is the raw source and `html`
/// what gets shown for it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub html: String,
    pub is_error: bool,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(sender: Sender, content: &str) -> Self {
        Self {
            sender,
            content: content.to_string(),
            html: markdown::render(content),
            is_error: false,
            timestamp: Local::now(),
        }
    }

    /// Errors are shown as plain text, never as markdown.
    pub fn error(content: &str) -> Self {
        Self {
            sender: Sender::Bot,
            content: content.to_string(),
            html: markdown::escape_html(content),
            is_error: true,
            timestamp: Local::now(),
        }
    }

    /// A bot message with prepared HTML, e.g. a generated image.
    pub fn with_html(content: &str, html: String) -> Self {
        Self {
            sender: Sender::Bot,
            content: content.to_string(),
            html,
            is_error: false,
            timestamp: Local::now(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build the transcript for a stored session, in the server's order.
    pub fn from_session(session: &ChatSession) -> Self {
        Self(
            session
                .messages
                .iter()
                .map(|m| ChatMessage::new(Sender::from(&m.role), &m.content))
                .collect(),
        )
    }

    /// Append a message and return its index.
    pub fn push(&mut self, msg: ChatMessage) -> usize {
        self.0.push(msg);
        self.0.len() - 1
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.0.iter()
    }

    /// Replace the content of the message being streamed into. Returns
    /// false when there is no message at `index`.
    pub fn update_content(&mut self, index: usize, content: &str, html: String) -> bool {
        match self.0.get_mut(index) {
            Some(msg) => {
                msg.content = content.to_string();
                msg.html = html;
                true
            }
            None => false,
        }
    }
}

/// Page-lifetime state of the chat client. Nothing here is persisted.
#[derive(Clone, Debug)]
pub struct ClientState {
    /// The session messages are sent to. `None` until the user picks or
    /// creates one, or the service reports the one it created.
    pub current_chat_id: Option<String>,
    /// Set while a `/chat` or `/generate_image` request is in flight
    pub is_loading: bool,
    /// Cached copy of the service's session list
    pub sessions: Vec<ChatSession>,
    /// Session whose title is being edited in the sidebar
    pub editing: Option<String>,
    pub user_initial: char,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            current_chat_id: None,
            is_loading: false,
            sessions: Vec::new(),
            editing: None,
            user_initial: 'U',
        }
    }
}

impl ClientState {
    pub fn find_session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn find_session_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.current_chat_id.as_deref() == Some(id)
    }
}
