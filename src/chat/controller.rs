//! The chat page: session sidebar, transcript, and the message
//! pipeline to `/chat`.
//!
//! All state lives in one [`ChatController`] created when the page
//! starts and passed by `&mut` to whatever drives it. Anything a view
//! needs to redraw is reported through a [`ChatObserver`].

use anyhow::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;

use super::models::{ChatMessage, ClientState, Sender, Transcript};
use super::stream::{self, Decoded, StreamRecord};
use crate::api::ApiClient;
use crate::api::public::{ChatSession, ErrorResponse};
use crate::auth::UserCache;
use crate::core::Route;
use crate::markdown;

/// Longest chat name the name prompt accepts
pub const MAX_CHAT_NAME_LEN: usize = 50;

const SEND_FAILED: &str = "Sorry, I encountered an error. Please try again.";
const DELETE_QUESTION: &str = "Are you sure you want to delete this chat?";

/// Blocking user prompts the controller needs from its host.
pub trait Dialogs {
    /// Ask for a new chat's name. `None` when the user cancels. Hosts
    /// keep asking until [`validate_chat_name`] accepts the input or the
    /// user cancels.
    fn prompt_chat_name(&mut self) -> Option<String>;

    fn confirm(&mut self, question: &str) -> bool;
}

/// Trimmed chat name, cut to [`MAX_CHAT_NAME_LEN`] characters. Blank
/// input is rejected.
pub fn validate_chat_name(input: &str) -> Option<String> {
    let name: String = input.trim().chars().take(MAX_CHAT_NAME_LEN).collect();
    let name = name.trim_end();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    MessageAdded(ChatMessage),
    /// A streamed fragment was appended to the message at `index`
    MessageUpdated { index: usize, fragment: String },
    TranscriptReset,
    LoadingChanged(bool),
    SessionsChanged,
    Redirect(Route),
}

pub trait ChatObserver: Send {
    fn notify(&mut self, event: &ChatEvent);
}

impl ChatObserver for mpsc::UnboundedSender<ChatEvent> {
    fn notify(&mut self, event: &ChatEvent) {
        // A closed receiver just means nobody is watching anymore
        let _ = self.send(event.clone());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input or a request already in flight
    Ignored,
    Completed,
    /// An error message was added to the transcript
    Failed,
    /// The service rejected the session; go to the auth page
    Unauthorized,
}

pub struct ChatController {
    api: ApiClient,
    state: ClientState,
    transcript: Transcript,
    welcome_message: String,
    observer: Option<Box<dyn ChatObserver>>,
}

impl ChatController {
    pub fn new(api: ApiClient, welcome_message: &str) -> Self {
        let mut controller = Self {
            api,
            state: ClientState::default(),
            transcript: Transcript::new(),
            welcome_message: welcome_message.to_string(),
            observer: None,
        };
        controller.add_welcome_message();
        controller
    }

    pub fn with_observer(mut self, observer: impl ChatObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn emit(&mut self, event: ChatEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.notify(&event);
        }
    }

    fn push_message(&mut self, msg: ChatMessage) -> usize {
        let index = self.transcript.push(msg.clone());
        self.emit(ChatEvent::MessageAdded(msg));
        index
    }

    fn add_welcome_message(&mut self) {
        let welcome = ChatMessage::new(Sender::Bot, &self.welcome_message);
        self.push_message(welcome);
    }

    fn reset_transcript(&mut self) {
        self.transcript.clear();
        self.emit(ChatEvent::TranscriptReset);
    }

    fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.emit(ChatEvent::LoadingChanged(loading));
    }

    /// Load the session list and the user's initial.
    pub async fn init(&mut self) {
        self.refresh_sessions().await;
        self.load_user_info().await;
    }

    /// Replace the cached session list with the service's.
    pub async fn load_sessions(&mut self) -> Result<usize, Error> {
        let resp = self.api.get_chats().await?;
        self.state.sessions = resp.chats;
        self.emit(ChatEvent::SessionsChanged);
        Ok(self.state.sessions.len())
    }

    async fn refresh_sessions(&mut self) {
        if let Err(e) = self.load_sessions().await {
            tracing::error!("Error loading chat history: {}", e);
        }
    }

    pub async fn load_user_info(&mut self) {
        match self.api.get_user_info().await {
            Ok(info) => {
                if let Some(first) = info.username.as_deref().and_then(|u| u.chars().next()) {
                    self.state.user_initial = first.to_uppercase().next().unwrap_or(first);
                }
            }
            Err(e) => {
                tracing::error!("Error loading user info: {}", e);
                self.state.user_initial = 'U';
            }
        }
    }

    /// Ask for a name and create a session with it. Returns the new
    /// session, or `None` when the prompt was cancelled or the service
    /// declined.
    pub async fn create_session(
        &mut self,
        dialogs: &mut impl Dialogs,
    ) -> Result<Option<ChatSession>, Error> {
        let Some(name) = dialogs
            .prompt_chat_name()
            .and_then(|input| validate_chat_name(&input))
        else {
            return Ok(None);
        };

        let resp = self.api.create_chat(&name).await?;
        match resp.chat {
            Some(chat) if resp.success => {
                tracing::info!("Created chat {} ({})", chat.id, chat.title);
                self.state.current_chat_id = Some(chat.id.clone());
                self.reset_transcript();
                self.add_welcome_message();
                self.refresh_sessions().await;
                Ok(Some(chat))
            }
            _ => {
                tracing::warn!("Service declined to create chat {}", name);
                Ok(None)
            }
        }
    }

    /// Start editing a session's title in the sidebar.
    pub fn begin_rename(&mut self, id: &str) -> bool {
        if self.state.find_session(id).is_none() {
            return false;
        }
        self.state.editing = Some(id.to_string());
        self.emit(ChatEvent::SessionsChanged);
        true
    }

    pub fn cancel_rename(&mut self) {
        if self.state.editing.take().is_some() {
            self.emit(ChatEvent::SessionsChanged);
        }
    }

    /// Rename a session. Returns whether the title changed. The edit
    /// field is closed whatever happens.
    pub async fn rename_session(&mut self, id: &str, new_title: &str) -> Result<bool, Error> {
        let result = self.try_rename(id, new_title).await;
        self.cancel_rename();
        result
    }

    async fn try_rename(&mut self, id: &str, new_title: &str) -> Result<bool, Error> {
        let new_title = new_title.trim();
        let current = self.state.find_session(id).map(|s| s.title.as_str());
        if new_title.is_empty() || current == Some(new_title) {
            return Ok(false);
        }

        if !self.api.rename_chat(id, new_title).await? {
            tracing::error!("Failed to rename chat {}", id);
            return Ok(false);
        }

        if let Some(session) = self.state.find_session_mut(id) {
            session.title = new_title.to_string();
        }
        self.emit(ChatEvent::SessionsChanged);
        Ok(true)
    }

    /// Delete a session after confirmation. Returns whether the service
    /// deleted it. The session list is reloaded after any delete request.
    pub async fn delete_session(
        &mut self,
        id: &str,
        dialogs: &mut impl Dialogs,
    ) -> Result<bool, Error> {
        if !dialogs.confirm(DELETE_QUESTION) {
            return Ok(false);
        }

        let result = self.api.delete_chat(id).await;
        let deleted = matches!(&result, Ok(resp) if resp.success);
        if deleted && self.state.is_current(id) {
            self.state.current_chat_id = None;
            self.reset_transcript();
            self.add_welcome_message();
        }
        // The service may have deleted it even if the reply was unreadable
        self.refresh_sessions().await;
        result?;
        Ok(deleted)
    }

    /// Show a cached session's stored messages. Unknown ids are ignored.
    pub fn select_session(&mut self, id: &str) -> bool {
        let Some(session) = self.state.find_session(id) else {
            return false;
        };
        let messages: Vec<ChatMessage> = Transcript::from_session(session).iter().cloned().collect();

        self.state.current_chat_id = Some(id.to_string());
        self.reset_transcript();
        if messages.is_empty() {
            self.add_welcome_message();
        }
        for msg in messages {
            self.push_message(msg);
        }
        self.emit(ChatEvent::SessionsChanged);
        true
    }

    /// Send a message and stream the reply into the transcript.
    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        let message = text.trim();
        if message.is_empty() || self.state.is_loading {
            return SendOutcome::Ignored;
        }

        self.push_message(ChatMessage::new(Sender::User, message));
        self.set_loading(true);

        let outcome = match self.exchange(message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error sending message: {}", e);
                self.push_message(ChatMessage::error(SEND_FAILED));
                SendOutcome::Failed
            }
        };

        self.set_loading(false);
        outcome
    }

    async fn exchange(&mut self, message: &str) -> Result<SendOutcome, Error> {
        let chat_id = self.state.current_chat_id.clone();
        let resp = self.api.chat(message, chat_id.as_deref()).await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.emit(ChatEvent::Redirect(Route::Auth));
            return Ok(SendOutcome::Unauthorized);
        }
        if !status.is_success() {
            let body: ErrorResponse = resp.json().await?;
            let error = body.error.as_deref().unwrap_or("Something went wrong");
            self.push_message(ChatMessage::error(&format!("Error: {}", error)));
            return Ok(SendOutcome::Failed);
        }

        let index = self.push_message(ChatMessage::new(Sender::Bot, ""));
        let mut full_response = String::new();

        let records = stream::decode(resp.bytes_stream());
        futures_util::pin_mut!(records);

        while let Some(item) = records.next().await {
            match item? {
                Decoded::Record(StreamRecord::Content(fragment)) => {
                    full_response.push_str(&fragment);
                    // Re-render everything received so far so the HTML
                    // always matches the whole text
                    let html = markdown::render(&full_response);
                    if !html.is_empty() {
                        self.transcript.update_content(index, &full_response, html);
                        self.emit(ChatEvent::MessageUpdated { index, fragment });
                    }
                }
                Decoded::Record(StreamRecord::ChatId(id)) => {
                    if self.state.current_chat_id.is_none() {
                        tracing::debug!("Service created chat {}", id);
                        self.state.current_chat_id = Some(id);
                        self.refresh_sessions().await;
                    }
                }
                Decoded::Record(StreamRecord::Other(kind)) => {
                    tracing::debug!("Ignoring stream record of type {}", kind);
                }
                Decoded::Malformed { line, reason } => {
                    tracing::error!("Error parsing JSON chunk: {} Chunk: {}", reason, line);
                }
            }
        }

        Ok(SendOutcome::Completed)
    }

    /// Ask the service for an image and add it to the transcript.
    /// Returns the image bytes when one was generated.
    pub async fn generate_image(&mut self, prompt: &str) -> Option<Vec<u8>> {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.state.is_loading {
            return None;
        }

        self.set_loading(true);
        let bytes = match self.request_image(prompt).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                self.push_message(ChatMessage::error("Image generation failed"));
                None
            }
            Err(e) => {
                tracing::error!("Image generation error: {}", e);
                self.push_message(ChatMessage::error("Error generating image"));
                None
            }
        };
        self.set_loading(false);
        bytes
    }

    async fn request_image(&mut self, prompt: &str) -> Result<Option<Vec<u8>>, Error> {
        let resp = self.api.generate_image(prompt).await?;
        if !resp.status().is_success() {
            tracing::warn!("Image generation returned {}", resp.status());
            return Ok(None);
        }

        let mime = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let bytes = resp.bytes().await?.to_vec();

        let html = format!(
            r#"<img src="data:{};base64,{}" class="generated-image" alt="{}">"#,
            markdown::escape_html(&mime),
            STANDARD.encode(&bytes),
            markdown::escape_html(prompt)
        );
        self.push_message(ChatMessage::with_html(prompt, html));
        Ok(Some(bytes))
    }

    /// End the service session and forget the cached user. The cache is
    /// cleared even when the service can't be reached.
    pub async fn logout(&mut self, cache: &UserCache) -> Result<Route, Error> {
        let result = self.api.logout().await;
        cache.clear();
        result?;
        self.emit(ChatEvent::Redirect(Route::Auth));
        Ok(Route::Auth)
    }
}
