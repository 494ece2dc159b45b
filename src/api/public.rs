//! Request and response types for the chat service's HTTP API

use serde::{Deserialize, Serialize};

// Auth

#[derive(Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct SignUpRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
}

/// `{success, user}` on success, `{success: false, message}` otherwise
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

// Sessions

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    // The service stores replies as "assistant"; anything that is not
    // the user is shown as the bot.
    #[serde(rename = "assistant")]
    #[serde(other)]
    Bot,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatsResponse {
    #[serde(default)]
    pub chats: Vec<ChatSession>,
}

#[derive(Serialize)]
pub struct CreateChatRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub chat: Option<ChatSession>,
}

#[derive(Serialize)]
pub struct RenameChatRequest<'a> {
    pub chat_id: &'a str,
    pub new_title: &'a str,
}

#[derive(Serialize)]
pub struct DeleteChatRequest<'a> {
    pub chat_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

// Chat

#[derive(Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<&'a str>,
}

/// Body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ImageRequest<'a> {
    pub prompt: &'a str,
}
