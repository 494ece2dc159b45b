//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;

use mockito::{Mock, ServerGuard};
use serde_json::{Value, json};

use teachable::api::ApiClient;
use teachable::chat::{ChatController, Dialogs};

pub const WELCOME: &str = "Welcome!";

/// Answers the controller's prompts from a script and records what it
/// was asked.
#[derive(Default)]
pub struct ScriptedDialogs {
    names: VecDeque<Option<String>>,
    answers: VecDeque<bool>,
    pub questions: Vec<String>,
}

impl ScriptedDialogs {
    pub fn naming(name: Option<&str>) -> Self {
        Self {
            names: VecDeque::from([name.map(String::from)]),
            ..Default::default()
        }
    }

    pub fn answering(answer: bool) -> Self {
        Self {
            answers: VecDeque::from([answer]),
            ..Default::default()
        }
    }
}

impl Dialogs for ScriptedDialogs {
    fn prompt_chat_name(&mut self) -> Option<String> {
        self.names.pop_front().flatten()
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}

/// A controller talking to the mock server.
pub fn test_controller(server: &ServerGuard) -> ChatController {
    let api = ApiClient::new(&server.url()).expect("Failed to build client");
    ChatController::new(api, WELCOME)
}

pub fn session(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "created_at": "2024-05-01T09:30:00",
        "messages": []
    })
}

pub async fn mock_chats(server: &mut ServerGuard, chats: Value) -> Mock {
    server
        .mock("GET", "/get_chats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "chats": chats }).to_string())
        .create_async()
        .await
}

/// One NDJSON line per record.
pub fn ndjson(records: &[Value]) -> String {
    records.iter().map(|r| format!("{}\n", r)).collect()
}
