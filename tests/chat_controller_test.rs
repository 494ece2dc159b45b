//! Integration tests for the chat page against a mock service

mod test_utils;

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use teachable::chat::{ChatEvent, SendOutcome, Sender};
    use teachable::core::Route;

    use crate::test_utils::{
        ScriptedDialogs, WELCOME, mock_chats, ndjson, session, test_controller,
    };

    /// Fragments are joined into a single bot message
    #[tokio::test]
    async fn it_streams_a_reply_into_one_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::Json(json!({"message": "Hi"})))
            .with_status(200)
            .with_body(ndjson(&[
                json!({"type": "content", "data": "Hel"}),
                json!({"type": "content", "data": "lo"}),
            ]))
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let outcome = controller.send_message("  Hi ").await;

        assert_eq!(outcome, SendOutcome::Completed);
        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.get(1).unwrap().sender, Sender::User);
        assert_eq!(transcript.get(1).unwrap().content, "Hi");
        let reply = transcript.last().unwrap();
        assert_eq!(reply.sender, Sender::Bot);
        assert_eq!(reply.content, "Hello");
        assert_eq!(reply.html, "Hello");
        assert!(!controller.state().is_loading);
        mock.assert_async().await;
    }

    /// The reply's HTML is rendered from the whole text, not per fragment
    #[tokio::test]
    async fn it_renders_markdown_across_fragments() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(ndjson(&[
                json!({"type": "content", "data": "**bo"}),
                json!({"type": "content", "data": "ld**"}),
            ]))
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.send_message("hi").await;

        assert_eq!(controller.transcript().last().unwrap().html, "<strong>bold</strong>");
    }

    /// A malformed line is skipped and the rest of the stream is used
    #[tokio::test]
    async fn it_skips_malformed_lines() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(format!(
                "{}{{not json\n{}",
                ndjson(&[json!({"type": "content", "data": "A"})]),
                ndjson(&[json!({"type": "content", "data": "B"})])
            ))
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        assert_eq!(controller.send_message("hi").await, SendOutcome::Completed);
        assert_eq!(controller.transcript().last().unwrap().content, "AB");
    }

    /// A new chat's id is adopted from the stream and the sidebar reloaded
    #[tokio::test]
    async fn it_adopts_the_chat_id_from_the_stream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(ndjson(&[
                json!({"type": "content", "data": "Sure"}),
                json!({"type": "chat_id", "data": "c42"}),
            ]))
            .create_async()
            .await;
        let chats = mock_chats(&mut server, json!([session("c42", "Hi")])).await;

        let mut controller = test_controller(&server);
        controller.send_message("hi").await;

        assert_eq!(controller.state().current_chat_id.as_deref(), Some("c42"));
        assert_eq!(controller.state().sessions.len(), 1);
        chats.assert_async().await;
    }

    /// Once a chat is selected its id goes with every message
    #[tokio::test]
    async fn it_sends_the_current_chat_id() {
        let mut server = mockito::Server::new_async().await;
        mock_chats(&mut server, json!([session("c1", "Trip")])).await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::Json(json!({"message": "hi", "chat_id": "c1"})))
            .with_status(200)
            .with_body(ndjson(&[json!({"type": "content", "data": "ok"})]))
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        assert!(controller.select_session("c1"));
        controller.send_message("hi").await;

        mock.assert_async().await;
    }

    /// An expired session sends the user to the auth page
    #[tokio::test]
    async fn it_redirects_on_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(401)
            .with_body("Unauthorized")
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = test_controller(&server).with_observer(tx);
        let outcome = controller.send_message("hi").await;

        assert_eq!(outcome, SendOutcome::Unauthorized);
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&ChatEvent::Redirect(Route::Auth)));
        // Only the user's message was added
        assert_eq!(controller.transcript().len(), 2);
        assert!(!controller.state().is_loading);
    }

    /// Service errors are shown in the transcript
    #[tokio::test]
    async fn it_shows_service_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(json!({"error": "model offline"}).to_string())
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let outcome = controller.send_message("hi").await;

        assert_eq!(outcome, SendOutcome::Failed);
        let last = controller.transcript().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.content, "Error: model offline");
        assert!(!controller.state().is_loading);
    }

    /// A failed request shows the generic apology
    #[tokio::test]
    async fn it_apologizes_when_the_service_is_unreachable() {
        let api = teachable::api::ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut controller = teachable::chat::ChatController::new(api, WELCOME);

        assert_eq!(controller.send_message("hi").await, SendOutcome::Failed);
        assert_eq!(
            controller.transcript().last().unwrap().content,
            "Sorry, I encountered an error. Please try again."
        );
    }

    /// An empty list is fine and leaves the welcome message alone
    #[tokio::test]
    async fn it_loads_an_empty_session_list() {
        let mut server = mockito::Server::new_async().await;
        mock_chats(&mut server, json!([])).await;

        let mut controller = test_controller(&server);
        assert_eq!(controller.load_sessions().await.unwrap(), 0);
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript().get(0).unwrap().content, WELCOME);
    }

    /// Creating a chat makes it current and starts a fresh transcript
    #[tokio::test]
    async fn it_creates_a_session() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/create_chat")
            .match_body(mockito::Matcher::Json(json!({"name": "Trip plans"})))
            .with_status(200)
            .with_body(
                json!({"success": true, "chat": session("c7", "Trip plans")}).to_string(),
            )
            .create_async()
            .await;
        mock_chats(&mut server, json!([session("c7", "Trip plans")])).await;

        let mut controller = test_controller(&server);
        let mut dialogs = ScriptedDialogs::naming(Some("  Trip plans  "));
        let chat = controller.create_session(&mut dialogs).await.unwrap().unwrap();

        assert_eq!(chat.id, "c7");
        assert_eq!(controller.state().current_chat_id.as_deref(), Some("c7"));
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.state().sessions.len(), 1);
        create.assert_async().await;
    }

    /// Cancelling the name prompt sends nothing
    #[tokio::test]
    async fn it_does_not_create_when_cancelled() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/create_chat")
            .expect(0)
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let mut dialogs = ScriptedDialogs::naming(None);
        assert!(controller.create_session(&mut dialogs).await.unwrap().is_none());
        create.assert_async().await;
    }

    /// Renaming updates the cached title and closes the edit field
    #[tokio::test]
    async fn it_renames_a_session() {
        let mut server = mockito::Server::new_async().await;
        mock_chats(&mut server, json!([session("c1", "Old")])).await;
        let rename = server
            .mock("POST", "/rename_chat")
            .match_body(mockito::Matcher::Json(json!({"chat_id": "c1", "new_title": "New"})))
            .with_status(200)
            .with_body(json!({"success": true}).to_string())
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        assert!(controller.begin_rename("c1"));
        assert!(controller.rename_session("c1", " New ").await.unwrap());

        assert_eq!(controller.state().find_session("c1").unwrap().title, "New");
        assert!(controller.state().editing.is_none());
        rename.assert_async().await;
    }

    /// A blank or unchanged title is not sent
    #[tokio::test]
    async fn it_ignores_blank_and_unchanged_titles() {
        let mut server = mockito::Server::new_async().await;
        mock_chats(&mut server, json!([session("c1", "Old")])).await;
        let rename = server
            .mock("POST", "/rename_chat")
            .expect(0)
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        controller.begin_rename("c1");
        assert!(!controller.rename_session("c1", "   ").await.unwrap());
        assert!(!controller.rename_session("c1", "Old").await.unwrap());

        assert_eq!(controller.state().find_session("c1").unwrap().title, "Old");
        assert!(controller.state().editing.is_none());
        rename.assert_async().await;
    }

    /// Deleting the open chat goes back to the welcome message
    #[tokio::test]
    async fn it_deletes_the_current_session() {
        let mut server = mockito::Server::new_async().await;
        let chats = mock_chats(&mut server, json!([session("c1", "Trip")])).await;
        let delete = server
            .mock("POST", "/delete_chat")
            .match_body(mockito::Matcher::Json(json!({"chat_id": "c1"})))
            .with_status(200)
            .with_body(json!({"success": true}).to_string())
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        controller.select_session("c1");
        chats.remove_async().await;

        mock_chats(&mut server, json!([])).await;
        let mut dialogs = ScriptedDialogs::answering(true);
        assert!(controller.delete_session("c1", &mut dialogs).await.unwrap());

        assert_eq!(
            dialogs.questions,
            vec![String::from("Are you sure you want to delete this chat?")]
        );
        assert!(controller.state().current_chat_id.is_none());
        assert!(controller.state().sessions.is_empty());
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript().get(0).unwrap().content, WELCOME);
        delete.assert_async().await;
    }

    /// Declining the confirmation sends nothing
    #[tokio::test]
    async fn it_does_not_delete_without_confirmation() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("POST", "/delete_chat")
            .expect(0)
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let mut dialogs = ScriptedDialogs::answering(false);
        assert!(!controller.delete_session("c1", &mut dialogs).await.unwrap());
        delete.assert_async().await;
    }

    /// Selecting a chat shows its stored messages
    #[tokio::test]
    async fn it_selects_a_session() {
        let mut server = mockito::Server::new_async().await;
        mock_chats(
            &mut server,
            json!([{
                "id": "c1",
                "title": "Trip",
                "created_at": "2024-05-01T09:30:00",
                "messages": [
                    {"role": "user", "content": "Where to?"},
                    {"role": "assistant", "content": "*Lisbon*"}
                ]
            }]),
        )
        .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();

        assert!(!controller.select_session("missing"));
        assert!(controller.select_session("c1"));

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.get(0).unwrap().sender, Sender::User);
        assert_eq!(transcript.get(1).unwrap().html, "<em>Lisbon</em>");
        assert!(controller.state().is_current("c1"));
    }

    /// Generated images are shown inline
    #[tokio::test]
    async fn it_generates_an_image() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate_image")
            .match_body(mockito::Matcher::Json(json!({"prompt": "a cat"})))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([1u8, 2, 3])
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let bytes = controller.generate_image("a cat").await.unwrap();

        assert_eq!(bytes, vec![1, 2, 3]);
        let html = &controller.transcript().last().unwrap().html;
        assert!(html.starts_with(r#"<img src="data:image/png;base64,AQID""#));
        assert!(html.contains(r#"alt="a cat""#));
    }

    /// A failed image request is reported in the transcript
    #[tokio::test]
    async fn it_reports_image_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate_image")
            .with_status(500)
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        assert!(controller.generate_image("a cat").await.is_none());
        let last = controller.transcript().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.content, "Image generation failed");
    }

    /// A chat id in the stream is ignored once a chat is open
    #[tokio::test]
    async fn it_keeps_the_current_chat_id() {
        let mut server = mockito::Server::new_async().await;
        let chats = mock_chats(&mut server, json!([session("c1", "Trip")])).await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(ndjson(&[
                json!({"type": "content", "data": "ok"}),
                json!({"type": "chat_id", "data": "c9"}),
            ]))
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        controller.select_session("c1");
        chats.remove_async().await;
        let refresh = server
            .mock("GET", "/get_chats")
            .expect(0)
            .create_async()
            .await;

        assert_eq!(controller.send_message("hi").await, SendOutcome::Completed);

        assert_eq!(controller.state().current_chat_id.as_deref(), Some("c1"));
        assert_eq!(controller.transcript().last().unwrap().content, "ok");
        refresh.assert_async().await;
    }

    /// Deleting another chat leaves the open one alone
    #[tokio::test]
    async fn it_deletes_a_session_that_is_not_open() {
        let mut server = mockito::Server::new_async().await;
        let stored = json!({
            "id": "c1",
            "title": "Trip",
            "created_at": "2024-05-01T09:30:00",
            "messages": [
                {"role": "user", "content": "Where to?"},
                {"role": "assistant", "content": "Lisbon"}
            ]
        });
        let chats = mock_chats(&mut server, json!([stored.clone(), session("c2", "Old")])).await;
        let delete = server
            .mock("POST", "/delete_chat")
            .match_body(mockito::Matcher::Json(json!({"chat_id": "c2"})))
            .with_status(200)
            .with_body(json!({"success": true}).to_string())
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        controller.load_sessions().await.unwrap();
        controller.select_session("c1");
        chats.remove_async().await;
        let refresh = server
            .mock("GET", "/get_chats")
            .with_status(200)
            .with_body(json!({ "chats": [stored] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut dialogs = ScriptedDialogs::answering(true);
        assert!(controller.delete_session("c2", &mut dialogs).await.unwrap());

        assert_eq!(controller.state().current_chat_id.as_deref(), Some("c1"));
        let contents: Vec<_> = controller
            .transcript()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["Where to?", "Lisbon"]);
        assert_eq!(controller.state().sessions.len(), 1);
        delete.assert_async().await;
        refresh.assert_async().await;
    }

    /// The list is reloaded even when the delete reply can't be read
    #[tokio::test]
    async fn it_reloads_sessions_after_a_failed_delete() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/delete_chat")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;
        let refresh = server
            .mock("GET", "/get_chats")
            .with_status(200)
            .with_body(json!({ "chats": [session("c1", "Trip")] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut controller = test_controller(&server);
        let mut dialogs = ScriptedDialogs::answering(true);

        assert!(controller.delete_session("c1", &mut dialogs).await.is_err());
        assert_eq!(controller.state().sessions.len(), 1);
        refresh.assert_async().await;
    }
}
