// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete turn pipeline.
//!
//! Each test creates an isolated SessionHarness with in-memory persistence and
//! scripted mocks. Tests are independent and order-insensitive.

use parley_agent::{FeedbackRequest, SessionEvent, TurnRequest, TurnState};
use parley_core::ParleyError;
use parley_core::types::{
    Assistant, EmbeddingsProvider, FeedbackKind, FileItem, FileRecord, MessageImage, PluginId,
    Role,
};
use parley_test_utils::{FailPoint, SessionHarness};

fn text_file(id: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: format!("{id}.txt"),
        file_type: "text".to_string(),
        description: String::new(),
    }
}

// ---- Send ----

#[tokio::test]
async fn test_first_send_creates_chat_and_persists_pair() {
    let mut harness = SessionHarness::builder()
        .with_replies(vec!["Hello from Parley!"])
        .build()
        .await;

    let outcome = harness.send("Hi there").await.unwrap();
    assert_eq!(outcome.full_text, "Hello from Parley!");
    assert_eq!(outcome.finish_reason, "stop");
    assert!(!outcome.aborted);

    let chats = harness.persistence.chats().await;
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].name, "Hi there");
    assert_eq!(chats[0].finish_reason.as_deref(), Some("stop"));

    let messages = harness.persistence.messages(&chats[0].id).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Hi there");
    assert_eq!(messages[0].sequence_number, 1);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hello from Parley!");
    assert_eq!(messages[1].sequence_number, 2);

    // Session state holds the persisted rows, not the temporary ones.
    let ids: Vec<&str> = harness
        .session
        .messages()
        .iter()
        .map(|m| m.message.id.as_str())
        .collect();
    assert_eq!(ids, vec![messages[0].id.as_str(), messages[1].id.as_str()]);
    assert_eq!(harness.chat_id().as_deref(), Some(chats[0].id.as_str()));
    assert_eq!(harness.session.state(), TurnState::Idle);
    assert!(!harness.session.is_generating());
}

#[tokio::test]
async fn test_send_publishes_lifecycle_events() {
    let mut harness = SessionHarness::builder()
        .with_replies(vec!["streamed"])
        .build()
        .await;

    harness.send("go").await.unwrap();
    let events = harness.drain_events();

    assert_eq!(events.first(), Some(&SessionEvent::GeneratingChanged(true)));
    let first_token = events
        .iter()
        .position(|e| *e == SessionEvent::FirstTokenReceived)
        .expect("first token event");
    let delta = events
        .iter()
        .position(|e| *e == SessionEvent::TextDelta("streamed".into()))
        .expect("delta event");
    assert!(first_token < delta);
    assert!(events.contains(&SessionEvent::StateChanged(TurnState::Streaming)));
    assert!(events.contains(&SessionEvent::StateChanged(TurnState::Finalizing)));
    assert!(events.contains(&SessionEvent::GeneratingChanged(false)));
    assert_eq!(
        events.last(),
        Some(&SessionEvent::StateChanged(TurnState::Idle))
    );
}

#[tokio::test]
async fn test_second_send_updates_chat() {
    let mut harness = SessionHarness::builder()
        .with_replies(vec!["one", "two"])
        .build()
        .await;

    harness.send("first").await.unwrap();
    harness.send("second").await.unwrap();

    let chats = harness.persistence.chats().await;
    assert_eq!(chats.len(), 1);
    assert!(chats[0].updated_at.is_some());
    assert_eq!(harness.sequence_numbers(), vec![1, 2, 3, 4]);
    assert_eq!(harness.contents(), vec!["first", "one", "second", "two"]);
}

#[tokio::test]
async fn test_chat_name_is_capped() {
    let mut harness = SessionHarness::builder().build().await;
    let long = "x".repeat(250);
    harness.send(&long).await.unwrap();
    let chats = harness.persistence.chats().await;
    assert_eq!(chats[0].name.chars().count(), 100);
}

#[tokio::test]
async fn test_system_prompt_reaches_transport() {
    let mut harness = SessionHarness::builder()
        .with_profile_context("I audit web apps.")
        .with_workspace_instructions("Cite CVEs.")
        .build()
        .await;

    harness.send("hello").await.unwrap();
    let call = harness.transport.last_call().await.unwrap();
    assert_eq!(call.plugin, None);
    assert_eq!(call.request.messages[0].role, Role::System);
    let system = call.request.messages[0].content.text();
    assert!(system.contains("User Info:\nI audit web apps."));
    assert!(system.contains("System Instructions:\nCite CVEs."));
    // The empty placeholder is stripped for hosted chat.
    assert_eq!(call.request.messages.len(), 2);
    assert_eq!(call.request.messages[1].content.text(), "hello");
}

// ---- Edit / regenerate / continue ----

#[tokio::test]
async fn test_edit_replaces_history_from_sequence() {
    let mut harness = SessionHarness::builder()
        .with_history(10)
        .with_replies(vec!["edited answer"])
        .build()
        .await;

    harness
        .session
        .send(TurnRequest::edit("edited question", 5))
        .await
        .unwrap();

    assert_eq!(harness.sequence_numbers(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(harness.contents()[4], "edited question");
    assert_eq!(harness.contents()[5], "edited answer");

    let persisted = harness.persistence.messages("test-chat").await;
    let seqs: Vec<i64> = persisted.iter().map(|m| m.sequence_number).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(persisted[4].content, "edited question");
}

#[tokio::test]
async fn test_regenerate_replaces_last_reply_in_place() {
    let mut harness = SessionHarness::builder()
        .with_history(4)
        .with_replies(vec!["a better answer"])
        .build()
        .await;

    let outcome = harness
        .session
        .send(TurnRequest::regenerate())
        .await
        .unwrap();
    assert_eq!(outcome.full_text, "a better answer");

    let last = harness.session.messages().last().unwrap();
    assert_eq!(last.message.id, "m4");
    assert_eq!(last.message.content, "a better answer");
    assert_eq!(harness.sequence_numbers(), vec![1, 2, 3, 4]);

    let call = harness.transport.last_call().await.unwrap();
    assert!(call.request.is_regeneration);

    let persisted = harness.persistence.messages("test-chat").await;
    assert_eq!(persisted.len(), 4);
    assert_eq!(persisted[3].content, "a better answer");
}

#[tokio::test]
async fn test_regenerate_without_reply_fails_cleanly() {
    let mut harness = SessionHarness::builder().with_history(3).build().await;
    let before = harness.contents();

    let err = harness
        .session
        .send(TurnRequest::regenerate())
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));
    assert_eq!(harness.contents(), before);
    assert!(harness.transport.calls().await.is_empty());
}

#[tokio::test]
async fn test_continuation_extends_last_reply() {
    let mut harness = SessionHarness::builder()
        .with_history(4)
        .with_replies(vec![" and more"])
        .build()
        .await;

    let outcome = harness
        .session
        .send(TurnRequest::continuation())
        .await
        .unwrap();
    assert_eq!(outcome.full_text, " and more");
    assert_eq!(harness.contents().last().unwrap(), "message 4 and more");
    assert_eq!(harness.sequence_numbers(), vec![1, 2, 3, 4]);

    let call = harness.transport.last_call().await.unwrap();
    assert!(call.request.is_continuation);
    assert_eq!(harness.persistence.messages("test-chat").await[3].content, "message 4 and more");
}

#[tokio::test]
async fn test_model_override_applies_to_one_turn() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .session
        .send(TurnRequest::send("hi").with_model("mistral-large"))
        .await
        .unwrap();

    let call = harness.transport.last_call().await.unwrap();
    assert_eq!(call.request.chat_settings.model, "mistral-large");
    assert_eq!(harness.session.context().chat_settings.model, "gpt-3.5-turbo");
}

// ---- Failures and rollback ----

#[tokio::test]
async fn test_transport_failure_rolls_back() {
    let mut harness = SessionHarness::builder().with_history(2).build().await;
    harness.transport.push_failure("connection refused").await;
    let before = harness.session.messages().to_vec();

    let err = harness.send("will fail").await.unwrap_err();
    assert!(matches!(err, ParleyError::Transport { .. }));
    assert_eq!(harness.session.messages(), before.as_slice());
    assert_eq!(harness.persistence.messages("test-chat").await.len(), 2);
    assert!(!harness.session.is_generating());
    assert_eq!(harness.session.state(), TurnState::Idle);

    let events = harness.drain_events();
    assert!(events.contains(&SessionEvent::StateChanged(TurnState::Error)));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Error(msg) if msg.contains("connection refused")))
    );
    assert_eq!(
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                SessionEvent::MessagesReplaced(messages) => Some(messages.clone()),
                _ => None,
            })
            .unwrap(),
        before
    );
}

#[tokio::test]
async fn test_mid_stream_failure_rolls_back_partial_text() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .transport
        .push_mid_stream_failure(&["partial "], "stream reset")
        .await;

    assert!(harness.send("hello").await.is_err());
    assert!(harness.session.messages().is_empty());
    assert!(harness.persistence.chats().await.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_rolls_back() {
    let mut harness = SessionHarness::builder().with_history(2).build().await;
    harness.persistence.fail_on(FailPoint::CreateMessages).await;
    let before = harness.contents();

    let err = harness.send("hello").await.unwrap_err();
    assert!(matches!(err, ParleyError::Persistence { .. }));
    assert_eq!(harness.contents(), before);

    // The chat patch written before the failure is reverted.
    let chats = harness.persistence.chats().await;
    assert_eq!(chats[0].updated_at, None);
    assert_eq!(chats[0].finish_reason.as_deref(), Some("stop"));
    let selected = harness.session.context().selected_chat.as_ref().unwrap();
    assert_eq!(selected.updated_at, None);
}

#[tokio::test]
async fn test_first_turn_persistence_failure_leaves_no_chat() {
    let mut harness = SessionHarness::builder().build().await;
    harness.persistence.fail_on(FailPoint::CreateMessages).await;

    let err = harness.send("hello").await.unwrap_err();
    assert!(matches!(err, ParleyError::Persistence { .. }));

    assert!(harness.persistence.chats().await.is_empty());
    let ctx = harness.session.context();
    assert!(ctx.selected_chat.is_none());
    assert!(ctx.chats.is_empty());
    assert!(ctx.chat_messages.is_empty());

    // The session is usable again once persistence recovers.
    harness.persistence.clear_failure().await;
    harness.send("hello again").await.unwrap();
    assert_eq!(harness.persistence.chats().await.len(), 1);
    assert_eq!(harness.session.context().chats.len(), 1);
}

#[tokio::test]
async fn test_failed_edit_keeps_persisted_history() {
    let mut harness = SessionHarness::builder()
        .with_history(10)
        .with_replies(vec!["edited answer"])
        .build()
        .await;
    harness.persistence.fail_on(FailPoint::CreateMessages).await;
    let before = harness.contents();

    let err = harness
        .session
        .send(TurnRequest::edit("edited question", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Persistence { .. }));

    let persisted = harness.persistence.messages("test-chat").await;
    let seqs: Vec<i64> = persisted.iter().map(|m| m.sequence_number).collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<_>>());
    assert_eq!(persisted[4].id, "m5");
    assert_eq!(harness.contents(), before);
}

#[tokio::test]
async fn test_chat_file_link_failure_removes_new_chat() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .endpoints
        .ingest_ok("https://docs.example/guide", "web-1")
        .await;
    harness.persistence.insert_file(text_file("web-1")).await;
    harness.persistence.fail_on(FailPoint::CreateChatFiles).await;

    let err = harness
        .send("read https://docs.example/guide")
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Persistence { .. }));

    assert!(harness.persistence.chats().await.is_empty());
    let ctx = harness.session.context();
    assert!(ctx.selected_chat.is_none());
    assert!(ctx.chat_files.is_empty());
}

#[tokio::test]
async fn test_oversize_input_is_rejected_before_transport() {
    let mut harness = SessionHarness::builder()
        .with_context_length(5)
        .build()
        .await;

    let err = harness
        .send("one two three four five six seven")
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::OversizeInput { .. }));
    assert_eq!(
        err.to_string(),
        "The message you submitted was too long, please submit something shorter."
    );
    assert!(harness.session.messages().is_empty());
    assert!(harness.transport.calls().await.is_empty());
}

#[tokio::test]
async fn test_unknown_model_is_a_validation_error() {
    let mut harness = SessionHarness::builder()
        .with_model("gpt-9")
        .build()
        .await;

    let err = harness.send("hi").await.unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));
    assert!(harness.transport.calls().await.is_empty());
    assert!(harness.session.messages().is_empty());
}

#[tokio::test]
async fn test_empty_message_is_a_validation_error() {
    let mut harness = SessionHarness::builder().build().await;
    let err = harness.send("   ").await.unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));
}

#[tokio::test]
async fn test_images_need_an_image_model() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .session
        .context_mut()
        .new_message_images
        .push(MessageImage {
            message_id: None,
            path: "img/1.png".into(),
            base64: "data:image/png;base64,AAAA".into(),
        });

    let err = harness.send("what is this?").await.unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));
}

#[tokio::test]
async fn test_images_are_sent_and_cached() {
    let mut harness = SessionHarness::builder()
        .with_model("gpt-4-turbo-preview")
        .build()
        .await;
    harness
        .session
        .context_mut()
        .new_message_images
        .push(MessageImage {
            message_id: None,
            path: "img/1.png".into(),
            base64: "data:image/png;base64,AAAA".into(),
        });

    harness.send("what is this?").await.unwrap();

    let call = harness.transport.last_call().await.unwrap();
    let user = &call.request.messages[1];
    assert!(matches!(
        user.content,
        parley_core::types::MessageContent::Multipart(_)
    ));

    let ctx = harness.session.context();
    assert!(ctx.new_message_images.is_empty());
    assert_eq!(ctx.chat_images.len(), 1);
    let user_row = &harness.session.messages()[0].message;
    assert_eq!(ctx.chat_images[0].message_id.as_deref(), Some(user_row.id.as_str()));
    assert_eq!(user_row.image_paths, vec!["img/1.png".to_string()]);
}

// ---- Stop ----

#[tokio::test]
async fn test_stop_waits_for_generating_and_keeps_partial_reply() {
    let mut harness = SessionHarness::builder().build().await;
    harness.transport.push_hang(&["partial"]).await;

    let stop = harness.session.stop_handle();
    let events = &mut harness.events;
    let session = &mut harness.session;

    let (outcome, ()) = tokio::join!(session.send(TurnRequest::send("long task")), async {
        while let Some(event) = events.recv().await {
            if event == SessionEvent::FirstTokenReceived {
                break;
            }
        }
        stop.stop().await;
        assert!(!stop.is_generating());
    });

    let outcome = outcome.unwrap();
    assert!(outcome.aborted);
    assert_eq!(outcome.full_text, "partial");
    assert_eq!(outcome.finish_reason, "aborted");

    let chats = harness.persistence.chats().await;
    assert_eq!(chats[0].finish_reason.as_deref(), Some("aborted"));
    let persisted = harness.persistence.messages(&chats[0].id).await;
    assert_eq!(persisted[1].content, "partial");
}

#[tokio::test]
async fn test_stop_without_turn_returns_immediately() {
    let harness = SessionHarness::builder().build().await;
    harness.session.stop().await;
    assert!(!harness.session.is_generating());
}

// ---- Plugins ----

#[tokio::test]
async fn test_auto_selector_routes_to_detected_plugin() {
    let mut harness = SessionHarness::builder()
        .with_plugin(PluginId::AutoPluginSelector)
        .build()
        .await;
    harness.endpoints.set_detected_plugin("nuclei").await;
    harness
        .session
        .context_mut()
        .new_message_files
        .push(text_file("targets"));

    let outcome = harness.send("scan these hosts").await.unwrap();
    assert_eq!(outcome.plugin, PluginId::Nuclei);

    let call = harness.transport.last_call().await.unwrap();
    assert_eq!(call.plugin, Some(PluginId::Nuclei));
    assert_eq!(call.file_data.len(), 1);
    assert_eq!(call.file_data[0].file_name, "targets");
    // Plugin chat keeps strict alternation with a filler reply.
    assert_eq!(call.request.messages.last().unwrap().content.text(), "Sure.");

    let chat_id = harness.chat_id().unwrap();
    let persisted = harness.persistence.messages(&chat_id).await;
    assert!(persisted.iter().all(|m| m.plugin == PluginId::Nuclei));
    // The session's selection is not overwritten by detection.
    assert_eq!(
        harness.session.context().selected_plugin,
        PluginId::AutoPluginSelector
    );
}

#[tokio::test]
async fn test_detector_none_keeps_default_chat() {
    let mut harness = SessionHarness::builder()
        .with_plugin(PluginId::AutoPluginSelector)
        .build()
        .await;

    let outcome = harness.send("hello").await.unwrap();
    assert_eq!(outcome.plugin, PluginId::AutoPluginSelector);
    assert_eq!(harness.transport.last_call().await.unwrap().plugin, None);
    assert_eq!(
        harness.endpoints.detect_calls().await,
        vec![PluginId::AutoPluginSelector]
    );
}

#[tokio::test]
async fn test_extraction_failure_warns_and_continues() {
    let mut harness = SessionHarness::builder()
        .with_plugin(PluginId::Httpx)
        .build()
        .await;
    harness.endpoints.fail_extraction("extractor offline").await;
    harness
        .session
        .context_mut()
        .new_message_files
        .push(text_file("hosts"));

    let outcome = harness.send("/httpx -silent").await.unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("extractor offline"));
    let call = harness.transport.last_call().await.unwrap();
    assert!(call.file_data.is_empty());
}

// ---- Web preprocessing and retrieval ----

#[tokio::test]
async fn test_failed_url_is_a_warning_not_an_error() {
    let mut harness = SessionHarness::builder().build().await;

    let outcome = harness
        .send("summarize https://unknown.example/page")
        .await
        .unwrap();
    assert_eq!(outcome.warnings, vec!["Failed to process websites."]);
    assert!(
        harness
            .drain_events()
            .contains(&SessionEvent::Warning("Failed to process websites.".into()))
    );
    assert_eq!(harness.session.messages().len(), 2);
}

#[tokio::test]
async fn test_ingested_url_becomes_chat_file() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .endpoints
        .ingest_ok("https://docs.example/guide", "web-1")
        .await;
    harness.persistence.insert_file(text_file("web-1")).await;
    harness
        .endpoints
        .set_retrieval(vec![FileItem {
            id: "item-1".into(),
            file_id: "web-1".into(),
            content: "Install with cargo.".into(),
            tokens: 3,
        }])
        .await;

    let outcome = harness
        .send("how do I install? https://docs.example/guide")
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty());

    let chat_id = harness.chat_id().unwrap();
    assert_eq!(
        harness.persistence.chat_file_ids(&chat_id).await,
        vec!["web-1".to_string()]
    );
    let ctx = harness.session.context();
    assert!(ctx.new_message_files.is_empty());
    assert_eq!(ctx.chat_files.len(), 1);
    assert_eq!(ctx.tool_in_use, "none");

    let retrieval = harness.endpoints.retrieval_calls().await;
    assert_eq!(retrieval.len(), 1);
    assert_eq!(retrieval[0].file_ids, vec!["web-1".to_string()]);
}

#[tokio::test]
async fn test_web_scraper_skips_ingestion() {
    let mut harness = SessionHarness::builder()
        .with_plugin(PluginId::WebScraper)
        .build()
        .await;

    harness.send("read https://a.example").await.unwrap();
    assert!(harness.endpoints.ingested_urls().await.is_empty());
}

#[tokio::test]
async fn test_retrieval_wraps_user_message_and_attaches_items() {
    let mut harness = SessionHarness::builder().build().await;
    harness
        .session
        .context_mut()
        .new_message_files
        .push(text_file("report"));
    harness
        .endpoints
        .set_retrieval(vec![FileItem {
            id: "item-1".into(),
            file_id: "report".into(),
            content: "Port 22 is open.".into(),
            tokens: 4,
        }])
        .await;

    harness.send("which ports are open?").await.unwrap();

    let call = harness.transport.last_call().await.unwrap();
    assert!(call.request.use_rag);
    let user = call.request.messages.last().unwrap().content.text();
    assert!(user.contains("<BEGIN SOURCE>\nPort 22 is open.\n<END SOURCE>"));
    assert!(user.contains("which ports are open?"));

    let user_message = &harness.session.messages()[0];
    assert_eq!(user_message.file_items.len(), 1);
    // Session history keeps the raw user text.
    assert_eq!(user_message.message.content, "which ports are open?");

    let calls = harness.endpoints.retrieval_calls().await;
    assert_eq!(calls[0].source_count, 4);
    assert_eq!(calls[0].user_input, "which ports are open?");
}

#[tokio::test]
async fn test_continuation_skips_retrieval() {
    let mut harness = SessionHarness::builder().with_history(2).build().await;
    harness
        .session
        .context_mut()
        .chat_files
        .push(text_file("report"));

    harness
        .session
        .send(TurnRequest::continuation())
        .await
        .unwrap();
    assert!(harness.endpoints.retrieval_calls().await.is_empty());
}

// ---- Feedback and chat management ----

#[tokio::test]
async fn test_feedback_is_attached_and_replaced() {
    let mut harness = SessionHarness::builder().with_history(2).build().await;

    let mut request = FeedbackRequest::new("m2", FeedbackKind::Bad);
    request.reason = Some("inaccurate".into());
    let first = harness.session.send_feedback(request).await.unwrap();
    assert_eq!(first.reason.as_deref(), Some("inaccurate"));

    let second = harness
        .session
        .send_feedback(FeedbackRequest::new("m2", FeedbackKind::Good))
        .await
        .unwrap();
    assert_eq!(second.feedback, FeedbackKind::Good);
    assert_eq!(second.reason.as_deref(), Some("inaccurate"));
    assert_eq!(second.created_at, first.created_at);

    let stored = harness.persistence.feedback().await;
    assert_eq!(stored.len(), 1);
    let message = &harness.session.messages()[1];
    assert_eq!(message.feedback.as_ref().unwrap().feedback, FeedbackKind::Good);
}

#[tokio::test]
async fn test_feedback_for_unknown_message_fails() {
    let mut harness = SessionHarness::builder().with_history(2).build().await;
    let err = harness
        .session
        .send_feedback(FeedbackRequest::new("nope", FeedbackKind::Good))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));
}

#[tokio::test]
async fn test_new_chat_resets_state_and_reseeds_from_assistant() {
    let mut harness = SessionHarness::builder().with_history(4).build().await;
    harness.session.context_mut().selected_assistant = Some(Assistant {
        id: "a1".into(),
        name: "Recon".into(),
        model: "mistral-large".into(),
        prompt: "Enumerate first.".into(),
        temperature: 0.2,
        context_length: 8000,
        include_profile_context: false,
        include_workspace_instructions: true,
        embeddings_provider: EmbeddingsProvider::Local,
    });
    harness.session.composer_mut().user_input = "draft".into();

    harness.session.new_chat().await;

    let ctx = harness.session.context();
    assert!(ctx.chat_messages.is_empty());
    assert!(ctx.selected_chat.is_none());
    assert!(ctx.chat_files.is_empty());
    assert!(!ctx.use_retrieval);
    assert_eq!(ctx.chat_settings.model, "mistral-large");
    assert_eq!(ctx.chat_settings.prompt, "Enumerate first.");
    assert!(harness.session.composer().user_input.is_empty());
}

#[tokio::test]
async fn test_new_chat_with_assistant_sends_persona() {
    let mut harness = SessionHarness::builder().build().await;
    harness.session.context_mut().selected_assistant = Some(Assistant {
        id: "a1".into(),
        name: "Recon".into(),
        model: "gpt-3.5-turbo".into(),
        prompt: "Enumerate first.".into(),
        temperature: 0.2,
        context_length: 4096,
        include_profile_context: false,
        include_workspace_instructions: false,
        embeddings_provider: EmbeddingsProvider::Openai,
    });
    harness.session.new_chat().await;

    harness.send("start").await.unwrap();
    let call = harness.transport.last_call().await.unwrap();
    assert!(call.request.messages[0].content.text().contains("You are Recon."));
    let chats = harness.persistence.chats().await;
    assert_eq!(chats[0].assistant_id.as_deref(), Some("a1"));
}

#[tokio::test]
async fn test_select_chat_loads_history() {
    let mut seeded = SessionHarness::builder().with_history(4).build().await;
    let chat = seeded.session.context().selected_chat.clone().unwrap();
    let messages = seeded.session.messages().to_vec();
    seeded.session.new_chat().await;

    seeded
        .session
        .select_chat(chat.clone(), messages, vec![text_file("notes")])
        .await;
    let ctx = seeded.session.context();
    assert_eq!(ctx.selected_chat.as_ref().map(|c| c.id.as_str()), Some("test-chat"));
    assert_eq!(ctx.chat_messages.len(), 4);
    assert_eq!(ctx.chat_files.len(), 1);
    assert_eq!(ctx.chat_settings.model, chat.model);
}
