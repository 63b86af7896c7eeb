// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end session testing.
//!
//! `SessionHarness` assembles a [`ChatSession`] wired to in-memory
//! collaborators and exposes the mocks for scripting and assertions.

use std::sync::Arc;

use parley_agent::{ChatSession, Collaborators, SessionContext, SessionEvent, TurnOutcome, TurnRequest};
use parley_config::model::{ContextConfig, SessionConfig};
use parley_context::{ContextEngine, TokenCounter};
use parley_core::ParleyError;
use parley_core::types::{
    Chat, ChatMessage, ChatSettings, EmbeddingsProvider, Message, PluginId, Profile, Role,
    Workspace,
};
use tokio::sync::mpsc;

use crate::memory_persistence::MemoryPersistence;
use crate::mock_endpoints::MockEndpoints;
use crate::mock_transport::MockTransport;

/// One token per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Builder for creating session test environments.
pub struct SessionHarnessBuilder {
    settings: ChatSettings,
    plugin: PluginId,
    history: i64,
    replies: Vec<String>,
    profile_context: Option<String>,
    workspace_instructions: Option<String>,
    context_config: ContextConfig,
    session_config: SessionConfig,
    counter: Arc<dyn TokenCounter>,
}

impl SessionHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: ChatSettings {
                model: "gpt-3.5-turbo".to_string(),
                prompt: "You are a test assistant.".to_string(),
                temperature: 0.5,
                context_length: 4096,
                include_profile_context: true,
                include_workspace_instructions: true,
                embeddings_provider: EmbeddingsProvider::Openai,
            },
            plugin: PluginId::None,
            history: 0,
            replies: Vec::new(),
            profile_context: None,
            workspace_instructions: None,
            context_config: ContextConfig::default(),
            session_config: SessionConfig {
                stop_grace_ms: 10,
                ..SessionConfig::default()
            },
            counter: Arc::new(WordCounter),
        }
    }

    /// Set scripted single-chunk transport replies.
    pub fn with_replies(mut self, replies: Vec<&str>) -> Self {
        self.replies = replies.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.settings.model = model.to_string();
        self
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.settings.context_length = context_length;
        self
    }

    pub fn with_plugin(mut self, plugin: PluginId) -> Self {
        self.plugin = plugin;
        self
    }

    /// Seed a saved chat with `count` alternating user/assistant messages.
    pub fn with_history(mut self, count: i64) -> Self {
        self.history = count;
        self
    }

    pub fn with_profile_context(mut self, context: &str) -> Self {
        self.profile_context = Some(context.to_string());
        self
    }

    pub fn with_workspace_instructions(mut self, instructions: &str) -> Self {
        self.workspace_instructions = Some(instructions.to_string());
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Build the harness, seeding persistence when history was requested.
    pub async fn build(self) -> SessionHarness {
        let persistence = Arc::new(MemoryPersistence::new());
        let transport = Arc::new(MockTransport::with_replies(self.replies));
        let endpoints = Arc::new(MockEndpoints::new());

        let profile = Profile {
            user_id: "test-user".to_string(),
            profile_context: self.profile_context,
        };
        let workspace = Workspace {
            id: "test-workspace".to_string(),
            name: "Test".to_string(),
            instructions: self.workspace_instructions,
        };
        let mut ctx = SessionContext::new(profile, workspace, self.settings.clone());
        ctx.selected_plugin = self.plugin;

        if self.history > 0 {
            let chat = seeded_chat(&self.settings);
            let messages: Vec<Message> = (1..=self.history)
                .map(|seq| seeded_message(&chat.id, seq, &self.settings.model))
                .collect();
            persistence.insert_chat(chat.clone()).await;
            persistence.insert_messages(messages.clone()).await;
            ctx.chats.push(chat.clone());
            ctx.selected_chat = Some(chat);
            ctx.chat_messages = messages.into_iter().map(ChatMessage::new).collect();
        }

        let collaborators = Collaborators {
            persistence: persistence.clone(),
            transport: transport.clone(),
            ingestion: endpoints.clone(),
            detector: endpoints.clone(),
            extractor: endpoints.clone(),
            retriever: endpoints.clone(),
        };
        let engine = Arc::new(ContextEngine::with_counter(&self.context_config, self.counter));
        let (session, events) = ChatSession::new(ctx, collaborators, engine, self.session_config);

        SessionHarness {
            session,
            events,
            persistence,
            transport,
            endpoints,
        }
    }
}

fn seeded_chat(settings: &ChatSettings) -> Chat {
    Chat {
        id: "test-chat".to_string(),
        workspace_id: "test-workspace".to_string(),
        user_id: "test-user".to_string(),
        assistant_id: None,
        name: "Seeded chat".to_string(),
        model: settings.model.clone(),
        prompt: settings.prompt.clone(),
        temperature: settings.temperature,
        context_length: settings.context_length,
        include_profile_context: settings.include_profile_context,
        include_workspace_instructions: settings.include_workspace_instructions,
        embeddings_provider: settings.embeddings_provider,
        finish_reason: Some("stop".to_string()),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: None,
    }
}

fn seeded_message(chat_id: &str, seq: i64, model: &str) -> Message {
    let role = if seq % 2 == 1 { Role::User } else { Role::Assistant };
    Message {
        id: format!("m{seq}"),
        chat_id: chat_id.to_string(),
        user_id: "test-user".to_string(),
        role,
        content: format!("message {seq}"),
        image_paths: Vec::new(),
        sequence_number: seq,
        model: model.to_string(),
        plugin: PluginId::None,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: None,
    }
}

/// A session plus the mocks behind it.
pub struct SessionHarness {
    pub session: ChatSession,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub persistence: Arc<MemoryPersistence>,
    pub transport: Arc<MockTransport>,
    pub endpoints: Arc<MockEndpoints>,
}

impl SessionHarness {
    pub fn builder() -> SessionHarnessBuilder {
        SessionHarnessBuilder::new()
    }

    /// Sends `text` as a new message.
    pub async fn send(&mut self, text: &str) -> Result<TurnOutcome, ParleyError> {
        self.session.send(TurnRequest::send(text)).await
    }

    /// Every event published so far.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn contents(&self) -> Vec<String> {
        self.session
            .messages()
            .iter()
            .map(|m| m.message.content.clone())
            .collect()
    }

    pub fn sequence_numbers(&self) -> Vec<i64> {
        self.session
            .messages()
            .iter()
            .map(|m| m.message.sequence_number)
            .collect()
    }

    /// Id of the selected chat, once one exists.
    pub fn chat_id(&self) -> Option<String> {
        self.session.context().selected_chat.as_ref().map(|c| c.id.clone())
    }
}
