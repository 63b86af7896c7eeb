// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly and context-window budgeting for Parley.
//!
//! A turn's wire messages are built in three stages:
//! - **Prompt**: the system prompt from persona, profile, workspace and
//!   user instructions
//! - **Truncation**: history fitted newest-first into the model's chunk size
//! - **Wire**: image expansion and retrieval splicing
//!
//! [`ContextEngine`] runs the stages for one [`ChatPayload`].

pub mod hygiene;
pub mod prompt;
pub mod retrieval;
pub mod tokens;
pub mod truncation;
pub mod wire;

use std::sync::Arc;

use parley_config::model::ContextConfig;
use parley_core::error::ParleyError;
use parley_core::types::{BuiltChatMessage, ChatPayload, MessageImage, PluginId, Profile};
use tracing::debug;

pub use hygiene::{ensure_assistant_messages_not_empty, filter_empty_assistant_messages};
pub use prompt::{DEFAULT_PROMPT, PromptParts, build_system_prompt};
pub use retrieval::build_retrieval_text;
pub use tokens::{ChunkSizer, Cl100kCounter, TokenCounter};
pub use truncation::{ClipPolicy, HistoryTruncator, TruncatedHistory};

/// Wire messages plus the budget figures that produced them.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub messages: Vec<BuiltChatMessage>,
    pub chunk_size: usize,
    pub used_tokens: usize,
    pub dropped: usize,
}

/// Builds the ordered message list sent to the model for one turn.
pub struct ContextEngine {
    counter: Arc<dyn TokenCounter>,
    sizer: ChunkSizer,
    clip: ClipPolicy,
}

impl ContextEngine {
    /// Engine using the `cl100k_base` tokenizer.
    pub fn new(config: &ContextConfig) -> Self {
        Self::with_counter(config, Arc::new(Cl100kCounter))
    }

    pub fn with_counter(config: &ContextConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter,
            sizer: ChunkSizer::new(config),
            clip: ClipPolicy::new(config),
        }
    }

    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Chunk size for a chat and the plugin active for this turn.
    pub fn chunk_size(&self, payload: &ChatPayload, plugin: PluginId) -> usize {
        self.sizer.chunk_size(&payload.chat_settings, plugin)
    }

    /// Assembles the turn's wire messages.
    ///
    /// Pure with respect to `payload`: an oversize failure leaves every input
    /// untouched.
    pub fn assemble(
        &self,
        payload: &ChatPayload,
        profile: &Profile,
        chat_images: &[MessageImage],
        plugin: PluginId,
    ) -> Result<AssembledContext, ParleyError> {
        let settings = &payload.chat_settings;
        let system_prompt = build_system_prompt(&PromptParts::from_settings(
            settings,
            payload.assistant.as_ref(),
            profile.profile_context.as_deref(),
            &payload.workspace_instructions,
            plugin,
        ));
        let chunk_size = self.sizer.chunk_size(settings, plugin);

        let truncated = HistoryTruncator::new(self.counter.as_ref(), &self.clip).truncate(
            &payload.chat_messages,
            &system_prompt,
            chunk_size,
            &settings.model,
        )?;

        let mut messages: Vec<BuiltChatMessage> = truncated
            .messages
            .iter()
            .map(|message| wire::to_wire(message, chat_images))
            .collect();
        wire::splice_retrieval(&mut messages, &payload.message_file_items, plugin);

        debug!(
            model = %settings.model,
            plugin = %plugin,
            chunk_size,
            used_tokens = truncated.used_tokens,
            dropped = truncated.dropped,
            messages = messages.len(),
            "context assembled"
        );

        Ok(AssembledContext {
            messages,
            chunk_size,
            used_tokens: truncated.used_tokens,
            dropped: truncated.dropped,
        })
    }

    /// The wire messages only; see [`ContextEngine::assemble`].
    pub fn build_final_messages(
        &self,
        payload: &ChatPayload,
        profile: &Profile,
        chat_images: &[MessageImage],
        plugin: PluginId,
    ) -> Result<Vec<BuiltChatMessage>, ParleyError> {
        self.assemble(payload, profile, chat_images, plugin)
            .map(|assembled| assembled.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::{
        Assistant, ChatMessage, ChatSettings, EmbeddingsProvider, FileItem, Message, Role,
    };

    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            model: "gpt-3.5-turbo".into(),
            prompt: DEFAULT_PROMPT.into(),
            temperature: 0.5,
            context_length: 4096,
            include_profile_context: true,
            include_workspace_instructions: true,
            embeddings_provider: EmbeddingsProvider::Openai,
        }
    }

    fn chat_message(seq: i64, role: Role, content: &str) -> ChatMessage {
        ChatMessage::new(Message {
            id: format!("m{seq}"),
            chat_id: "c".into(),
            user_id: "u".into(),
            role,
            content: content.into(),
            image_paths: Vec::new(),
            sequence_number: seq,
            model: "gpt-3.5-turbo".into(),
            plugin: PluginId::None,
            created_at: String::new(),
            updated_at: None,
        })
    }

    fn payload() -> ChatPayload {
        ChatPayload {
            chat_settings: settings(),
            workspace_instructions: "Be terse.".into(),
            chat_messages: vec![
                chat_message(1, Role::User, "hello"),
                chat_message(2, Role::Assistant, "hi there"),
                chat_message(3, Role::User, "scan my host"),
                chat_message(4, Role::Assistant, ""),
            ],
            assistant: None,
            message_file_items: Vec::new(),
        }
    }

    fn profile() -> Profile {
        Profile {
            user_id: "u".into(),
            profile_context: Some("security engineer".into()),
        }
    }

    fn engine() -> ContextEngine {
        ContextEngine::with_counter(&ContextConfig::default(), Arc::new(WordCounter))
    }

    #[test]
    fn system_message_leads_and_history_follows() {
        let messages = engine()
            .build_final_messages(&payload(), &profile(), &[], PluginId::None)
            .unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[0].content.text(),
            "User Info:\nsecurity engineer\n\nSystem Instructions:\nBe terse.\n\n"
        );
        assert_eq!(messages[3].content.text(), "scan my host");
    }

    #[test]
    fn persona_is_injected_for_assistants() {
        let mut p = payload();
        p.assistant = Some(Assistant {
            id: "a".into(),
            name: "Hawk".into(),
            model: "gpt-3.5-turbo".into(),
            prompt: String::new(),
            temperature: 0.5,
            context_length: 4096,
            include_profile_context: false,
            include_workspace_instructions: false,
            embeddings_provider: EmbeddingsProvider::Openai,
        });
        let messages = engine()
            .build_final_messages(&p, &profile(), &[], PluginId::None)
            .unwrap();
        assert!(messages[0].content.text().starts_with("<INJECT ROLE>\nYou are not an AI. You are Hawk."));
    }

    #[test]
    fn oversize_leaves_payload_untouched() {
        let mut p = payload();
        p.chat_settings.context_length = 2;
        let before = p.clone();
        let err = engine()
            .build_final_messages(&p, &profile(), &[], PluginId::None)
            .unwrap_err();
        assert!(matches!(err, ParleyError::OversizeInput { tokens: 3, limit: 2 }));
        assert_eq!(p, before);
    }

    #[test]
    fn plugin_turn_uses_plugin_chunk_size() {
        let assembled = engine()
            .assemble(&payload(), &profile(), &[], PluginId::Katana)
            .unwrap();
        assert_eq!(assembled.chunk_size, 8000);
        assert_eq!(assembled.dropped, 0);
    }

    #[test]
    fn standalone_file_items_wrap_current_query() {
        let mut p = payload();
        p.message_file_items = vec![FileItem {
            id: "i".into(),
            file_id: "f".into(),
            content: "nmap output".into(),
            tokens: 2,
        }];
        let messages = engine()
            .build_final_messages(&p, &profile(), &[], PluginId::None)
            .unwrap();
        let query = messages[3].content.text();
        assert!(query.starts_with("Assist with the user's query: 'scan my host'"));
        assert!(query.contains("<BEGIN SOURCE>\nnmap output\n<END SOURCE>"));
    }
}
