// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state split into turn-affecting and presentation-only parts.

use parley_core::models::LlmModel;
use parley_core::types::{
    Assistant, Chat, ChatMessage, ChatSettings, FileRecord, MessageImage, PluginId, Preset,
    Profile, Workspace,
};

/// Everything a turn reads or commits.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub profile: Option<Profile>,
    pub workspace: Option<Workspace>,
    pub chat_settings: ChatSettings,
    pub selected_assistant: Option<Assistant>,
    pub selected_preset: Option<Preset>,
    pub selected_plugin: PluginId,
    pub selected_chat: Option<Chat>,
    pub chats: Vec<Chat>,
    pub chat_messages: Vec<ChatMessage>,
    /// Files already linked to the selected chat.
    pub chat_files: Vec<FileRecord>,
    /// Files attached to the message being composed.
    pub new_message_files: Vec<FileRecord>,
    pub chat_images: Vec<MessageImage>,
    pub new_message_images: Vec<MessageImage>,
    /// Workspace custom models, searched before the built-in list.
    pub custom_models: Vec<LlmModel>,
    pub use_retrieval: bool,
    pub tool_in_use: String,
}

impl SessionContext {
    pub fn new(profile: Profile, workspace: Workspace, chat_settings: ChatSettings) -> Self {
        Self {
            profile: Some(profile),
            workspace: Some(workspace),
            chat_settings,
            selected_assistant: None,
            selected_preset: None,
            selected_plugin: PluginId::None,
            selected_chat: None,
            chats: Vec::new(),
            chat_messages: Vec::new(),
            chat_files: Vec::new(),
            new_message_files: Vec::new(),
            chat_images: Vec::new(),
            new_message_images: Vec::new(),
            custom_models: Vec::new(),
            use_retrieval: true,
            tool_in_use: "none".to_string(),
        }
    }

    /// Ids of the composing message's files followed by the chat's files.
    pub fn attached_file_ids(&self) -> Vec<String> {
        self.new_message_files
            .iter()
            .chain(&self.chat_files)
            .map(|f| f.id.clone())
            .collect()
    }
}

/// Composer fields that never influence a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    pub user_input: String,
    pub is_prompt_picker_open: bool,
    pub is_at_picker_open: bool,
    pub show_files_display: bool,
}
