// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence for deterministic testing.
//!
//! `MemoryPersistence` implements `Persistence` over plain vectors guarded by
//! a tokio mutex. A single [`FailPoint`] can be armed to make one operation
//! fail, which exercises the session's rollback path.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::Persistence;
use parley_core::types::{
    Chat, ChatPatch, Feedback, FeedbackInsert, FileRecord, Message, MessageInsert, NewChat,
};

/// Operation that fails while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CreateChat,
    UpdateChat,
    CreateChatFiles,
    /// Also fails [`Persistence::replace_messages_from`] before anything is deleted.
    CreateMessages,
    UpdateMessage,
    CreateFeedback,
}

#[derive(Default)]
struct Store {
    chats: Vec<Chat>,
    messages: Vec<Message>,
    chat_files: Vec<(String, String)>,
    feedback: Vec<Feedback>,
    files: HashMap<String, FileRecord>,
    fail_on: Option<FailPoint>,
}

impl Store {
    fn check(&self, point: FailPoint) -> Result<(), ParleyError> {
        if self.fail_on == Some(point) {
            return Err(ParleyError::persistence(format!("{point:?} failed")));
        }
        Ok(())
    }
}

/// Persistence backed by in-memory rows.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    store: Arc<Mutex<Store>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file row so `get_file_by_id` can find it.
    pub async fn insert_file(&self, file: FileRecord) {
        self.store.lock().await.files.insert(file.id.clone(), file);
    }

    /// Seeds an existing chat.
    pub async fn insert_chat(&self, chat: Chat) {
        self.store.lock().await.chats.push(chat);
    }

    /// Seeds existing message rows.
    pub async fn insert_messages(&self, messages: Vec<Message>) {
        self.store.lock().await.messages.extend(messages);
    }

    /// Makes `point` fail until [`MemoryPersistence::clear_failure`].
    pub async fn fail_on(&self, point: FailPoint) {
        self.store.lock().await.fail_on = Some(point);
    }

    pub async fn clear_failure(&self) {
        self.store.lock().await.fail_on = None;
    }

    pub async fn chats(&self) -> Vec<Chat> {
        self.store.lock().await.chats.clone()
    }

    /// Messages of `chat_id` ordered by sequence number.
    pub async fn messages(&self, chat_id: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .store
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sequence_number);
        messages
    }

    pub async fn chat_file_ids(&self, chat_id: &str) -> Vec<String> {
        self.store
            .lock()
            .await
            .chat_files
            .iter()
            .filter(|(chat, _)| chat == chat_id)
            .map(|(_, file)| file.clone())
            .collect()
    }

    pub async fn feedback(&self) -> Vec<Feedback> {
        self.store.lock().await.feedback.clone()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn message_row(m: MessageInsert) -> Message {
    Message {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: m.chat_id,
        user_id: m.user_id,
        role: m.role,
        content: m.content,
        image_paths: m.image_paths,
        sequence_number: m.sequence_number,
        model: m.model,
        plugin: m.plugin,
        created_at: now(),
        updated_at: None,
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn create_chat(&self, chat: NewChat) -> Result<Chat, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::CreateChat)?;
        let row = Chat {
            id: uuid::Uuid::new_v4().to_string(),
            workspace_id: chat.workspace_id,
            user_id: chat.user_id,
            assistant_id: chat.assistant_id,
            name: chat.name,
            model: chat.settings.model,
            prompt: chat.settings.prompt,
            temperature: chat.settings.temperature,
            context_length: chat.settings.context_length,
            include_profile_context: chat.settings.include_profile_context,
            include_workspace_instructions: chat.settings.include_workspace_instructions,
            embeddings_provider: chat.settings.embeddings_provider,
            finish_reason: chat.finish_reason,
            created_at: now(),
            updated_at: None,
        };
        store.chats.push(row.clone());
        Ok(row)
    }

    async fn update_chat(&self, chat_id: &str, patch: ChatPatch) -> Result<Chat, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::UpdateChat)?;
        let chat = store
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or_else(|| ParleyError::persistence(format!("chat {chat_id} not found")))?;
        chat.updated_at = patch.updated_at;
        chat.finish_reason = patch.finish_reason;
        Ok(chat.clone())
    }

    async fn create_chat_files(
        &self,
        chat_id: &str,
        _user_id: &str,
        file_ids: &[String],
    ) -> Result<(), ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::CreateChatFiles)?;
        for file_id in file_ids {
            store.chat_files.push((chat_id.to_string(), file_id.clone()));
        }
        Ok(())
    }

    async fn delete_chat_files(
        &self,
        chat_id: &str,
        file_ids: &[String],
    ) -> Result<(), ParleyError> {
        self.store
            .lock()
            .await
            .chat_files
            .retain(|(chat, file)| chat != chat_id || !file_ids.contains(file));
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ParleyError> {
        let mut store = self.store.lock().await;
        store.chats.retain(|c| c.id != chat_id);
        store.messages.retain(|m| m.chat_id != chat_id);
        store.chat_files.retain(|(chat, _)| chat != chat_id);
        Ok(())
    }

    async fn create_messages(
        &self,
        messages: Vec<MessageInsert>,
    ) -> Result<Vec<Message>, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::CreateMessages)?;
        let rows: Vec<Message> = messages.into_iter().map(message_row).collect();
        store.messages.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update_message_content(
        &self,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::UpdateMessage)?;
        let message = store
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ParleyError::persistence(format!("message {message_id} not found")))?;
        message.content = content.to_string();
        message.updated_at = Some(now());
        Ok(message.clone())
    }

    async fn replace_messages_from(
        &self,
        chat_id: &str,
        sequence_number: i64,
        messages: Vec<MessageInsert>,
    ) -> Result<Vec<Message>, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::CreateMessages)?;
        store
            .messages
            .retain(|m| m.chat_id != chat_id || m.sequence_number < sequence_number);
        let rows: Vec<Message> = messages.into_iter().map(message_row).collect();
        store.messages.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn create_message_feedback(
        &self,
        feedback: FeedbackInsert,
    ) -> Result<Vec<Feedback>, ParleyError> {
        let mut store = self.store.lock().await;
        store.check(FailPoint::CreateFeedback)?;
        store.feedback.retain(|f| f.message_id != feedback.message_id);
        let row = Feedback {
            id: uuid::Uuid::new_v4().to_string(),
            message_id: feedback.message_id,
            chat_id: feedback.chat_id,
            user_id: feedback.user_id,
            feedback: feedback.feedback,
            reason: feedback.reason,
            detailed_feedback: feedback.detailed_feedback,
            model: feedback.model,
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
            sequence_number: feedback.sequence_number,
            allow_email: feedback.allow_email,
            allow_sharing: feedback.allow_sharing,
            has_files: feedback.has_files,
            plugin: feedback.plugin,
        };
        store.feedback.push(row.clone());
        Ok(vec![row])
    }

    async fn get_file_by_id(&self, file_id: &str) -> Result<Option<FileRecord>, ParleyError> {
        Ok(self.store.lock().await.files.get(file_id).cloned())
    }
}
