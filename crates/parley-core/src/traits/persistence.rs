// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator for chats, messages, feedback, and files.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{
    Chat, ChatPatch, Feedback, FeedbackInsert, FileRecord, Message, MessageInsert, NewChat,
};

/// Database access used when a turn is finalized.
///
/// Implementations own their own connection handling; the chat core only
/// calls these after a stream has completed, never mid-turn.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn create_chat(&self, chat: NewChat) -> Result<Chat, ParleyError>;

    /// Sets the patched columns to exactly the given values.
    async fn update_chat(&self, chat_id: &str, patch: ChatPatch) -> Result<Chat, ParleyError>;

    /// Deletes a chat together with its messages and file links.
    async fn delete_chat(&self, chat_id: &str) -> Result<(), ParleyError>;

    /// Links files to a chat so later turns can retrieve from them.
    async fn create_chat_files(
        &self,
        chat_id: &str,
        user_id: &str,
        file_ids: &[String],
    ) -> Result<(), ParleyError>;

    async fn delete_chat_files(
        &self,
        chat_id: &str,
        file_ids: &[String],
    ) -> Result<(), ParleyError>;

    /// Inserts messages in order and returns the persisted rows in the same order.
    async fn create_messages(
        &self,
        messages: Vec<MessageInsert>,
    ) -> Result<Vec<Message>, ParleyError>;

    async fn update_message_content(
        &self,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ParleyError>;

    /// Deletes every message of `chat_id` whose sequence number is
    /// `>= sequence_number` and inserts `messages` in its place.
    ///
    /// All or nothing: on error the stored messages are unchanged.
    async fn replace_messages_from(
        &self,
        chat_id: &str,
        sequence_number: i64,
        messages: Vec<MessageInsert>,
    ) -> Result<Vec<Message>, ParleyError>;

    async fn create_message_feedback(
        &self,
        feedback: FeedbackInsert,
    ) -> Result<Vec<Feedback>, ParleyError>;

    async fn get_file_by_id(&self, file_id: &str) -> Result<Option<FileRecord>, ParleyError>;
}
