// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history truncation against a token ceiling.
//!
//! The walk is greedy and recency-first: history is visited newest to oldest
//! and the first message that does not fit ends the walk. Older messages are
//! dropped even when a smaller one further back would still fit.

use parley_config::model::ContextConfig;
use parley_core::error::ParleyError;
use parley_core::types::{ChatMessage, Message, PluginId, Role, last_sequence_number};
use tracing::debug;

use crate::retrieval::{build_retrieval_text, inline_query_with_sources};
use crate::tokens::TokenCounter;

/// Character thresholds for clipping long assistant replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPolicy {
    /// Clip trigger, in characters.
    pub limit: usize,
    /// Characters kept before the marker.
    pub keep: usize,
    pub marker: String,
}

impl ClipPolicy {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            limit: config.message_size_limit,
            keep: config.message_size_keep,
            marker: config.truncation_marker.clone(),
        }
    }

    /// Clips `content` to `keep` characters plus the marker when it is longer
    /// than `limit` characters; otherwise returns `None`.
    pub fn clip(&self, content: &str) -> Option<String> {
        if content.chars().count() <= self.limit {
            return None;
        }
        let mut clipped: String = content.chars().take(self.keep).collect();
        clipped.push_str(&self.marker);
        Some(clipped)
    }
}

/// Output of [`HistoryTruncator::truncate`].
#[derive(Debug, Clone)]
pub struct TruncatedHistory {
    /// System message first, then the admitted suffix in chronological order.
    pub messages: Vec<Message>,
    /// Tokens spent by the system prompt and admitted history.
    pub used_tokens: usize,
    pub remaining_tokens: usize,
    /// Number of processed history messages left out.
    pub dropped: usize,
}

pub struct HistoryTruncator<'a> {
    counter: &'a dyn TokenCounter,
    clip: &'a ClipPolicy,
}

impl<'a> HistoryTruncator<'a> {
    pub fn new(counter: &'a dyn TokenCounter, clip: &'a ClipPolicy) -> Self {
        Self { counter, clip }
    }

    /// Fits `history` plus `system_prompt` into `chunk_size` tokens.
    ///
    /// Fails with [`ParleyError::OversizeInput`] when the most recent user
    /// message alone exceeds `chunk_size`, before anything else runs.
    pub fn truncate(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        chunk_size: usize,
        model: &str,
    ) -> Result<TruncatedHistory, ParleyError> {
        self.check_last_user_message(history, chunk_size)?;

        let processed = inline_historical_retrieval(history);

        let prompt_tokens = self.counter.count(system_prompt);
        let mut remaining = chunk_size.saturating_sub(prompt_tokens);
        let mut used = prompt_tokens;

        let mut admitted: Vec<Message> = Vec::new();
        for chat_message in processed.iter().rev() {
            let mut message = chat_message.message.clone();
            if message.role == Role::Assistant
                && let Some(clipped) = self.clip.clip(&message.content)
            {
                message.content = clipped;
            }

            let tokens = self.counter.count(&message.content);
            if tokens > remaining {
                break;
            }
            remaining -= tokens;
            used += tokens;
            admitted.push(message);
        }
        admitted.reverse();

        let dropped = processed.len() - admitted.len();
        debug!(
            chunk_size,
            prompt_tokens,
            used_tokens = used,
            remaining_tokens = remaining,
            admitted = admitted.len(),
            dropped,
            "history truncated"
        );

        let system = Message {
            id: processed.len().to_string(),
            chat_id: String::new(),
            user_id: String::new(),
            role: Role::System,
            content: system_prompt.to_string(),
            image_paths: Vec::new(),
            sequence_number: last_sequence_number(&processed) + 1,
            model: model.to_string(),
            plugin: PluginId::None,
            created_at: String::new(),
            updated_at: None,
        };

        let mut messages = Vec::with_capacity(admitted.len() + 1);
        messages.push(system);
        messages.extend(admitted);

        Ok(TruncatedHistory {
            messages,
            used_tokens: used,
            remaining_tokens: remaining,
            dropped,
        })
    }

    fn check_last_user_message(
        &self,
        history: &[ChatMessage],
        chunk_size: usize,
    ) -> Result<(), ParleyError> {
        let Some(last_user) = history.iter().rev().find(|m| m.message.role == Role::User) else {
            return Ok(());
        };
        let tokens = self.counter.count(&last_user.message.content);
        if tokens > chunk_size {
            return Err(ParleyError::OversizeInput {
                tokens,
                limit: chunk_size,
            });
        }
        Ok(())
    }
}

/// Rewrites every message except the newest that carries file items into the
/// inline query-plus-sources form, clearing its file items.
fn inline_historical_retrieval(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let last = history.len().saturating_sub(1);
    history
        .iter()
        .enumerate()
        .map(|(index, chat_message)| {
            if index == last || chat_message.file_items.is_empty() {
                return chat_message.clone();
            }
            let retrieval = build_retrieval_text(&chat_message.file_items);
            let mut message = chat_message.message.clone();
            message.content = inline_query_with_sources(&message.content, &retrieval);
            ChatMessage {
                message,
                file_items: Vec::new(),
                feedback: chat_message.feedback.clone(),
            }
        })
        .collect()
}
