// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn requests and optimistic history splicing.

use parley_core::error::ParleyError;
use parley_core::types::{ChatMessage, Message, PluginId, Role, last_sequence_number};

/// How a turn relates to the existing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Send,
    /// Discards history at or after `sequence_number`, then sends.
    Edit { sequence_number: i64 },
    /// Replaces the last assistant message.
    Regenerate,
    /// Extends the last assistant message.
    Continue,
}

/// One user action that starts a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub kind: TurnKind,
    pub content: Option<String>,
    /// Overrides the chat's model for this turn only.
    pub model: Option<String>,
}

impl TurnRequest {
    pub fn send(content: impl Into<String>) -> Self {
        Self {
            kind: TurnKind::Send,
            content: Some(content.into()),
            model: None,
        }
    }

    pub fn edit(content: impl Into<String>, sequence_number: i64) -> Self {
        Self {
            kind: TurnKind::Edit { sequence_number },
            content: Some(content.into()),
            model: None,
        }
    }

    pub fn regenerate() -> Self {
        Self {
            kind: TurnKind::Regenerate,
            content: None,
            model: None,
        }
    }

    pub fn continuation() -> Self {
        Self {
            kind: TurnKind::Continue,
            content: None,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn is_continuation(&self) -> bool {
        self.kind == TurnKind::Continue
    }
}

/// Fields shared by the temporary messages of one turn.
#[derive(Debug, Clone)]
pub(crate) struct Draft<'a> {
    pub chat_id: &'a str,
    pub user_id: &'a str,
    pub content: &'a str,
    pub model: &'a str,
    pub plugin: PluginId,
    pub image_paths: Vec<String>,
}

impl Draft<'_> {
    fn message(&self, role: Role, content: &str, sequence_number: i64) -> ChatMessage {
        ChatMessage::new(Message {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: self.chat_id.to_string(),
            user_id: self.user_id.to_string(),
            role,
            content: content.to_string(),
            image_paths: if role == Role::User {
                self.image_paths.clone()
            } else {
                Vec::new()
            },
            sequence_number,
            model: self.model.to_string(),
            plugin: self.plugin,
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: None,
        })
    }
}

/// Builds the history the turn is sent with.
///
/// The last entry is always the assistant message that receives streamed
/// text: a fresh placeholder for send and edit, a blank copy of the replaced
/// reply for regeneration, the existing reply for continuation.
pub(crate) fn splice_history(
    history: &[ChatMessage],
    kind: TurnKind,
    draft: &Draft<'_>,
) -> Result<Vec<ChatMessage>, ParleyError> {
    match kind {
        TurnKind::Send => Ok(append_pair(history.to_vec(), draft)),
        TurnKind::Edit { sequence_number } => {
            let kept = history
                .iter()
                .filter(|m| m.message.sequence_number < sequence_number)
                .cloned()
                .collect();
            Ok(append_pair(kept, draft))
        }
        TurnKind::Regenerate => {
            let mut sent = history.to_vec();
            let replaced = match sent.pop() {
                Some(last) if last.message.role == Role::Assistant => last,
                _ => {
                    return Err(ParleyError::Validation(
                        "no assistant message to regenerate".into(),
                    ));
                }
            };
            let mut placeholder = draft.message(Role::Assistant, "", replaced.message.sequence_number);
            placeholder.message.id = replaced.message.id;
            placeholder.message.chat_id = replaced.message.chat_id;
            sent.push(placeholder);
            Ok(sent)
        }
        TurnKind::Continue => match history.last() {
            Some(last) if last.message.role == Role::Assistant => Ok(history.to_vec()),
            _ => Err(ParleyError::Validation(
                "no assistant message to continue".into(),
            )),
        },
    }
}

fn append_pair(mut sent: Vec<ChatMessage>, draft: &Draft<'_>) -> Vec<ChatMessage> {
    let next = last_sequence_number(&sent) + 1;
    sent.push(draft.message(Role::User, draft.content, next));
    sent.push(draft.message(Role::Assistant, "", next + 1));
    sent
}

/// Appends streamed text to the receiving assistant message.
pub(crate) fn apply_delta(history: &mut [ChatMessage], delta: &str) {
    if let Some(last) = history.last_mut() {
        last.message.content.push_str(delta);
    }
}
