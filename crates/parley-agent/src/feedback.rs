// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message feedback.

use parley_core::types::{ChatMessage, FeedbackInsert, FeedbackKind};

/// A user's rating of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub message_id: String,
    pub feedback: FeedbackKind,
    pub reason: Option<String>,
    pub detailed_feedback: Option<String>,
    pub allow_email: Option<bool>,
    pub allow_sharing: Option<bool>,
}

impl FeedbackRequest {
    pub fn new(message_id: impl Into<String>, feedback: FeedbackKind) -> Self {
        Self {
            message_id: message_id.into(),
            feedback,
            reason: None,
            detailed_feedback: None,
            allow_email: None,
            allow_sharing: None,
        }
    }
}

/// Builds the insert row for `request` against `target`.
///
/// Missing reason and details fall back to the message's previous feedback,
/// whose creation time is also kept.
pub fn build_feedback_insert(
    target: &ChatMessage,
    request: &FeedbackRequest,
    now: &str,
) -> FeedbackInsert {
    let previous = target.feedback.as_ref();
    FeedbackInsert {
        message_id: target.message.id.clone(),
        chat_id: target.message.chat_id.clone(),
        user_id: target.message.user_id.clone(),
        feedback: request.feedback,
        reason: request
            .reason
            .clone()
            .or_else(|| previous.and_then(|f| f.reason.clone())),
        detailed_feedback: request
            .detailed_feedback
            .clone()
            .or_else(|| previous.and_then(|f| f.detailed_feedback.clone())),
        model: target.message.model.clone(),
        created_at: previous
            .map(|f| f.created_at.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| now.to_string()),
        updated_at: now.to_string(),
        sequence_number: target.message.sequence_number,
        allow_email: request.allow_email,
        allow_sharing: request.allow_sharing,
        has_files: !target.file_items.is_empty(),
        plugin: target.message.plugin,
    }
}
