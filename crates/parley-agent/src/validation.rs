// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-flight checks run before a turn touches any state.

use parley_core::error::ParleyError;
use parley_core::models::LlmModel;
use parley_core::types::{ChatSettings, Profile, Workspace};

/// What a turn is about to send, as seen by [`validate_chat_settings`].
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub content: Option<&'a str>,
    pub is_continuation: bool,
    pub has_images: bool,
}

pub fn validate_chat_settings(
    settings: &ChatSettings,
    model: Option<&LlmModel>,
    profile: Option<&Profile>,
    workspace: Option<&Workspace>,
    input: TurnInput<'_>,
) -> Result<(), ParleyError> {
    let Some(model) = model else {
        return Err(ParleyError::Validation(format!(
            "model `{}` not found",
            settings.model
        )));
    };
    if profile.is_none() {
        return Err(ParleyError::Validation("profile not found".into()));
    }
    if workspace.is_none() {
        return Err(ParleyError::Validation("workspace not found".into()));
    }
    if !input.is_continuation && input.content.is_none_or(|c| c.trim().is_empty()) {
        return Err(ParleyError::Validation("message content not found".into()));
    }
    if input.has_images && !model.image_input {
        return Err(ParleyError::Validation(format!(
            "model `{}` does not accept images",
            model.model_id
        )));
    }
    Ok(())
}
