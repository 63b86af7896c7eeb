// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly.

use parley_core::types::{Assistant, ChatSettings, PluginId};

/// Stock prompt that is never echoed back as user instructions.
pub const DEFAULT_PROMPT: &str = "You are a friendly, helpful AI assistant.";

const WEB_SCRAPER_HELP: &str = "\n\nWeb Scraper Plugin:\n\
    The user can provide one or more URLs in their message. The content of each \
    page is fetched and made available to you. Summarize or answer questions about \
    that content, and say so when a page could not be read.";

/// Inputs to the system prompt, already filtered by the chat's include flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptParts<'a> {
    pub persona: Option<&'a str>,
    pub profile_context: &'a str,
    pub workspace_instructions: &'a str,
    pub user_prompt: &'a str,
    pub plugin: PluginId,
}

impl<'a> PromptParts<'a> {
    /// Applies the include flags of `settings`.
    pub fn from_settings(
        settings: &'a ChatSettings,
        assistant: Option<&'a Assistant>,
        profile_context: Option<&'a str>,
        workspace_instructions: &'a str,
        plugin: PluginId,
    ) -> Self {
        Self {
            persona: assistant.map(|a| a.name.as_str()),
            profile_context: if settings.include_profile_context {
                profile_context.unwrap_or_default()
            } else {
                ""
            },
            workspace_instructions: if settings.include_workspace_instructions {
                workspace_instructions
            } else {
                ""
            },
            user_prompt: &settings.prompt,
            plugin,
        }
    }
}

/// Concatenates persona, profile, workspace and user sections in that order.
///
/// Empty profile and workspace sections are skipped. User instructions are
/// omitted only when the prompt is exactly [`DEFAULT_PROMPT`].
pub fn build_system_prompt(parts: &PromptParts<'_>) -> String {
    let mut prompt = String::new();

    if let Some(name) = parts.persona {
        prompt.push_str(&format!(
            "<INJECT ROLE>\nYou are not an AI. You are {name}.\n</INJECT ROLE>\n\n"
        ));
    }
    if !parts.profile_context.is_empty() {
        prompt.push_str(&format!("User Info:\n{}\n\n", parts.profile_context));
    }
    if !parts.workspace_instructions.is_empty() {
        prompt.push_str(&format!(
            "System Instructions:\n{}\n\n",
            parts.workspace_instructions
        ));
    }
    if parts.user_prompt != DEFAULT_PROMPT {
        prompt.push_str(&format!("User Instructions:\n{}", parts.user_prompt));
    }
    if parts.plugin == PluginId::WebScraper {
        prompt.push_str(WEB_SCRAPER_HELP);
    }

    prompt
}
