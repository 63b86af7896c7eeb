// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley chat core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Prompt assembly and history budgeting.
    #[serde(default)]
    pub context: ContextConfig,

    /// Turn lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Hosted backend endpoints.
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Identity and logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name reported in logs and by `parley config`.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Context window budgeting.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Assistant messages longer than this many characters are clipped.
    #[serde(default = "default_message_size_limit")]
    pub message_size_limit: usize,

    /// Characters kept from a clipped assistant message.
    #[serde(default = "default_message_size_keep")]
    pub message_size_keep: usize,

    /// Marker appended to a clipped assistant message.
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,

    /// Token ceiling forced whenever any plugin is active.
    #[serde(default = "default_plugin_chunk_size")]
    pub plugin_chunk_size: usize,

    /// Per-model token ceilings overriding the chat's context length.
    #[serde(default = "default_model_chunk_sizes")]
    pub model_chunk_sizes: BTreeMap<String, usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            message_size_limit: default_message_size_limit(),
            message_size_keep: default_message_size_keep(),
            truncation_marker: default_truncation_marker(),
            plugin_chunk_size: default_plugin_chunk_size(),
            model_chunk_sizes: default_model_chunk_sizes(),
        }
    }
}

fn default_message_size_limit() -> usize {
    12_000
}

fn default_message_size_keep() -> usize {
    2_000
}

fn default_truncation_marker() -> String {
    "\n... [output truncated]".to_string()
}

fn default_plugin_chunk_size() -> usize {
    8_000
}

fn default_model_chunk_sizes() -> BTreeMap<String, usize> {
    // mistral-* are served behind a gateway capped at 8192 tokens.
    BTreeMap::from([
        ("gpt-4-turbo-preview".to_string(), 12_000),
        ("mistral-large".to_string(), 8_000),
        ("mistral-medium".to_string(), 8_000),
    ])
}

/// Turn lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Settle time after a stopped turn reports it is no longer generating.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    /// Number of file chunks requested from the retriever.
    #[serde(default = "default_source_count")]
    pub source_count: usize,

    /// Whether attached files are searched on each turn.
    #[serde(default = "default_true")]
    pub use_retrieval: bool,

    /// Maximum characters of the first message used as a new chat's name.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_grace_ms: default_stop_grace_ms(),
            source_count: default_source_count(),
            use_retrieval: default_true(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

fn default_stop_grace_ms() -> u64 {
    100
}

fn default_source_count() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_title_max_chars() -> usize {
    100
}

/// Hosted backend endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Scheme, host and port of the hosted backend. Paths below are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request, if set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default hosted chat stream.
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Plugin chat stream, used when a concrete plugin handles the turn.
    #[serde(default = "default_plugins_chat_path")]
    pub plugins_chat_path: String,

    /// Embeds a URL found in a message as a file.
    #[serde(default = "default_web_ingestion_path")]
    pub web_ingestion_path: String,

    /// Classifies a payload for the auto plugin selector.
    #[serde(default = "default_plugin_detector_path")]
    pub plugin_detector_path: String,

    /// Turns attached files into plain text for file-context plugins.
    #[serde(default = "default_file_extraction_path")]
    pub file_extraction_path: String,

    /// Returns the file chunks closest to the user's input.
    #[serde(default = "default_retrieval_path")]
    pub retrieval_path: String,

    /// TCP connect timeout. Streams themselves have no deadline.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_path: default_chat_path(),
            plugins_chat_path: default_plugins_chat_path(),
            web_ingestion_path: default_web_ingestion_path(),
            plugin_detector_path: default_plugin_detector_path(),
            file_extraction_path: default_file_extraction_path(),
            retrieval_path: default_retrieval_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_chat_path() -> String {
    "/api/chat".to_string()
}

fn default_plugins_chat_path() -> String {
    "/api/chat/plugins".to_string()
}

fn default_web_ingestion_path() -> String {
    "/api/retrieval/process/web".to_string()
}

fn default_plugin_detector_path() -> String {
    "/api/v2/chat/plugin-detector".to_string()
}

fn default_file_extraction_path() -> String {
    "/api/retrieval/file-2v".to_string()
}

fn default_retrieval_path() -> String {
    "/api/retrieval/retrieve".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}
