// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies of the hosted endpoints.

use parley_core::types::{
    ChatPayload, EmbeddingsProvider, ExtractedFile, FileItem, HostedChatRequest, PluginId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginChatRequest<'a> {
    #[serde(flatten)]
    pub request: &'a HostedChatRequest,
    pub selected_plugin: PluginId,
    pub file_data: &'a [ExtractedFile],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebIngestionRequest<'a> {
    pub embeddings_provider: EmbeddingsProvider,
    pub workspace_id: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDetectorRequest<'a> {
    pub payload: &'a ChatPayload,
    pub selected_plugin: PluginId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginDetectorResponse {
    #[serde(default)]
    pub plugin: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtractionRequest<'a> {
    pub file_ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileExtractionResponse {
    #[serde(default)]
    pub files: Vec<ExtractedFile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalRequest<'a> {
    pub user_input: &'a str,
    pub file_ids: &'a [String],
    pub embeddings_provider: EmbeddingsProvider,
    pub source_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalResponse {
    #[serde(default)]
    pub results: Vec<FileItem>,
}

/// Error body returned by the hosted endpoints, in either of its two shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
