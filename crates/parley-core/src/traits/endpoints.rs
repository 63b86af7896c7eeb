// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auxiliary endpoints consulted while preparing a turn.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{
    ChatPayload, EmbeddingsProvider, ExtractedFile, FileItem, IngestionResponse, PluginId,
};

/// Fetches and embeds a web page, returning the new file id on success.
#[async_trait]
pub trait WebIngestion: Send + Sync {
    async fn process_url(
        &self,
        embeddings_provider: EmbeddingsProvider,
        workspace_id: &str,
        url: &str,
    ) -> Result<IngestionResponse, ParleyError>;
}

/// Classifies a payload into the plugin that should handle it.
#[async_trait]
pub trait PluginDetector: Send + Sync {
    /// Returns the raw plugin string; the literal `"None"` means no override.
    async fn detect(
        &self,
        payload: &ChatPayload,
        selected_plugin: PluginId,
    ) -> Result<String, ParleyError>;
}

/// Converts uploaded files to plain text for plugin context.
#[async_trait]
pub trait FileExtractor: Send + Sync {
    async fn extract(&self, file_ids: &[String]) -> Result<Vec<ExtractedFile>, ParleyError>;
}

/// Semantic search over attached files.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        user_input: &str,
        file_ids: &[String],
        embeddings_provider: EmbeddingsProvider,
        source_count: usize,
    ) -> Result<Vec<FileItem>, ParleyError>;
}
