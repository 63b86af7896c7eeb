// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web ingestion, plugin detection, file extraction, and retrieval endpoints.

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::{FileExtractor, PluginDetector, Retriever, WebIngestion};
use parley_core::types::{
    ChatPayload, EmbeddingsProvider, ExtractedFile, FileItem, IngestionResponse, PluginId,
};
use tracing::debug;

use crate::client::HostedClient;
use crate::types::{
    FileExtractionRequest, FileExtractionResponse, PluginDetectorRequest, PluginDetectorResponse,
    RetrievalRequest, RetrievalResponse, WebIngestionRequest,
};

#[derive(Debug, Clone)]
pub struct HttpEndpoints {
    client: HostedClient,
}

impl HttpEndpoints {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebIngestion for HttpEndpoints {
    async fn process_url(
        &self,
        embeddings_provider: EmbeddingsProvider,
        workspace_id: &str,
        url: &str,
    ) -> Result<IngestionResponse, ParleyError> {
        let body = WebIngestionRequest {
            embeddings_provider,
            workspace_id,
            url,
        };
        let response: IngestionResponse = self
            .client
            .post_json(&self.client.paths().web_ingestion_path, &body)
            .await?;
        debug!(url, message = %response.message, "web ingestion answered");
        Ok(response)
    }
}

#[async_trait]
impl PluginDetector for HttpEndpoints {
    async fn detect(
        &self,
        payload: &ChatPayload,
        selected_plugin: PluginId,
    ) -> Result<String, ParleyError> {
        let body = PluginDetectorRequest {
            payload,
            selected_plugin,
        };
        let response: PluginDetectorResponse = self
            .client
            .post_json(&self.client.paths().plugin_detector_path, &body)
            .await?;
        Ok(response.plugin.unwrap_or_else(|| "None".to_string()))
    }
}

#[async_trait]
impl FileExtractor for HttpEndpoints {
    async fn extract(&self, file_ids: &[String]) -> Result<Vec<ExtractedFile>, ParleyError> {
        let body = FileExtractionRequest { file_ids };
        let response: FileExtractionResponse = self
            .client
            .post_json(&self.client.paths().file_extraction_path, &body)
            .await
            .map_err(|e| ParleyError::Ingestion {
                message: format!("file extraction failed: {e}"),
            })?;
        Ok(response.files)
    }
}

#[async_trait]
impl Retriever for HttpEndpoints {
    async fn retrieve(
        &self,
        user_input: &str,
        file_ids: &[String],
        embeddings_provider: EmbeddingsProvider,
        source_count: usize,
    ) -> Result<Vec<FileItem>, ParleyError> {
        let body = RetrievalRequest {
            user_input,
            file_ids,
            embeddings_provider,
            source_count,
        };
        let response: RetrievalResponse = self
            .client
            .post_json(&self.client.paths().retrieval_path, &body)
            .await?;
        debug!(files = file_ids.len(), results = response.results.len(), "retrieval answered");
        Ok(response.results)
    }
}
