// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock hosted endpoints: web ingestion, plugin detection, file extraction,
//! and retrieval.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::{FileExtractor, PluginDetector, Retriever, WebIngestion};
use parley_core::types::{
    ChatPayload, EmbeddingsProvider, ExtractedFile, FileItem, IngestionResponse, PluginId,
};

/// Arguments of one retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalCall {
    pub user_input: String,
    pub file_ids: Vec<String>,
    pub source_count: usize,
}

struct State {
    ingested: HashMap<String, String>,
    ingested_urls: Vec<String>,
    detected_plugin: String,
    detect_calls: Vec<PluginId>,
    extraction_failure: Option<String>,
    extraction_calls: Vec<Vec<String>>,
    retrieval_items: Vec<FileItem>,
    retrieval_failure: Option<String>,
    retrieval_calls: Vec<RetrievalCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ingested: HashMap::new(),
            ingested_urls: Vec::new(),
            detected_plugin: "None".to_string(),
            detect_calls: Vec::new(),
            extraction_failure: None,
            extraction_calls: Vec::new(),
            retrieval_items: Vec::new(),
            retrieval_failure: None,
            retrieval_calls: Vec::new(),
        }
    }
}

/// One mock standing in for every hosted endpoint except chat.
#[derive(Clone, Default)]
pub struct MockEndpoints {
    state: Arc<Mutex<State>>,
}

impl MockEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `url` embed successfully into `file_id`. Other URLs are rejected.
    pub async fn ingest_ok(&self, url: &str, file_id: &str) {
        self.state
            .lock()
            .await
            .ingested
            .insert(url.to_string(), file_id.to_string());
    }

    pub async fn ingested_urls(&self) -> Vec<String> {
        self.state.lock().await.ingested_urls.clone()
    }

    /// Raw answer returned by the detector (default `"None"`).
    pub async fn set_detected_plugin(&self, plugin: &str) {
        self.state.lock().await.detected_plugin = plugin.to_string();
    }

    pub async fn detect_calls(&self) -> Vec<PluginId> {
        self.state.lock().await.detect_calls.clone()
    }

    pub async fn fail_extraction(&self, message: &str) {
        self.state.lock().await.extraction_failure = Some(message.to_string());
    }

    pub async fn extraction_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().await.extraction_calls.clone()
    }

    pub async fn set_retrieval(&self, items: Vec<FileItem>) {
        self.state.lock().await.retrieval_items = items;
    }

    pub async fn fail_retrieval(&self, message: &str) {
        self.state.lock().await.retrieval_failure = Some(message.to_string());
    }

    pub async fn retrieval_calls(&self) -> Vec<RetrievalCall> {
        self.state.lock().await.retrieval_calls.clone()
    }
}

#[async_trait]
impl WebIngestion for MockEndpoints {
    async fn process_url(
        &self,
        _embeddings_provider: EmbeddingsProvider,
        _workspace_id: &str,
        url: &str,
    ) -> Result<IngestionResponse, ParleyError> {
        let mut state = self.state.lock().await;
        state.ingested_urls.push(url.to_string());
        Ok(match state.ingested.get(url) {
            Some(file_id) => IngestionResponse {
                message: IngestionResponse::SUCCESS.to_string(),
                file_id: Some(file_id.clone()),
            },
            None => IngestionResponse {
                message: "Failed to fetch url".to_string(),
                file_id: None,
            },
        })
    }
}

#[async_trait]
impl PluginDetector for MockEndpoints {
    async fn detect(
        &self,
        _payload: &ChatPayload,
        selected_plugin: PluginId,
    ) -> Result<String, ParleyError> {
        let mut state = self.state.lock().await;
        state.detect_calls.push(selected_plugin);
        Ok(state.detected_plugin.clone())
    }
}

#[async_trait]
impl FileExtractor for MockEndpoints {
    async fn extract(&self, file_ids: &[String]) -> Result<Vec<ExtractedFile>, ParleyError> {
        let mut state = self.state.lock().await;
        state.extraction_calls.push(file_ids.to_vec());
        if let Some(message) = &state.extraction_failure {
            return Err(ParleyError::Ingestion {
                message: message.clone(),
            });
        }
        Ok(file_ids
            .iter()
            .map(|id| ExtractedFile {
                file_name: id.clone(),
                file_content: format!("contents of {id}"),
            })
            .collect())
    }
}

#[async_trait]
impl Retriever for MockEndpoints {
    async fn retrieve(
        &self,
        user_input: &str,
        file_ids: &[String],
        _embeddings_provider: EmbeddingsProvider,
        source_count: usize,
    ) -> Result<Vec<FileItem>, ParleyError> {
        let mut state = self.state.lock().await;
        state.retrieval_calls.push(RetrievalCall {
            user_input: user_input.to_string(),
            file_ids: file_ids.to_vec(),
            source_count,
        });
        if let Some(message) = &state.retrieval_failure {
            return Err(ParleyError::transport(message.clone()));
        }
        Ok(state
            .retrieval_items
            .iter()
            .take(source_count)
            .cloned()
            .collect())
    }
}
