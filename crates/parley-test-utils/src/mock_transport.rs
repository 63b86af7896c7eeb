// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport with scripted streaming replies.
//!
//! Scripts are popped from a FIFO queue, one per call. When the queue is
//! empty, a single "mock response" chunk is streamed. Every call is recorded
//! for assertions on the request body.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::{ChatStream, ChatTransport};
use parley_core::types::{ExtractedFile, HostedChatRequest, PluginId, StreamChunk};

/// How the transport answers one call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Streams the chunks, then ends with `finish_reason`.
    Reply {
        chunks: Vec<String>,
        finish_reason: Option<String>,
    },
    /// Fails before any chunk is produced.
    Fail(String),
    /// Streams the chunks, then yields an error.
    FailMidStream { chunks: Vec<String>, message: String },
    /// Streams the chunks, then never ends.
    Hang { chunks: Vec<String> },
}

/// One recorded transport call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: HostedChatRequest,
    /// `Some` for plugin chat calls.
    pub plugin: Option<PluginId>,
    pub file_data: Vec<ExtractedFile>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn owned(chunks: &[&str]) -> Vec<String> {
    chunks.iter().map(|c| c.to_string()).collect()
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport pre-loaded with single-chunk replies.
    pub fn with_replies(replies: Vec<String>) -> Self {
        let scripts = replies
            .into_iter()
            .map(|text| Script::Reply {
                chunks: vec![text],
                finish_reason: None,
            })
            .collect();
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            calls: Arc::default(),
        }
    }

    pub async fn push(&self, script: Script) {
        self.scripts.lock().await.push_back(script);
    }

    /// Queue a reply streamed as the given chunks.
    pub async fn push_chunks(&self, chunks: &[&str]) {
        self.push(Script::Reply {
            chunks: owned(chunks),
            finish_reason: None,
        })
        .await;
    }

    pub async fn push_failure(&self, message: &str) {
        self.push(Script::Fail(message.to_string())).await;
    }

    pub async fn push_mid_stream_failure(&self, chunks: &[&str], message: &str) {
        self.push(Script::FailMidStream {
            chunks: owned(chunks),
            message: message.to_string(),
        })
        .await;
    }

    pub async fn push_hang(&self, chunks: &[&str]) {
        self.push(Script::Hang {
            chunks: owned(chunks),
        })
        .await;
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().await.last().cloned()
    }

    async fn answer(&self, call: RecordedCall) -> Result<ChatStream, ParleyError> {
        self.calls.lock().await.push(call);
        let script = self.scripts.lock().await.pop_front().unwrap_or(Script::Reply {
            chunks: vec!["mock response".to_string()],
            finish_reason: None,
        });

        let text = |chunks: Vec<String>| {
            stream::iter(chunks.into_iter().map(|text| {
                Ok::<_, ParleyError>(StreamChunk {
                    text: Some(text),
                    finish_reason: None,
                })
            }))
        };

        let stream: ChatStream = match script {
            Script::Reply {
                chunks,
                finish_reason,
            } => Box::pin(text(chunks).chain(stream::once(async move {
                Ok::<_, ParleyError>(StreamChunk {
                    text: None,
                    finish_reason: Some(finish_reason.unwrap_or_else(|| "stop".to_string())),
                })
            }))),
            Script::Fail(message) => return Err(ParleyError::transport(message)),
            Script::FailMidStream { chunks, message } => Box::pin(
                text(chunks).chain(stream::once(async move { Err(ParleyError::transport(message)) })),
            ),
            Script::Hang { chunks } => Box::pin(text(chunks).chain(stream::pending())),
        };
        Ok(stream)
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn stream_chat(&self, request: HostedChatRequest) -> Result<ChatStream, ParleyError> {
        self.answer(RecordedCall {
            request,
            plugin: None,
            file_data: Vec::new(),
        })
        .await
    }

    async fn stream_plugin_chat(
        &self,
        request: HostedChatRequest,
        plugin: PluginId,
        file_data: Vec<ExtractedFile>,
    ) -> Result<ChatStream, ParleyError> {
        self.answer(RecordedCall {
            request,
            plugin: Some(plugin),
            file_data,
        })
        .await
    }
}
