// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted chat transports (default chat and plugin chat).

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ParleyError;
use crate::types::{ExtractedFile, HostedChatRequest, PluginId, StreamChunk};

/// Stream of response increments produced by a transport.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ParleyError>> + Send>>;

/// Streams model output for a fully built request.
///
/// Cancellation is cooperative: the caller stops polling the returned stream
/// (and drops it) when the turn's cancellation token fires. Implementations
/// must release the underlying connection on drop.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Default hosted chat.
    async fn stream_chat(&self, request: HostedChatRequest) -> Result<ChatStream, ParleyError>;

    /// Hosted plugin chat; `file_data` carries text extracted from attached files.
    async fn stream_plugin_chat(
        &self,
        request: HostedChatRequest,
        plugin: PluginId,
        file_data: Vec<ExtractedFile>,
    ) -> Result<ChatStream, ParleyError>;
}
