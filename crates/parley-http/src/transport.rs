// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted chat transports over HTTP.

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::{ChatStream, ChatTransport};
use parley_core::types::{ExtractedFile, HostedChatRequest, PluginId};
use tracing::debug;

use crate::client::HostedClient;
use crate::stream::text_stream;
use crate::types::PluginChatRequest;

/// Streams replies from the hosted chat and plugin chat endpoints.
///
/// Dropping the returned stream closes the connection, which is how a
/// stopped turn cancels the request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HostedClient,
}

impl HttpTransport {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn stream_chat(&self, request: HostedChatRequest) -> Result<ChatStream, ParleyError> {
        debug!(
            model = %request.chat_settings.model,
            messages = request.messages.len(),
            "opening hosted chat stream"
        );
        let response = self
            .client
            .post(&self.client.paths().chat_path, &request)
            .await?;
        Ok(text_stream(response))
    }

    async fn stream_plugin_chat(
        &self,
        request: HostedChatRequest,
        plugin: PluginId,
        file_data: Vec<ExtractedFile>,
    ) -> Result<ChatStream, ParleyError> {
        debug!(
            plugin = %plugin,
            files = file_data.len(),
            messages = request.messages.len(),
            "opening hosted plugin chat stream"
        );
        let body = PluginChatRequest {
            request: &request,
            selected_plugin: plugin,
            file_data: &file_data,
        };
        let response = self
            .client
            .post(&self.client.paths().plugins_chat_path, &body)
            .await?;
        Ok(text_stream(response))
    }
}
