// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client for the hosted backend.
//!
//! Provides [`HostedClient`] which handles URL construction, bearer
//! authentication, and error body decoding. Requests are never retried; the
//! user re-issues the action instead.

use std::time::Duration;

use parley_config::model::EndpointsConfig;
use parley_core::ParleyError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::ApiErrorBody;

#[derive(Debug, Clone)]
pub struct HostedClient {
    client: reqwest::Client,
    base_url: String,
    paths: EndpointsConfig,
}

impl HostedClient {
    /// Builds a client for `config`.
    ///
    /// Only the connect phase has a timeout: streamed replies may run for as
    /// long as the model keeps producing text.
    pub fn new(config: &EndpointsConfig) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ParleyError::Config(format!("invalid API key header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ParleyError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            paths: config.clone(),
        })
    }

    pub fn paths(&self) -> &EndpointsConfig {
        &self.paths
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs `body` and returns the response once its status is a success.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ParleyError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ParleyError::Transport {
                message: format!("HTTP request to {path} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, path, "response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(api_err) if api_err.text().is_some() => {
                format!("{path} returned {status}: {}", api_err.text().unwrap_or_default())
            }
            _ => format!("{path} returned {status}: {body}"),
        };
        Err(ParleyError::transport(message))
    }

    /// POSTs `body` and decodes a JSON answer.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ParleyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.post(path, body).await?;
        let text = response.text().await.map_err(|e| ParleyError::Transport {
            message: format!("failed to read response body from {path}: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&text).map_err(|e| ParleyError::Transport {
            message: format!("failed to parse response from {path}: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
