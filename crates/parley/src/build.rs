// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley build` command implementation.
//!
//! Assembles the context for a payload file exactly as a turn would and
//! prints the resulting wire messages.

use std::path::Path;
use std::str::FromStr;

use parley_agent::detect_plugin;
use parley_config::ParleyConfig;
use parley_context::ContextEngine;
use parley_core::ParleyError;
use parley_core::types::{ChatPayload, PluginId, Profile};
use parley_http::{HostedClient, HttpEndpoints};
use tracing::info;

/// Run the `parley build` command.
pub async fn run_build(
    config: &ParleyConfig,
    payload_path: &Path,
    plugin: &str,
    profile_context: Option<String>,
) -> Result<(), ParleyError> {
    let rendered = build_messages(config, payload_path, plugin, profile_context).await?;
    println!("{rendered}");
    Ok(())
}

/// Pretty JSON of the wire messages for the payload at `payload_path`.
///
/// With the auto plugin selector, the hosted detector picks the plugin first.
pub async fn build_messages(
    config: &ParleyConfig,
    payload_path: &Path,
    plugin: &str,
    profile_context: Option<String>,
) -> Result<String, ParleyError> {
    let raw = tokio::fs::read_to_string(payload_path).await.map_err(|e| {
        ParleyError::Validation(format!(
            "failed to read payload {}: {e}",
            payload_path.display()
        ))
    })?;
    let payload: ChatPayload = serde_json::from_str(&raw)
        .map_err(|e| ParleyError::Validation(format!("invalid payload: {e}")))?;
    let selected = PluginId::from_str(plugin)
        .map_err(|_| ParleyError::Validation(format!("unknown plugin `{plugin}`")))?;

    let plugin = if selected == PluginId::AutoPluginSelector {
        let endpoints = HttpEndpoints::new(HostedClient::new(&config.endpoints)?);
        detect_plugin(&endpoints, &payload, selected).await
    } else {
        selected
    };

    let profile = Profile {
        user_id: String::new(),
        profile_context,
    };
    let engine = ContextEngine::new(&config.context);
    let assembled = engine.assemble(&payload, &profile, &[], plugin)?;
    info!(
        plugin = %plugin,
        chunk_size = assembled.chunk_size,
        used_tokens = assembled.used_tokens,
        dropped = assembled.dropped,
        "payload assembled"
    );

    serde_json::to_string_pretty(&assembled.messages)
        .map_err(|e| ParleyError::Internal(format!("failed to render messages: {e}")))
}
