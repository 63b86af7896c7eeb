// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley chat core.
//!
//! This crate provides the data model, the error taxonomy, and the collaborator
//! traits used by the context builder and the send orchestrator.

pub mod error;
pub mod models;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use models::{LlmModel, ModelProvider};
pub use types::{
    BuiltChatMessage, ChatMessage, ChatPayload, ChatSettings, FileItem, Message, MessageContent,
    PluginId, Role,
};

pub use traits::{
    ChatStream, ChatTransport, FileExtractor, Persistence, PluginDetector, Retriever,
    WebIngestion,
};
