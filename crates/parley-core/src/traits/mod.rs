// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the send orchestrator.
//!
//! Every external system the chat core talks to sits behind one of these
//! traits and uses `#[async_trait]` for dynamic dispatch.

pub mod endpoints;
pub mod persistence;
pub mod transport;

pub use endpoints::{FileExtractor, PluginDetector, Retriever, WebIngestion};
pub use persistence::Persistence;
pub use transport::{ChatStream, ChatTransport};
