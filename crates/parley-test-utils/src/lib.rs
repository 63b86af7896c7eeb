// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides in-memory collaborators and a session harness for fast,
//! deterministic tests without a database or hosted backend.
//!
//! # Components
//!
//! - [`MemoryPersistence`] - In-memory chat, message, feedback, and file rows
//! - [`MockTransport`] - Scripted streaming replies
//! - [`MockEndpoints`] - Web ingestion, plugin detection, file extraction, and retrieval
//! - [`SessionHarness`] - A ready-to-use [`parley_agent::ChatSession`] wired to the mocks

pub mod harness;
pub mod memory_persistence;
pub mod mock_endpoints;
pub mod mock_transport;

pub use harness::{SessionHarness, SessionHarnessBuilder, WordCounter};
pub use memory_persistence::{FailPoint, MemoryPersistence};
pub use mock_endpoints::{MockEndpoints, RetrievalCall};
pub use mock_transport::{MockTransport, RecordedCall, Script};
