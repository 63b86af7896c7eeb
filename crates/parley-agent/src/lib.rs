// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send orchestration and chat session management for Parley.
//!
//! The [`ChatSession`] is the single owner of a chat's state. Each turn:
//! - Validates settings, model, and input
//! - Ingests URLs found in the message as files
//! - Splices temporary messages into the history
//! - Retrieves file chunks and routes to a plugin when asked
//! - Streams the reply into the last assistant message
//! - Persists the chat and messages, or rolls back on failure

pub mod context;
pub mod events;
pub mod feedback;
pub mod routing;
pub mod session;
pub mod stop;
pub mod turn;
pub mod validation;
pub mod web;

pub use context::{ComposerState, SessionContext};
pub use events::{EventSink, SessionEvent};
pub use feedback::{FeedbackRequest, build_feedback_insert};
pub use routing::{FILE_CONTEXT_PLUGINS, detect_plugin, fetch_file_context, is_file_command};
pub use session::{ABORTED_FINISH_REASON, ChatSession, Collaborators, TurnOutcome, TurnState};
pub use stop::StopHandle;
pub use turn::{TurnKind, TurnRequest};
pub use validation::{TurnInput, validate_chat_settings};
pub use web::{IngestionReport, extract_urls, ingest_urls};
