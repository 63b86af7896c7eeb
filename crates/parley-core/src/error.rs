// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley chat core.

use thiserror::Error;

/// The primary error type used across Parley collaborators and turn logic.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Chat settings, model selection, or message content rejected before any
    /// network call or state mutation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The most recent user message alone exceeds the model's chunk size.
    #[error("The message you submitted was too long, please submit something shorter.")]
    OversizeInput { tokens: usize, limit: usize },

    /// Network or streaming failure talking to a hosted transport.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence collaborator failure (chat, message, feedback, file rows).
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A URL failed to embed or a file extraction call failed. Never fatal to
    /// a turn; surfaced to the user as a warning.
    #[error("ingestion warning: {message}")]
    Ingestion { message: String },

    /// The in-flight operation was cancelled by a stop request.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration errors (invalid values, missing sections).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        ParleyError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a persistence error without an underlying source.
    pub fn persistence(message: impl Into<String>) -> Self {
        ParleyError::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// True for failures that only warrant a user-facing warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ParleyError::Ingestion { .. })
    }
}
