// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events published by a chat session for the presentation layer.

use parley_core::types::ChatMessage;
use tokio::sync::mpsc;

use crate::session::TurnState;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GeneratingChanged(bool),
    FirstTokenReceived,
    /// Incremental assistant text.
    TextDelta(String),
    /// The visible message list was replaced (optimistic splice, commit, or rollback).
    MessagesReplaced(Vec<ChatMessage>),
    ToolInUse(String),
    StateChanged(TurnState),
    /// Non-fatal notice; the turn continues.
    Warning(String),
    /// Turn-level failure; the message list has been rolled back.
    Error(String),
}

/// Sending half of the event channel. Sends after the receiver is gone are
/// dropped silently.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}
