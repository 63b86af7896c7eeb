// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stop coordination for the in-flight turn.
//!
//! Each turn gets a fresh [`CancellationToken`]. Stopping cancels it and then
//! awaits the generating flag through a [`watch`] channel, followed by a
//! short grace period that lets finalization settle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owned by the session; starts and ends turns.
#[derive(Debug)]
pub(crate) struct TurnControl {
    active: Arc<Mutex<Option<CancellationToken>>>,
    generating: watch::Sender<bool>,
    grace: Duration,
}

impl TurnControl {
    pub(crate) fn new(grace: Duration) -> Self {
        let (generating, _) = watch::channel(false);
        Self {
            active: Arc::new(Mutex::new(None)),
            generating,
            grace,
        }
    }

    /// Installs a fresh token and raises the generating flag.
    pub(crate) async fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.active.lock().await = Some(token.clone());
        self.generating.send_replace(true);
        token
    }

    /// Clears the token and lowers the generating flag.
    pub(crate) async fn finish(&self) {
        self.active.lock().await.take();
        self.generating.send_replace(false);
    }

    pub(crate) fn is_generating(&self) -> bool {
        *self.generating.borrow()
    }

    pub(crate) fn handle(&self) -> StopHandle {
        StopHandle {
            active: Arc::clone(&self.active),
            generating: self.generating.subscribe(),
            grace: self.grace,
        }
    }
}

/// Cloneable handle that stops the session's in-flight turn from any task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    active: Arc<Mutex<Option<CancellationToken>>>,
    generating: watch::Receiver<bool>,
    grace: Duration,
}

impl StopHandle {
    /// Cancels the in-flight turn and resolves once it is no longer generating,
    /// plus the grace period.
    ///
    /// Returns immediately only when no turn is active. Concurrent stops of
    /// the same turn all wait for the generating flag to drop.
    pub async fn stop(&self) {
        let token = self.active.lock().await.clone();
        let Some(token) = token else {
            return;
        };

        if token.is_cancelled() {
            debug!("stop requested, turn already cancelling");
        } else {
            debug!("stop requested, cancelling in-flight turn");
            token.cancel();
        }

        let mut generating = self.generating.clone();
        // An Err means the session is gone, which is as stopped as it gets.
        let _ = generating.wait_for(|g| !*g).await;
        tokio::time::sleep(self.grace).await;
    }

    pub fn is_generating(&self) -> bool {
        *self.generating.borrow()
    }
}
