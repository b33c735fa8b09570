//! Panel host seam.
//!
//! The relay never talks to a UI directly. Whatever hosts the panel (the
//! `/panel` WebSocket endpoint, the terminal console) receives relay output
//! through a [`PanelHost`], and feeds panel input back as relay events.

use frames::PanelEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::badge::Badge;

/// Relay output a panel may leave undrained before it counts as gone.
pub const PANEL_QUEUE_CAPACITY: usize = 1024;

/// Capabilities the relay needs from the panel's host.
pub trait PanelHost: Send + 'static {
    /// Deliver one message to the panel script.
    ///
    /// Returns `false` once the panel is gone; the relay stops on that signal.
    fn post_message(&mut self, event: PanelEvent) -> bool;

    /// Show `badge` on the panel's tab.
    fn set_badge(&mut self, badge: Badge) -> bool {
        self.post_message(badge.into())
    }
}

/// Host adapter that queues panel messages for a transport task to drain.
///
/// The queue is bounded. A panel that falls [`PANEL_QUEUE_CAPACITY`]
/// messages behind is treated as detached.
pub struct ChannelHost {
    tx: mpsc::Sender<PanelEvent>,
}

impl ChannelHost {
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<PanelEvent>) {
        Self::with_capacity(PANEL_QUEUE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<PanelEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl PanelHost for ChannelHost {
    fn post_message(&mut self, event: PanelEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(capacity = self.tx.max_capacity(), "host: panel queue full, detaching");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

#[cfg(test)]
#[path = "host_test.rs"]
mod tests;
