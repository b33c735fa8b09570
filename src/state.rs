//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the endpoints every new panel session dials and a count of live
//! sessions. Sessions own their relay; nothing else is shared between them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Endpoints;

#[derive(Clone)]
pub struct AppState {
    pub endpoints: Arc<Endpoints>,
    sessions: Arc<AtomicUsize>,
}

impl AppState {
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Count a panel session as live until the guard drops.
    #[must_use]
    pub fn open_session(&self) -> SessionGuard {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            sessions: Arc::clone(&self.sessions),
        }
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

/// Live-session marker returned by [`AppState::open_session`].
pub struct SessionGuard {
    sessions: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
