//! Relay actor, one per panel session.
//!
//! DESIGN
//! ======
//! The relay owns everything a panel session needs: both feed connections,
//! the unread counter and the panel's visibility. A single event queue drives
//! it, so panel requests and socket events are handled one at a time:
//! - Panel requests → upstream sends, endpoint switch, visibility
//! - Socket events from a current connection → state change + panel message
//! - Socket events from a replaced connection → dropped
//!
//! Feed frames reach the panel as the raw text received. They are parsed
//! only to reject malformed payloads, which are dropped and logged.
//!
//! LIFECYCLE
//! =========
//! 1. `Relay::new` → `run` dials the chat and game endpoints
//! 2. Events are handled until `Shutdown` or the panel goes away
//! 3. Teardown closes both connections and hands the host back

use std::ops::ControlFlow;
use std::time::Duration;

use frames::{ChatMessage, ConnectionState, Feed, GameCommand, PanelEvent, PanelRequest};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::badge::{Badge, UnreadCounter};
use crate::config::{ConfigError, Endpoints, validate_endpoint};
use crate::host::PanelHost;
use crate::socket::{Connection, SocketEvent};

pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// How long teardown waits for each close frame to go out.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

// =============================================================================
// ERRORS & EVENTS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{feed} connection is {state}")]
    NotOpen { feed: Feed, state: ConnectionState },
    #[error(transparent)]
    InvalidEndpoint(#[from] ConfigError),
    #[error("relay has stopped")]
    Stopped,
}

/// Everything the relay reacts to.
#[derive(Debug)]
pub enum RelayEvent {
    Panel(PanelRequest),
    Socket {
        feed: Feed,
        id: Uuid,
        event: SocketEvent,
    },
    Shutdown,
}

/// Cloneable sender side of a relay's event queue.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayEvent>,
}

impl RelayHandle {
    /// Queue a panel request.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Stopped`] once the relay has exited.
    pub async fn submit(&self, request: PanelRequest) -> Result<(), RelayError> {
        self.tx
            .send(RelayEvent::Panel(request))
            .await
            .map_err(|_| RelayError::Stopped)
    }

    /// Ask the relay to tear down. A relay that already stopped is fine.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(RelayEvent::Shutdown).await;
    }
}

// =============================================================================
// RELAY
// =============================================================================

pub struct Relay<H> {
    host: H,
    endpoints: Endpoints,
    chat: Option<Connection>,
    game: Option<Connection>,
    unread: UnreadCounter,
    visible: bool,
    panel_attached: bool,
    tx: mpsc::Sender<RelayEvent>,
    inbox: mpsc::Receiver<RelayEvent>,
}

impl<H: PanelHost> Relay<H> {
    /// Build a relay for a freshly created, visible panel.
    pub fn new(host: H, endpoints: Endpoints) -> Self {
        let (tx, inbox) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        Self {
            host,
            endpoints,
            chat: None,
            game: None,
            unread: UnreadCounter::default(),
            visible: true,
            panel_attached: true,
            tx,
            inbox,
        }
    }

    #[must_use]
    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            tx: self.tx.clone(),
        }
    }

    /// Connect both feeds and process events until the session ends.
    pub async fn run(mut self) -> H {
        info!(chat = %self.endpoints.chat, game = %self.endpoints.game, "relay: session started");
        let chat_url = self.endpoints.chat.clone();
        let game_url = self.endpoints.game.clone();
        self.connect_chat(chat_url);
        self.connect_game(game_url);

        loop {
            let Some(event) = self.inbox.recv().await else {
                break;
            };
            if self.dispatch(event).is_break() {
                break;
            }
        }

        self.teardown().await;
        self.host
    }

    /// Handle one event. `Break` means the session is over.
    pub fn dispatch(&mut self, event: RelayEvent) -> ControlFlow<()> {
        match event {
            RelayEvent::Panel(request) => self.handle_panel(request),
            RelayEvent::Socket { feed, id, event } => self.handle_socket(feed, id, event),
            RelayEvent::Shutdown => {
                info!("relay: shutdown requested");
                return ControlFlow::Break(());
            }
        }

        if self.panel_attached {
            ControlFlow::Continue(())
        } else {
            info!("relay: panel detached");
            ControlFlow::Break(())
        }
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Replace the chat connection with a new one to `url`.
    pub fn connect_chat(&mut self, url: impl Into<String>) {
        self.connect(Feed::Chat, url.into());
    }

    /// Replace the game connection with a new one to `url`.
    pub fn connect_game(&mut self, url: impl Into<String>) {
        self.connect(Feed::Game, url.into());
    }

    /// Point the chat feed at another endpoint and clear the panel's log.
    ///
    /// Invalid URLs are refused and the current connection is kept.
    pub fn switch_chat_endpoint(&mut self, url: String) {
        if let Err(e) = validate_endpoint(&url) {
            warn!(%url, error = %e, "relay: refused chat endpoint switch");
            self.post(PanelEvent::DeliveryFailed {
                feed: Feed::Chat,
                reason: RelayError::from(e).to_string(),
            });
            return;
        }

        info!(%url, "relay: switching chat endpoint");
        self.post(PanelEvent::ClearChat);
        self.connect_chat(url);
    }

    pub fn send_chat(&mut self, message: &ChatMessage) {
        self.deliver(Feed::Chat, frames::encode(message));
    }

    pub fn send_game(&mut self, command: GameCommand) {
        self.deliver(Feed::Game, frames::encode(&command));
    }

    /// Record a host visibility change and refresh the badge.
    pub fn set_visible(&mut self, visible: bool) {
        debug!(visible, "relay: panel visibility changed");
        self.visible = visible;
        let badge = self.unread.visibility_changed(visible);
        self.set_badge(badge);
    }

    #[must_use]
    pub fn state(&self, feed: Feed) -> ConnectionState {
        self.slot(feed)
            .map_or(ConnectionState::Disconnected, Connection::state)
    }

    #[must_use]
    pub fn unread(&self) -> u32 {
        self.unread.count()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn handle_panel(&mut self, request: PanelRequest) {
        match request {
            PanelRequest::Chat { data } => self.send_chat(&data),
            PanelRequest::SwitchSession { url } => self.switch_chat_endpoint(url),
            PanelRequest::Karirs { data } => self.send_game(data),
            PanelRequest::Visibility { visible } => self.set_visible(visible),
        }
    }

    fn handle_socket(&mut self, feed: Feed, id: Uuid, event: SocketEvent) {
        let Some(conn) = self.slot_mut(feed).as_mut().filter(|c| c.id() == id) else {
            debug!(%feed, connection_id = %id, "relay: ignored event from replaced connection");
            return;
        };
        let changed = conn.apply(&event);
        let url = conn.url().to_owned();

        if let Some(state) = changed {
            info!(%feed, %url, %state, "relay: connection state changed");
            self.post_state(feed, state, url);
        }

        if let SocketEvent::Frame(text) = event {
            match feed {
                Feed::Chat => self.forward_chat(text),
                Feed::Game => self.forward_game(text),
            }
        }
    }

    fn forward_chat(&mut self, text: String) {
        if let Err(e) = frames::parse_chat(&text) {
            warn!(feed = %Feed::Chat, error = %e, "relay: dropped malformed frame");
            return;
        }
        self.post(PanelEvent::WsMessage { data: text });
        let badge = self.unread.record_frame(self.visible);
        self.set_badge(badge);
    }

    fn forward_game(&mut self, text: String) {
        if let Err(e) = frames::parse_game(&text) {
            warn!(feed = %Feed::Game, error = %e, "relay: dropped malformed frame");
            return;
        }
        self.post(PanelEvent::Karirs { data: text });
    }

    fn connect(&mut self, feed: Feed, url: String) {
        if let Some(old) = self.slot_mut(feed).take() {
            let old_url = old.url().to_owned();
            drop(old.close());
            self.post_state(feed, ConnectionState::Disconnected, old_url);
        }

        let conn = Connection::open(feed, url.clone(), self.tx.clone());
        *self.slot_mut(feed) = Some(conn);
        self.post_state(feed, ConnectionState::Connecting, url);
    }

    fn deliver(&mut self, feed: Feed, text: String) {
        let result = match self.slot(feed) {
            Some(conn) => conn.send(text),
            None => Err(RelayError::NotOpen {
                feed,
                state: ConnectionState::Disconnected,
            }),
        };

        match result {
            Ok(()) => debug!(%feed, "relay: command sent"),
            Err(e) => {
                warn!(%feed, error = %e, "relay: command not delivered");
                self.post(PanelEvent::DeliveryFailed {
                    feed,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn post(&mut self, event: PanelEvent) {
        if !self.host.post_message(event) {
            self.panel_attached = false;
        }
    }

    fn set_badge(&mut self, badge: Badge) {
        if !self.host.set_badge(badge) {
            self.panel_attached = false;
        }
    }

    fn post_state(&mut self, feed: Feed, state: ConnectionState, url: String) {
        self.post(PanelEvent::Connection { feed, state, url });
    }

    fn slot(&self, feed: Feed) -> Option<&Connection> {
        match feed {
            Feed::Chat => self.chat.as_ref(),
            Feed::Game => self.game.as_ref(),
        }
    }

    fn slot_mut(&mut self, feed: Feed) -> &mut Option<Connection> {
        match feed {
            Feed::Chat => &mut self.chat,
            Feed::Game => &mut self.game,
        }
    }

    async fn teardown(&mut self) {
        let closing: Vec<_> = [self.chat.take(), self.game.take()]
            .into_iter()
            .flatten()
            .map(Connection::close)
            .collect();
        for task in closing {
            let _ = tokio::time::timeout(CLOSE_GRACE, task).await;
        }
        info!("relay: session ended");
    }
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
