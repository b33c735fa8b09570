//! Upstream feed connection.
//!
//! DESIGN
//! ======
//! A `Connection` is one attempt to reach one endpoint. Its socket I/O runs in
//! a spawned task that only reports back through the relay's event queue,
//! tagged with the connection id. The relay owns the `Connection` value and
//! its state; the task never touches relay state, so events from a replaced
//! connection can be recognised and discarded by id.
//!
//! LIFECYCLE
//! =========
//! 1. `open` → `Connecting`; the task dials the endpoint
//! 2. Handshake ok → `Opened`; failure → `Errored` (no retry)
//! 3. Text frames → `Frame`
//! 4. Peer close or end of stream → `Closed`; read/write error → `Errored`
//! 5. `close` drops the outbound sender; the task sends a close frame and exits

use frames::{ConnectionState, Feed};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::{RelayError, RelayEvent};

/// What a connection task reports to the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Frame(String),
    Closed,
    Errored(String),
}

/// Relay-side handle to one upstream socket.
pub struct Connection {
    id: Uuid,
    feed: Feed,
    url: String,
    state: ConnectionState,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Connection {
    /// Start connecting to `url`. Progress arrives on `events`.
    pub fn open(feed: Feed, url: impl Into<String>, events: mpsc::Sender<RelayEvent>) -> Self {
        let id = Uuid::new_v4();
        let url = url.into();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        info!(%feed, %url, connection_id = %id, "socket: connecting");
        let task = tokio::spawn(run_socket(feed, id, url.clone(), outbound_rx, events));

        Self {
            id,
            feed,
            url,
            state: ConnectionState::Connecting,
            outbound,
            task,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Advance the state machine. Returns the new state when it changed.
    pub fn apply(&mut self, event: &SocketEvent) -> Option<ConnectionState> {
        let next = match (self.state, event) {
            (_, SocketEvent::Frame(_)) => return None,
            (ConnectionState::Connecting, SocketEvent::Opened) => ConnectionState::Open,
            (ConnectionState::Errored, SocketEvent::Closed) => return None,
            (state, SocketEvent::Closed) if state != ConnectionState::Closed => {
                ConnectionState::Closed
            }
            (state, SocketEvent::Errored(_)) if !state.is_terminal() => ConnectionState::Errored,
            _ => return None,
        };
        self.state = next;
        Some(next)
    }

    /// Queue one text frame for the peer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotOpen`] unless the handshake has completed and
    /// the peer has not gone away.
    pub fn send(&self, text: String) -> Result<(), RelayError> {
        if self.state != ConnectionState::Open {
            return Err(RelayError::NotOpen {
                feed: self.feed,
                state: self.state,
            });
        }
        self.outbound
            .send(text)
            .map_err(|_| RelayError::NotOpen {
                feed: self.feed,
                state: ConnectionState::Closed,
            })
    }

    /// Stop this connection. Any later events it produces are stale.
    ///
    /// The returned handle resolves once the close frame has gone out.
    pub fn close(self) -> JoinHandle<()> {
        debug!(feed = %self.feed, url = %self.url, connection_id = %self.id, "socket: closing");
        drop(self.outbound);
        self.task
    }
}

async fn run_socket(
    feed: Feed,
    id: Uuid,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::Sender<RelayEvent>,
) {
    let report = |event| RelayEvent::Socket { feed, id, event };

    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        None = outbound.recv() => {
            debug!(%feed, connection_id = %id, "socket: dropped before handshake");
            return;
        }
    };

    let stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(%feed, %url, connection_id = %id, error = %e, "socket: connect failed");
            let _ = events.send(report(SocketEvent::Errored(e.to_string()))).await;
            return;
        }
    };

    info!(%feed, %url, connection_id = %id, "socket: connected");
    if events.send(report(SocketEvent::Opened)).await.is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(text) = outgoing else {
                    let _ = write.send(Message::Close(None)).await;
                    debug!(%feed, connection_id = %id, "socket: closed by relay");
                    return;
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    warn!(%feed, connection_id = %id, error = %e, "socket: send failed");
                    let _ = events.send(report(SocketEvent::Errored(e.to_string()))).await;
                    return;
                }
            }
            incoming = read.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => SocketEvent::Frame(text.to_string()),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => SocketEvent::Frame(text),
                        Err(_) => {
                            debug!(%feed, connection_id = %id, len = bytes.len(), "socket: dropped non-utf8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map_or(1005, |f| u16::from(f.code));
                        info!(%feed, %url, connection_id = %id, code, "socket: closed by peer");
                        // Flushes the queued close reply to finish the handshake.
                        let _ = write.close().await;
                        let _ = events.send(report(SocketEvent::Closed)).await;
                        return;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(%feed, %url, connection_id = %id, error = %e, "socket: read failed");
                        let _ = events.send(report(SocketEvent::Errored(e.to_string()))).await;
                        return;
                    }
                    None => {
                        info!(%feed, %url, connection_id = %id, "socket: stream ended");
                        let _ = events.send(report(SocketEvent::Closed)).await;
                        return;
                    }
                };
                if events.send(report(event)).await.is_err() {
                    return;
                }
            }
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
