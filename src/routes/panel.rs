//! WebSocket handler for browser-hosted panels.
//!
//! DESIGN
//! ======
//! On upgrade, starts a relay whose host is a [`ChannelHost`] and enters a
//! `select!` loop:
//! - Panel text frames → decode as `PanelRequest` → relay queue
//! - Relay output → encode as JSON → panel
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → spawn relay (it dials both feeds)
//! 2. Frames flow both ways until either side closes
//! 3. Close → relay shutdown → wait for its teardown

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tracing::{info, warn};
use uuid::Uuid;

use crate::host::ChannelHost;
use crate::relay::Relay;
use crate::state::AppState;

pub async fn handle_panel(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_panel(socket, state))
}

async fn run_panel(mut socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    let _session = state.open_session();

    let (host, mut outbound) = ChannelHost::new();
    let relay = Relay::new(host, state.endpoints.as_ref().clone());
    let handle = relay.handle();
    let relay_task = tokio::spawn(relay.run());

    info!(%session_id, "panel: session opened");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => match frames::decode_request(&text) {
                        Ok(request) => {
                            if handle.submit(request).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(%session_id, error = %e, "panel: invalid inbound message"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = outbound.recv() => {
                let Some(event) = event else { break };
                let text = frames::encode(&event);
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    handle.shutdown().await;
    if let Err(e) = relay_task.await {
        warn!(%session_id, error = %e, "panel: relay task failed");
    }
    info!(%session_id, "panel: session closed");
}

#[cfg(test)]
#[path = "panel_test.rs"]
mod tests;
