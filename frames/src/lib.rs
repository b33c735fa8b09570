//! Shared frame model for the chat and race feeds and the panel channel.
//!
//! This crate owns the JSON shapes used on three hops: inbound feed frames
//! (chat, game), outbound feed commands, and the panel <-> relay channel.
//! Feed payloads travel to the panel as raw text; the typed models here are
//! used to validate them on the way through and to render them on arrival.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Author name stamped on chat messages sent from the panel.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Error returned by the frame parsers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text was not valid JSON for the expected frame kind.
    #[error("invalid {kind} frame: {source}")]
    Json {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl CodecError {
    fn json(kind: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Json { kind, source }
    }
}

// =============================================================================
// FEEDS
// =============================================================================

/// The two upstream sockets a panel session relays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    Chat,
    Game,
}

impl Feed {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Game => "game",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one upstream connection.
///
/// `Disconnected -> Connecting -> Open -> {Closed | Errored}`. There is no
/// edge back to `Open`; recovery always goes through a fresh connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Closed and errored connections never reopen on their own.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(label)
    }
}

// =============================================================================
// FEED PAYLOADS
// =============================================================================

/// One chat line, both inbound and outbound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
}

impl ChatMessage {
    /// Chat message authored by the panel user.
    pub fn anonymous(message: impl Into<String>) -> Self {
        Self {
            user: ANONYMOUS_USER.to_owned(),
            message: message.into(),
        }
    }
}

/// A racer on the game board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub position: f64,
}

/// Full race snapshot. Every update replaces the previous one wholesale.
///
/// Missing and `null` fields both read as their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    #[serde(deserialize_with = "null_as_default")]
    pub started: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub spectators: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Race control verbs understood by the game server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameAction {
    Start,
    Stop,
    Change,
}

/// Outbound game frame: `{"action": "start" | "stop" | "change"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommand {
    pub action: GameAction,
}

impl GameCommand {
    #[must_use]
    pub fn new(action: GameAction) -> Self {
        Self { action }
    }
}

// =============================================================================
// PANEL CHANNEL
// =============================================================================

/// Messages the panel posts to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PanelRequest {
    /// Send a chat line upstream.
    #[serde(rename = "chat")]
    Chat { data: ChatMessage },
    /// Reconnect the chat feed to another endpoint.
    #[serde(rename = "switchSession")]
    SwitchSession { url: String },
    /// Send a race command upstream.
    #[serde(rename = "karirs")]
    Karirs { data: GameCommand },
    /// Host visibility notification for the panel.
    #[serde(rename = "visibility")]
    Visibility { visible: bool },
}

/// Messages the relay posts to the panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PanelEvent {
    /// Raw chat frame text, already validated as a [`ChatMessage`].
    #[serde(rename = "wsMessage")]
    WsMessage { data: String },
    /// Raw game frame text, already validated as a [`GameState`].
    #[serde(rename = "karirs")]
    Karirs { data: String },
    /// Unread badge for the host to display.
    #[serde(rename = "badge")]
    Badge { value: u32, tooltip: String },
    /// The chat endpoint changed; drop the displayed history.
    #[serde(rename = "clearChat")]
    ClearChat,
    /// A feed connection moved to a new state.
    #[serde(rename = "connection")]
    Connection {
        feed: Feed,
        state: ConnectionState,
        url: String,
    },
    /// A panel command could not be delivered upstream.
    #[serde(rename = "deliveryFailed")]
    DeliveryFailed { feed: Feed, reason: String },
}

// =============================================================================
// CODEC
// =============================================================================

/// Parse an inbound chat frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the text is not a chat message.
pub fn parse_chat(text: &str) -> Result<ChatMessage, CodecError> {
    serde_json::from_str(text).map_err(CodecError::json("chat"))
}

/// Parse an inbound game frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the text is not a game snapshot.
pub fn parse_game(text: &str) -> Result<GameState, CodecError> {
    serde_json::from_str(text).map_err(CodecError::json("game"))
}

/// Parse a message posted by the panel.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for unknown `type` tags or malformed bodies.
pub fn decode_request(text: &str) -> Result<PanelRequest, CodecError> {
    serde_json::from_str(text).map_err(CodecError::json("panel request"))
}

/// Parse a message posted by the relay.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for unknown `type` tags or malformed bodies.
pub fn decode_event(text: &str) -> Result<PanelEvent, CodecError> {
    serde_json::from_str(text).map_err(CodecError::json("panel event"))
}

/// Serialize any frame model to its JSON text.
///
/// Every type in this crate has string keys only, so serialization cannot
/// fail; an empty string would only ever be produced for foreign types.
#[must_use]
pub fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
