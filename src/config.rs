//! Relay configuration parsed from CLI flags with environment fallbacks.

use std::net::SocketAddr;

use clap::Args;

pub const DEFAULT_CHAT_URL: &str = "ws://45.77.242.28/api/chat/ws/439";
pub const DEFAULT_GAME_URL: &str = "ws://45.77.242.28/karirs/";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7357";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: &'static str },
}

/// Upstream feed endpoints as given on the command line.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Initial chat feed; the panel may switch it at runtime.
    #[arg(long, env = "PANEL_RELAY_CHAT_URL", default_value = DEFAULT_CHAT_URL)]
    pub chat_url: String,

    /// Race game feed; fixed for the lifetime of a panel session.
    #[arg(long, env = "PANEL_RELAY_GAME_URL", default_value = DEFAULT_GAME_URL)]
    pub game_url: String,
}

/// Listener settings for the panel endpoint.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "PANEL_RELAY_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,
}

/// Validated feed endpoints handed to each relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chat: String,
    pub game: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            chat: DEFAULT_CHAT_URL.to_owned(),
            game: DEFAULT_GAME_URL.to_owned(),
        }
    }
}

impl TryFrom<EndpointArgs> for Endpoints {
    type Error = ConfigError;

    fn try_from(args: EndpointArgs) -> Result<Self, Self::Error> {
        validate_endpoint(&args.chat_url)?;
        validate_endpoint(&args.game_url)?;
        Ok(Self {
            chat: args.chat_url,
            game: args.game_url,
        })
    }
}

/// Check that `url` names a WebSocket endpoint with a host.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEndpoint`] for other schemes or a missing host.
pub fn validate_endpoint(url: &str) -> Result<(), ConfigError> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))
        .ok_or_else(|| ConfigError::InvalidEndpoint {
            url: url.to_owned(),
            reason: "expected a ws:// or wss:// URL",
        })?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(ConfigError::InvalidEndpoint {
            url: url.to_owned(),
            reason: "missing host",
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
