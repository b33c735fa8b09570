//! Panel presentation logic.
//!
//! SYSTEM CONTEXT
//! ==============
//! `PanelView` is the renderer-agnostic state behind the side panel: it folds
//! relay messages into a chat log, a race board, connection status and the
//! unread badge, and turns user input into panel requests. Whatever draws the
//! panel reads from it; nothing here touches a socket.

pub mod chat_log;
pub mod countdown;
pub mod race;

use frames::{
    ChatMessage, CodecError, ConnectionState, Feed, GameAction, GameCommand, PanelEvent,
    PanelRequest,
};

use chat_log::ChatLog;
use countdown::{Countdown, CountdownTick};
use race::RaceBoard;

#[derive(Clone, Debug, Default)]
pub struct PanelView {
    pub chat: ChatLog,
    pub race: RaceBoard,
    pub countdown: Countdown,
    drawer_unlocked: bool,
    badge: u32,
    chat_state: ConnectionState,
    game_state: ConnectionState,
    last_failure: Option<String>,
}

impl PanelView {
    /// Fold one relay message into the view.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when a relayed feed payload does not parse; the
    /// view is left unchanged.
    pub fn apply(&mut self, event: &PanelEvent) -> Result<(), CodecError> {
        match event {
            PanelEvent::WsMessage { data } => {
                let message = frames::parse_chat(data)?;
                self.chat.push(message);
            }
            PanelEvent::Karirs { data } => {
                let state = frames::parse_game(data)?;
                if state.started {
                    self.countdown.cancel();
                }
                self.race.apply(&state);
            }
            PanelEvent::Badge { value, .. } => self.badge = *value,
            PanelEvent::ClearChat => self.chat.clear(),
            PanelEvent::Connection { feed, state, .. } => match feed {
                Feed::Chat => self.chat_state = *state,
                Feed::Game => self.game_state = *state,
            },
            PanelEvent::DeliveryFailed { feed, reason } => {
                self.last_failure = Some(format!("{feed}: {reason}"));
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User input
    // -------------------------------------------------------------------------

    /// Enter pressed in the chat box.
    #[must_use]
    pub fn submit_text(&self, text: &str) -> Option<PanelRequest> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        Some(PanelRequest::Chat {
            data: ChatMessage::anonymous(message),
        })
    }

    /// Chat endpoint picked from the selector. Clears the log right away.
    pub fn select_endpoint(&mut self, url: &str) -> Option<PanelRequest> {
        if url.is_empty() {
            return None;
        }
        self.chat.clear();
        Some(PanelRequest::SwitchSession {
            url: url.to_owned(),
        })
    }

    /// Start pressed. Returns `true` if a countdown began.
    pub fn press_start(&mut self) -> bool {
        if !self.race.controls().start_visible {
            return false;
        }
        self.countdown.start()
    }

    /// One countdown second elapsed. Yields the start command when it fires.
    pub fn tick_countdown(&mut self) -> Option<PanelRequest> {
        match self.countdown.tick()? {
            CountdownTick::Show(_) => None,
            CountdownTick::Fire => Some(game_request(GameAction::Start)),
        }
    }

    /// Stop pressed. Also abandons a pending countdown.
    pub fn press_stop(&mut self) -> PanelRequest {
        self.countdown.cancel();
        game_request(GameAction::Stop)
    }

    #[must_use]
    pub fn press_change(&self) -> PanelRequest {
        game_request(GameAction::Change)
    }

    /// Flip the drawer lock. Local only.
    pub fn toggle_drawer_lock(&mut self) -> bool {
        self.drawer_unlocked = !self.drawer_unlocked;
        self.drawer_unlocked
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn drawer_unlocked(&self) -> bool {
        self.drawer_unlocked
    }

    #[must_use]
    pub fn badge(&self) -> u32 {
        self.badge
    }

    #[must_use]
    pub fn connection(&self, feed: Feed) -> ConnectionState {
        match feed {
            Feed::Chat => self.chat_state,
            Feed::Game => self.game_state,
        }
    }

    #[must_use]
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }
}

fn game_request(action: GameAction) -> PanelRequest {
    PanelRequest::Karirs {
        data: GameCommand::new(action),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
