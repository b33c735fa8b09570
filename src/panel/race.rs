//! Race board view.
//!
//! Every game snapshot rebuilds the board from scratch. Before the race
//! starts, the first player holding the strictly greatest positive position
//! is marked as leading; once it starts nobody is, and the start/change
//! controls are hidden.

use frames::{GameState, Player};

/// One drawn player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRow {
    pub name: String,
    /// Horizontal offset in pixels, equal to the player's position.
    pub offset_px: f64,
    pub leading: bool,
}

/// Which race controls are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaceControls {
    pub start_visible: bool,
    pub change_visible: bool,
}

impl Default for RaceControls {
    fn default() -> Self {
        Self {
            start_visible: true,
            change_visible: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RaceBoard {
    started: bool,
    spectators: f64,
    rows: Vec<PlayerRow>,
    controls: RaceControls,
}

impl RaceBoard {
    /// Replace the board with `state`.
    pub fn apply(&mut self, state: &GameState) {
        let leader = leader_index(state);
        self.started = state.started;
        self.spectators = state.spectators;
        self.controls = RaceControls {
            start_visible: !state.started,
            change_visible: !state.started,
        };
        self.rows = state
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| PlayerRow {
                name: player.name.clone(),
                offset_px: player.position,
                leading: leader == Some(index),
            })
            .collect();
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn spectators(&self) -> f64 {
        self.spectators
    }

    #[must_use]
    pub fn rows(&self) -> &[PlayerRow] {
        &self.rows
    }

    #[must_use]
    pub fn controls(&self) -> RaceControls {
        self.controls
    }

    #[must_use]
    pub fn leader(&self) -> Option<&PlayerRow> {
        self.rows.iter().find(|row| row.leading)
    }
}

/// Index of the leading player, if any.
///
/// Ties go to the earliest player. A race in progress has no leader, and
/// neither does a board where nobody has moved past zero.
#[must_use]
pub fn leader_index(state: &GameState) -> Option<usize> {
    if state.started {
        return None;
    }

    let (index, leader) = state
        .players
        .iter()
        .enumerate()
        .reduce(|best, candidate| {
            if candidate.1.position > best.1.position {
                candidate
            } else {
                best
            }
        })?;

    is_ahead(leader).then_some(index)
}

fn is_ahead(player: &Player) -> bool {
    player.position > 0.0
}

#[cfg(test)]
#[path = "race_test.rs"]
mod tests;
