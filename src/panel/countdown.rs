//! Race start countdown.
//!
//! Purely local: the server hears nothing until the countdown fires. Ticks
//! come from a one-second [`ticker`]; each tick shows the remaining seconds
//! and then decrements, and the tick that takes the count below zero fires
//! the start command and clears the display. Starting twice is a no-op and a
//! running countdown can be cancelled.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

pub const COUNTDOWN_SECS: i32 = 10;
pub const TICK: Duration = Duration::from_secs(1);

/// Outcome of one countdown tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountdownTick {
    /// Still counting; the display now reads this.
    Show(String),
    /// The countdown finished. Send the start command.
    Fire,
}

#[derive(Clone, Debug, Default)]
pub struct Countdown {
    remaining: Option<i32>,
    display: Option<String>,
}

impl Countdown {
    /// Begin counting down from [`COUNTDOWN_SECS`]. Returns `false` if a
    /// countdown is already running.
    pub fn start(&mut self) -> bool {
        if self.remaining.is_some() {
            return false;
        }
        self.remaining = Some(COUNTDOWN_SECS);
        true
    }

    /// Abandon a running countdown. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        self.display = None;
        self.remaining.take().is_some()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Current countdown text, empty between countdowns.
    #[must_use]
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    /// Advance by one second. Idle countdowns yield `None`.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        let remaining = self.remaining?;
        if remaining <= 0 {
            self.remaining = None;
            self.display = None;
            return Some(CountdownTick::Fire);
        }

        let label = format!("Race will start at '{remaining}s'");
        self.remaining = Some(remaining - 1);
        self.display = Some(label.clone());
        Some(CountdownTick::Show(label))
    }
}

/// One-second interval whose first tick lands one second from now.
#[must_use]
pub fn ticker() -> Interval {
    let mut interval = interval_at(Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
#[path = "countdown_test.rs"]
mod tests;
