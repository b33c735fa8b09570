//! Unread chat badge.
//!
//! The badge is derived state: its value is always the unread counter, and
//! it is recomputed after every inbound chat frame and every visibility
//! change. The counter is the only thing stored.

use frames::PanelEvent;

/// Host-rendered unread indicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Badge {
    pub value: u32,
    pub tooltip: String,
}

impl From<Badge> for PanelEvent {
    fn from(badge: Badge) -> Self {
        PanelEvent::Badge {
            value: badge.value,
            tooltip: badge.tooltip,
        }
    }
}

/// Chat frames that arrived while the panel was hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnreadCounter {
    count: u32,
}

impl UnreadCounter {
    #[must_use]
    pub fn count(self) -> u32 {
        self.count
    }

    /// A chat frame was forwarded. Hidden panels accumulate, visible ones reset.
    pub fn record_frame(&mut self, visible: bool) -> Badge {
        if visible {
            self.count = 0;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.badge()
    }

    /// The panel was shown or hidden. Only showing it clears the count.
    pub fn visibility_changed(&mut self, visible: bool) -> Badge {
        if visible {
            self.count = 0;
        }
        self.badge()
    }

    #[must_use]
    pub fn badge(self) -> Badge {
        Badge {
            value: self.count,
            tooltip: format!("{} unread messages", self.count),
        }
    }
}

#[cfg(test)]
#[path = "badge_test.rs"]
mod tests;
