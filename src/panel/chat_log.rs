//! Scrolling chat log.

use frames::ChatMessage;

/// Lines in arrival order. Unbounded, no dedup; the newest line is always
/// the one in view.
#[derive(Clone, Debug, Default)]
pub struct ChatLog {
    lines: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn push(&mut self, message: ChatMessage) {
        self.lines.push(message);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[ChatMessage] {
        &self.lines
    }

    /// The line the log is scrolled to.
    #[must_use]
    pub fn latest(&self) -> Option<&ChatMessage> {
        self.lines.last()
    }
}

/// `user: message`, as shown in the log.
#[must_use]
pub fn render_line(message: &ChatMessage) -> String {
    format!("{}: {}", message.user, message.message)
}

#[cfg(test)]
#[path = "chat_log_test.rs"]
mod tests;
