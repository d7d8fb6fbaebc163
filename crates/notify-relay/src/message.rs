//! The message value that flows from ingress to the aggregator.

use std::fmt::Write;

/// A single log/event notification.
///
/// Empty `sender` and `level` strings are normalized to `None` so that
/// "missing" and "blank" mean the same thing downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Option<String>,
    level: Option<String>,
    text: String,
}

impl Message {
    pub fn new(sender: Option<String>, level: Option<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.filter(|s| !s.is_empty()),
            level: level.filter(|l| !l.is_empty()),
            text: text.into(),
        }
    }

    /// A message with neither sender nor level.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(None, None, text)
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.text
    }

    /// Append this message's digest line to `out`.
    ///
    /// The `*` and `` ` `` markers are Telegram Markdown. User text is not
    /// escaped, so a body containing those characters can break rendering.
    pub fn write_line(&self, out: &mut String) {
        if let Some(sender) = &self.sender {
            let _ = write!(out, "From: *{sender}*: ");
        }
        if let Some(level) = &self.level {
            let _ = write!(out, "`[{level}]` ");
        }
        out.push_str(&self.text);
        out.push('\n');
    }
}
