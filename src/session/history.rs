//! Append-only conversation log.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the widget.
    User,
    /// The accounting backend.
    Assistant,
}

impl Role {
    /// Lowercase wire name, also used in transcript CSS classes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Header shown above a transcript bubble.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// A single history entry.
///
/// `content` is `None` only for an assistant reply whose body lacked a
/// `message` field; such an entry serializes as `{"role":"assistant"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Entry author.
    pub role: Role,
    /// Entry text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    /// Build a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    /// Build an assistant entry.
    pub fn assistant(content: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// In-memory history, appended to only after a completed exchange.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    entries: RwLock<Vec<ChatMessage>>,
}

impl ConversationHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the entries as they stand now.
    ///
    /// Requests serialize this snapshot, so an exchange that completes while
    /// another is in flight does not change what the in-flight one sent.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.read().unwrap().clone()
    }

    /// Append a user entry and the matching assistant entry in one step.
    pub fn record_exchange(&self, user: impl Into<String>, assistant: Option<String>) {
        let mut guard = self.entries.write().unwrap();
        guard.push(ChatMessage::user(user));
        guard.push(ChatMessage::assistant(assistant));
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether no exchange has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
