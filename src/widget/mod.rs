//! The chat widget and the page surface it drives.
//!
//! - [`ChatWidget`]: owns the conversation history and handles page events
//! - [`Document`]: element operations the widget needs from a page
//! - [`MemoryDocument`]: in-memory page used by the server and tests

mod chat;
mod document;

pub use chat::{ChatWidget, ERROR_REPLY, SubmitEvent, Submission, render_entry};
pub use document::{Document, MemoryDocument};

use crate::session::Role;

/// Element ids the widget reads and writes.
pub mod ids {
    /// Pre-formatted schema text.
    pub const SCHEMA_CONTENT: &str = "schema-content";
    /// Message form.
    pub const CHAT_FORM: &str = "chat-form";
    /// Mode selector.
    pub const CHAT_MODE: &str = "chat-mode";
    /// Collapsible panel around the schema text.
    pub const SCHEMA_INFO: &str = "schema-info";
    /// Message text input.
    pub const MESSAGE_INPUT: &str = "message-input";
    /// Transcript container.
    pub const CHAT_MESSAGES: &str = "chat-messages";

    /// Every id above.
    pub const ALL: [&str; 6] = [
        SCHEMA_CONTENT,
        CHAT_FORM,
        CHAT_MODE,
        SCHEMA_INFO,
        MESSAGE_INPUT,
        CHAT_MESSAGES,
    ];
}

/// Mode in which the schema panel is visible.
pub const ACCOUNTING_MODE: &str = "accounting";

/// Class that hides an element.
pub const COLLAPSE_CLASS: &str = "collapse";

impl Role {
    /// CSS class of a transcript bubble.
    #[must_use]
    pub fn bubble_class(self) -> String {
        format!("chat-message {}-message", self.as_str())
    }
}
