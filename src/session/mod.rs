//! Conversation history owned by the chat widget.
//!
//! The history is the log of `{role, content}` pairs sent to the backend
//! with every new message. It lives in memory for the lifetime of the
//! widget and is never persisted.
//!
//! # Example
//!
//! ```rust
//! use ledger_chat::session::{ChatMessage, ConversationHistory};
//!
//! let history = ConversationHistory::new();
//! history.record_exchange("How much did we sell?", Some("About 12k".to_string()));
//!
//! let entries = history.snapshot();
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0], ChatMessage::user("How much did we sell?"));
//! ```

mod history;

pub use history::{ChatMessage, ConversationHistory, Role};
