//! Accounting chat widget
//!
//! A chat widget that posts user messages to an accounting backend,
//! renders the returned text, and formats replies (fenced SQL, code blocks,
//! inline code, SQL keyword highlighting) for an HTMX page.
//!
//! # Architecture
//!
//! - **Widget**: owns the conversation history and drives a page document
//! - **Client**: HTTP calls to the accounting backend
//! - **Render**: reply parser and HTML formatting
//! - **Server**: Axum page server that hosts the widget
//!
//! # Modules
//!
//! - [`client`]: Accounting backend client and wire types
//! - [`render`]: Reply layout parser and HTML formatting
//! - [`session`]: Conversation history
//! - [`widget`]: Chat widget and page document

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod server;
pub mod session;
pub mod widget;

pub use error::{Error, Result};

use crate::config::AppConfig;

use std::sync::{Arc, Mutex};
use server::PendingReplies;
use widget::{ChatWidget, MemoryDocument};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The single widget instance backing the page.
    pub widget: Arc<ChatWidget<MemoryDocument>>,
    /// Serializes writes to the message input with the read that follows.
    pub input_lock: Arc<Mutex<()>>,
    /// Assistant replies the page has not fetched yet.
    pub pending: Arc<PendingReplies>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
