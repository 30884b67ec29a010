//! Chat widget: initialization, message exchange and transcript updates.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};

use super::{ACCOUNTING_MODE, COLLAPSE_CLASS, Document, ids};
use crate::client::{AccountingClient, is_truthy, pretty_json};
use crate::render::Formatter;
use crate::session::{ConversationHistory, Role};

/// Shown in place of a reply when an exchange fails.
pub const ERROR_REPLY: &str = "Error processing your request. Please try again.";

/// A form submission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    /// Create a submission event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the browser's default form navigation.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether default navigation was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Transcript entries produced by one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Trimmed message text.
    pub message: String,
    /// Markup of the user bubble.
    pub user_entry: String,
    /// Markup of the assistant bubble.
    pub assistant_entry: String,
}

/// The chat widget.
///
/// Owns the conversation history and a page document. History is appended
/// only by [`ChatWidget::send_message`] after a successful round trip; the
/// transcript is appended by [`ChatWidget::append_message`].
///
/// Overlapping submissions are not serialized. Each one sends the history
/// as it stood when its request was built and records its pair when its
/// reply arrives, so pairs land in completion order.
#[derive(Debug)]
pub struct ChatWidget<D> {
    client: AccountingClient,
    formatter: Formatter,
    document: D,
    history: ConversationHistory,
    submit_wired: AtomicBool,
    mode_wired: AtomicBool,
}

impl<D: Document> ChatWidget<D> {
    /// Create a widget. No handler is active until [`ChatWidget::wire_handlers`]
    /// or [`ChatWidget::initialize`].
    pub fn new(client: AccountingClient, formatter: Formatter, document: D) -> Self {
        Self {
            client,
            formatter,
            document,
            history: ConversationHistory::new(),
            submit_wired: AtomicBool::new(false),
            mode_wired: AtomicBool::new(false),
        }
    }

    /// The page document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// The conversation history.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// The formatter used for transcript entries.
    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Wire the form and mode selector, then load the schema panel.
    ///
    /// Handlers are live before the schema request is sent, so a slow
    /// schema endpoint never blocks chatting. A failed schema fetch is
    /// logged and otherwise ignored.
    pub async fn initialize(&self) {
        self.wire_handlers();
        self.load_schema().await;
    }

    /// Wire the submit and mode handlers for the controls the page has.
    pub fn wire_handlers(&self) {
        let form = self.document.has_element(ids::CHAT_FORM);
        let mode = self.document.has_element(ids::CHAT_MODE);
        self.submit_wired.store(form, Ordering::Release);
        self.mode_wired.store(mode, Ordering::Release);

        info!(
            name: "widget.initialized",
            submit_wired = form,
            mode_wired = mode,
            "Chat widget initialized"
        );
    }

    /// Fetch the schema and show it in the schema panel.
    ///
    /// Returns whether the panel was written.
    pub async fn load_schema(&self) -> bool {
        match self.client.fetch_schema().await {
            Ok(Some(schema)) if is_truthy(&schema) => {
                self.document
                    .set_text_content(ids::SCHEMA_CONTENT, &pretty_json(&schema));
                debug!(name: "widget.schema.loaded", "Schema panel populated");
                true
            }
            Ok(_) => {
                debug!(name: "widget.schema.empty", "Schema response carried no schema");
                false
            }
            Err(e) => {
                error!(name: "widget.schema.failed", error = %e, "Error getting schema");
                false
            }
        }
    }

    /// React to a mode selector change.
    ///
    /// Reads the selector's current value; the schema panel is visible only
    /// in accounting mode. Returns `false` when the selector is not wired.
    pub fn handle_mode_change(&self) -> bool {
        if !self.mode_wired.load(Ordering::Acquire) {
            return false;
        }

        let mode = self.document.value(ids::CHAT_MODE).unwrap_or_default();
        if mode == ACCOUNTING_MODE {
            self.document.remove_class(ids::SCHEMA_INFO, COLLAPSE_CLASS);
        } else {
            self.document.add_class(ids::SCHEMA_INFO, COLLAPSE_CLASS);
        }
        debug!(mode = %mode, "Mode changed");
        true
    }

    /// Handle a form submission end to end.
    ///
    /// Returns `None` when the form is not wired or the input is blank.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> Option<Submission> {
        let (message, user_entry) = self.begin_submit(event)?;
        let assistant_entry = self.finish_submit(&message).await;
        Some(Submission {
            message,
            user_entry,
            assistant_entry,
        })
    }

    /// Synchronous part of a submission: prevent navigation, read and clear
    /// the input, echo the user bubble.
    ///
    /// Returns the trimmed message and the user bubble markup.
    pub fn begin_submit(&self, event: &mut SubmitEvent) -> Option<(String, String)> {
        if !self.submit_wired.load(Ordering::Acquire) {
            return None;
        }
        event.prevent_default();

        let raw = self.document.value(ids::MESSAGE_INPUT).unwrap_or_default();
        let message = raw.trim();
        if message.is_empty() {
            return None;
        }
        let message = message.to_string();

        let user_entry = self.append_message(Role::User, &message);
        self.document.set_value(ids::MESSAGE_INPUT, "");
        Some((message, user_entry))
    }

    /// Network part of a submission: send and echo the assistant bubble.
    pub async fn finish_submit(&self, message: &str) -> String {
        let reply = self.send_message(message).await;
        self.append_message(Role::Assistant, &reply)
    }

    /// Send a message with the current history.
    ///
    /// On success the user/assistant pair is recorded and the reply text is
    /// returned, followed by a dump of any query results. On failure
    /// [`ERROR_REPLY`] is returned and history is left as it was.
    pub async fn send_message(&self, message: &str) -> String {
        let history = self.history.snapshot();
        debug!(history_len = history.len(), "Sending message");

        match self.client.chat(message, &history).await {
            Ok(response) => {
                self.history
                    .record_exchange(message, response.message.clone());
                info!(
                    name: "chat.exchange.completed",
                    has_message = response.message.is_some(),
                    has_data = response.data.is_some(),
                    history_len = self.history.len(),
                    "Exchange completed"
                );
                response.display_text()
            }
            Err(e) => {
                error!(name: "chat.exchange.failed", error = %e, "Error sending message");
                ERROR_REPLY.to_string()
            }
        }
    }

    /// Format `content`, append it as a bubble and scroll to it.
    ///
    /// Returns the appended markup.
    pub fn append_message(&self, role: Role, content: &str) -> String {
        let entry = render_entry(role, &self.formatter.format_content(content));
        self.document.append_html(ids::CHAT_MESSAGES, &entry);
        self.document.scroll_to_bottom(ids::CHAT_MESSAGES);
        entry
    }
}

/// Transcript bubble markup around already formatted content.
#[must_use]
pub fn render_entry(role: Role, formatted: &str) -> String {
    format!(
        r#"<div class="{}"><div class="message-header">{}</div><div class="message-content">{formatted}</div></div>"#,
        role.bubble_class(),
        role.label()
    )
}
