use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Form, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::AppState;
use crate::client::AccountingClient;
use crate::config::AppConfig;
use crate::render::Formatter;
use crate::widget::{ChatWidget, Document, MemoryDocument, SubmitEvent, ids};

/// Start the page server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "backend.config.loaded",
        base_url = %config.backend.base_url,
        escape_markup = config.render.escape_markup,
        "Backend configuration loaded"
    );

    let state = build_state(Arc::clone(&config))?;
    let _schema = initialize_widget(&state);

    let app = router(state);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        name: "server.started",
        address = %format!("http://{address}"),
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wire the widget's handlers and load the schema in the background.
///
/// Runs once, like a page load. The returned task resolves to whether the
/// schema panel was written.
pub fn initialize_widget(state: &AppState) -> JoinHandle<bool> {
    state.widget.wire_handlers();
    let widget = Arc::clone(&state.widget);
    tokio::spawn(async move { widget.load_schema().await })
}

/// Build the shared state: client, page document and widget.
pub fn build_state(config: Arc<AppConfig>) -> crate::Result<AppState> {
    let client = AccountingClient::from_config(&config.backend)?;
    let formatter = Formatter::new(config.render.escape_markup);
    let document = MemoryDocument::chat_page(&config.widget.initial_mode);

    Ok(AppState {
        widget: Arc::new(ChatWidget::new(client, formatter, document)),
        input_lock: Arc::new(Mutex::new(())),
        pending: Arc::new(PendingReplies::default()),
        config,
    })
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/widget/submit", post(submit_handler))
        .route("/widget/reply/{id}", get(reply_handler))
        .route("/widget/mode", post(mode_handler))
        .route("/widget/transcript", get(transcript_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assistant replies still in flight, keyed by placeholder id.
#[derive(Debug, Default)]
pub struct PendingReplies {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, JoinHandle<String>>>,
}

impl PendingReplies {
    /// Track a running exchange and return its placeholder id.
    pub fn insert(&self, task: JoinHandle<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.tasks.lock().unwrap().insert(id, task);
        id
    }

    /// Remove the exchange behind a placeholder. Each id resolves once.
    pub fn take(&self, id: u64) -> Option<JoinHandle<String>> {
        self.tasks.lock().unwrap().remove(&id)
    }

    /// Number of placeholders not yet fetched.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Whether every placeholder has been fetched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body posted by the message form.
#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    message: String,
}

/// Form body posted by the mode selector.
#[derive(Debug, Deserialize)]
struct ModeForm {
    #[serde(default)]
    mode: String,
}

/// GET / - Chat page.
async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(html_shell("Accounting Chat", &chat_content(&state)))
}

/// POST /widget/submit - Echo the user bubble and start the exchange.
///
/// HTMX requests get the user bubble plus a placeholder that loads the
/// assistant bubble from `/widget/reply/{id}`. Plain form posts wait for
/// the reply and redirect back to the page.
async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Response {
    let widget = &state.widget;
    let mut event = SubmitEvent::new();

    // Writing the input and reading it back must not interleave with
    // another request.
    let pending = {
        let _guard = state.input_lock.lock().unwrap();
        widget.document().set_value(ids::MESSAGE_INPUT, &form.message);
        widget.begin_submit(&mut event)
    };
    let htmx = is_htmx(&headers);

    let Some((message, user_entry)) = pending else {
        debug!("Ignored empty submission");
        return if htmx {
            Html(String::new()).into_response()
        } else {
            Redirect::to("/").into_response()
        };
    };

    let widget = Arc::clone(widget);
    let task = tokio::spawn(async move { widget.finish_submit(&message).await });

    if !htmx {
        if let Err(e) = task.await {
            error!(name: "widget.reply.failed", error = %e, "Reply task failed");
        }
        return Redirect::to("/").into_response();
    }

    let id = state.pending.insert(task);
    Html(format!("{user_entry}{}", reply_placeholder(id))).into_response()
}

/// GET /widget/reply/{id} - Wait for an exchange and return its bubble.
async fn reply_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let Some(task) = state.pending.take(id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match task.await {
        Ok(entry) => Html(entry).into_response(),
        Err(e) => {
            error!(name: "widget.reply.failed", reply_id = id, error = %e, "Reply task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /widget/mode - Apply a mode change and return the schema panel.
async fn mode_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ModeForm>,
) -> Response {
    let doc = state.widget.document();
    doc.set_value(ids::CHAT_MODE, &form.mode);
    state.widget.handle_mode_change();
    if is_htmx(&headers) {
        Html(schema_panel(doc)).into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// GET /widget/transcript - Current transcript markup.
async fn transcript_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(
        state
            .widget
            .document()
            .children(ids::CHAT_MESSAGES)
            .concat(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Markup
// ─────────────────────────────────────────────────────────────────────────────

/// Pinned HTMX build. Without it the forms fall back to plain posts.
pub const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js";

/// Generate the HTML shell for the application.
fn html_shell(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <script src="{HTMX_SRC}" crossorigin="anonymous"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <main id="app" class="container py-4">
        {content}
    </main>
</body>
</html>"#)
}

/// Chat page content built from the widget's document.
fn chat_content(state: &AppState) -> String {
    let doc = state.widget.document();
    let mode = doc.value(ids::CHAT_MODE).unwrap_or_default();
    let transcript = doc.children(ids::CHAT_MESSAGES).concat();

    format!(
        r##"
    <form class="mb-3" action="/widget/mode" method="post">
        <select id="{chat_mode}" name="mode" class="form-select"
                hx-post="/widget/mode" hx-trigger="change"
                hx-target="#{schema_info}" hx-swap="outerHTML">
            {options}
        </select>
        <noscript><button type="submit" class="btn btn-secondary mt-2">Switch mode</button></noscript>
    </form>
    {schema}
    <div id="{chat_messages}" class="chat-messages"
         hx-on::after-settle="this.scrollTop = this.scrollHeight">{transcript}</div>
    <form id="{chat_form}" class="d-flex gap-2 mt-3" action="/widget/submit" method="post"
          hx-post="/widget/submit" hx-target="#{chat_messages}" hx-swap="beforeend"
          hx-on::before-request="this.reset()">
        <input id="{message_input}" name="message" class="form-control" placeholder="Ask about your accounts..." autocomplete="off">
        <button type="submit" class="btn btn-primary">Send</button>
    </form>
    "##,
        chat_mode = ids::CHAT_MODE,
        schema_info = ids::SCHEMA_INFO,
        chat_messages = ids::CHAT_MESSAGES,
        chat_form = ids::CHAT_FORM,
        message_input = ids::MESSAGE_INPUT,
        options = mode_options(&mode),
        schema = schema_panel(doc),
    )
}

/// Stand-in for an assistant bubble that swaps itself for the reply.
fn reply_placeholder(id: u64) -> String {
    format!(
        r#"<div id="reply-{id}" class="chat-message pending-reply" hx-get="/widget/reply/{id}" hx-trigger="load" hx-swap="outerHTML"><div class="message-header">Assistant</div><div class="message-content">Thinking...</div></div>"#
    )
}

fn mode_options(current: &str) -> String {
    [("accounting", "Accounting"), ("general", "General")]
        .iter()
        .map(|(value, label)| {
            let selected = if *value == current { " selected" } else { "" };
            format!(r#"<option value="{value}"{selected}>{label}</option>"#)
        })
        .collect()
}

/// Schema panel; its text is inert, never markup.
fn schema_panel(doc: &MemoryDocument) -> String {
    let text = doc.text_content(ids::SCHEMA_CONTENT).unwrap_or_default();
    format!(
        r#"<div id="{}" class="card mb-3 {}"><pre id="{}" class="card-body">{}</pre></div>"#,
        ids::SCHEMA_INFO,
        doc.class_list(ids::SCHEMA_INFO),
        ids::SCHEMA_CONTENT,
        html_escape::encode_text(&text)
    )
}
