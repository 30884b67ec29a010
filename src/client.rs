//! HTTP client for the accounting chat backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::session::ChatMessage;

/// Rendered in place of a reply that arrived without a `message` field.
pub const MISSING_MESSAGE: &str = "undefined";

/// Separator between the reply text and a dump of its structured result.
pub const QUERY_RESULTS_HEADER: &str = "\n\nQuery Results:\n";

/// Request body for `POST /api/chat/accounting`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// The new user message.
    pub message: &'a str,
    /// Every entry recorded before this message.
    pub history: &'a [ChatMessage],
}

/// Response from `POST /api/chat/accounting`.
///
/// Only presence is checked. A body without `message` still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text.
    #[serde(default)]
    pub message: Option<String>,
    /// Structured query result, if the backend ran one.
    #[serde(default)]
    pub data: Option<Value>,
}

impl ChatResponse {
    /// Text shown in the transcript: the reply followed by a pretty-printed
    /// dump of `data` when `data` is truthy.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut text = self
            .message
            .clone()
            .unwrap_or_else(|| MISSING_MESSAGE.to_string());
        if let Some(data) = self.data.as_ref().filter(|d| is_truthy(d)) {
            text.push_str(QUERY_RESULTS_HEADER);
            text.push_str(&pretty_json(data));
        }
        text
    }
}

/// Response from `GET /api/accounting/schema`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaResponse {
    /// Schema description, shown verbatim.
    #[serde(default)]
    pub schema: Option<Value>,
}

/// HTTP client for the accounting backend.
///
/// # Example
///
/// ```rust,no_run
/// use ledger_chat::client::AccountingClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AccountingClient::new("http://localhost:5000")?;
/// let reply = client.chat("Total sales this month?", &[]).await?;
/// println!("{}", reply.display_text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AccountingClient {
    base_url: Url,
    chat_path: String,
    schema_path: String,
    http: reqwest::Client,
}

impl AccountingClient {
    /// Create a client using the default endpoint paths.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let defaults = BackendConfig::default();
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            chat_path: defaults.chat_path,
            schema_path: defaults.schema_path,
            http,
        })
    }

    /// Create a client from backend configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build()?;

        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            chat_path: config.chat_path.clone(),
            schema_path: config.schema_path.clone(),
            http,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the schema description.
    ///
    /// Returns `Ok(None)` when the body has no `schema` field.
    pub async fn fetch_schema(&self) -> Result<Option<Value>> {
        let response = self.http.get(self.url(&self.schema_path)?).send().await?;
        let body: SchemaResponse = Self::handle_response(response).await?;
        Ok(body.schema)
    }

    /// Post a message together with the prior history.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatResponse> {
        let req = ChatRequest { message, history };
        let response = self
            .http
            .post(self.url(&self.chat_path)?)
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// JavaScript-style truthiness for optional payloads: `null`,
/// `false`, `0` and `""` count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Two-space indented JSON.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text_appends_results() {
        let resp = ChatResponse {
            message: Some("Found 1 row".to_string()),
            data: Some(json!([{"total": 5}])),
        };
        assert_eq!(
            resp.display_text(),
            "Found 1 row\n\nQuery Results:\n[\n  {\n    \"total\": 5\n  }\n]"
        );
    }

    #[test]
    fn test_display_text_skips_falsy_data() {
        for data in [json!(null), json!(false), json!(0), json!("")] {
            let resp = ChatResponse {
                message: Some("ok".to_string()),
                data: Some(data),
            };
            assert_eq!(resp.display_text(), "ok");
        }
    }

    #[test]
    fn test_missing_message_renders_undefined() {
        let resp: ChatResponse = serde_json::from_str(r#"{"data": {"n": 1}}"#).unwrap();
        assert!(resp.message.is_none());
        assert!(resp.display_text().starts_with("undefined\n\nQuery Results:"));
    }

    #[test]
    fn test_request_shape() {
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant(Some("b".into()))];
        let req = ChatRequest {
            message: "c",
            history: &history,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "message": "c",
                "history": [
                    {"role": "user", "content": "a"},
                    {"role": "assistant", "content": "b"}
                ]
            })
        );
    }

    #[test]
    fn test_url_join_keeps_absolute_paths() {
        let client = AccountingClient::new("http://localhost:5000/app/").unwrap();
        let url = client.url("/api/chat/accounting").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/chat/accounting");
    }
}
