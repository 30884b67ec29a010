//! Reply formatting.
//!
//! Turns reply text into the HTML inserted into the transcript:
//!
//! - [`reply`]: tagged region parser (preamble, SQL, post-SQL, explanation)
//! - [`markdown`]: generic markdown-like formatting
//! - [`sql`]: SQL keyword highlighting
//!
//! # Markup trust
//!
//! Reply text comes from the backend and is inserted as markup, not as
//! inert text. By default any HTML the backend returns is rendered as-is.
//! With `escape_markup` enabled, text content is escaped before formatting
//! markers are applied and only the tags generated here are trusted.
//!
//! # Example
//!
//! ```rust
//! use ledger_chat::render::Formatter;
//!
//! let html = Formatter::default().format_content("```sql\nSELECT 1\n```");
//! assert!(html.contains("SQL Query"));
//! ```

pub mod markdown;
pub mod reply;
pub mod sql;

pub use markdown::format_message;
pub use reply::{ReplyLayout, Region, parse_reply};
pub use sql::highlight_sql;

use markdown::escape_text;

/// Renders reply text into transcript HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    escape_markup: bool,
}

impl Formatter {
    /// Create a formatter.
    #[must_use]
    pub fn new(escape_markup: bool) -> Self {
        Self { escape_markup }
    }

    /// Whether text content is escaped before formatting.
    #[must_use]
    pub fn escapes_markup(&self) -> bool {
        self.escape_markup
    }

    /// Render a full reply.
    #[must_use]
    pub fn format_content(&self, content: &str) -> String {
        match parse_reply(content) {
            ReplyLayout::Plain(text) => self.format_message(text),
            ReplyLayout::Structured(regions) => regions
                .iter()
                .map(|region| self.render_region(*region))
                .collect(),
        }
    }

    /// Generic formatting only.
    #[must_use]
    pub fn format_message(&self, text: &str) -> String {
        format_message(text, self.escape_markup)
    }

    fn render_region(&self, region: Region<'_>) -> String {
        match region {
            Region::Preamble(text) => format!(
                concat!(
                    r#"<div class="thinking-process">"#,
                    r#"<button class="btn btn-sm btn-outline-secondary mb-2" "#,
                    r#"onclick="this.nextElementSibling.classList.toggle('show')">"#,
                    "Show Thinking Process</button>",
                    r#"<div class="collapse thinking-content">"#,
                    r#"<div class="card card-body bg-light mb-3">{}</div>"#,
                    "</div></div>"
                ),
                self.format_message(text)
            ),
            Region::Sql(query) => format!(
                concat!(
                    r#"<div class="sql-section mb-3">"#,
                    r#"<div class="sql-header"><span class="badge bg-secondary">SQL Query</span></div>"#,
                    r#"<div class="sql-content"><pre><code class="language-sql">{}</code></pre></div>"#,
                    "</div>"
                ),
                highlight_sql(&escape_text(query, self.escape_markup))
            ),
            Region::PostSql(text) => format!(
                r#"<div class="actual-response">{}</div>"#,
                self.format_message(text)
            ),
            Region::Explanation(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KW_SELECT: &str = r#"<span class="sql-keyword">SELECT</span>"#;
    const KW_FROM: &str = r#"<span class="sql-keyword">FROM</span>"#;

    #[test]
    fn test_sql_reply_with_explanation_drops_explanation_text() {
        let html = Formatter::default()
            .format_content("```sql\nSELECT * FROM t\n```\n### Explanation\nDone.");

        assert!(html.contains("SQL Query"));
        assert!(html.contains(&format!("{KW_SELECT} * {KW_FROM} t")));
        assert!(!html.contains("Done."));
        assert!(!html.contains("thinking-process"));
        assert!(!html.contains("actual-response"));
    }

    #[test]
    fn test_regions_render_in_order() {
        let html = Formatter::default().format_content(
            "Checking invoices\n```sql\nSELECT 1\n```\nOne row\n### Explanation\nSkipped",
        );

        let thinking = html.find("thinking-process").unwrap();
        let sql = html.find("sql-section").unwrap();
        let result = html.find("actual-response").unwrap();
        assert!(thinking < sql && sql < result);
        assert!(html.contains("Checking invoices<br>"));
        assert!(html.contains("One row"));
        assert!(!html.contains("Skipped"));
    }

    #[test]
    fn test_thinking_panel_starts_collapsed() {
        let html = Formatter::default().format_content("hmm\n```sql\nSELECT 1\n```");
        assert!(html.contains(r#"<div class="collapse thinking-content">"#));
        assert!(html.contains("Show Thinking Process"));
    }

    #[test]
    fn test_plain_reply_uses_generic_formatting_only() {
        let html = Formatter::default().format_content("Line one\nuse `x` to select");
        assert_eq!(
            html,
            r#"Line one<br>use <code>x</code> to <span class="sql-keyword">select</span>"#
        );
        assert!(!html.contains("SQL Query"));
        assert!(!html.contains("thinking-process"));
    }

    #[test]
    fn test_escape_switch_applies_to_every_region() {
        let formatter = Formatter::new(true);
        let html = formatter.format_content("<i>x</i>\n```sql\nSELECT '<b>'\n```\n<u>y</u>");
        assert!(!html.contains("<i>") && !html.contains("<b>") && !html.contains("<u>"));
        assert!(html.contains("&lt;i&gt;x&lt;/i&gt;"));
        assert!(html.contains("&lt;u&gt;y&lt;/u&gt;"));
    }
}
