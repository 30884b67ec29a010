//! Markdown-like formatting for reply text.
//!
//! Fenced code blocks are cut out first; inline code, line breaks and
//! keyword highlighting then apply to the text between them. Every pass
//! works on text content before tags are emitted, so no pass rewrites
//! markup produced by an earlier one.

use std::sync::LazyLock;

use regex::Regex;

use super::sql::highlight_sql;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_]+)?\n(.*?)```").expect("code block pattern is valid")
});

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern is valid"));

/// Language class used when a fence carries no tag.
const DEFAULT_LANGUAGE: &str = "plaintext";

/// Format arbitrary reply text.
pub fn format_message(text: &str, escape: bool) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;

    for caps in CODE_BLOCK_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&format_inline(&text[last..whole.start()], escape));

        let lang = caps.get(1).map_or(DEFAULT_LANGUAGE, |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str()).trim();
        out.push_str(&format!(
            r#"<pre><code class="language-{lang}">{}</code></pre>"#,
            highlight_sql(&escape_text(body, escape))
        ));
        last = whole.end();
    }

    out.push_str(&format_inline(&text[last..], escape));
    out
}

/// Inline code spans plus plain text.
fn format_inline(text: &str, escape: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in INLINE_CODE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&format_plain(&text[last..whole.start()], escape));
        let inner = caps.get(1).map_or("", |m| m.as_str());
        out.push_str("<code>");
        out.push_str(&format_plain(inner, escape));
        out.push_str("</code>");
        last = whole.end();
    }

    out.push_str(&format_plain(&text[last..], escape));
    out
}

fn format_plain(text: &str, escape: bool) -> String {
    highlight_sql(&escape_text(text, escape)).replace('\n', "<br>")
}

/// HTML-escape text content when the escape switch is on.
pub(crate) fn escape_text(text: &str, escape: bool) -> String {
    if escape {
        html_escape::encode_text(text).into_owned()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_breaks() {
        assert_eq!(format_message("a\nb", false), "a<br>b");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            format_message("use `ledger` table", false),
            "use <code>ledger</code> table"
        );
    }

    #[test]
    fn test_code_block_with_language() {
        let out = format_message("see:\n```python\nprint(1)\n```\nend", false);
        assert_eq!(
            out,
            r#"see:<br><pre><code class="language-python">print(1)</code></pre><br>end"#
        );
    }

    #[test]
    fn test_code_block_without_language() {
        let out = format_message("```\nplain text\n```", false);
        assert_eq!(out, r#"<pre><code class="language-plaintext">plain text</code></pre>"#);
    }

    #[test]
    fn test_code_block_is_not_reprocessed_as_inline_code() {
        let out = format_message("```\nx\n```", false);
        assert!(!out.contains("<code>"));
        assert!(!out.contains('`'));
    }

    #[test]
    fn test_keywords_do_not_touch_generated_markup() {
        // "sql" in the class attribute and "code" tags stay intact.
        let out = format_message("```sql\nselect 1\n```", false);
        assert_eq!(
            out,
            r#"<pre><code class="language-sql"><span class="sql-keyword">select</span> 1</code></pre>"#
        );
    }

    #[test]
    fn test_keywords_highlighted_in_text_and_inline_code() {
        let out = format_message("Use `SELECT` or select", false);
        assert_eq!(
            out,
            r#"Use <code><span class="sql-keyword">SELECT</span></code> <span class="sql-keyword">or</span> <span class="sql-keyword">select</span>"#
        );
    }

    #[test]
    fn test_markup_passes_through_unless_escaped() {
        assert_eq!(format_message("<b>hi</b>", false), "<b>hi</b>");
        assert_eq!(format_message("<b>hi</b>", true), "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn test_language_tag_is_ascii_only() {
        let out = format_message("```café\nx\n```", false);
        assert!(!out.contains("<pre>"));
        let out = format_message("```rust2\nx\n```", false);
        assert!(out.contains(r#"<code class="language-rust2">"#));
    }
}
