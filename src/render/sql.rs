//! SQL keyword highlighting.

use std::sync::LazyLock;

use regex::Regex;

/// Keywords wrapped by [`highlight_sql`], matched case-insensitively on word
/// boundaries. Multi-word entries use a single space. Case folding and word
/// boundaries are ASCII only.
pub const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP BY", "ORDER BY", "JOIN", "ON", "AS", "AND", "OR", "IN",
    "LIKE", "BETWEEN", "IS", "NULL", "NOT", "DISTINCT", "COUNT", "SUM", "AVG", "MIN", "MAX",
];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i-u)\b({})\b", SQL_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("keyword pattern is valid")
});

/// Wrap every SQL keyword in `<span class="sql-keyword">`, keeping the
/// matched text's case.
///
/// Callers must pass text content only. Running this over generated markup
/// would wrap words inside attribute values.
pub fn highlight_sql(text: &str) -> String {
    KEYWORD_RE
        .replace_all(text, r#"<span class="sql-keyword">${1}</span>"#)
        .into_owned()
}
