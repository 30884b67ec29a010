//! Reply layout parser.
//!
//! Splits a reply into tagged regions around the first fenced `sql` block.
//! The post-SQL region is the text after the second triple-backtick marker
//! counted from the start of the reply, not the text after the SQL fence's
//! own closing marker. The two coincide for the usual reply shape; a fence
//! earlier in the reply shifts the post-SQL region onto other content.

/// Any triple-backtick marker.
pub const FENCE: &str = "```";

/// Opening marker of a SQL fence, without the trailing newline.
pub const SQL_FENCE: &str = "```sql";

/// Marker that ends the rendered part of a reply.
pub const EXPLANATION_MARKER: &str = "### Explanation";

/// A tagged piece of a structured reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region<'a> {
    /// Text before the first SQL fence or explanation marker. Untrimmed.
    Preamble(&'a str),
    /// Body of the first `sql` fence, trimmed.
    Sql(&'a str),
    /// Text between the post-SQL marker and the explanation marker, trimmed.
    PostSql(&'a str),
    /// Text after the explanation marker. Parsed, never rendered.
    Explanation(&'a str),
}

/// Layout of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyLayout<'a> {
    /// No SQL fence: the whole reply gets generic formatting.
    Plain(&'a str),
    /// Non-blank regions in display order.
    Structured(Vec<Region<'a>>),
}

/// Position within the reply's triple-backtick markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    /// Before the first marker.
    Leading,
    /// Between the first and second markers.
    Opened,
    /// After the second marker.
    Closed,
}

/// Parse a reply into its layout.
pub fn parse_reply(text: &str) -> ReplyLayout<'_> {
    let Some(sql) = sql_fence_body(text) else {
        return ReplyLayout::Plain(text);
    };

    let mut regions = Vec::with_capacity(4);

    let preamble = preamble(text);
    if !preamble.trim().is_empty() {
        regions.push(Region::Preamble(preamble));
    }

    regions.push(Region::Sql(sql.trim()));

    if let Some(piece) = post_fence_piece(text) {
        let (result, explanation) = match piece.split_once(EXPLANATION_MARKER) {
            Some((before, after)) => (before, Some(after)),
            None => (piece, None),
        };
        let result = result.trim();
        if !result.is_empty() {
            regions.push(Region::PostSql(result));
        }
        if let Some(explanation) = explanation {
            regions.push(Region::Explanation(explanation.trim()));
        }
    }

    ReplyLayout::Structured(regions)
}

/// Body of the first "```sql\n" fence up to the next marker.
fn sql_fence_body(text: &str) -> Option<&str> {
    let open = format!("{SQL_FENCE}\n");
    let start = text.find(&open)? + open.len();
    let len = text[start..].find(FENCE)?;
    Some(&text[start..start + len])
}

/// Text before whichever of the SQL fence or explanation marker comes first.
fn preamble(text: &str) -> &str {
    let cut = [text.find(SQL_FENCE), text.find(EXPLANATION_MARKER)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    &text[..cut]
}

/// Text following the second marker, up to the third marker or the end.
fn post_fence_piece(text: &str) -> Option<&str> {
    let mut state = FenceState::Leading;
    for piece in text.split(FENCE) {
        match state {
            FenceState::Leading => state = FenceState::Opened,
            FenceState::Opened => state = FenceState::Closed,
            FenceState::Closed => return Some(piece),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reply() {
        assert_eq!(parse_reply("Revenue is up."), ReplyLayout::Plain("Revenue is up."));
    }

    #[test]
    fn test_sql_fence_requires_newline() {
        // "```sql " never opens a SQL fence.
        let text = "```sql SELECT 1```";
        assert_eq!(parse_reply(text), ReplyLayout::Plain(text));
    }

    #[test]
    fn test_unclosed_sql_fence_is_plain() {
        let text = "```sql\nSELECT 1";
        assert_eq!(parse_reply(text), ReplyLayout::Plain(text));
    }

    #[test]
    fn test_full_reply_regions() {
        let text = "Thinking about totals\n```sql\nSELECT 1\n```\nTotal: 1\n### Explanation\nBecause.";
        assert_eq!(
            parse_reply(text),
            ReplyLayout::Structured(vec![
                Region::Preamble("Thinking about totals\n"),
                Region::Sql("SELECT 1"),
                Region::PostSql("Total: 1"),
                Region::Explanation("Because."),
            ])
        );
    }

    #[test]
    fn test_blank_preamble_and_result_are_dropped() {
        let text = "  \n```sql\nSELECT * FROM t\n```\n### Explanation\nDone.";
        assert_eq!(
            parse_reply(text),
            ReplyLayout::Structured(vec![
                Region::Sql("SELECT * FROM t"),
                Region::Explanation("Done."),
            ])
        );
    }

    #[test]
    fn test_explanation_before_sql_cuts_preamble() {
        let text = "intro ### Explanation more ```sql\nSELECT 1\n```";
        let ReplyLayout::Structured(regions) = parse_reply(text) else {
            panic!("expected structured layout");
        };
        assert_eq!(regions[0], Region::Preamble("intro "));
        assert_eq!(regions[1], Region::Sql("SELECT 1"));
    }

    #[test]
    fn test_earlier_fence_shifts_post_sql_region() {
        // The python fence consumes the first two markers, so the post-SQL
        // region is the text between the python fence and the SQL fence.
        let text = "```python\nx = 1\n```\nbetween\n```sql\nSELECT 1\n```\nafter";
        let ReplyLayout::Structured(regions) = parse_reply(text) else {
            panic!("expected structured layout");
        };
        assert_eq!(regions.last(), Some(&Region::PostSql("between")));
        assert!(!regions.contains(&Region::PostSql("after")));
    }

    #[test]
    fn test_post_sql_region_absent_without_trailing_text() {
        let text = "```sql\nSELECT 1\n```";
        assert_eq!(
            parse_reply(text),
            ReplyLayout::Structured(vec![Region::Sql("SELECT 1")])
        );
    }
}
