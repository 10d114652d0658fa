//! Comment thread decoding and cleanup.

use crate::api::{RedditCommentData, RedditListing};
use regex::Regex;
use serde_json::Value;
use signal_core::{Comment, CoreError, RedditApiError};
use std::sync::LazyLock;

static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^\)]+\)").expect("valid markdown link regex"));

const COMMENT_KIND: &str = "t1";

/// Truncates `body` to `max_chars` characters (marking the cut with `...`)
/// and rewrites markdown links to their display text.
pub fn clean_body(body: &str, max_chars: usize) -> String {
    let truncated = if body.chars().count() > max_chars {
        let mut cut: String = body.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        body.to_string()
    };
    MARKDOWN_LINK_RE.replace_all(&truncated, "$1").into_owned()
}

/// Keeps the `limit` highest-scored comments. Equal scores keep thread order.
pub fn select_top(mut comments: Vec<Comment>, limit: usize) -> Vec<Comment> {
    comments.sort_by(|a, b| b.score.cmp(&a.score));
    comments.truncate(limit);
    comments
}

/// Extracts the top comments from a thread response (`[post listing,
/// comment listing]`). A response without a comment listing yields no
/// comments; a comment listing that does not decode is an error.
pub fn comments_from_thread(
    thread: &Value,
    max_chars: usize,
    limit: usize,
) -> Result<Vec<Comment>, CoreError> {
    let Some(listing) = thread.as_array().and_then(|parts| parts.get(1)) else {
        return Ok(Vec::new());
    };

    let listing: RedditListing<Value> =
        serde_json::from_value(listing.clone()).map_err(|e| RedditApiError::InvalidResponse {
            details: format!("comment listing: {}", e),
        })?;

    let comments = listing
        .data
        .children
        .into_iter()
        .filter(|child| child.kind == COMMENT_KIND)
        .filter_map(|child| match serde_json::from_value::<RedditCommentData>(child.data) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!("Skipping undecodable comment: {}", e);
                None
            }
        })
        .map(|data| Comment {
            author: data.author.unwrap_or_else(|| "[deleted]".to_string()),
            body: clean_body(&data.body, max_chars),
            score: data.score,
            author_flair: data.author_flair_text.unwrap_or_default(),
        })
        .collect();

    Ok(select_top(comments, limit))
}
