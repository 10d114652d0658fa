//! Subreddit RSS/Atom feed parsing.

use feed_rs::model::Entry;
use regex::Regex;
use signal_core::{CoreError, FeedError, Post};
use std::sync::LazyLock;
use tracing::{info, warn};

static COMMENTS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/comments/([a-z0-9]+)").expect("valid comments id regex"));

const DELETED_AUTHOR: &str = "[deleted]";

/// Parses raw feed text into posts. Entries whose id cannot be derived are
/// skipped; only an unreadable document as a whole is an error.
pub fn parse_feed(raw: &str, subreddit: &str) -> Result<Vec<Post>, CoreError> {
    let feed = feed_rs::parser::parse(raw.as_bytes()).map_err(|e| FeedError::Malformed {
        details: e.to_string(),
    })?;

    let total = feed.entries.len();
    let posts: Vec<Post> = feed
        .entries
        .into_iter()
        .filter_map(|entry| entry_to_post(entry, subreddit))
        .collect();

    info!(
        "Successfully parsed {} posts ({} entries skipped)",
        posts.len(),
        total - posts.len()
    );
    Ok(posts)
}

fn entry_to_post(entry: Entry, subreddit: &str) -> Option<Post> {
    let title = entry
        .title
        .as_ref()
        .map(|t| unescape_html(&t.content))
        .unwrap_or_default();
    let url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let id = match post_id(&entry.id, &url) {
        Some(id) => id,
        None => {
            warn!("Could not extract ID for entry: {}", title);
            return None;
        }
    };

    let author = entry
        .authors
        .first()
        .map(|p| strip_user_prefix(&p.name).to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DELETED_AUTHOR.to_string());

    let created = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    Some(Post {
        id,
        title,
        url,
        author,
        created,
        subreddit: subreddit.to_string(),
        ..Default::default()
    })
}

/// Entry ids that are empty or URLs are replaced by `t3_<id>` taken from the
/// permalink.
pub fn post_id(entry_id: &str, link: &str) -> Option<String> {
    if !entry_id.is_empty() && !entry_id.starts_with("http") {
        return Some(entry_id.to_string());
    }
    COMMENTS_ID_RE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("t3_{}", m.as_str()))
}

fn strip_user_prefix(name: &str) -> &str {
    name.strip_prefix("/u/")
        .or_else(|| name.strip_prefix("u/"))
        .unwrap_or(name)
}

/// Decodes the entities Reddit double-escapes in feed titles.
/// Decodes every named and numeric HTML entity in a feed title.
pub fn unescape_html(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>television</title>
  <id>https://www.reddit.com/r/television/.rss</id>
  <updated>2026-10-16T20:00:00+00:00</updated>
  <entry>
    <author><name>/u/couch_critic</name></author>
    <id>t3_1abcde</id>
    <link href="https://www.reddit.com/r/television/comments/1abcde/severance_s02e10/" />
    <updated>2026-10-16T19:00:00+00:00</updated>
    <published>2026-10-16T18:30:00+00:00</published>
    <title>Severance S02E10 &amp;amp; the finale</title>
  </entry>
  <entry>
    <author><name>u/remote_control</name></author>
    <id>https://www.reddit.com/r/television/comments/2xyz99/</id>
    <link href="https://www.reddit.com/r/television/comments/2xyz99/what_are_you_watching/" />
    <updated>2026-10-16T17:00:00+00:00</updated>
    <title>What are you watching this week?</title>
  </entry>
  <entry>
    <id>https://example.com/not-a-reddit-post</id>
    <link href="https://example.com/elsewhere" />
    <updated>2026-10-16T16:00:00+00:00</updated>
    <title>Orphan entry</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_normalizes_entries() {
        let posts = parse_feed(ATOM, "television").unwrap();
        assert_eq!(posts.len(), 2);

        let first = &posts[0];
        assert_eq!(first.id, "t3_1abcde");
        assert_eq!(first.title, "Severance S02E10 & the finale");
        assert_eq!(first.author, "couch_critic");
        assert_eq!(first.subreddit, "television");
        assert!(first.created.starts_with("2026-10-16T18:30:00"));
        assert_eq!(first.score, 0);
        assert_eq!(first.num_comments, 0);
        assert!(first.flair.is_empty());
    }

    #[test]
    fn test_url_ids_are_derived_from_permalink() {
        let posts = parse_feed(ATOM, "television").unwrap();
        let second = &posts[1];
        assert_eq!(second.id, "t3_2xyz99");
        assert_eq!(second.author, "remote_control");
        // no <published>, falls back to <updated>
        assert!(second.created.starts_with("2026-10-16T17:00:00"));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = parse_feed("this is not xml at all", "television").unwrap_err();
        assert!(matches!(err, CoreError::Feed(FeedError::Malformed { .. })));
    }

    #[test]
    fn test_post_id_rules() {
        assert_eq!(post_id("t3_abc", ""), Some("t3_abc".to_string()));
        assert_eq!(
            post_id("", "https://www.reddit.com/r/tv/comments/q1w2e3/x/"),
            Some("t3_q1w2e3".to_string())
        );
        assert_eq!(post_id("https://example.com/a", "https://example.com/a"), None);
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(unescape_html("&quot;Lost&quot;"), "\"Lost\"");
        assert_eq!(unescape_html("it&#39;s"), "it's");
    }

    #[test]
    fn test_unescape_html_named_and_numeric_entities() {
        assert_eq!(
            unescape_html("Caf&eacute; It&#8217;s &hellip; &#x200B;end"),
            "Caf\u{e9} It\u{2019}s \u{2026} \u{200b}end"
        );
    }
}
