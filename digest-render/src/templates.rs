use crate::DigestSummary;
use signal_engine::{AnnotatedComment, DigestEntry};

/// Full digest page: stats dashboard followed by one card per post.
pub fn render_digest(
    entries: &[DigestEntry],
    summary: &DigestSummary,
    display_date: &str,
    generated_at: &str,
) -> String {
    let mut content = String::new();

    content.push_str(&format!(
        r#"<div class="container">
<p class="dateline">{date}</p>
"#,
        date = html_escape(display_date),
    ));

    if summary.degraded {
        content.push_str(
            r#"<div class="degraded-banner">Comments could not be fetched today. Showing posts without discussion highlights.</div>
"#,
        );
    }

    content.push_str(&render_stats(entries.len(), summary));

    if entries.is_empty() {
        content.push_str(r#"<p class="empty">No new high-signal discussions today. Check back tomorrow.</p>"#);
    }

    for (rank, entry) in entries.iter().enumerate() {
        content.push_str(&render_card(rank + 1, entry));
    }

    content.push_str(&format!(
        r#"<p class="footer">Generated {}</p>
</div>"#,
        html_escape(generated_at)
    ));

    build_page(display_date, &content)
}

/// Minimal page shown when the run could not produce a digest.
pub fn render_fallback(display_date: &str, reason: &str) -> String {
    let content = format!(
        r#"<div class="container fallback">
<p>Today's digest could not be generated.</p>
<p class="reason">Error: {}</p>
<p>Normal service will resume with the next run.</p>
</div>"#,
        html_escape(reason)
    );
    build_page(display_date, &content)
}

fn render_stats(post_count: usize, summary: &DigestSummary) -> String {
    let hottest = if summary.hottest_title.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="stat"><span class="stat-value">{}</span><span class="stat-label">Hottest: {}</span></div>"#,
            summary.hottest_comments,
            html_escape(&summary.hottest_title)
        )
    };

    format!(
        r#"<div class="stats">
<div class="stat"><span class="stat-value">{post_count}</span><span class="stat-label">Discussions</span></div>
<div class="stat"><span class="stat-value">{total}</span><span class="stat-label">Comments</span></div>
<div class="stat"><span class="stat-value">{filtered}</span><span class="stat-label">Filtered out of {fetched}</span></div>
{hottest}
</div>
"#,
        total = summary.total_comments,
        filtered = summary.posts_filtered_out,
        fetched = summary.posts_fetched,
    )
}

fn render_card(rank: usize, entry: &DigestEntry) -> String {
    let post = &entry.post;
    let features = &entry.features;

    let mut badges = format!(
        r#"<span class="badge badge-{}">{} {}</span>"#,
        features.sentiment.css_class(),
        features.sentiment.emoji(),
        features.sentiment.label()
    );
    if let Some(consensus) = &features.consensus {
        badges.push_str(&format!(
            r#"<span class="badge badge-{}">{} {}</span>"#,
            consensus.css_class(),
            consensus.emoji(),
            html_escape(&consensus.label())
        ));
    }
    if features.freshness.is_trending {
        badges.push_str(r#"<span class="badge badge-trending">Trending</span>"#);
    }
    if features.has_spoiler {
        badges.push_str(r#"<span class="badge badge-spoiler">Spoilers</span>"#);
    }

    let show = if features.show_name.is_empty() {
        String::new()
    } else {
        format!(r#"<span class="show">{}</span>"#, html_escape(&features.show_name))
    };

    let flair = if post.flair.is_empty() {
        String::new()
    } else {
        format!(r#"<span class="flair">{}</span>"#, html_escape(&post.flair))
    };

    let time_ago = if features.freshness.time_ago.is_empty() {
        String::new()
    } else {
        format!("<span>{}</span>", html_escape(&features.freshness.time_ago))
    };

    let comments = if entry.comments.is_empty() {
        if post.comments_degraded {
            r#"<p class="no-comments">Comments unavailable.</p>"#.to_string()
        } else {
            String::new()
        }
    } else {
        let items: String = entry.comments.iter().map(render_comment).collect();
        format!(r#"<ul class="comments">{items}</ul>"#)
    };

    format!(
        r#"<div class="post-card">
<div class="rank">#{rank}</div>
<h3><a href="{url}" target="_blank" rel="noopener">{title}</a></h3>
<div class="meta-row">{show}{flair}<span>u/{author}</span><span>{score} points</span><span>{num_comments} comments</span>{time_ago}<span>{minutes} min read</span></div>
<div class="badges">{badges}</div>
{comments}
</div>
"#,
        url = html_escape(&post.url),
        title = html_escape(&post.title),
        author = html_escape(&post.author),
        score = post.score,
        num_comments = post.num_comments,
        minutes = features.reading_time_minutes,
    )
}

fn render_comment(comment: &AnnotatedComment) -> String {
    let mut tags = String::new();
    if comment.is_catalyst {
        tags.push_str(r#"<span class="badge badge-catalyst">Conversation Catalyst</span>"#);
    }
    if comment.is_creator {
        tags.push_str(&format!(
            r#"<span class="badge badge-creator">{}</span>"#,
            html_escape(&comment.comment.author_flair)
        ));
    }

    format!(
        r#"<li class="comment"><div class="comment-meta"><strong>u/{author}</strong> &middot; {score} points {tags}</div><p>{body}</p></li>"#,
        author = html_escape(&comment.comment.author),
        score = comment.comment.score,
        body = html_escape(&comment.comment.body),
    )
}

// --- Helpers ---

fn build_page(subtitle: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>The TV Signal - {subtitle}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;}}
.header h1{{font-size:20px;font-weight:600;}}
.container{{max-width:860px;margin:0 auto;padding:24px;}}
.dateline{{color:#666;font-size:14px;margin-bottom:16px;}}
.degraded-banner{{background:#fff8e1;border:1px solid #ffecb3;padding:8px 12px;border-radius:4px;font-size:13px;color:#795548;margin-bottom:16px;}}
.stats{{display:flex;gap:16px;flex-wrap:wrap;margin-bottom:24px;}}
.stat{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:12px 16px;display:flex;flex-direction:column;}}
.stat-value{{font-size:22px;font-weight:700;}}
.stat-label{{font-size:12px;color:#888;}}
.post-card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.post-card .rank{{font-size:12px;color:#999;}}
.post-card h3{{font-size:16px;margin-bottom:4px;}}
.post-card h3 a{{color:#1a1a1a;text-decoration:none;}}
.post-card h3 a:hover{{color:#0066cc;}}
.meta-row{{display:flex;gap:12px;flex-wrap:wrap;align-items:center;font-size:12px;color:#888;margin:8px 0;}}
.show{{font-weight:600;color:#333;}}
.flair{{background:#f0f0f0;padding:2px 8px;border-radius:10px;color:#555;}}
.badges{{display:flex;gap:6px;flex-wrap:wrap;margin-bottom:8px;}}
.badge{{display:inline-block;padding:2px 8px;border-radius:12px;font-size:11px;font-weight:600;}}
.badge-positive{{background:#e8f5e9;color:#2e7d32;}}
.badge-negative{{background:#fce4ec;color:#c62828;}}
.badge-mixed{{background:#fff3e0;color:#e65100;}}
.badge-neutral{{background:#eceff1;color:#546e7a;}}
.badge-consensus{{background:#e3f2fd;color:#1565c0;}}
.badge-divided{{background:#f3e5f5;color:#7b1fa2;}}
.badge-trending{{background:#ffebee;color:#d32f2f;}}
.badge-spoiler{{background:#212121;color:#fff;}}
.badge-catalyst{{background:#fffde7;color:#f57f17;}}
.badge-creator{{background:#e0f7fa;color:#00838f;}}
.comments{{list-style:none;border-top:1px solid #eee;padding-top:8px;}}
.comment{{margin-bottom:8px;font-size:14px;}}
.comment-meta{{font-size:12px;color:#666;margin-bottom:2px;}}
.no-comments,.empty{{color:#888;font-size:13px;font-style:italic;}}
.fallback{{text-align:center;padding:40px;}}
.fallback .reason{{color:#666;font-style:italic;margin:12px 0;}}
.footer{{color:#aaa;font-size:11px;text-align:center;margin-top:24px;}}
</style>
</head>
<body>
<div class="header">
    <h1>The TV Signal</h1>
</div>
{content}
</body>
</html>"#,
        subtitle = html_escape(subtitle),
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
