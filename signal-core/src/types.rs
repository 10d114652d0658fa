use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// A subreddit post as it moves through the pipeline.
///
/// Stages never mutate a post in place; they return updated copies via the
/// `with_*` builders so a failed stage can fall back to its input list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: String,
    /// RFC 3339 timestamp, or empty when the feed entry carried none.
    pub created: String,
    pub subreddit: String,
    pub score: i32,
    pub num_comments: u32,
    pub flair: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub comments_degraded: bool,
}

impl Post {
    pub fn with_engagement(&self, engagement: &Engagement) -> Self {
        Self {
            score: engagement.score,
            num_comments: engagement.num_comments,
            flair: engagement.flair.clone(),
            ..self.clone()
        }
    }

    pub fn with_comments(&self, comments: Vec<Comment>) -> Self {
        Self {
            comments,
            comments_degraded: false,
            ..self.clone()
        }
    }

    /// Copy of the post with comments cleared and marked as unavailable.
    pub fn with_degraded_comments(&self) -> Self {
        Self {
            comments: Vec::new(),
            comments_degraded: true,
            ..self.clone()
        }
    }

    pub fn has_comments(&self) -> bool {
        !self.comments.is_empty()
    }
}

/// Score, comment count and flair reported by the per-post JSON endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub score: i32,
    pub num_comments: u32,
    pub flair: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub score: i32,
    pub author_flair: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Counters accumulated across one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: Uuid,
    pub date: String,
    pub posts_fetched: usize,
    pub posts_after_dedup: usize,
    pub posts_after_filter: usize,
    pub posts_in_digest: usize,
    pub comments_success: usize,
    pub comments_total: usize,
    pub degraded: bool,
    /// Wall-clock seconds, rounded to two decimals.
    pub runtime: f64,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            date: Local::now().to_rfc3339(),
            posts_fetched: 0,
            posts_after_dedup: 0,
            posts_after_filter: 0,
            posts_in_digest: 0,
            comments_success: 0,
            comments_total: 0,
            degraded: false,
            runtime: 0.0,
            status: RunStatus::Failed,
            failure_reason: None,
        }
    }

    pub fn record_runtime(&mut self, started: Instant) {
        let secs = started.elapsed().as_secs_f64();
        self.runtime = (secs * 100.0).round() / 100.0;
    }

    /// Records comment coverage for the post list leaving the comment stage.
    pub fn record_comments(&mut self, posts: &[Post]) {
        self.comments_total = posts.len();
        self.comments_success = posts.iter().filter(|p| p.has_comments()).count();
        self.degraded = self.comments_success == 0 && !posts.is_empty();
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
