//! Keeps only high-signal discussion threads.

use regex::Regex;
use signal_core::{FilterPolicy, Post};
use std::sync::LazyLock;
use tracing::info;

static EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)S\d{1,2}E\d{1,2}|Episode \d+|Season \d+").expect("valid episode regex")
});

/// Why a post was dropped, or that it was kept.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterVerdict {
    Keep,
    ExcludedKeyword(String),
    BlockedFlair(String),
    DisallowedFlair(String),
    LowComments { count: u32, threshold: u32 },
    LowRatio(f64),
}

impl FilterVerdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, FilterVerdict::Keep)
    }
}

#[derive(Debug, Clone)]
pub struct FilterEngine {
    policy: FilterPolicy,
    excluded: Vec<String>,
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl FilterEngine {
    pub fn new(policy: FilterPolicy) -> Self {
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect();
        Self {
            excluded: lower(&policy.excluded_keywords),
            allowed: lower(&policy.allowed_flairs),
            blocked: lower(&policy.blocked_flairs),
            policy,
        }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Episode threads get a lower comment threshold and skip the ratio test.
    pub fn is_episode_discussion(post: &Post) -> bool {
        EPISODE_RE.is_match(&post.title)
            || EPISODE_RE.is_match(&post.flair)
            || post.flair.to_lowercase().contains("episode discussion")
    }

    /// Runs the four drop tests in order; the first that fires decides.
    pub fn evaluate(&self, post: &Post) -> FilterVerdict {
        let title = post.title.to_lowercase();
        if let Some(keyword) = self.excluded.iter().find(|kw| title.contains(kw.as_str())) {
            return FilterVerdict::ExcludedKeyword(keyword.clone());
        }

        if !post.flair.is_empty() {
            let flair = post.flair.to_lowercase();
            if self.blocked.contains(&flair) {
                return FilterVerdict::BlockedFlair(post.flair.clone());
            }
            if !self.allowed.is_empty() && !self.allowed.contains(&flair) {
                return FilterVerdict::DisallowedFlair(post.flair.clone());
            }
        }

        let is_episode = Self::is_episode_discussion(post);
        let threshold = if is_episode {
            self.policy.episode_min_comments
        } else {
            self.policy.min_comments
        };
        // Zero comments means "not measured yet", not "dead thread".
        if post.num_comments > 0 && post.num_comments < threshold {
            return FilterVerdict::LowComments {
                count: post.num_comments,
                threshold,
            };
        }

        if !is_episode && post.score > 0 {
            let ratio = post.num_comments as f64 / post.score as f64;
            if ratio < self.policy.min_comment_score_ratio {
                return FilterVerdict::LowRatio(ratio);
            }
        }

        FilterVerdict::Keep
    }

    /// Filters and sorts by comment count, highest first. The sort is stable.
    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        let original_count = posts.len();
        let mut kept: Vec<Post> = posts
            .into_iter()
            .filter(|post| {
                let verdict = self.evaluate(post);
                match &verdict {
                    FilterVerdict::Keep => {}
                    FilterVerdict::ExcludedKeyword(kw) => {
                        info!(post_id = %post.id, "Filtered (Keyword '{}'): {}", kw, post.title)
                    }
                    FilterVerdict::BlockedFlair(flair) => {
                        info!(post_id = %post.id, "Filtered (Blocked Flair): {} [{}]", post.title, flair)
                    }
                    FilterVerdict::DisallowedFlair(flair) => {
                        info!(post_id = %post.id, "Filtered (Disallowed Flair): {} [{}]", post.title, flair)
                    }
                    FilterVerdict::LowComments { count, threshold } => {
                        info!(post_id = %post.id, "Filtered (Low Comments): {} ({} < {})", post.title, count, threshold)
                    }
                    FilterVerdict::LowRatio(ratio) => {
                        info!(post_id = %post.id, "Filtered (Low Ratio): {} (ratio {:.2})", post.title, ratio)
                    }
                }
                verdict.is_keep()
            })
            .collect();

        kept.sort_by(|a, b| b.num_comments.cmp(&a.num_comments));

        info!(
            "Filtered {} -> {} posts ({} removed)",
            original_count,
            kept.len(),
            original_count - kept.len()
        );
        kept
    }
}
