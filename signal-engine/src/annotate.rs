use crate::features::{catalyst_index, extract_show_name, Consensus, FeatureEngine, Freshness, Sentiment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signal_core::{Comment, Post};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub is_creator: bool,
    pub is_catalyst: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostFeatures {
    pub sentiment: Sentiment,
    pub consensus: Option<Consensus>,
    pub show_name: String,
    pub reading_time_minutes: usize,
    pub has_spoiler: bool,
    pub freshness: Freshness,
}

/// A post ready for the digest: the record itself, its derived features and
/// its comments with per-comment flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    pub post: Post,
    pub features: PostFeatures,
    pub comments: Vec<AnnotatedComment>,
}

impl FeatureEngine {
    pub fn annotate(&self, post: &Post, now: DateTime<Utc>) -> DigestEntry {
        let catalyst = catalyst_index(&post.comments);
        let comments = post
            .comments
            .iter()
            .enumerate()
            .map(|(idx, comment)| AnnotatedComment {
                comment: comment.clone(),
                is_creator: self.is_creator_comment(comment),
                is_catalyst: catalyst == Some(idx),
            })
            .collect();

        DigestEntry {
            features: PostFeatures {
                sentiment: self.sentiment(&post.comments),
                consensus: self.consensus(&post.comments),
                show_name: extract_show_name(&post.title),
                reading_time_minutes: self.reading_time(post),
                has_spoiler: self.has_spoiler(post),
                freshness: self.freshness(&post.created, post.num_comments, now),
            },
            comments,
            post: post.clone(),
        }
    }

    pub fn annotate_all(&self, posts: &[Post], now: DateTime<Utc>) -> Vec<DigestEntry> {
        posts.iter().map(|post| self.annotate(post, now)).collect()
    }
}
