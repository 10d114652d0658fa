use crate::comments::comments_from_thread;
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::RedditSource;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signal_core::{
    Comment, CoreError, Engagement, ErrorExt, FeedConfig, FeedError, Post, RedditApiError,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// The subset of a thread's post object used for enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub score: i32,
    pub num_comments: u32,
    pub link_flair_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditCommentData {
    pub author: Option<String>,
    pub body: String,
    pub score: i32,
    pub author_flair_text: Option<String>,
}

impl From<RedditPostData> for Engagement {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            score: post_data.score,
            num_comments: post_data.num_comments,
            flair: post_data
                .link_flair_text
                .map(|f| f.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Client for the public (unauthenticated) Reddit endpoints the digest uses:
/// the subreddit RSS feed and the per-thread `.json` documents.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    config: FeedConfig,
}

impl RedditApiClient {
    pub fn new(config: FeedConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let rate_limiter = RateLimiter::new(RateLimitConfig::courtesy(Duration::from_millis(
            config.request_interval_ms,
        )));

        Ok(Self {
            http_client,
            rate_limiter,
            config,
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Downloads the raw subreddit feed.
    pub async fn get_feed(&self) -> Result<String, CoreError> {
        let url = &self.config.feed_url;
        info!("Fetching RSS feed from {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                error!("RSS fetch timed out after {}s", self.config.request_timeout_secs);
                CoreError::Feed(FeedError::Timeout {
                    seconds: self.config.request_timeout_secs,
                })
            } else if e.is_connect() {
                error!("Cannot reach Reddit RSS");
                CoreError::Feed(FeedError::Unreachable { url: url.clone() })
            } else {
                error!("Generic request error during RSS fetch: {}", e);
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            let body_preview: String = body.chars().take(200).collect();
            let err = FeedError::BadStatus {
                status_code: status.as_u16(),
                body_preview,
            };
            err.log_error();
            return Err(err.into());
        }

        info!("Fetched {} bytes of feed", body.len());
        Ok(body)
    }

    /// Fetches score, comment count and flair for one post.
    pub async fn get_post_engagement(&self, post: &Post) -> Result<Engagement, CoreError> {
        let short_id = post.id.trim_start_matches("t3_");
        let url = format!(
            "{}/r/{}/comments/{}.json",
            REDDIT_WEB_BASE, self.config.subreddit, short_id
        );

        let thread = self.get_json(&url, &[]).await?;
        let post_data = thread
            .as_array()
            .and_then(|parts| parts.first())
            .cloned()
            .ok_or_else(|| RedditApiError::InvalidResponse {
                details: format!("thread for {} has no post listing", post.id),
            })
            .and_then(|listing| {
                serde_json::from_value::<RedditListing<RedditPostData>>(listing).map_err(|e| {
                    RedditApiError::InvalidResponse {
                        details: format!("post listing for {}: {}", post.id, e),
                    }
                })
            })?
            .data
            .children
            .into_iter()
            .next()
            .map(|child| child.data)
            .ok_or_else(|| RedditApiError::PostNotFound {
                post_id: post.id.clone(),
            })?;

        Ok(post_data.into())
    }

    /// Fetches the thread sorted by top and keeps the best comments.
    pub async fn get_top_comments(&self, post: &Post) -> Result<Vec<Comment>, CoreError> {
        let url = thread_json_url(&post.url)?;
        let limit = self.config.comment_fetch_limit.to_string();
        let thread = self
            .get_json(url.as_str(), &[("sort", "top"), ("limit", limit.as_str())])
            .await?;

        comments_from_thread(
            &thread,
            self.config.comment_body_max_chars,
            self.config.max_comments_per_post,
        )
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, CoreError> {
        let permit = self.rate_limiter.acquire_permit().await;
        debug!("Acquired request permit after {:?}", permit.queue_wait_time);

        let start_time = Instant::now();
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let response = check_status(response, url)?;
        let value = response.json::<Value>().await.map_err(|e| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("{}: {}", url, e),
            })
        })?;

        debug!("GET {} completed in {:?}", url, start_time.elapsed());
        Ok(value)
    }
}

/// `https://…/comments/abc/slug/` becomes `https://…/comments/abc/slug.json`.
pub fn thread_json_url(permalink: &str) -> Result<Url, CoreError> {
    let mut url = Url::parse(permalink).map_err(|e| CoreError::InvalidInput {
        message: format!("post url '{}': {}", permalink, e),
    })?;
    let path = format!("{}.json", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}

fn check_status(response: Response, endpoint: &str) -> Result<Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    warn!("Request failed with status: {} for {}", status, endpoint);
    let err = match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::UnexpectedStatus {
            status_code: code,
            endpoint: endpoint.to_string(),
        },
    };
    Err(err.into())
}

fn is_rate_limited(err: &CoreError) -> bool {
    matches!(
        err,
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { .. })
    )
}

impl RedditSource for RedditApiClient {
    async fn fetch_feed(&self) -> Result<String, CoreError> {
        self.get_feed().await
    }

    /// Per-post failures keep the post's defaults. A 429 aborts the batch:
    /// continuing would only dig the rate-limit hole deeper.
    async fn enrich(&self, posts: Vec<Post>) -> Result<Vec<Post>, CoreError> {
        let mut enriched = Vec::with_capacity(posts.len());
        for post in posts {
            info!(post_id = %post.id, "Enriching post");
            match self.get_post_engagement(&post).await {
                Ok(engagement) => enriched.push(post.with_engagement(&engagement)),
                Err(e) if is_rate_limited(&e) => return Err(e),
                Err(e) => {
                    warn!(post_id = %post.id, "Error enriching post: {}", e);
                    enriched.push(post);
                }
            }
        }
        Ok(enriched)
    }

    async fn attach_comments(&self, posts: Vec<Post>) -> Result<Vec<Post>, CoreError> {
        let mut with_comments = Vec::with_capacity(posts.len());
        for post in posts {
            let preview: String = post.title.chars().take(50).collect();
            info!(post_id = %post.id, "Extracting comments for post: {}...", preview);
            match self.get_top_comments(&post).await {
                Ok(comments) => with_comments.push(post.with_comments(comments)),
                Err(e) if is_rate_limited(&e) => return Err(e),
                Err(e) => {
                    warn!(post_id = %post.id, "Failed to fetch comments for post: {}", e);
                    with_comments.push(post.with_degraded_comments());
                }
            }
        }
        Ok(with_comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_client_creation() {
        let client = RedditApiClient::new(FeedConfig::default()).unwrap();
        assert_eq!(client.config().subreddit, "television");
        assert_eq!(
            client.rate_limiter.config().time_window,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_engagement_conversion() {
        let listing: RedditListing<RedditPostData> = serde_json::from_value(json!({
            "kind": "Listing",
            "data": {
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "1abcde",
                        "title": "Severance S02E10",
                        "score": 812,
                        "num_comments": 431,
                        "link_flair_text": "  Episode Discussion ",
                        "over_18": false
                    }
                }]
            }
        }))
        .unwrap();

        let post_data = listing.data.children.into_iter().next().unwrap().data;
        let engagement: Engagement = post_data.into();
        assert_eq!(engagement.score, 812);
        assert_eq!(engagement.num_comments, 431);
        assert_eq!(engagement.flair, "Episode Discussion");
    }

    #[test]
    fn test_null_flair_becomes_empty() {
        let engagement: Engagement = RedditPostData {
            link_flair_text: None,
            ..Default::default()
        }
        .into();
        assert_eq!(engagement.flair, "");
    }

    #[test]
    fn test_thread_json_url() {
        let url =
            thread_json_url("https://www.reddit.com/r/television/comments/1abcde/severance/")
                .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.reddit.com/r/television/comments/1abcde/severance.json"
        );

        assert!(thread_json_url("not a url").is_err());
    }

    #[test]
    fn test_rate_limit_detection() {
        let limited: CoreError = RedditApiError::RateLimitExceeded { retry_after: 30 }.into();
        assert!(is_rate_limited(&limited));

        let other: CoreError = RedditApiError::RequestTimeout.into();
        assert!(!is_rate_limited(&other));
    }
}
