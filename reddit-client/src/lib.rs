pub mod api;
pub mod comments;
pub mod feed;
pub mod rate_limiter;

pub use api::RedditApiClient;
pub use feed::parse_feed;

use signal_core::{CoreError, Post};

/// The network side of a digest run.
///
/// Batch methods return the whole list in input order. Failures of a single
/// post are absorbed (defaults kept, or comments marked degraded); an `Err`
/// means the batch as a whole could not be completed.
#[allow(async_fn_in_trait)]
pub trait RedditSource {
    async fn fetch_feed(&self) -> Result<String, CoreError>;

    async fn enrich(&self, posts: Vec<Post>) -> Result<Vec<Post>, CoreError>;

    async fn attach_comments(&self, posts: Vec<Post>) -> Result<Vec<Post>, CoreError>;
}
