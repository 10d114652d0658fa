use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum FeedError {
    #[error("Feed request failed with status {status_code}: {body_preview}")]
    BadStatus {
        status_code: u16,
        body_preview: String,
    },

    #[error("Feed request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Cannot reach feed host: {url}")]
    Unreachable { url: String },

    #[error("Malformed feed document: {details}")]
    Malformed { details: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Unexpected status {status_code} from {endpoint}")]
    UnexpectedStatus { status_code: u16, endpoint: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Seen-ID store unreadable at {path}: {reason}")]
    CorruptSeenIds { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to create directory {path}: {reason}")]
    DirectoryUnavailable { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Digest directory unavailable: {path}")]
    OutputUnavailable { path: String },

    #[error("Failed to write digest {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {details}")]
    InvalidFormat { details: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
