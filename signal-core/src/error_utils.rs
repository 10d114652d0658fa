use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Feed(e) => {
                error!("Feed error details: {:?}", e);
            }
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Storage(e) => {
                error!("Storage error details: {:?}", e);
            }
            CoreError::Render(e) => {
                error!("Render error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Feed(e) => e.user_friendly_message(),
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Storage(e) => e.user_friendly_message(),
            CoreError::Render(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Reddit could not be reached.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::Serialization(e) => format!("Could not encode or decode JSON: {}", e),
            CoreError::Internal { .. } => {
                "An unexpected error occurred. Normal service will resume with the next run."
                    .to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Feed(e) => e.error_code(),
            CoreError::RedditApi(e) => e.error_code(),
            CoreError::Storage(e) => e.error_code(),
            CoreError::Render(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for FeedError {
    fn log_error(&self) -> &Self {
        error!("FeedError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("FeedError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FeedError::BadStatus { status_code, .. } => {
                format!("RSS feed fetch failed with HTTP status {}", status_code)
            }
            FeedError::Timeout { seconds } => {
                format!("RSS feed fetch timed out after {}s", seconds)
            }
            FeedError::Unreachable { .. } => "Cannot reach Reddit RSS".to_string(),
            FeedError::Malformed { details } => format!("RSS parsing failed: {}", details),
        }
    }

    fn error_code(&self) -> String {
        match self {
            FeedError::BadStatus { .. } => "FEED_BAD_STATUS".to_string(),
            FeedError::Timeout { .. } => "FEED_TIMEOUT".to_string(),
            FeedError::Unreachable { .. } => "FEED_UNREACHABLE".to_string(),
            FeedError::Malformed { .. } => "FEED_MALFORMED".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Reddit is rate limiting requests. Retry after {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => {
                format!("Access denied to {}.", resource)
            }
            RedditApiError::PostNotFound { post_id } => {
                format!("Post {} could not be found.", post_id)
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            RedditApiError::InvalidResponse { .. } => {
                "Reddit returned a response in an unexpected shape.".to_string()
            }
            RedditApiError::UnexpectedStatus { status_code, .. } => {
                format!("Reddit answered with HTTP {}.", status_code)
            }
            RedditApiError::ServerError { status_code } => {
                format!("Reddit is having trouble (HTTP {}).", status_code)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::UnexpectedStatus { .. } => "REDDIT_UNEXPECTED_STATUS".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for StorageError {
    fn log_error(&self) -> &Self {
        error!("StorageError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StorageError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StorageError::CorruptSeenIds { path, .. } => {
                format!("The seen-post list at {} is unreadable and was reset.", path)
            }
            StorageError::WriteFailed { path, .. } => format!("Could not write {}.", path),
            StorageError::ReadFailed { path, .. } => format!("Could not read {}.", path),
            StorageError::DirectoryUnavailable { path, .. } => {
                format!("Directory {} is not available.", path)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            StorageError::CorruptSeenIds { .. } => "STORAGE_CORRUPT_SEEN_IDS".to_string(),
            StorageError::WriteFailed { .. } => "STORAGE_WRITE_FAILED".to_string(),
            StorageError::ReadFailed { .. } => "STORAGE_READ_FAILED".to_string(),
            StorageError::DirectoryUnavailable { .. } => "STORAGE_DIR_UNAVAILABLE".to_string(),
        }
    }
}

impl ErrorExt for RenderError {
    fn log_error(&self) -> &Self {
        error!("RenderError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RenderError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RenderError::OutputUnavailable { path } => {
                format!("Render failed: digest directory {} is unavailable", path)
            }
            RenderError::WriteFailed { path, .. } => {
                format!("Render failed: could not write {}", path)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            RenderError::OutputUnavailable { .. } => "RENDER_OUTPUT_UNAVAILABLE".to_string(),
            RenderError::WriteFailed { .. } => "RENDER_WRITE_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file not found: {}", path)
            }
            ConfigError::InvalidFormat { details } => {
                format!("Configuration file is malformed: {}", details)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for setting '{}'", value, field)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is invalid: {}", reason)
            }
            ConfigError::Parse(e) => format!("Configuration could not be parsed: {}", e),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Logs pipeline errors together with the stage they surfaced in.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, stage: &str, error: &CoreError) {
        error.log_error();
        info!(stage, "Error code: {}", error.error_code());
        info!(stage, "User message: {}", error.user_friendly_message());
    }

    pub fn report_warning(&self, stage: &str, error: &CoreError) {
        error.log_warn();
        info!(stage, "Error code: {}", error.error_code());
    }
}
