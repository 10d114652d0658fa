//! Run configuration.
//!
//! Everything the pipeline treats as policy (keyword lists, thresholds, file
//! locations) lives here as plain data. A `DigestConfig` is built once at
//! startup, validated, and then handed out by value: the filter engine takes
//! a [`FilterPolicy`], the feature engine a [`FeatureLexicon`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "tv-signal.toml";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub feed: FeedConfig,
    pub filter: FilterPolicy,
    pub lexicon: FeatureLexicon,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub subreddit: String,
    pub feed_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Courtesy delay between per-post requests.
    pub request_interval_ms: u64,
    pub max_comments_per_post: usize,
    pub comment_fetch_limit: u32,
    pub comment_body_max_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            subreddit: "television".to_string(),
            feed_url: "https://www.reddit.com/r/television/.rss?limit=100".to_string(),
            user_agent: "TheTV Signal/1.0 (RSS digest bot)".to_string(),
            request_timeout_secs: 30,
            request_interval_ms: 1000,
            max_comments_per_post: 3,
            comment_fetch_limit: 10,
            comment_body_max_chars: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    pub excluded_keywords: Vec<String>,
    /// Empty means every non-blocked flair is allowed.
    pub allowed_flairs: Vec<String>,
    pub blocked_flairs: Vec<String>,
    pub min_comments: u32,
    pub episode_min_comments: u32,
    pub min_comment_score_ratio: f64,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            excluded_keywords: strings(&[
                "trailer",
                "teaser",
                "first look",
                "cast",
                "casting",
                "renewed",
                "cancelled",
                "canceled",
                "streaming on",
                "coming to",
                "moves to",
                "premiere date",
                "release date",
            ]),
            allowed_flairs: strings(&[
                "discussion",
                "review",
                "episode discussion",
                "weekly rec thread",
                "official",
            ]),
            blocked_flairs: strings(&["trailer", "casting", "news", "premiere date"]),
            min_comments: 50,
            episode_min_comments: 20,
            min_comment_score_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureLexicon {
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub mixed_words: Vec<String>,
    pub agree_words: Vec<String>,
    pub disagree_words: Vec<String>,
    pub creator_flair_keywords: Vec<String>,
    pub spoiler_keywords: Vec<String>,
    pub words_per_minute: usize,
    pub trending_max_hours: f64,
    pub trending_min_comments: u32,
}

impl Default for FeatureLexicon {
    fn default() -> Self {
        Self {
            positive_words: strings(&[
                "amazing",
                "masterpiece",
                "brilliant",
                "fantastic",
                "incredible",
                "love",
                "loved",
                "perfect",
                "excellent",
                "outstanding",
                "phenomenal",
                "superb",
                "beautiful",
                "gorgeous",
                "stunning",
                "best",
                "favorite",
                "favourite",
                "great",
                "wonderful",
                "awesome",
                "enjoy",
                "enjoyed",
                "impressive",
            ]),
            negative_words: strings(&[
                "terrible",
                "awful",
                "horrible",
                "disappointing",
                "boring",
                "worst",
                "hate",
                "hated",
                "trash",
                "garbage",
                "mediocre",
                "bad",
                "poor",
                "painful",
                "unwatchable",
                "cringe",
                "annoying",
                "overrated",
                "weak",
                "bland",
                "dull",
                "forgettable",
                "disaster",
                "ruined",
            ]),
            mixed_words: strings(&[
                "but",
                "however",
                "although",
                "conflicted",
                "mixed",
                "uneven",
                "inconsistent",
                "divisive",
                "controversial",
                "overrated",
            ]),
            agree_words: strings(&[
                "agree",
                "exactly",
                "this",
                "yes",
                "right",
                "same",
                "true",
                "absolutely",
                "definitely",
            ]),
            disagree_words: strings(&[
                "disagree", "wrong", "no", "nah", "nope", "but", "however", "actually",
            ]),
            creator_flair_keywords: strings(&[
                "creator",
                "showrunner",
                "writer",
                "director",
                "producer",
                "actor",
                "actress",
                "verified",
                "official",
                "staff",
                "crew",
                "show creator",
            ]),
            spoiler_keywords: strings(&[
                "finale",
                "twist",
                "dies",
                "death",
                "killed",
                "ending",
                "spoiler",
                "reveal",
                "plot twist",
                "cliffhanger",
            ]),
            words_per_minute: 200,
            trending_max_hours: 6.0,
            trending_min_comments: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub seen_ids_file: PathBuf,
    pub max_seen_ids: usize,
    pub memory_file: PathBuf,
    pub max_history_entries: usize,
    pub artifact_dir: PathBuf,
    pub digest_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seen_ids_file: PathBuf::from("data/seen_ids.json"),
            max_seen_ids: 200,
            memory_file: PathBuf::from("MEMORY.md"),
            max_history_entries: 30,
            artifact_dir: PathBuf::from("data/artifacts"),
            digest_dir: PathBuf::from("data/digests"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Local wall-clock time of the daily run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { hour: 23, minute: 0 }
    }
}

impl DigestConfig {
    /// Loads configuration from `path`.
    ///
    /// When `path` is `None` the default location is tried and built-in
    /// defaults are used if no file exists there. An explicit path that does
    /// not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            tracing::debug!("No config at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&path).map_err(|e| ConfigError::InvalidFormat {
            details: format!("{}: {}", path.display(), e),
        })?;
        let config = Self::from_toml(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.subreddit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "feed.subreddit".to_string(),
                value: self.feed.subreddit.clone(),
            });
        }
        if self.feed.feed_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "feed.feed_url".to_string(),
                value: self.feed.feed_url.clone(),
            });
        }
        if self.lexicon.words_per_minute == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "lexicon.words_per_minute must be positive".to_string(),
            });
        }
        if self.filter.min_comment_score_ratio < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "filter.min_comment_score_ratio".to_string(),
                value: self.filter.min_comment_score_ratio.to_string(),
            });
        }
        if self.storage.max_seen_ids == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "storage.max_seen_ids must be positive".to_string(),
            });
        }
        if self.schedule.hour > 23 || self.schedule.minute > 59 {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "schedule {:02}:{:02} is not a valid time of day",
                    self.schedule.hour, self.schedule.minute
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DigestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.filter.min_comments, 50);
        assert_eq!(config.filter.episode_min_comments, 20);
        assert_eq!(config.storage.max_seen_ids, 200);
        assert_eq!(config.storage.max_history_entries, 30);
        assert_eq!(config.feed.max_comments_per_post, 3);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let raw = r#"
            [feed]
            subreddit = "anime"

            [filter]
            min_comments = 75
        "#;
        let config = DigestConfig::from_toml(raw).unwrap();
        assert_eq!(config.feed.subreddit, "anime");
        assert_eq!(config.filter.min_comments, 75);
        assert_eq!(config.filter.episode_min_comments, 20);
        assert_eq!(config.schedule.hour, 23);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let raw = "[schedule]\nhour = 25\n";
        let err = DigestConfig::from_toml(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = DigestConfig::from_toml("[feed\nsubreddit = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = DigestConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tv-signal.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[storage]\nmax_seen_ids = 50").unwrap();

        let config = DigestConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage.max_seen_ids, 50);
    }
}
