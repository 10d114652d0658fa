//! Heuristic classifiers over a post and its top comments.
//!
//! Every function here is pure and total: missing titles, flairs or comments
//! produce the neutral/absent value rather than an error.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use signal_core::{Comment, FeatureLexicon, Post};
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+").expect("valid word regex"));

static SPOILER_EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)S\d{2}E\d{2}").expect("valid spoiler regex"));

static SHOW_BEFORE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+S\d{1,2}E\d{1,2}").expect("valid show-name regex")
});

static SHOW_BEFORE_SEASON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s*[-–—]\s*(?:Season|Series)\s+\d").expect("valid show-name regex")
});

static SHOW_QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["'](.+?)["']"#).expect("valid show-name regex"));

/// Hours reported when a post's timestamp cannot be read.
pub const UNKNOWN_HOURS_AGO: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive vibes",
            Sentiment::Negative => "Critical reception",
            Sentiment::Mixed => "Mixed reactions",
            Sentiment::Neutral => "Neutral discussion",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "\u{1f60d}",
            Sentiment::Negative => "\u{1f62c}",
            Sentiment::Mixed => "\u{2696}\u{fe0f}",
            Sentiment::Neutral => "\u{1f4ac}",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Mixed => "mixed",
            Sentiment::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsensusKind {
    Strong,
    Divided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Consensus {
    pub kind: ConsensusKind,
    /// Alignment percentage for `Strong`, split percentage for `Divided`.
    pub percent: u8,
}

impl Consensus {
    pub fn label(&self) -> String {
        match self.kind {
            ConsensusKind::Strong => format!("Strong Consensus ({}% alignment)", self.percent),
            ConsensusKind::Divided => format!("Divided Community ({}% split)", self.percent),
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self.kind {
            ConsensusKind::Strong => "\u{2705}",
            ConsensusKind::Divided => "\u{26a1}",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            ConsensusKind::Strong => "consensus",
            ConsensusKind::Divided => "divided",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Freshness {
    pub time_ago: String,
    pub hours_ago: f64,
    pub is_trending: bool,
}

impl Freshness {
    fn unknown() -> Self {
        Self {
            time_ago: String::new(),
            hours_ago: UNKNOWN_HOURS_AGO,
            is_trending: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEngine {
    positive: HashSet<String>,
    negative: HashSet<String>,
    mixed: HashSet<String>,
    agree: HashSet<String>,
    disagree: HashSet<String>,
    creator_keywords: Vec<String>,
    spoiler_keywords: Vec<String>,
    words_per_minute: usize,
    trending_max_hours: f64,
    trending_min_comments: u32,
}

fn word_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

/// Distinct lowercase alphabetic words of a comment body.
fn words_of(body: &str) -> HashSet<String> {
    let lower = body.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn hits(words: &HashSet<String>, lexicon: &HashSet<String>) -> usize {
    words.intersection(lexicon).count()
}

impl FeatureEngine {
    pub fn new(lexicon: FeatureLexicon) -> Self {
        Self {
            positive: word_set(&lexicon.positive_words),
            negative: word_set(&lexicon.negative_words),
            mixed: word_set(&lexicon.mixed_words),
            agree: word_set(&lexicon.agree_words),
            disagree: word_set(&lexicon.disagree_words),
            creator_keywords: lexicon
                .creator_flair_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            spoiler_keywords: lexicon
                .spoiler_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            words_per_minute: lexicon.words_per_minute.max(1),
            trending_max_hours: lexicon.trending_max_hours,
            trending_min_comments: lexicon.trending_min_comments,
        }
    }

    /// The order of the checks matters on ambiguous inputs; do not reorder.
    pub fn sentiment(&self, comments: &[Comment]) -> Sentiment {
        let (mut pos, mut neg, mut mix) = (0usize, 0usize, 0usize);
        for comment in comments {
            let words = words_of(&comment.body);
            pos += hits(&words, &self.positive);
            neg += hits(&words, &self.negative);
            mix += hits(&words, &self.mixed);
        }

        if pos + neg + mix == 0 {
            return Sentiment::Neutral;
        }
        if pos > neg * 2 && pos > mix {
            return Sentiment::Positive;
        }
        if neg > pos * 2 && neg > mix {
            return Sentiment::Negative;
        }
        if mix >= pos && mix >= neg {
            return Sentiment::Mixed;
        }
        if pos.abs_diff(neg) <= 2 {
            return Sentiment::Mixed;
        }
        if pos > neg {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    /// `None` when there are fewer than two comments or fewer than three
    /// agree/disagree hits in total.
    pub fn consensus(&self, comments: &[Comment]) -> Option<Consensus> {
        if comments.len() < 2 {
            return None;
        }

        let (mut agree, mut disagree) = (0usize, 0usize);
        for comment in comments {
            let words = words_of(&comment.body);
            agree += hits(&words, &self.agree);
            disagree += hits(&words, &self.disagree);
        }

        let total = agree + disagree;
        if total < 3 {
            return None;
        }

        let pct = (agree as f64 / total as f64 * 100.0).round() as u8;
        let consensus = if pct >= 70 {
            Consensus {
                kind: ConsensusKind::Strong,
                percent: pct,
            }
        } else if pct <= 30 {
            Consensus {
                kind: ConsensusKind::Divided,
                percent: 100 - pct,
            }
        } else {
            Consensus {
                kind: ConsensusKind::Divided,
                percent: pct.max(100 - pct),
            }
        };
        Some(consensus)
    }

    /// Minutes to read the title and all comment bodies, at least one.
    pub fn reading_time(&self, post: &Post) -> usize {
        let words = post.title.split_whitespace().count()
            + post
                .comments
                .iter()
                .map(|c| c.body.split_whitespace().count())
                .sum::<usize>();
        words.div_ceil(self.words_per_minute).max(1)
    }

    pub fn has_spoiler(&self, post: &Post) -> bool {
        if post.flair.to_lowercase().contains("spoiler") {
            return true;
        }
        if SPOILER_EPISODE_RE.is_match(&post.title) {
            return true;
        }
        let title = post.title.to_lowercase();
        self.spoiler_keywords
            .iter()
            .any(|kw| title.contains(kw.as_str()))
    }

    pub fn is_creator_comment(&self, comment: &Comment) -> bool {
        let flair = comment.author_flair.to_lowercase();
        if flair.is_empty() {
            return false;
        }
        self.creator_keywords
            .iter()
            .any(|kw| flair.contains(kw.as_str()))
    }

    pub fn freshness(&self, created: &str, num_comments: u32, now: DateTime<Utc>) -> Freshness {
        let Some(created) = parse_timestamp(created) else {
            if !created.is_empty() {
                tracing::debug!("Unparseable post timestamp '{}'", created);
            }
            return Freshness::unknown();
        };

        let hours = (now - created).num_milliseconds() as f64 / 3_600_000.0;
        let time_ago = if hours < 1.0 {
            "just now".to_string()
        } else if hours < 24.0 {
            format!("{}h ago", hours as i64)
        } else if hours < 48.0 {
            "yesterday".to_string()
        } else {
            format!("{}d ago", (hours / 24.0) as i64)
        };

        Freshness {
            time_ago,
            hours_ago: hours,
            is_trending: hours < self.trending_max_hours
                && num_comments >= self.trending_min_comments,
        }
    }
}

/// ISO-8601 with offset; a trailing `Z` counts as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First match wins: text before an `SxxEyy` code, text before
/// "- Season N"/"- Series N", then a leading quoted phrase.
pub fn extract_show_name(title: &str) -> String {
    let strip = |s: &str| {
        s.trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string()
    };

    if let Some(caps) = SHOW_BEFORE_CODE_RE.captures(title) {
        return strip(&caps[1]);
    }
    if let Some(caps) = SHOW_BEFORE_SEASON_RE.captures(title) {
        return strip(&caps[1]);
    }
    if let Some(caps) = SHOW_QUOTED_RE.captures(title) {
        return caps[1].trim().to_string();
    }
    String::new()
}

/// Index of the highest-scored comment; the first one wins ties.
pub fn catalyst_index(comments: &[Comment]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (idx, comment) in comments.iter().enumerate() {
        match best {
            Some((_, score)) if comment.score <= score => {}
            _ => best = Some((idx, comment.score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn engine() -> FeatureEngine {
        FeatureEngine::new(FeatureLexicon::default())
    }

    fn comments(bodies: &[&str]) -> Vec<Comment> {
        bodies
            .iter()
            .map(|b| Comment {
                author: "viewer".to_string(),
                body: b.to_string(),
                score: 1,
                author_flair: String::new(),
            })
            .collect()
    }

    fn scored(scores: &[i32]) -> Vec<Comment> {
        scores
            .iter()
            .map(|s| Comment {
                score: *s,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_sentiment_examples() {
        let engine = engine();
        assert_eq!(
            engine.sentiment(&comments(&["I loved this, amazing"])),
            Sentiment::Positive
        );
        assert_eq!(
            engine.sentiment(&comments(&["terrible, awful, I hated it"])),
            Sentiment::Negative
        );
        assert_eq!(engine.sentiment(&[]), Sentiment::Neutral);
        assert_eq!(engine.sentiment(&[]).label(), "Neutral discussion");
        assert_eq!(
            engine.sentiment(&comments(&["I watched it on Sunday"])),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_sentiment_tie_breaks() {
        let engine = engine();
        // pos=1 neg=1 mix=1: mixed dominates both
        assert_eq!(
            engine.sentiment(&comments(&["great but boring"])),
            Sentiment::Mixed
        );
        // pos=3 neg=2 mix=0: close call falls to mixed
        assert_eq!(
            engine.sentiment(&comments(&["great, amazing, brilliant. boring and dull"])),
            Sentiment::Mixed
        );
        // pos=6 neg=3 mix=0: not double, gap above two, larger wins
        assert_eq!(
            engine.sentiment(&comments(&[
                "great amazing brilliant fantastic perfect superb",
                "boring dull weak"
            ])),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_sentiment_counts_words_once_per_comment() {
        let engine = engine();
        // "great great great" is one positive hit; "awful" one negative hit.
        assert_eq!(
            engine.sentiment(&comments(&["great great great", "awful"])),
            Sentiment::Mixed
        );
    }

    #[test]
    fn test_consensus_absent_below_thresholds() {
        let engine = engine();
        assert_eq!(engine.consensus(&comments(&["agree exactly yes"])), None);
        assert_eq!(engine.consensus(&comments(&["agree", "nice"])), None);
        assert_eq!(engine.consensus(&[]), None);
    }

    #[test]
    fn test_consensus_strong_and_divided() {
        let engine = engine();
        let strong = engine
            .consensus(&comments(&["agree, exactly", "yes, absolutely"]))
            .unwrap();
        assert_eq!(strong.kind, ConsensusKind::Strong);
        assert_eq!(strong.percent, 100);
        assert_eq!(strong.label(), "Strong Consensus (100% alignment)");

        let split = engine
            .consensus(&comments(&["wrong, nope", "nah, disagree", "agree"]))
            .unwrap();
        assert_eq!(split.kind, ConsensusKind::Divided);
        assert_eq!(split.percent, 80);

        let middle = engine
            .consensus(&comments(&["agree exactly", "wrong nope nah"]))
            .unwrap();
        assert_eq!(middle.kind, ConsensusKind::Divided);
        assert_eq!(middle.percent, 60);
        assert_eq!(middle.label(), "Divided Community (60% split)");
    }

    #[test]
    fn test_show_name_extraction() {
        assert_eq!(extract_show_name("Breaking Bad S05E14 Discussion"), "Breaking Bad");
        assert_eq!(extract_show_name("Random Thoughts"), "");
        assert_eq!(extract_show_name("The Bear - Season 3 trailer"), "The Bear");
        assert_eq!(extract_show_name("Slow Horses — Series 4 is great"), "Slow Horses");
        assert_eq!(extract_show_name("\"Shogun\" wins big"), "Shogun");
        assert_eq!(extract_show_name("\"Andor\" s02e03 thread"), "Andor");
        assert_eq!(extract_show_name(""), "");
    }

    #[test]
    fn test_reading_time() {
        let engine = engine();
        let short = Post {
            title: "Three word title".to_string(),
            ..Default::default()
        };
        assert_eq!(engine.reading_time(&short), 1);

        let long = Post {
            title: "title".to_string(),
            comments: comments(&[&"word ".repeat(250), &"word ".repeat(150)]),
            ..Default::default()
        };
        // 401 words at 200 wpm
        assert_eq!(engine.reading_time(&long), 3);
        assert_eq!(engine.reading_time(&Post::default()), 1);
    }

    #[test]
    fn test_spoiler_detection() {
        let engine = engine();
        let flaired = Post {
            title: "Thoughts".to_string(),
            flair: "Spoilers".to_string(),
            ..Default::default()
        };
        assert!(engine.has_spoiler(&flaired));

        let coded = Post {
            title: "Andor s02e03".to_string(),
            ..Default::default()
        };
        assert!(engine.has_spoiler(&coded));

        let keyword = Post {
            title: "That FINALE though".to_string(),
            ..Default::default()
        };
        assert!(engine.has_spoiler(&keyword));

        let clean = Post {
            title: "Comfort shows you rewatch".to_string(),
            ..Default::default()
        };
        assert!(!engine.has_spoiler(&clean));
    }

    #[test]
    fn test_creator_flag() {
        let engine = engine();
        let creator = Comment {
            author_flair: "Showrunner - The Expanse".to_string(),
            ..Default::default()
        };
        assert!(engine.is_creator_comment(&creator));

        let fan = Comment {
            author_flair: "Longtime fan".to_string(),
            ..Default::default()
        };
        assert!(!engine.is_creator_comment(&fan));
        assert!(!engine.is_creator_comment(&Comment::default()));
    }

    #[test]
    fn test_catalyst_index() {
        assert_eq!(catalyst_index(&[]), None);
        assert_eq!(catalyst_index(&scored(&[3, 9, 2])), Some(1));
        assert_eq!(catalyst_index(&scored(&[7, 9, 9])), Some(1));
        assert_eq!(catalyst_index(&scored(&[-4, -2])), Some(1));
    }

    #[test]
    fn test_freshness_buckets() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let at = |hours: i64| (now - Duration::minutes(hours * 60 + 10)).to_rfc3339();

        assert_eq!(engine.freshness(&at(0), 0, now).time_ago, "just now");
        assert_eq!(engine.freshness(&at(5), 0, now).time_ago, "5h ago");
        assert_eq!(engine.freshness(&at(30), 0, now).time_ago, "yesterday");
        assert_eq!(engine.freshness(&at(80), 0, now).time_ago, "3d ago");

        let zulu = engine.freshness("2026-10-17T09:00:00Z", 250, now);
        assert_eq!(zulu.time_ago, "3h ago");
        assert!(zulu.is_trending);

        let quiet = engine.freshness("2026-10-17T09:00:00Z", 199, now);
        assert!(!quiet.is_trending);
    }

    #[test]
    fn test_freshness_unparseable() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        for raw in ["", "yesterday-ish", "2026-10-17 09:00"] {
            let freshness = engine.freshness(raw, 900, now);
            assert_eq!(freshness.time_ago, "");
            assert_eq!(freshness.hours_ago, UNKNOWN_HOURS_AGO);
            assert!(!freshness.is_trending);
        }
    }
}
