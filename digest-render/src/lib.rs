//! Static HTML output for the daily digest.

pub mod templates;

use chrono::{DateTime, Local};
use signal_core::{CoreError, RenderError};
use signal_engine::DigestEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const LATEST_FILE: &str = "latest.html";
pub const LAST_RESORT_FILE: &str = "error.txt";

/// Aggregate numbers shown in the stats dashboard at the top of a digest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DigestSummary {
    pub total_comments: u64,
    pub hottest_title: String,
    pub hottest_comments: u32,
    pub posts_fetched: usize,
    pub posts_filtered_out: usize,
    /// Every post in the digest lost its comments.
    pub degraded: bool,
}

impl DigestSummary {
    pub fn from_entries(entries: &[DigestEntry], posts_fetched: usize) -> Self {
        let total_comments = entries
            .iter()
            .map(|e| u64::from(e.post.num_comments))
            .sum();

        // first post with the highest count wins ties
        let hottest = entries.iter().fold(None::<&DigestEntry>, |best, e| match best {
            Some(b) if b.post.num_comments >= e.post.num_comments => Some(b),
            _ => Some(e),
        });

        let posts_filtered_out = if posts_fetched > 0 {
            posts_fetched.saturating_sub(entries.len())
        } else {
            0
        };

        Self {
            total_comments,
            hottest_title: hottest.map(|e| e.post.title.clone()).unwrap_or_default(),
            hottest_comments: hottest.map(|e| e.post.num_comments).unwrap_or(0),
            posts_fetched,
            posts_filtered_out,
            degraded: !entries.is_empty() && entries.iter().all(|e| e.post.comments_degraded),
        }
    }
}

/// Writes dated digest pages plus the `latest.html` copy into one directory.
#[derive(Debug, Clone)]
pub struct DigestRenderer {
    digest_dir: PathBuf,
}

impl DigestRenderer {
    pub fn new(digest_dir: impl Into<PathBuf>) -> Self {
        Self {
            digest_dir: digest_dir.into(),
        }
    }

    pub fn digest_dir(&self) -> &Path {
        &self.digest_dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.digest_dir.join(LATEST_FILE)
    }

    /// Renders `digest_YYYYMMDD.html` and overwrites `latest.html` with the
    /// same page. Returns the dated path.
    pub fn render(
        &self,
        entries: &[DigestEntry],
        summary: &DigestSummary,
        now: DateTime<Local>,
    ) -> Result<PathBuf, CoreError> {
        let html = templates::render_digest(
            entries,
            summary,
            &display_date(now),
            &now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        );

        let path = self
            .digest_dir
            .join(format!("digest_{}.html", now.format("%Y%m%d")));
        self.write_pair(&path, &html)?;

        info!(
            "Digest written to {} ({:.1} KB, {} posts)",
            path.display(),
            html.len() as f64 / 1024.0,
            entries.len()
        );
        Ok(path)
    }

    /// Writes the fallback page to `digest_YYYYMMDD_fallback.html` and
    /// `latest.html`. If that fails, tries a plain-text `error.txt`. Always
    /// returns the path it meant to write.
    pub fn render_fallback(&self, reason: &str, now: DateTime<Local>) -> PathBuf {
        let html = templates::render_fallback(&display_date(now), reason);
        let path = self
            .digest_dir
            .join(format!("digest_{}_fallback.html", now.format("%Y%m%d")));

        match self.write_pair(&path, &html) {
            Ok(()) => {
                warn!("Fallback digest written to {}", path.display());
                path
            }
            Err(e) => {
                error!("Even fallback render failed: {}", e);
                let last_resort = self.digest_dir.join(LAST_RESORT_FILE);
                if let Err(e) = fs::write(&last_resort, format!("FATAL ERROR: {reason}")) {
                    error!("Could not write {}: {}", last_resort.display(), e);
                }
                last_resort
            }
        }
    }

    fn write_pair(&self, dated: &Path, html: &str) -> Result<(), RenderError> {
        fs::create_dir_all(&self.digest_dir).map_err(|_| RenderError::OutputUnavailable {
            path: self.digest_dir.display().to_string(),
        })?;

        for path in [dated.to_path_buf(), self.latest_path()] {
            fs::write(&path, html).map_err(|e| RenderError::WriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn display_date(now: DateTime<Local>) -> String {
    now.format("%A, %B %d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use signal_core::{Comment, FeatureLexicon, Post};
    use signal_engine::FeatureEngine;
    use tempfile::TempDir;

    fn post(id: &str, title: &str, num_comments: u32) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://www.reddit.com/r/television/comments/{id}/"),
            author: "viewer".to_string(),
            num_comments,
            ..Default::default()
        }
    }

    fn entries(posts: &[Post]) -> Vec<DigestEntry> {
        FeatureEngine::new(FeatureLexicon::default()).annotate_all(posts, Utc::now())
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_aggregates() {
        let posts = vec![
            post("a", "First", 120),
            post("b", "Second", 300),
            post("c", "Third", 300),
        ];
        let summary = DigestSummary::from_entries(&entries(&posts), 100);

        assert_eq!(summary.total_comments, 720);
        assert_eq!(summary.hottest_title, "Second");
        assert_eq!(summary.hottest_comments, 300);
        assert_eq!(summary.posts_filtered_out, 97);
        assert!(!summary.degraded);
    }

    #[test]
    fn test_summary_empty_and_unknown_fetch_count() {
        let summary = DigestSummary::from_entries(&[], 0);
        assert_eq!(summary, DigestSummary::default());

        let summary = DigestSummary::from_entries(&entries(&[post("a", "Only", 5)]), 0);
        assert_eq!(summary.posts_filtered_out, 0);
    }

    #[test]
    fn test_summary_degraded_only_when_all_posts_degraded() {
        let degraded = post("a", "One", 10).with_degraded_comments();
        let fine = post("b", "Two", 10);

        let all = DigestSummary::from_entries(&entries(&[degraded.clone()]), 1);
        assert!(all.degraded);

        let some = DigestSummary::from_entries(&entries(&[degraded, fine]), 2);
        assert!(!some.degraded);
    }

    #[test]
    fn test_render_writes_dated_and_latest() {
        let dir = TempDir::new().unwrap();
        let renderer = DigestRenderer::new(dir.path().join("digests"));
        let mut hot = post("a", "Severance S02E10 <Finale> Discussion", 640);
        hot.comments = vec![Comment {
            author: "dan".to_string(),
            body: "Thank you all & goodnight".to_string(),
            score: 900,
            author_flair: "Show Creator".to_string(),
        }];
        let list = entries(&[hot]);
        let summary = DigestSummary::from_entries(&list, 100);

        let path = renderer.render(&list, &summary, now()).unwrap();
        assert_eq!(path.file_name().unwrap(), "digest_20261017.html");

        let dated = fs::read_to_string(&path).unwrap();
        let latest = fs::read_to_string(renderer.latest_path()).unwrap();
        assert_eq!(dated, latest);
        assert!(dated.contains("Saturday, October 17, 2026"));
        assert!(dated.contains("&lt;Finale&gt;"));
        assert!(dated.contains("Thank you all &amp; goodnight"));
        assert!(dated.contains("Conversation Catalyst"));
        assert!(dated.contains("badge-creator"));
        assert!(dated.contains("Spoilers"));
        assert!(!dated.contains("degraded-banner\""));
    }

    #[test]
    fn test_render_degraded_banner() {
        let dir = TempDir::new().unwrap();
        let renderer = DigestRenderer::new(dir.path());
        let list = entries(&[post("a", "Thread", 80).with_degraded_comments()]);
        let summary = DigestSummary::from_entries(&list, 10);

        let path = renderer.render(&list, &summary, now()).unwrap();
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains(r#"<div class="degraded-banner">"#));
        assert!(html.contains("Comments unavailable."));
    }

    #[test]
    fn test_render_into_blocked_dir_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let renderer = DigestRenderer::new(&blocker);
        assert!(renderer.render(&[], &DigestSummary::default(), now()).is_err());
    }

    #[test]
    fn test_fallback_overwrites_latest() {
        let dir = TempDir::new().unwrap();
        let renderer = DigestRenderer::new(dir.path());
        fs::write(renderer.latest_path(), "yesterday").unwrap();

        let path = renderer.render_fallback("Could not reach the <feed>", now());
        assert_eq!(path.file_name().unwrap(), "digest_20261017_fallback.html");

        let latest = fs::read_to_string(renderer.latest_path()).unwrap();
        assert!(latest.contains("Today's digest could not be generated."));
        assert!(latest.contains("Could not reach the &lt;feed&gt;"));
    }

    #[test]
    fn test_fallback_never_panics_when_dir_is_blocked() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let path = DigestRenderer::new(&blocker).render_fallback("boom", now());
        assert_eq!(path, blocker.join(LAST_RESORT_FILE));
    }
}
