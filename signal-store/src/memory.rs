use crate::{ensure_parent_dir, write_atomically};
use chrono::{DateTime, Local};
use signal_core::{CoreError, DigestConfig, RunMetrics, StorageError};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const LAST_RUN_HEADING: &str = "## Last Run";
const HISTORY_HEADING: &str = "## Run History";

/// Static facts written into the header of a freshly created memory file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInfo {
    pub subreddit: String,
    pub min_comments: u32,
    pub max_seen_ids: usize,
    pub schedule_hour: u32,
    pub schedule_minute: u32,
}

impl ProjectInfo {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            subreddit: config.feed.subreddit.clone(),
            min_comments: config.filter.min_comments,
            max_seen_ids: config.storage.max_seen_ids,
            schedule_hour: config.schedule.hour,
            schedule_minute: config.schedule.minute,
        }
    }

    fn template(&self) -> String {
        format!(
            "# The TV Signal - Project Memory\n\
             \n\
             ## Project\n\
             RSS digest system for /r/{sub}.\n\
             \n\
             ## Configuration\n\
             - Subreddit: {sub}\n\
             - Min comments: {min}\n\
             - Max seen IDs: {max}\n\
             - Schedule: Daily {hour:02}:{minute:02} local time\n\
             \n\
             {LAST_RUN_HEADING}\n\
             No runs yet.\n\
             \n\
             {HISTORY_HEADING}\n\
             No runs yet.\n",
            sub = self.subreddit,
            min = self.min_comments,
            max = self.max_seen_ids,
            hour = self.schedule_hour,
            minute = self.schedule_minute,
        )
    }
}

/// Markdown run log: a "Last Run" block replaced every run and a capped
/// "Run History" list with the newest line first.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    path: PathBuf,
    max_history: usize,
    project: ProjectInfo,
}

impl MemoryFile {
    pub fn new(path: impl Into<PathBuf>, max_history: usize, project: ProjectInfo) -> Self {
        Self {
            path: path.into(),
            max_history,
            project,
        }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        Self::new(
            &config.storage.memory_file,
            config.storage.max_history_entries,
            ProjectInfo::from_config(config),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn update(&self, metrics: &RunMetrics) -> Result<(), CoreError> {
        let existing = if self.path.exists() {
            Some(
                fs::read_to_string(&self.path).map_err(|e| StorageError::ReadFailed {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })?,
            )
        } else {
            None
        };

        let updated = self.rewrite(existing.as_deref(), metrics, Local::now());
        ensure_parent_dir(&self.path)?;
        write_atomically(&self.path, updated.as_bytes())?;
        info!("Updated run memory in {}", self.path.display());
        Ok(())
    }

    /// Produces the new file contents. A missing file, or one without a
    /// Last Run heading, is replaced by the template first.
    pub fn rewrite(
        &self,
        existing: Option<&str>,
        metrics: &RunMetrics,
        now: DateTime<Local>,
    ) -> String {
        let template;
        let source = match existing {
            Some(text) if text.lines().any(|l| l.starts_with(LAST_RUN_HEADING)) => text,
            _ => {
                template = self.project.template();
                template.as_str()
            }
        };

        let lines: Vec<&str> = source.lines().collect();
        let last_run_idx = lines
            .iter()
            .position(|l| l.starts_with(LAST_RUN_HEADING))
            .unwrap_or(lines.len());

        let mut out = String::new();
        for line in &lines[..last_run_idx] {
            out.push_str(line);
            out.push('\n');
        }

        out.push_str(LAST_RUN_HEADING);
        out.push('\n');
        let _ = writeln!(out, "- Date: {}", metrics.date);
        let _ = writeln!(out, "- Posts fetched: {}", metrics.posts_fetched);
        let _ = writeln!(out, "- Posts after dedup: {}", metrics.posts_after_dedup);
        let _ = writeln!(out, "- Posts after filter: {}", metrics.posts_after_filter);
        let _ = writeln!(out, "- Posts in digest: {}", metrics.posts_in_digest);
        let _ = writeln!(
            out,
            "- Comments fetched: {}/{}",
            metrics.comments_success, metrics.comments_total
        );
        let _ = writeln!(
            out,
            "- Degraded mode: {}",
            if metrics.degraded { "yes" } else { "no" }
        );
        let _ = writeln!(out, "- Runtime: {}s", metrics.runtime);
        let _ = writeln!(out, "- Status: {}", metrics.status);
        out.push('\n');

        out.push_str(HISTORY_HEADING);
        out.push('\n');
        let mut history = vec![history_line(metrics, now)];
        history.extend(existing_history(&lines));
        history.truncate(self.max_history);
        for entry in history {
            out.push_str(&entry);
            out.push('\n');
        }
        out
    }
}

fn history_line(metrics: &RunMetrics, now: DateTime<Local>) -> String {
    format!(
        "- {} | {} posts | {}s | {}",
        now.format("%Y-%m-%d %H:%M"),
        metrics.posts_in_digest,
        metrics.runtime,
        metrics.status
    )
}

fn existing_history(lines: &[&str]) -> Vec<String> {
    let Some(start) = lines.iter().position(|l| l.starts_with(HISTORY_HEADING)) else {
        return Vec::new();
    };

    lines[start + 1..]
        .iter()
        .take_while(|l| !l.starts_with("##"))
        .filter(|l| l.trim().starts_with("- "))
        .map(|l| l.trim_end().to_string())
        .collect()
}
