use chrono::{Local, Utc};
use digest_render::{DigestRenderer, DigestSummary};
use reddit_client::{parse_feed, RedditSource};
use serde::Serialize;
use signal_core::{CoreError, DigestConfig, ErrorExt, ErrorReporter, Post, RunMetrics, RunStatus};
use signal_engine::{FeatureEngine, FilterEngine};
use signal_store::{ArtifactWriter, MemoryFile, SeenIdStore};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

const BANNER: &str = "============================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Dedup,
    EnrichFilter,
    Comments,
    Render,
    Persist,
}

impl Stage {
    pub const COUNT: usize = 7;

    pub fn index(&self) -> usize {
        match self {
            Stage::Fetch => 1,
            Stage::Parse => 2,
            Stage::Dedup => 3,
            Stage::EnrichFilter => 4,
            Stage::Comments => 5,
            Stage::Render => 6,
            Stage::Persist => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "Fetch RSS Feed",
            Stage::Parse => "Parse Posts",
            Stage::Dedup => "Deduplicate",
            Stage::EnrichFilter => "Enrich & Filter",
            Stage::Comments => "Extract Comments",
            Stage::Render => "Render HTML Digest",
            Stage::Persist => "Update Memory",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TASK {}/{}: {}", self.index(), Stage::COUNT, self.name())
    }
}

/// Post counts entering and leaving one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTransition {
    pub stage: Stage,
    pub before: usize,
    pub after: usize,
}

/// Final state of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub metrics: RunMetrics,
    /// The dated digest, the fallback page, or the last-resort error file.
    pub digest_path: PathBuf,
    /// One entry per stage that ran, in order.
    pub transitions: Vec<StageTransition>,
}

/// `failed` beats `partial` beats `success`.
pub fn derive_status(render_failed: bool, degraded: bool, persistence_failed: bool) -> RunStatus {
    if render_failed {
        RunStatus::Failed
    } else if degraded || persistence_failed {
        RunStatus::Partial
    } else {
        RunStatus::Success
    }
}

/// Ends a run whose Reddit source could not be constructed. Writes the
/// fallback page and the metrics artifact so the output directory still
/// reflects the failure.
pub fn fail_before_start(config: &DigestConfig, err: &CoreError) -> RunOutcome {
    let started = Instant::now();
    error!("FATAL: Reddit client could not be built");
    ErrorReporter::new().report_error(Stage::Fetch.name(), err);

    let digest_path = DigestRenderer::new(&config.storage.digest_dir)
        .render_fallback(&err.user_friendly_message(), Local::now());
    info!("Fallback digest written to {}", digest_path.display());

    let mut metrics = RunMetrics::new();
    metrics.failure_reason = Some(err.error_code());
    metrics.status = RunStatus::Failed;
    metrics.record_runtime(started);

    let artifacts = ArtifactWriter::new(&config.storage.artifact_dir);
    if let Err(e) = artifacts.write_json("metrics", &metrics) {
        warn!("Could not write metrics artifact: {}", e);
    }

    RunOutcome {
        metrics,
        digest_path,
        transitions: Vec::new(),
    }
}

/// Drives one digest run through its seven stages.
///
/// Fetch and parse failures end the run with a fallback page. Every later
/// failure is absorbed: the stage falls back to its input and the run
/// status is downgraded instead.
pub struct Orchestrator<S: RedditSource> {
    config: DigestConfig,
    source: S,
    filter: FilterEngine,
    features: FeatureEngine,
    seen_ids: SeenIdStore,
    memory: MemoryFile,
    artifacts: ArtifactWriter,
    renderer: DigestRenderer,
    reporter: ErrorReporter,
}

impl<S: RedditSource> Orchestrator<S> {
    pub fn new(config: DigestConfig, source: S) -> Self {
        let storage = &config.storage;
        Self {
            filter: FilterEngine::new(config.filter.clone()),
            features: FeatureEngine::new(config.lexicon.clone()),
            seen_ids: SeenIdStore::new(&storage.seen_ids_file, storage.max_seen_ids),
            memory: MemoryFile::from_config(&config),
            artifacts: ArtifactWriter::new(&storage.artifact_dir),
            renderer: DigestRenderer::new(&storage.digest_dir),
            reporter: ErrorReporter::new(),
            source,
            config,
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub async fn run(&self) -> RunOutcome {
        let started = Instant::now();
        let mut metrics = RunMetrics::new();
        let mut trail = Vec::with_capacity(Stage::COUNT);
        info!(run_id = %metrics.run_id, "Starting digest run for r/{}", self.config.feed.subreddit);

        // 1. fetch
        begin(Stage::Fetch);
        let raw = match self.source.fetch_feed().await {
            Ok(raw) => raw,
            Err(e) => return self.abort(Stage::Fetch, &e, metrics, trail, started),
        };
        info!(stage = Stage::Fetch.name(), "Fetched {} bytes of feed", raw.len());
        self.snapshot_text("raw_feed", "xml", &raw);
        finish(&mut trail, Stage::Fetch, 0, 0);

        // 2. parse
        begin(Stage::Parse);
        let posts = match parse_feed(&raw, &self.config.feed.subreddit) {
            Ok(posts) => posts,
            Err(e) => return self.abort(Stage::Parse, &e, metrics, trail, started),
        };
        metrics.posts_fetched = posts.len();
        self.snapshot_json("parsed_posts", &posts);
        finish(&mut trail, Stage::Parse, 0, posts.len());

        // 3. dedup
        begin(Stage::Dedup);
        let before = posts.len();
        let posts = self.seen_ids.filter(posts);
        metrics.posts_after_dedup = posts.len();
        finish(&mut trail, Stage::Dedup, before, posts.len());

        // 4. enrich & filter
        begin(Stage::EnrichFilter);
        let before = posts.len();
        let posts = match self.source.enrich(posts.clone()).await {
            Ok(enriched) => {
                self.snapshot_json("enriched_posts", &enriched);
                let kept = self.filter.apply(enriched);
                self.snapshot_json("filtered_posts", &kept);
                kept
            }
            Err(e) => {
                self.reporter.report_warning(Stage::EnrichFilter.name(), &e);
                warn!("Enrichment failed, continuing with deduplicated posts");
                posts
            }
        };
        metrics.posts_after_filter = posts.len();
        finish(&mut trail, Stage::EnrichFilter, before, posts.len());

        // 5. comments
        begin(Stage::Comments);
        let before = posts.len();
        let posts = match self.source.attach_comments(posts.clone()).await {
            Ok(with_comments) => with_comments,
            Err(e) => {
                self.reporter.report_warning(Stage::Comments.name(), &e);
                warn!("Comment extraction failed entirely, marking all posts degraded");
                posts.iter().map(Post::with_degraded_comments).collect()
            }
        };
        metrics.record_comments(&posts);
        if metrics.degraded {
            warn!("Degraded mode: no post received comments");
        }
        info!(
            stage = Stage::Comments.name(),
            "Comments fetched for {}/{} posts",
            metrics.comments_success,
            metrics.comments_total
        );
        self.snapshot_json("posts_with_comments", &posts);
        finish(&mut trail, Stage::Comments, before, posts.len());

        // 6. render
        begin(Stage::Render);
        let entries = self.features.annotate_all(&posts, Utc::now());
        let summary = DigestSummary::from_entries(&entries, metrics.posts_fetched);
        let (digest_path, render_failed) = match self.renderer.render(&entries, &summary, Local::now()) {
            Ok(path) => {
                metrics.posts_in_digest = entries.len();
                (path, false)
            }
            Err(e) => {
                self.reporter.report_error(Stage::Render.name(), &e);
                metrics.failure_reason = Some(e.error_code());
                let fallback = self
                    .renderer
                    .render_fallback(&e.user_friendly_message(), Local::now());
                (fallback, true)
            }
        };
        finish(&mut trail, Stage::Render, posts.len(), metrics.posts_in_digest);

        // 7. persist
        begin(Stage::Persist);
        let mut persistence_failed = false;
        if let Err(e) = self.seen_ids.record(&posts) {
            self.reporter.report_error(Stage::Persist.name(), &e);
            persistence_failed = true;
        }
        metrics.record_runtime(started);
        metrics.status = derive_status(render_failed, metrics.degraded, persistence_failed);
        if let Err(e) = self.memory.update(&metrics) {
            self.reporter.report_error(Stage::Persist.name(), &e);
            metrics.status = derive_status(render_failed, metrics.degraded, true);
        }
        finish(&mut trail, Stage::Persist, posts.len(), posts.len());

        self.complete(metrics, digest_path, trail)
    }

    /// Fatal path for fetch and parse: fallback page, no persistence.
    fn abort(
        &self,
        stage: Stage,
        err: &CoreError,
        mut metrics: RunMetrics,
        mut trail: Vec<StageTransition>,
        started: Instant,
    ) -> RunOutcome {
        error!("FATAL: {} failed", stage.name());
        self.reporter.report_error(stage.name(), err);

        let digest_path = self
            .renderer
            .render_fallback(&err.user_friendly_message(), Local::now());
        info!("Fallback digest written to {}", digest_path.display());

        metrics.failure_reason = Some(err.error_code());
        metrics.status = RunStatus::Failed;
        metrics.record_runtime(started);
        finish(&mut trail, stage, 0, 0);
        self.complete(metrics, digest_path, trail)
    }

    fn complete(
        &self,
        metrics: RunMetrics,
        digest_path: PathBuf,
        transitions: Vec<StageTransition>,
    ) -> RunOutcome {
        info!("{}", BANNER);
        info!(run_id = %metrics.run_id, "PIPELINE COMPLETE - Status: {}", metrics.status);
        info!("Runtime: {}s", metrics.runtime);
        info!("{}", BANNER);

        self.snapshot_json("metrics", &metrics);
        RunOutcome {
            metrics,
            digest_path,
            transitions,
        }
    }

    fn snapshot_json<T: Serialize + ?Sized>(&self, stem: &str, value: &T) {
        if let Err(e) = self.artifacts.write_json(stem, value) {
            warn!("Could not write {} artifact: {}", stem, e);
        }
    }

    fn snapshot_text(&self, stem: &str, ext: &str, contents: &str) {
        if let Err(e) = self.artifacts.write_text(stem, ext, contents) {
            warn!("Could not write {} artifact: {}", stem, e);
        }
    }
}

fn begin(stage: Stage) {
    info!("{}", BANNER);
    info!("{}", stage);
    info!("{}", BANNER);
}

fn finish(trail: &mut Vec<StageTransition>, stage: Stage, before: usize, after: usize) {
    info!(stage = stage.name(), before, after, "{} complete: {} -> {} posts", stage.name(), before, after);
    trail.push(StageTransition { stage, before, after });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_banner() {
        assert_eq!(Stage::Fetch.to_string(), "TASK 1/7: Fetch RSS Feed");
        assert_eq!(Stage::Persist.to_string(), "TASK 7/7: Update Memory");
        assert_eq!(Stage::EnrichFilter.index(), 4);
    }

    #[test]
    fn test_derive_status_precedence() {
        assert_eq!(derive_status(false, false, false), RunStatus::Success);
        assert_eq!(derive_status(false, true, false), RunStatus::Partial);
        assert_eq!(derive_status(false, false, true), RunStatus::Partial);
        assert_eq!(derive_status(true, true, true), RunStatus::Failed);
        assert_eq!(derive_status(true, false, false), RunStatus::Failed);
    }
}
