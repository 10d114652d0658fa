use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use digest_service::{fail_before_start, run_daily, run_log_name, Orchestrator, RunOutcome};
use reddit_client::RedditApiClient;
use signal_core::{DigestConfig, ErrorExt, RunStatus, StorageConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument::WithSubscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "tv_signal=info,digest_service=info,reddit_client=info,\
signal_engine=info,signal_store=info,digest_render=info,signal_core=info";

#[derive(Parser)]
#[command(
    name = "tv-signal",
    version,
    about = "Daily HTML digest of the most discussed subreddit threads"
)]
struct Cli {
    /// Path to config TOML file (defaults to ./tv-signal.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the pipeline once and exit
    Run,
    /// Run the pipeline every day at the configured local time
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    let loaded = DigestConfig::load(cli.config.as_deref()).and_then(|config| {
        config.validate()?;
        Ok(config)
    });
    let log_dir = match &loaded {
        Ok(config) => config.storage.log_dir.clone(),
        Err(_) => StorageConfig::default().log_dir,
    };
    let log_name = match command {
        Command::Run => run_log_name(Local::now().naive_local()),
        Command::Schedule => "scheduler.log".to_string(),
    };
    let _guard = init_logging(&log_dir, &log_name)?;

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            e.log_error();
            return Err(e).context("loading configuration");
        }
    };
    tracing::info!("Configuration loaded for r/{}", config.feed.subreddit);

    match command {
        Command::Run => {
            let outcome = run_once(config).await;
            if outcome.metrics.status == RunStatus::Failed {
                anyhow::bail!(
                    "digest run failed ({})",
                    outcome.metrics.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
        Command::Schedule => {
            let (hour, minute) = (config.schedule.hour, config.schedule.minute);
            run_daily(hour, minute, || {
                let config = config.clone();
                async move {
                    let log_name = run_log_name(Local::now().naive_local());
                    let outcome = match file_subscriber(&config.storage.log_dir, &log_name) {
                        Ok((subscriber, _run_guard)) => {
                            tracing::info!("Run log: {}", config.storage.log_dir.join(&log_name).display());
                            run_once(config).with_subscriber(subscriber).await
                        }
                        Err(e) => {
                            tracing::warn!("No per-run log file, logging to scheduler log: {:#}", e);
                            run_once(config).await
                        }
                    };
                    tracing::info!(
                        "Scheduled run finished: {} ({} posts, {}s)",
                        outcome.metrics.status,
                        outcome.metrics.posts_in_digest,
                        outcome.metrics.runtime
                    );
                }
            })
            .await?;
        }
    }

    Ok(())
}

/// One pipeline run. A client that cannot be built still yields a failed
/// run with a fallback page.
async fn run_once(config: DigestConfig) -> RunOutcome {
    let outcome = match RedditApiClient::new(config.feed.clone()) {
        Ok(client) => Orchestrator::new(config, client).run().await,
        Err(e) => fail_before_start(&config, &e),
    };
    tracing::info!("Digest available at {}", outcome.digest_path.display());
    outcome
}

/// Stdout plus a plain-text log file under `log_dir`. The guard flushes the
/// file writer when dropped.
fn file_subscriber(
    log_dir: &Path,
    file_name: &str,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, WorkerGuard)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer));
    Ok((subscriber, guard))
}

/// Installs the process-wide subscriber. Keep the guard alive for the whole
/// process or buffered lines are lost.
fn init_logging(log_dir: &Path, file_name: &str) -> Result<WorkerGuard> {
    let (subscriber, guard) = file_subscriber(log_dir, file_name)?;
    subscriber.init();

    tracing::info!("Logging to {}", log_dir.join(file_name).display());
    Ok(guard)
}
