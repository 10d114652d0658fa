use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use signal_core::{ConfigError, CoreError};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Pause after each run so an early wake-up cannot trigger the same slot twice.
pub const POST_RUN_BUFFER: Duration = Duration::from_secs(60);

/// Time from `now` until the next `hour:minute`. A target equal to `now`
/// counts as passed and rolls over to tomorrow.
pub fn duration_until(now: NaiveDateTime, hour: u32, minute: u32) -> Result<Duration, CoreError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ConfigError::InvalidValue {
        field: "schedule".to_string(),
        value: format!("{hour:02}:{minute:02}"),
    })?;

    let mut target = now.date().and_time(time);
    if target <= now {
        target += ChronoDuration::days(1);
    }

    (target - now).to_std().map_err(|e| CoreError::Internal {
        message: format!("negative schedule delay: {e}"),
    })
}

/// Log file name for a run started at `now`: `run_YYYYMMDD_HHMMSS.log`.
pub fn run_log_name(now: NaiveDateTime) -> String {
    format!("run_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Runs `job` every day at local `hour:minute` until Ctrl-C.
pub async fn run_daily<F, Fut>(hour: u32, minute: u32, mut job: F) -> Result<(), CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    info!("Digest scheduler started");
    info!("Target run time: {:02}:{:02} daily (local time)", hour, minute);

    loop {
        let now = Local::now().naive_local();
        let wait = duration_until(now, hour, minute)?;
        let next_run = now + ChronoDuration::seconds(wait.as_secs() as i64);
        info!("Next run scheduled for: {}", next_run.format("%Y-%m-%d %H:%M:%S"));
        info!("Waiting for {:.2} hours...", wait.as_secs_f64() / 3600.0);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Scheduler stopped by user");
                return Ok(());
            }
        }

        info!("Starting scheduled digest run");
        job().await;

        tokio::select! {
            _ = tokio::time::sleep(POST_RUN_BUFFER) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Scheduler stopped by user after a run");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_target_later_today() {
        let wait = duration_until(at(22, 30, 0), 23, 0).unwrap();
        assert_eq!(wait, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_target_passed_rolls_to_tomorrow() {
        let wait = duration_until(at(23, 0, 1), 23, 0).unwrap();
        assert_eq!(wait, Duration::from_secs(24 * 3600 - 1));
    }

    #[test]
    fn test_target_now_rolls_to_tomorrow() {
        let wait = duration_until(at(23, 0, 0), 23, 0).unwrap();
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_run_log_name_is_timestamped() {
        assert_eq!(run_log_name(at(7, 5, 9)), "run_20261017_070509.log");
        assert_ne!(run_log_name(at(23, 0, 0)), run_log_name(at(23, 0, 1)));
    }

    #[test]
    fn test_invalid_time_rejected() {
        assert!(matches!(
            duration_until(at(1, 0, 0), 24, 0),
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
