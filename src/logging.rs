//! Logging initialization: ANSI console output plus a daily-rotated log
//! file, with old files cleaned up in the background.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 7);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Keeps the non-blocking file writer alive; drop it to flush on shutdown.
#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

pub fn init_logging(log_dir: impl AsRef<Path>, prefix: &str, level: &str) -> LoggerGuard {
    let log_dir = log_dir.as_ref().to_path_buf();

    let level = match level {
        "trace" | "debug" | "info" | "warn" | "error" => level,
        _ => "info",
    };
    let env_overrides = std::env::var("RUST_LOG").unwrap_or_default();
    let make_filter = || {
        EnvFilter::builder()
            .with_default_directive(level.parse().expect("static level directive"))
            .parse_lossy(&env_overrides)
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)
        .expect("Failed to create file appender");
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(make_filter()),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_filter(make_filter()),
        )
        .init();

    spawn_cleanup_task(log_dir, prefix.to_string());

    LoggerGuard(guard)
}

fn spawn_cleanup_task(log_dir: PathBuf, prefix: String) {
    tokio::task::spawn(async move {
        loop {
            if let Err(e) = remove_old_logs(&log_dir, &prefix, LOG_MAX_AGE) {
                tracing::warn!("Log cleanup failed: {}", e);
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

fn remove_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<()> {
    let now = SystemTime::now();

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(prefix));
        if !path.is_file() || !is_ours {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            tracing::debug!("Removed old log file {:?}", path);
        }
    }

    Ok(())
}
