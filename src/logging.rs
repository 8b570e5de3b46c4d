//! Log subscriber setup
//!
//! Structured JSON lines go to a daily-rolling file under `logs/` (or
//! `LOG_DIR`). Set `LOG_STDERR=1` to mirror compact lines to stderr. The
//! level comes from `RUST_LOG` and defaults to `info`.

use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE: &str = "sqlchat-agent.log";

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer.
pub fn init_logging() -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE));

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter());

    let stderr_layer = stderr_enabled().then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::info!("[Logging] Writing logs to {}", dir.join(LOG_FILE).display());
    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

fn log_dir() -> PathBuf {
    env::var("LOG_DIR")
        .ok()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

fn stderr_enabled() -> bool {
    matches!(env::var("LOG_STDERR").as_deref(), Ok("1") | Ok("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir() {
        temp_env::with_var_unset("LOG_DIR", || {
            assert_eq!(log_dir(), PathBuf::from("logs"));
        });
        temp_env::with_var("LOG_DIR", Some("/var/log/sqlchat"), || {
            assert_eq!(log_dir(), PathBuf::from("/var/log/sqlchat"));
        });
    }

    #[test]
    fn test_stderr_switch() {
        temp_env::with_var("LOG_STDERR", Some("1"), || assert!(stderr_enabled()));
        temp_env::with_var("LOG_STDERR", Some("0"), || assert!(!stderr_enabled()));
        temp_env::with_var_unset("LOG_STDERR", || assert!(!stderr_enabled()));
    }
}
