//! Shared logging utilities for the giftflow binaries.
//!
//! Logs go to a daily file under `<home>/logs` and to stderr.
//! Stdout is left alone: the dispatcher prints its report lines there.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "giftflow=info";
const VERBOSE_LOG_FILTER: &str = "giftflow=debug";
const MAX_LOG_FILES: usize = 7;

/// Logging configuration shared by giftflow binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Keeps the background file writer alive. Drop it last so buffered lines
/// are flushed before the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with a daily log file and stderr output.
///
/// If the log directory cannot be prepared the file layer is dropped and
/// logging continues on stderr only.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let mut guard = None;
    let file_layer = match open_log_file(config.app_name) {
        Ok(appender) => {
            let (writer, worker) = tracing_appender::non_blocking(appender);
            guard = Some(worker);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}

fn open_log_file(app_name: &str) -> Result<RollingFileAppender> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    file_appender(&log_dir, app_name)
}

/// `<dir>/<app>.<date>.log`, rotated daily, keeping the newest [`MAX_LOG_FILES`].
fn file_appender(dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(sanitize_name(app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}

/// Get the giftflow home directory: `$GIFTFLOW_HOME` or `~/.giftflow`
pub fn giftflow_home() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("GIFTFLOW_HOME") {
        return Ok(PathBuf::from(override_path));
    }
    dirs::home_dir()
        .map(|home| home.join(".giftflow"))
        .context("Could not determine home directory (set GIFTFLOW_HOME)")
}

/// Get the logs directory: `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(giftflow_home()?.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn sanitize_replaces_path_characters() {
        assert_eq!(sanitize_name("giftflow-serve"), "giftflow-serve");
        assert_eq!(sanitize_name("../evil name"), "___evil_name");
    }

    #[test]
    fn appender_writes_dated_file_named_after_app() {
        let dir = TempDir::new().unwrap();
        let mut appender = file_appender(dir.path(), "giftflow-serve").unwrap();
        appender.write_all(b"started\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        assert!(names[0].starts_with("giftflow-serve."), "{names:?}");
        assert!(names[0].ends_with(".log"), "{names:?}");

        let contents = fs::read_to_string(dir.path().join(&names[0])).unwrap();
        assert_eq!(contents, "started\n");
    }

    #[test]
    fn appender_keeps_unsafe_names_inside_dir() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir_all(&logs).unwrap();
        let mut appender = file_appender(&logs, "../escape").unwrap();
        appender.write_all(b"x").unwrap();
        appender.flush().unwrap();

        assert_eq!(fs::read_dir(&logs).unwrap().count(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
