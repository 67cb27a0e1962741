//! Structured logging for soundviz using the tracing crate.
//!
//! Two layers: a daily-rotated log file under the XDG state directory, and a
//! stderr layer for warnings (or debug output with `--verbose`). Old log files
//! are pruned at startup, keeping the 7 most recent days.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::anyhow;
use tracing_appender::rolling;
use tracing::Level;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "soundviz.log";
const MAX_LOG_FILES: usize = 7;

/// Target for the fatal error logged on exit. `main` prints that error to
/// stderr itself, so the stderr layer skips it.
pub const FATAL_TARGET: &str = "soundviz::fatal";

/// Keeps the non-blocking file writer alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes logging.
///
/// The file layer level comes from `RUST_LOG` (default "info"). If the log
/// directory is unavailable, only the stderr layer is installed.
///
/// # Errors
/// - If logging was already initialized
pub fn init_logging(verbose: bool) -> Result<(), anyhow::Error> {
    let file_layer = match get_log_dir() {
        Ok(log_dir) => {
            if let Err(e) = cleanup_old_logs(&log_dir) {
                eprintln!("Warning: Failed to cleanup old logs: {e}");
            }

            let file_appender = rolling::daily(&log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            APPENDER_GUARD
                .set(guard)
                .map_err(|_| anyhow!("Logging already initialized"))?;

            let env_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_filter(env_filter),
            )
        }
        Err(e) => {
            eprintln!("Warning: File logging disabled: {e}");
            None
        }
    };

    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_fn(move |meta| {
            shown_on_stderr(meta.target(), meta.level(), stderr_level)
        }));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!("Logging initialized");
    Ok(())
}

fn shown_on_stderr(target: &str, level: &Level, max: LevelFilter) -> bool {
    target != FATAL_TARGET && max >= *level
}

/// Log directory: `$XDG_STATE_HOME/soundviz`, else `~/.local/state/soundviz`.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn get_log_dir() -> Result<PathBuf, anyhow::Error> {
    let log_dir = if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg_state).join("soundviz")
    } else {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        home.join(".local/state/soundviz")
    };

    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Removes rotated log files beyond the newest `MAX_LOG_FILES`.
///
/// Only files named `soundviz.log.YYYY-MM-DD` are considered.
fn cleanup_old_logs(log_dir: &Path) -> Result<(), anyhow::Error> {
    let prefix = format!("{LOG_FILE_NAME}.");
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            if file_name.starts_with(&prefix) && file_name.matches('-').count() == 2 {
                let modified = fs::metadata(&path).ok()?.modified().ok()?;
                Some((path, modified))
            } else {
                None
            }
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_stderr_skips_fatal_target() {
        assert!(shown_on_stderr("soundviz::app", &Level::ERROR, LevelFilter::WARN));
        assert!(shown_on_stderr("soundviz::app", &Level::WARN, LevelFilter::WARN));
        assert!(!shown_on_stderr("soundviz::app", &Level::INFO, LevelFilter::WARN));
        assert!(shown_on_stderr("soundviz::app", &Level::DEBUG, LevelFilter::DEBUG));
        assert!(!shown_on_stderr(FATAL_TARGET, &Level::ERROR, LevelFilter::DEBUG));
    }

    #[test]
    fn test_cleanup_keeps_newest_logs() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();

        for day in 1..=10 {
            let path = dir.path().join(format!("soundviz.log.2026-01-{day:02}"));
            let file = fs::File::create(&path).unwrap();
            file.set_modified(now - Duration::from_secs(86_400 * (10 - day)))
                .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();

        assert_eq!(remaining.len(), MAX_LOG_FILES + 1);
        assert!(remaining.contains(&"notes.txt".to_string()));
        assert!(remaining.contains(&"soundviz.log.2026-01-10".to_string()));
        assert!(!remaining.contains(&"soundviz.log.2026-01-03".to_string()));
    }
}
