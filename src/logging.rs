use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{self, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_DIR_NAME: &str = "component-language-server";
const SESSION_PREFIX: &str = "session-";

/// Set once a global subscriber is known to be in place.
static LOGGER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Log directory in the user-specific OS cache directory
/// - Linux: ~/.cache/component-language-server/
/// - macOS: ~/Library/Caches/component-language-server/
/// - Windows: %LOCALAPPDATA%\component-language-server\
fn get_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory"))?;

    let log_dir = cache_dir.join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

fn is_session_log(name: &str) -> bool {
    name.starts_with(SESSION_PREFIX) && name.ends_with(".log")
}

/// Removes session logs last modified more than `retention` before `now`.
/// Returns the number of files removed.
fn cleanup_old_logs(log_dir: &Path, now: SystemTime, retention: Duration) -> usize {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        let is_stale_log = metadata.is_file()
            && entry.file_name().to_str().is_some_and(is_session_log)
            && metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > retention);
        if !is_stale_log {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e),
        }
    }
    removed
}

fn session_log_name() -> io::Result<String> {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(io::Error::other)?;
    Ok(format!("{}{}-{}.log", SESSION_PREFIX, timestamp, std::process::id()))
}

/// `try_init` fails only when a global subscriber or `log` logger is already
/// set, possibly by the embedding process; either way one is in place.
fn mark_installed(result: Result<(), TryInitError>) {
    if let Err(e) = result {
        tracing::debug!("Keeping the existing global subscriber: {}", e);
    }
    let _ = LOGGER_INSTALLED.set(());
}

/// Initialize logger with stderr and optional file output
/// Returns a WorkerGuard that must be kept alive for the duration of the program
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
/// * `enable_file_logging` - Enable the session log file (disable for tests)
///
/// # Logging Behavior
/// - **Stderr**: Logs at the configured level (default "info"). stdout carries the protocol.
/// - **Session File**: Logs at DEBUG level, including registry scans and per-request detail
pub fn init_logger(no_color: bool, log_level: Option<&str>, enable_file_logging: bool) -> io::Result<WorkerGuard> {
    if LOGGER_INSTALLED.get().is_some() {
        let (_, guard) = tracing_appender::non_blocking(io::sink());
        return Ok(guard);
    }

    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    if !enable_file_logging {
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());
        mark_installed(tracing_subscriber::registry().with(stderr_layer).try_init());
        return Ok(guard);
    }

    let log_dir = get_log_dir()?;
    cleanup_old_logs(&log_dir, SystemTime::now(), Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60));

    let log_path = log_dir.join(session_log_name()?);
    let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::EnvFilter::new("debug"));

    mark_installed(
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init(),
    );
    eprintln!("Logging to file: {:?}", log_path);
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_log_name_shape() {
        let name = session_log_name().unwrap();
        assert!(is_session_log(&name), "{}", name);
        assert!(name.ends_with(&format!("-{}.log", std::process::id())));
    }

    #[test]
    fn test_cleanup_removes_only_stale_session_logs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("session-20240101-000000-1.log"), "old").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        // Everything looks fresh right now.
        assert_eq!(cleanup_old_logs(dir.path(), SystemTime::now(), Duration::from_secs(3600)), 0);

        let later = SystemTime::now() + Duration::from_secs(8 * 24 * 60 * 60);
        let retention = Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);
        assert_eq!(cleanup_old_logs(dir.path(), later, retention), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_init_logger_is_idempotent() {
        let _first = init_logger(true, Some("warn"), false).unwrap();
        let _second = init_logger(true, Some("debug"), false).unwrap();
        assert!(LOGGER_INSTALLED.get().is_some());
    }

    #[test]
    fn test_init_logger_tolerates_foreign_subscriber() {
        // Whichever test runs first, a subscriber not installed here must not
        // turn initialization into an error.
        let _ = tracing::subscriber::set_global_default(tracing_subscriber::registry());
        let _guard = init_logger(true, None, false).unwrap();
        assert!(LOGGER_INSTALLED.get().is_some());
    }
}
