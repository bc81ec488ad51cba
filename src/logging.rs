//! # Logging
//!
//! Subscriber setup for binaries. The library itself only emits `tracing`
//! events; whoever owns `main` decides where they go.
//!
//! Log files are named `app-YYYY-MM-DD.log` after the day the process
//! started and appended to. A process running past midnight keeps writing
//! to the file of its start day.

use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Days of log files kept by default
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

const LOG_PREFIX: &str = "app-";
const LOG_SUFFIX: &str = ".log";

/// Path of the log file for `date` inside `dir`
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}{}{}", LOG_PREFIX, date.format("%Y-%m-%d"), LOG_SUFFIX))
}

/// Install a global subscriber writing to stderr and to the log file for
/// the start day in `dir`.
///
/// Returns the path of the log file. Fails if the directory or file cannot
/// be created or a global subscriber is already set.
pub fn init_with_log_dir(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = log_file_path(dir, Local::now().date_naive());
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(path)
}

/// Delete `app-*.log` files in `dir` last modified more than
/// `retention_days` ago. Returns the number of files removed.
pub fn prune_old_logs(dir: &Path, retention_days: u64) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(retention_days * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(LOG_PREFIX) || !name.ends_with(LOG_SUFFIX) {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        match modified {
            Ok(modified) if modified < cutoff => match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(file = name, "Removed old log file");
                    removed += 1;
                }
                Err(e) => warn!(file = name, error = %e, "Failed to remove old log file"),
            },
            _ => {}
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn age(path: &Path, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60))
            .unwrap();
    }

    #[test]
    fn log_file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            log_file_path(Path::new("/logs"), date),
            PathBuf::from("/logs/app-2024-03-09.log")
        );
    }

    #[test]
    fn log_file_is_named_after_start_day() {
        let temp = TempDir::new().unwrap();
        let before = Local::now().date_naive();
        let path = init_with_log_dir(temp.path()).unwrap();
        let after = Local::now().date_naive();

        assert!(path.exists());
        assert!(
            path == log_file_path(temp.path(), before) || path == log_file_path(temp.path(), after)
        );
        assert!(init_with_log_dir(temp.path()).is_err());
    }

    #[test]
    fn prune_removes_only_old_log_files() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("app-2020-01-01.log");
        let fresh = temp.path().join("app-2024-01-01.log");
        let other = temp.path().join("notes.txt");
        for path in [&old, &fresh, &other] {
            fs::write(path, b"x").unwrap();
        }
        age(&old, 30);
        age(&other, 30);

        assert_eq!(prune_old_logs(temp.path(), DEFAULT_RETENTION_DAYS), 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(other.exists());
    }

    #[test]
    fn prune_missing_dir_is_noop() {
        assert_eq!(prune_old_logs(Path::new("/nonexistent/logs"), 7), 0);
    }
}
