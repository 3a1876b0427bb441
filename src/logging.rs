//! Structured logging bootstrap: console output plus a daily rolling file
//! under the configured log directory.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ClientConfig;

/// Rolled files kept on disk, today's included.
pub const RETAINED_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "backoffice";
const APP_DIR: &str = "restaurant-backoffice";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },
    #[error("cannot create log directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("a global subscriber is already installed")]
    AlreadyInitialised,
}

/// What the about screen shows and the first log line records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub git_sha: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        git_sha: env!("BUILD_GIT_SHA"),
        platform: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    }
}

/// Per-user data directory: `%LOCALAPPDATA%` on Windows, `$XDG_DATA_HOME`
/// or `~/.local/share` elsewhere.
pub fn default_log_dir() -> PathBuf {
    let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);
    let data_dir = if cfg!(windows) {
        var("LOCALAPPDATA")
            .or_else(|| var("USERPROFILE").map(|home| home.join("AppData").join("Local")))
    } else {
        var("XDG_DATA_HOME").or_else(|| var("HOME").map(|home| home.join(".local").join("share")))
    };
    data_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("logs")
}

/// Delete all but the `keep` most recently modified log files in `dir`.
/// Files that do not carry the log prefix are left alone.
pub fn prune_old_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .filter_map(|e| {
            let meta = e.metadata().ok().filter(fs::Metadata::is_file)?;
            Some((meta.modified().unwrap_or(SystemTime::UNIX_EPOCH), e.path()))
        })
        .collect();
    logs.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, path) in logs.into_iter().skip(keep) {
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "could not prune log file");
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// filter. Hold the returned guard until exit; dropping it flushes the file.
pub fn init_logging(config: &ClientConfig) -> Result<WorkerGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| LoggingError::Filter {
            filter: config.log_filter.clone(),
            reason: e.to_string(),
        })?;

    // Leave room for the file today's appender is about to open.
    prune_old_logs(&config.log_dir, RETAINED_LOG_FILES.saturating_sub(1));
    fs::create_dir_all(&config.log_dir).map_err(|source| LoggingError::Directory {
        path: config.log_dir.clone(),
        source,
    })?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialised)?;

    let build = build_info();
    info!(
        version = build.version,
        git_sha = build.git_sha,
        built = build.build_timestamp,
        api_url = %config.api_url,
        "restaurant back-office client starting"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn build_info_serializes_camel_case() {
        let json = serde_json::to_value(build_info()).expect("serialize");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json.get("gitSha").is_some());
        assert!(json.get("buildTimestamp").is_some());
    }

    #[test]
    fn prune_keeps_newest_log_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = SystemTime::now() - Duration::from_secs(3600);
        for day in 1..=4u64 {
            let path = dir.path().join(format!("{LOG_FILE_PREFIX}.2026-01-0{day}"));
            fs::write(&path, "log").expect("write log");
            fs::File::options()
                .write(true)
                .open(&path)
                .expect("open")
                .set_modified(base + Duration::from_secs(day * 60))
                .expect("set mtime");
        }
        fs::write(dir.path().join("unrelated.txt"), "keep me").expect("write");

        prune_old_logs(dir.path(), 2);

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .expect("read dir")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                format!("{LOG_FILE_PREFIX}.2026-01-03"),
                format!("{LOG_FILE_PREFIX}.2026-01-04"),
                "unrelated.txt".to_string(),
            ]
        );
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        prune_old_logs(&dir.path().join("absent"), 1);
    }
}
