//! File-based logging configuration.
//!
//! Console logging is always on; rotating daily JSON log files can be
//! enabled with `FORGEBOARD_FILE_LOGGING`. `FORGEBOARD_LOG_DIR` overrides
//! the default directory and `FORGEBOARD_LOG_MAX_FILES` the retention
//! count (default 7).

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use utils::assets::log_dir;

const LOG_FILE_PREFIX: &str = "forgeboard.log";

#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    pub max_files: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        let enabled = std::env::var("FORGEBOARD_FILE_LOGGING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let dir = std::env::var("FORGEBOARD_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| log_dir());

        let max_files = std::env::var("FORGEBOARD_LOG_MAX_FILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        Self {
            enabled,
            log_dir: dir,
            max_files,
        }
    }
}

/// Initialize logging. The returned guard must live for the whole process
/// so buffered file output is flushed on shutdown.
pub fn init_logging(log_level: &str) -> Option<WorkerGuard> {
    let config = FileLoggingConfig::default();

    let filter_string = format!(
        "warn,server={level},services={level},db={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(&filter_string).expect("Failed to create tracing filter");

    let console_layer = tracing_subscriber::fmt::layer().with_filter(env_filter);

    if config.enabled {
        if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
            eprintln!("Failed to create log directory {:?}: {}", config.log_dir, e);
            tracing_subscriber::registry().with(console_layer).init();
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_filter =
            EnvFilter::try_new(&filter_string).expect("Failed to create file filter");
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(file_filter);

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();

        tracing::info!(
            log_dir = ?config.log_dir,
            max_files = config.max_files,
            "File logging enabled"
        );

        let dir = config.log_dir.clone();
        let max_files = config.max_files;
        std::thread::spawn(move || {
            cleanup_old_logs(&dir, max_files);
        });

        Some(guard)
    } else {
        tracing_subscriber::registry().with(console_layer).init();
        None
    }
}

/// Remove log files beyond the retention count, oldest first.
fn cleanup_old_logs(dir: &PathBuf, max_files: usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.into_iter().skip(max_files) {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
        }
    }
}
