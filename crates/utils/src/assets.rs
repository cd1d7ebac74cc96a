//! Filesystem locations for runtime assets (database, logs).

use std::path::PathBuf;

/// Base directory for runtime assets.
///
/// Overridable via `FORGEBOARD_ASSET_DIR`; defaults to the platform data
/// directory (e.g. `~/.local/share/forgeboard` on Linux).
pub fn asset_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FORGEBOARD_ASSET_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("forgeboard")
}

/// Path to the SQLite database file.
pub fn database_path() -> PathBuf {
    asset_dir().join("forgeboard.sqlite")
}

/// Directory for rotating log files.
pub fn log_dir() -> PathBuf {
    asset_dir().join("logs")
}
