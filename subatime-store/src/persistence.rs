//! File persistence helpers.
//!
//! Session state survives restarts as a JSON snapshot written atomically
//! (temp file + rename). The persistence format is opaque to the engine
//! beyond load-at-start and save-on-change.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use subatime_core::{PlatformKind, PlatformStats, SessionTotals};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - Linux: `~/.config/subatime`
/// - macOS: `~/Library/Application Support/subatime`
/// - Windows: `%APPDATA%\subatime`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join("subatime"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Returns the default session snapshot path.
pub fn default_session_path() -> PathBuf {
    default_config_dir().join("session.json")
}

// ============================================================================
// Session Snapshot
// ============================================================================

/// Aggregate state persisted across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Per-platform statistics.
    #[serde(default)]
    pub platform_stats: HashMap<PlatformKind, PlatformStats>,
    /// Session-wide totals.
    #[serde(default)]
    pub totals: SessionTotals,
    /// Timer milliseconds remaining when the snapshot was taken. The timer
    /// always restarts stopped; this is informational.
    #[serde(default)]
    pub timer_remaining_ms: u64,
}

/// Saves a session snapshot to the default path.
pub async fn save_session(snapshot: &SessionSnapshot) -> Result<(), StoreError> {
    save_json(&default_session_path(), snapshot).await
}

/// Loads the session snapshot from the default path, empty if absent.
pub async fn load_session_or_default() -> SessionSnapshot {
    load_json_or_default(&default_session_path()).await
}

// ============================================================================
// File Operations
// ============================================================================

/// Saves data to a JSON file.
///
/// Creates parent directories if they don't exist and writes atomically
/// (temp file + rename) so a crash mid-write never corrupts the snapshot.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

/// Loads data from a JSON file, returning default if missing or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !matches!(e, StoreError::Io(_)) {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut snapshot = SessionSnapshot::default();
        snapshot.platform_stats.insert(
            PlatformKind::Youtube,
            PlatformStats {
                total: 1005,
                session_new: 5,
                ..PlatformStats::default()
            },
        );
        snapshot.totals.total_session_followers = 5;
        snapshot.totals.total_session_time_added_ms = 150_000;
        snapshot.timer_remaining_ms = 42_000;

        save_json(&path, &snapshot).await.unwrap();
        let loaded: SessionSnapshot = load_json(&path).await.unwrap();

        assert_eq!(loaded.totals.total_session_followers, 5);
        assert_eq!(loaded.timer_remaining_ms, 42_000);
        assert_eq!(
            loaded.platform_stats.get(&PlatformKind::Youtube).unwrap().total,
            1005
        );
    }

    #[tokio::test]
    async fn test_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot: SessionSnapshot =
            load_json_or_default(&dir.path().join("missing.json")).await;
        assert!(snapshot.platform_stats.is_empty());
        assert_eq!(snapshot.totals.total_session_followers, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let snapshot: SessionSnapshot = load_json_or_default(&path).await;
        assert!(snapshot.platform_stats.is_empty());
    }

    #[test]
    fn test_default_paths() {
        assert!(default_config_path().ends_with("config.json"));
        assert!(default_session_path().ends_with("session.json"));
    }
}
