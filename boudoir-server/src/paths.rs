//! Platform-specific directory paths.
//!
//! XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "fr";
const ORGANIZATION: &str = "boudoir";
const APPLICATION: &str = "boudoir";

/// Rotated log files kept besides `latest.log`.
const MAX_OLD_LOGS: usize = 10;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Persistent data, home of the marketplace database.
///
/// - Linux: `$XDG_DATA_HOME/boudoir` or `~/.local/share/boudoir`
/// - macOS: `~/Library/Application Support/fr.boudoir.boudoir`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Regenerable data: logs.
///
/// - Linux: `$XDG_CACHE_HOME/boudoir` or `~/.cache/boudoir`
/// - macOS: `~/Library/Caches/fr.boudoir.boudoir`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default location of the marketplace database.
pub fn database() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("boudoir.db"))
}

/// Log file of the running server.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("latest.log"))
}

/// Archives `latest.log` under a timestamped name and prunes old logs.
/// Call before creating the new log file.
pub fn rotate_logs() {
    let Some(cache) = cache_dir() else { return };
    let latest = cache.join("latest.log");

    if latest.exists() {
        let archived = cache.join(format!("{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S")));
        let _ = fs::rename(&latest, &archived);
    }

    prune_logs(&cache, MAX_OLD_LOGS);
}

fn prune_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut logs: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != "latest.log"
        })
        .collect();
    if logs.len() <= keep {
        return;
    }

    // Oldest first
    logs.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    for entry in &logs[..logs.len() - keep] {
        let _ = fs::remove_file(entry.path());
    }
}
