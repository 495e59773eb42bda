//! Resolution of the per-user application directory holding the single
//! SQLite store file, per spec.md §6.4: created on first use, no other
//! persistent files are part of the contract.

use std::path::PathBuf;

use directories::ProjectDirs;

/// The default store path: `$XDG_DATA_HOME/queuectl/queue.db`, falling back
/// to `~/.queuectl/queue.db` when no XDG-style data directory can be
/// resolved — matching the Python prototype's flat `~/.queuectl` layout.
pub fn default_db_path() -> PathBuf {
    match ProjectDirs::from("", "", "queuectl") {
        Some(dirs) => dirs.data_dir().join("queue.db"),
        None => home_fallback(),
    }
}

fn home_fallback() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".queuectl").join("queue.db")
}

/// Ensure the store file's parent directory exists.
pub fn ensure_parent(path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
