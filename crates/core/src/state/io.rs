//! # IO Utilities
//!
//! File system operations for the `.swiftsmith` runtime directory, which
//! holds the persisted configuration and the saved session.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";

/// Get the runtime directory path (.swiftsmith)
pub fn get_runtime_path() -> PathBuf {
    // Check for environment variable override
    if let Ok(path) = std::env::var("SWIFTSMITH_RUNTIME_PATH") {
        return PathBuf::from(path);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".swiftsmith")
}

/// Location of the persisted configuration
pub fn config_path() -> PathBuf {
    get_runtime_path().join(CONFIG_FILE)
}

/// Location of the saved session snapshot
pub fn session_path() -> PathBuf {
    get_runtime_path().join(SESSION_FILE)
}

/// Ensure the runtime directory exists
pub async fn ensure_runtime_dir() -> Result<PathBuf> {
    let path = get_runtime_path();
    fs::create_dir_all(&path)
        .await
        .with_context(|| format!("Failed to create runtime directory: {:?}", path))?;
    Ok(path)
}

/// Remove a file if it exists; returns whether anything was removed
pub async fn remove_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
    }
}
