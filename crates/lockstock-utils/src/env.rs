//! Environment loading helpers

use std::path::PathBuf;

/// Load a `.env` file from the current directory or any parent.
///
/// Returns the path that was loaded, or `None` when no file was found.
/// Variables already present in the process environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("failed to read .env file: {e}");
            None
        }
    }
}

/// Read an environment variable, treating empty or whitespace-only values as unset.
pub fn var_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
