mod config;
pub mod kv;

pub use config::{Config, MonitorConfig, NavigationConfig, OverlayConfig};
pub use kv::SqliteStore;

use std::path::PathBuf;

/// Returns `~/.config/focus-overlay[-dev]/` based on FOCUS_OVERLAY_ENV.
///
/// Set FOCUS_OVERLAY_ENV=dev to use development data directory, or
/// FOCUS_OVERLAY_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(custom) = std::env::var("FOCUS_OVERLAY_DATA_DIR") {
        if !custom.trim().is_empty() {
            let dir = PathBuf::from(custom);
            std::fs::create_dir_all(&dir)?;
            return Ok(dir);
        }
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUS_OVERLAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focus-overlay-dev")
    } else {
        base_dir.join("focus-overlay")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
