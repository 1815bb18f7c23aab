//! Configuration and data directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/rboard/`, `~/.cache/rboard/`
//! - macOS: `~/Library/Application Support/rboard/`, `~/Library/Caches/rboard/`
//! - Windows: `%APPDATA%\rboard\`, `%LOCALAPPDATA%\rboard\`

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const APP_NAME: &str = "rboard";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the application cache directory, creating it if needed
///
/// Release builds write their log files here.
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
