//! File-based logging using simplelog
//!
//! Log file location depends on build type:
//! - Debug builds: current working directory
//! - Release builds: cache directory (~/.cache/rboard/ on Linux)
//!
//! Only records from the rboard crates are written. HTTP stack internals
//! (reqwest, hyper) are filtered out even at `trace`.

use anyhow::{Context, Result};
use rb_config::AppConfig;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

const LOGGED_CRATES: [&str; 5] = ["rboard", "rb_client", "rb_diff", "rb_api_cache", "rb_config"];

fn log_file_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = format!("debug-{}.log", timestamp);

    if cfg!(debug_assertions) {
        PathBuf::from(filename)
    } else {
        rb_config::paths::cache_dir()
            .map(|dir| dir.join(&filename))
            .unwrap_or_else(|_| PathBuf::from(filename))
    }
}

/// Level named by `RUST_LOG`, `Debug` when unset and `Info` when unreadable
fn parse_level(value: Option<&str>) -> LevelFilter {
    match value {
        None => LevelFilter::Debug,
        Some(name) => name.trim().parse().unwrap_or(LevelFilter::Info),
    }
}

/// Start logging to a fresh file and record the settings in use
///
/// Returns the path of the log file.
pub fn init(config: &AppConfig) -> Result<PathBuf> {
    let log_file = log_file_path();
    let level = parse_level(std::env::var("RUST_LOG").ok().as_deref());

    let mut builder = ConfigBuilder::new();
    for name in LOGGED_CRATES {
        builder.add_filter_allow_str(name);
    }
    let log_config = builder
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();

    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;
    WriteLogger::init(level, log_config, file).context("Failed to initialize logger")?;

    log::info!(
        "rboard {} logging at {} to {}",
        env!("CARGO_PKG_VERSION"),
        level,
        log_file.display()
    );
    log::info!(
        "Config from {}: server {}, p4 command {}",
        config.source_description(),
        config.server_url,
        config.p4_command
    );

    Ok(log_file)
}
