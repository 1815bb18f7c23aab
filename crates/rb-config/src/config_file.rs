use crate::paths;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const CONFIG_FILE: &str = ".rboard.toml";

/// File name inside the platform config directory
pub const CONFIG_DIR_FILE: &str = "config.toml";

/// A config file that was found and read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub content: String,
}

/// Places searched for a config file, in priority order
///
/// 1. `.rboard.toml` in the current working directory
/// 2. `.rboard.toml` in the home directory
/// 3. `config.toml` in the platform config directory (`~/.config/rboard/`)
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    candidates.extend(get_home_config_path());
    match paths::config_dir() {
        Ok(dir) => candidates.push(dir.join(CONFIG_DIR_FILE)),
        Err(e) => log::debug!("Skipping config directory: {}", e),
    }
    candidates
}

/// Load the first config file found among [`config_candidates`]
pub fn load_config_file() -> Option<ConfigFile> {
    load_first_of(&config_candidates())
}

/// The first readable file among `candidates`
pub fn load_first_of<P: AsRef<Path>>(candidates: &[P]) -> Option<ConfigFile> {
    candidates.iter().find_map(|path| {
        let path = path.as_ref();
        let content = fs::read_to_string(path).ok()?;
        log::debug!("Loaded config from {}", path.display());
        Some(ConfigFile {
            path: path.to_path_buf(),
            content,
        })
    })
}

fn get_home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}
