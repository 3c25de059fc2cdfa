//! Configuration and data file locations

use std::path::{Path, PathBuf};

/// Project name used for platform directories
const APP_NAME: &str = "steprun";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "steprun.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/steprun/`
/// - macOS: `~/Library/Application Support/steprun/`
/// - Windows: `%APPDATA%\steprun\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Find the configuration file to use
///
/// An explicit path wins, then `./steprun.toml`, then the user config file.
/// Returns `None` when nothing exists, in which case defaults apply.
pub fn find_config(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    config_path().filter(|path| path.is_file())
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
