//! Configuration file handling
//!
//! Settings live in `steprun.toml`. Every field has a default, so an empty
//! or missing file is a valid configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Run settings
    #[serde(default)]
    pub run: RunSettings,

    /// Marker registration
    #[serde(default)]
    pub markers: MarkerSettings,

    /// Directory the configuration was loaded from; relative paths resolve
    /// against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings for `steprun run`
#[derive(Debug, Deserialize)]
pub struct RunSettings {
    /// Directory scanned for `*.feature` files
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,

    /// Directory holding the INI and CSV files used by the demo suites
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Stop after the first failing item
    #[serde(default)]
    pub exit_first: bool,

    /// Emit a JSON report instead of terminal output
    #[serde(default)]
    pub json: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            features_dir: default_features_dir(),
            data_dir: default_data_dir(),
            exit_first: false,
            json: false,
        }
    }
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("features")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("demos")
}

/// Marker settings
#[derive(Debug, Deserialize, Default)]
pub struct MarkerSettings {
    /// Reject tags that are not registered
    #[serde(default)]
    pub strict: bool,

    /// Known marker names
    #[serde(default)]
    pub registered: Vec<String>,
}

impl Config {
    /// Load configuration
    ///
    /// Uses `explicit` when given, otherwise `./steprun.toml`, otherwise the
    /// user config file. Returns defaults rooted at `cwd` if none exists.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let Some(path) = paths::find_config(explicit, cwd) else {
            return Ok(Self {
                base_dir: cwd.to_path_buf(),
                ..Self::default()
            });
        };

        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, &e))?;
        let mut config = Self::parse(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Features directory resolved against the config location
    pub fn features_dir(&self) -> PathBuf {
        paths::resolve_against(&self.base_dir, &self.run.features_dir)
    }

    /// Data directory resolved against the config location
    pub fn data_dir(&self) -> PathBuf {
        paths::resolve_against(&self.base_dir, &self.run.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.run.features_dir, PathBuf::from("features"));
        assert!(!config.run.exit_first);
        assert!(!config.markers.strict);
    }

    #[test]
    fn test_parse_markers() {
        let config = Config::parse(
            r#"
            [run]
            exit_first = true

            [markers]
            strict = true
            registered = ["str_test", "temp_conversion"]
            "#,
        )
        .unwrap();
        assert!(config.run.exit_first);
        assert!(config.markers.strict);
        assert_eq!(config.markers.registered.len(), 2);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = Config::parse("[run]\nexit_first = \"maybe\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[run]\nfeatures_dir = \"specs\"\n").unwrap();

        let config = Config::load(Some(&path), Path::new("/")).unwrap();
        assert_eq!(config.features_dir(), dir.path().join("specs"));
        assert_eq!(config.data_dir(), dir.path().join("demos"));
    }
}
