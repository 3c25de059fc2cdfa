//! INI configuration reader
//!
//! Sections are `[name]`, entries `key = value` or `key: value`. Lines
//! starting with `#` or `;` are comments. Keys are case-insensitive, section
//! names are not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// A parsed INI file
#[derive(Debug, Clone, Default)]
pub struct IniConfig {
    path: Option<PathBuf>,
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        let mut config = Self::parse(&text, &path.display().to_string())?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse INI text; `origin` names the source in errors
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let malformed = |message: &str| Error::DataFile {
                path: origin.to_string(),
                line: index + 1,
                message: message.to_string(),
            };

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| malformed("bad section header"))?;
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let Some(section) = current.as_ref() else {
                return Err(malformed("entry before any section"));
            };
            let split = line
                .find(|c: char| c == '=' || c == ':')
                .ok_or_else(|| malformed("expected 'key = value'"))?;
            let key = line[..split].trim().to_lowercase();
            if key.is_empty() {
                return Err(malformed("empty key"));
            }
            let value = line[split + 1..].trim().to_string();
            sections.entry(section.clone()).or_default().insert(key, value);
        }

        Ok(Self {
            path: None,
            sections,
        })
    }

    /// Value of `key` in `[section]`
    pub fn get(&self, section: &str, key: &str) -> Result<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key.to_lowercase()))
            .map(String::as_str)
            .ok_or_else(|| Error::ConfigKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
