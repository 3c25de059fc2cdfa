//! Error types for steprun
//!
//! These are configuration and collection errors: problems with how fixtures,
//! steps, feature files or settings are declared. Failures raised while a
//! test is running are [`crate::check::Failure`] values instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for steprun
#[derive(Error, Debug)]
pub enum Error {
    // === Fixture Errors ===
    #[error("Fixture '{name}' not found (requested by '{requested_by}')")]
    UnknownFixture { name: String, requested_by: String },

    #[error("Cyclic fixture dependency: {cycle}")]
    CyclicDependency { cycle: String },

    #[error("Fixture '{fixture}' with {scope} scope cannot depend on '{dependency}' with {dependency_scope} scope")]
    ScopeMismatch {
        fixture: String,
        scope: String,
        dependency: String,
        dependency_scope: String,
    },

    #[error("Fixture '{0}' is already registered")]
    DuplicateFixture(String),

    // === Test Model Errors ===
    #[error("Test '{test}' parametrizes {expected} argument(s) but a row has {found} value(s)")]
    ParamArity {
        test: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown marker '{name}' on '{item}'. Register it under [markers] in steprun.toml")]
    UnknownMarker { name: String, item: String },

    // === Step Errors ===
    #[error("Invalid step pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No {keyword} step matches '{text}'")]
    StepNotFound { keyword: String, text: String },

    #[error("{keyword} step '{text}' is ambiguous, it matches: {candidates}")]
    AmbiguousStep {
        keyword: String,
        text: String,
        candidates: String,
    },

    #[error("{path}:{line}: {message}")]
    FeatureParse {
        path: String,
        line: usize,
        message: String,
    },

    // === Collaborator Errors ===
    #[error("No key '{key}' in section [{section}]")]
    ConfigKey { section: String, key: String },

    #[error("Malformed data file '{path}' at line {line}: {message}")]
    DataFile {
        path: String,
        line: usize,
        message: String,
    },

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown fixture error
    pub fn unknown_fixture(name: &str, requested_by: &str) -> Self {
        Self::UnknownFixture {
            name: name.to_string(),
            requested_by: requested_by.to_string(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: &str, reason: &str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a feature parse error
    pub fn feature_parse(path: &str, line: usize, message: impl Into<String>) -> Self {
        Self::FeatureParse {
            path: path.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error stops collection before any test runs
    ///
    /// Step binding errors only invalidate the scenario that contains them.
    pub fn is_fatal_to_collection(&self) -> bool {
        !matches!(self, Error::StepNotFound { .. } | Error::AmbiguousStep { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_binding_errors_are_not_fatal() {
        let err = Error::StepNotFound {
            keyword: "Given".to_string(),
            text: "nothing".to_string(),
        };
        assert!(!err.is_fatal_to_collection());
        assert!(Error::unknown_fixture("db", "test_x").is_fatal_to_collection());
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = Error::unknown_fixture("db", "test_x");
        assert_eq!(err.to_string(), "Fixture 'db' not found (requested by 'test_x')");

        let err = Error::feature_parse("a.feature", 3, "step outside of a scenario");
        assert_eq!(err.to_string(), "a.feature:3: step outside of a scenario");
    }
}
