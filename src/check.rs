//! Failures raised while a test runs
//!
//! Test bodies, step handlers, fixture factories and teardowns all return
//! [`CheckResult`]. The `check!` family of macros builds assertion failures
//! that carry the failing expression and the values involved.

use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use crate::common::{panic_message, Error};

/// Result of a test body, step, factory or teardown
pub type CheckResult<T = ()> = std::result::Result<T, Failure>;

/// What kind of failure a test produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An expectation did not hold
    Assertion,
    /// A collaborator outside the engine failed (file, config, network)
    External,
    /// Anything else, including non-assertion panics
    Error,
    /// The test skipped itself
    Skip,
    /// The test declared itself an expected failure
    XFail,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Assertion => "assertion",
            FailureKind::External => "external",
            FailureKind::Error => "error",
            FailureKind::Skip => "skip",
            FailureKind::XFail => "xfail",
        };
        f.write_str(name)
    }
}

/// A failure raised while running a test
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Assertion, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(FailureKind::External, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Error, message)
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Skip, reason)
    }

    pub fn xfail(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::XFail, reason)
    }

    /// Prefix the message with where the failure happened
    pub fn context(mut self, what: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", what, self.message);
        self
    }

    /// Whether this failure counts against the test (not a skip or xfail)
    pub fn is_fault(&self) -> bool {
        !matches!(self.kind, FailureKind::Skip | FailureKind::XFail)
    }
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        let kind = match e {
            Error::Io(_)
            | Error::FileRead { .. }
            | Error::ConfigKey { .. }
            | Error::DataFile { .. } => FailureKind::External,
            _ => FailureKind::Error,
        };
        Self::new(kind, e.to_string())
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Self::external(e.to_string())
    }
}

/// Skip the running test
pub fn skip<T>(reason: impl Into<String>) -> CheckResult<T> {
    Err(Failure::skip(reason))
}

/// Mark the running test as an expected failure and stop it
pub fn xfail<T>(reason: impl Into<String>) -> CheckResult<T> {
    Err(Failure::xfail(reason))
}

/// Expect `f` to fail
///
/// Returns the failure so the caller can inspect it. A panic inside `f`
/// counts as a failure too.
pub fn raises<T, F>(f: F) -> CheckResult<Failure>
where
    F: FnOnce() -> CheckResult<T>,
{
    match guarded(f) {
        Ok(_) => Err(Failure::assertion("expected a failure, but the call succeeded")),
        Err(failure) => Ok(failure),
    }
}

/// Relative floating point comparison
pub fn approx_eq(actual: f64, expected: f64, rel: f64) -> bool {
    if actual == expected {
        return true;
    }
    (actual - expected).abs() <= rel * expected.abs()
}

/// Run `f`, converting a panic into a [`Failure`]
///
/// Panics raised by `assert!`-style macros become assertion failures, any
/// other panic becomes an error.
pub fn guarded<T, F>(f: F) -> CheckResult<T>
where
    F: FnOnce() -> CheckResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            if message.starts_with("assertion") {
                Err(Failure::assertion(message))
            } else {
                Err(Failure::error(format!("panicked: {message}")))
            }
        }
    }
}

/// Fail with an assertion error unless the condition holds
///
/// ```
/// use steprun::check;
/// use steprun::check::CheckResult;
///
/// fn body(x: i32) -> CheckResult {
///     check!(x > 1, "{} is not greater than 1", x);
///     Ok(())
/// }
/// assert!(body(2).is_ok());
/// assert!(body(0).is_err());
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            return ::std::result::Result::Err($crate::check::Failure::assertion(
                concat!("assert ", stringify!($cond)),
            )
            .into());
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return ::std::result::Result::Err($crate::check::Failure::assertion(format!(
                "assert {}: {}",
                stringify!($cond),
                format_args!($($arg)+)
            ))
            .into());
        }
    };
}

/// Fail with an assertion error unless both sides are equal
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    return ::std::result::Result::Err($crate::check::Failure::assertion(format!(
                        "assert {} == {}\n  left: {:?}\n right: {:?}",
                        stringify!($left),
                        stringify!($right),
                        left,
                        right
                    ))
                    .into());
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    return ::std::result::Result::Err($crate::check::Failure::assertion(format!(
                        "assert {} == {}: {}\n  left: {:?}\n right: {:?}",
                        stringify!($left),
                        stringify!($right),
                        format_args!($($arg)+),
                        left,
                        right
                    ))
                    .into());
                }
            }
        }
    };
}

/// Fail with an assertion error if both sides are equal
#[macro_export]
macro_rules! check_ne {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if *left == *right {
                    return ::std::result::Result::Err($crate::check::Failure::assertion(format!(
                        "assert {} != {}\n  both: {:?}",
                        stringify!($left),
                        stringify!($right),
                        left
                    ))
                    .into());
                }
            }
        }
    };
}
