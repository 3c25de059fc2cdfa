//! Marks attached to tests, parameter rows and scenarios
//!
//! Skip conditions are evaluated once, at collection, against an
//! [`Environment`] snapshot.

use semver::{Version, VersionReq};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::check::FailureKind;

/// Names of the marks the engine understands itself
pub const BUILTIN_MARKS: &[&str] = &["skip", "skipif", "xfail", "usefixtures", "parametrize"];

/// What skip-if conditions can look at
#[derive(Debug, Clone)]
pub struct Environment {
    pub os: String,
    pub vars: HashMap<String, String>,
    pub version: Version,
}

impl Environment {
    /// Snapshot of the running process
    pub fn capture() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            vars: std::env::vars().collect(),
            version: engine_version(),
        }
    }

    /// Value of an environment variable at capture time
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether the engine version satisfies a requirement such as `>=0.2`
    ///
    /// An unparsable requirement never matches.
    pub fn version_matches(&self, requirement: &str) -> bool {
        match VersionReq::parse(requirement) {
            Ok(req) => req.matches(&self.version),
            Err(e) => {
                tracing::warn!(requirement, error = %e, "invalid version requirement");
                false
            }
        }
    }
}

fn engine_version() -> Version {
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unparsable package version");
        Version::new(0, 0, 0)
    })
}

/// Predicate of a skip-if mark
pub type Condition = Rc<dyn Fn(&Environment) -> bool>;

/// Expected-failure settings
#[derive(Debug, Clone, PartialEq)]
pub struct XFailSpec {
    pub reason: String,
    /// An unexpected pass fails the run
    pub strict: bool,
    /// Only failures of this kind count as expected
    pub raises: Option<FailureKind>,
}

impl XFailSpec {
    /// Whether a failure of `kind` is the expected one
    pub fn absorbs(&self, kind: FailureKind) -> bool {
        self.raises.map_or(true, |expected| expected == kind)
    }
}

/// A mark on a test, a parameter row or a scenario
#[derive(Clone)]
pub enum Mark {
    Skip { reason: String },
    SkipIf { condition: Condition, reason: String },
    XFail(XFailSpec),
    /// Fixtures set up for the item but not visible to it
    UseFixtures(Vec<String>),
    /// A plain label, used for selection
    Tag(String),
}

impl Mark {
    pub fn skip(reason: impl Into<String>) -> Self {
        Mark::Skip {
            reason: reason.into(),
        }
    }

    pub fn skip_if<F>(condition: F, reason: impl Into<String>) -> Self
    where
        F: Fn(&Environment) -> bool + 'static,
    {
        Mark::SkipIf {
            condition: Rc::new(condition),
            reason: reason.into(),
        }
    }

    pub fn xfail(reason: impl Into<String>) -> Self {
        Mark::XFail(XFailSpec {
            reason: reason.into(),
            strict: false,
            raises: None,
        })
    }

    pub fn xfail_strict(reason: impl Into<String>) -> Self {
        Mark::XFail(XFailSpec {
            reason: reason.into(),
            strict: true,
            raises: None,
        })
    }

    pub fn xfail_raises(reason: impl Into<String>, kind: FailureKind) -> Self {
        Mark::XFail(XFailSpec {
            reason: reason.into(),
            strict: false,
            raises: Some(kind),
        })
    }

    pub fn use_fixtures<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Mark::UseFixtures(names.into_iter().map(Into::into).collect())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Mark::Tag(name.into())
    }

    /// Mark for a scenario tag; `@skip` and `@xfail` carry their meaning
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "skip" => Mark::skip("tagged @skip"),
            "xfail" => Mark::xfail("tagged @xfail"),
            other => Mark::tag(other),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Mark::Skip { .. } => "skip",
            Mark::SkipIf { .. } => "skipif",
            Mark::XFail(_) => "xfail",
            Mark::UseFixtures(_) => "usefixtures",
            Mark::Tag(name) => name,
        }
    }

    /// Whether this is a user label that strict mode must know about
    pub fn is_custom(&self) -> bool {
        matches!(self, Mark::Tag(name) if !BUILTIN_MARKS.contains(&name.as_str()))
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Skip { reason } => write!(f, "Skip({reason:?})"),
            Mark::SkipIf { reason, .. } => write!(f, "SkipIf({reason:?})"),
            Mark::XFail(spec) => write!(f, "XFail({spec:?})"),
            Mark::UseFixtures(names) => write!(f, "UseFixtures({names:?})"),
            Mark::Tag(name) => write!(f, "Tag({name:?})"),
        }
    }
}

/// Marks of one item after evaluation
#[derive(Debug, Clone, Default)]
pub struct ItemMarks {
    /// Reason the item is skipped, if it is
    pub skip: Option<String>,
    pub xfail: Option<XFailSpec>,
    pub use_fixtures: Vec<String>,
    /// Every mark name on the item, for `-m` selection
    pub names: Vec<String>,
}

impl ItemMarks {
    /// Evaluate marks in order; a later xfail replaces an earlier one
    pub fn evaluate<'a, I>(marks: I, env: &Environment) -> Self
    where
        I: IntoIterator<Item = &'a Mark>,
    {
        let mut evaluated = Self::default();
        for mark in marks {
            match mark {
                Mark::Skip { reason } => {
                    evaluated.skip.get_or_insert_with(|| reason.clone());
                }
                Mark::SkipIf { condition, reason } => {
                    if evaluated.skip.is_none() && condition(env) {
                        evaluated.skip = Some(reason.clone());
                    }
                }
                Mark::XFail(spec) => evaluated.xfail = Some(spec.clone()),
                Mark::UseFixtures(names) => {
                    for name in names {
                        if !evaluated.use_fixtures.contains(name) {
                            evaluated.use_fixtures.push(name.clone());
                        }
                    }
                }
                Mark::Tag(_) => {}
            }
            if !evaluated.names.iter().any(|n| n == mark.name()) {
                evaluated.names.push(mark.name().to_string());
            }
        }
        evaluated
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
