//! Test cases, modules and the session that owns them

use std::fmt;

use super::context::Context;
use super::marker::Mark;
use crate::bdd::{Feature, StepDef, StepRegistry};
use crate::check::CheckResult;
use crate::common::Result;
use crate::fixture::{FixtureDef, FixtureId, FixtureRegistry};
use crate::value::Param;

type Body = Box<dyn Fn(&mut Context) -> CheckResult>;

/// One row of a parametrize set
#[derive(Debug, Clone)]
pub struct ParamRow {
    pub values: Vec<Param>,
    pub id: Option<String>,
    pub marks: Vec<Mark>,
}

impl ParamRow {
    pub fn new<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            id: None,
            marks: Vec::new(),
        }
    }

    /// Use `id` in node ids instead of the values
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Mark only this row
    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Node id label: the explicit id, or the values joined with `-`
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => self
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("-"),
        }
    }
}

/// Build a [`ParamRow`] from values of mixed types
///
/// ```
/// let row = steprun::row![8, 46.4];
/// assert_eq!(row.label(), "8-46.4");
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::engine::case::ParamRow::new(
            ::std::vec![$($crate::value::Param::from($value)),*]
        )
    };
}

/// Argument names plus the rows that fill them
#[derive(Debug, Clone)]
pub struct Parametrize {
    pub names: Vec<String>,
    pub rows: Vec<ParamRow>,
}

/// A test: a body plus the fixtures, parameters and marks it runs with
pub struct TestCase {
    pub(crate) name: String,
    pub(crate) body: Body,
    pub(crate) uses: Vec<String>,
    pub(crate) marks: Vec<Mark>,
    pub(crate) parametrize: Vec<Parametrize>,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Context) -> CheckResult + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
            uses: Vec::new(),
            marks: Vec::new(),
            parametrize: Vec::new(),
        }
    }

    /// Request fixtures; their values are visible in the context
    pub fn uses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uses.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Run once per row; several sets multiply
    ///
    /// `names` is comma separated, e.g. `"cent, expected"`.
    pub fn parametrize<I>(mut self, names: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = ParamRow>,
    {
        self.parametrize.push(Parametrize {
            names: names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect(),
            rows: rows.into_iter().collect(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("uses", &self.uses)
            .field("marks", &self.marks)
            .field("parametrize", &self.parametrize)
            .finish()
    }
}

/// A named group of tests with its own fixtures
///
/// Module fixtures shadow session fixtures of the same name, and
/// module-scoped instances are torn down when the module finishes.
#[derive(Debug)]
pub struct TestModule {
    pub(crate) name: String,
    pub(crate) fixtures: FixtureRegistry,
    pub(crate) tests: Vec<TestCase>,
}

impl TestModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixtures: FixtureRegistry::new(),
            tests: Vec::new(),
        }
    }

    pub fn fixture(&mut self, def: FixtureDef) -> Result<FixtureId> {
        self.fixtures.register(def)
    }

    pub fn test(&mut self, case: TestCase) -> &mut Self {
        self.tests.push(case);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }
}

/// Everything one run knows about: session fixtures, steps, test modules and
/// feature files
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) fixtures: FixtureRegistry,
    pub(crate) steps: StepRegistry,
    pub(crate) modules: Vec<TestModule>,
    pub(crate) features: Vec<Feature>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session-wide fixture
    pub fn fixture(&mut self, def: FixtureDef) -> Result<FixtureId> {
        self.fixtures.register(def)
    }

    pub fn step(&mut self, def: StepDef) -> usize {
        self.steps.register(def)
    }

    pub fn add_module(&mut self, module: TestModule) {
        self.modules.push(module);
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn fixtures(&self) -> &FixtureRegistry {
        &self.fixtures
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn modules(&self) -> &[TestModule] {
        &self.modules
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}
