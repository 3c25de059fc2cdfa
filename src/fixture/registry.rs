//! Fixture definitions and the registry that owns them

use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::check::{CheckResult, Failure};
use crate::common::{Error, Result};
use crate::engine::context::Context;
use crate::value::{Param, Value};

/// Lifetime boundary of a fixture instance
///
/// Ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One instance per test item
    Function,
    /// One instance per module (or feature file)
    Module,
    /// One instance per run
    Session,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Function => write!(f, "function"),
            Scope::Module => write!(f, "module"),
            Scope::Session => write!(f, "session"),
        }
    }
}

/// Unique identity of a registered fixture definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureId(u32);

static NEXT_FIXTURE_ID: AtomicU32 = AtomicU32::new(0);

impl FixtureId {
    fn next() -> Self {
        Self(NEXT_FIXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One value of a parametrized fixture
#[derive(Debug, Clone)]
pub struct ParamValue {
    /// Readable identifier used in node ids
    pub id: String,
    pub value: Param,
}

impl ParamValue {
    /// A parameter whose id is its display form
    pub fn new(value: impl Into<Param>) -> Self {
        let value = value.into();
        Self {
            id: value.to_string(),
            value,
        }
    }

    /// A parameter with an explicit id
    pub fn with_id(id: impl Into<String>, value: impl Into<Param>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Teardown continuation of a fixture instance
pub type Teardown = Box<dyn FnOnce(&mut Value) -> CheckResult>;

/// Result of phase one of a fixture: the value and its pending teardown
pub struct Setup {
    pub(crate) value: Value,
    pub(crate) teardown: Option<Teardown>,
}

impl Setup {
    /// A fixture value with nothing to release
    pub fn value<T: Any>(value: T) -> Self {
        Self {
            value: Value::new(value),
            teardown: None,
        }
    }

    /// A fixture value with a teardown that runs when its scope ends
    ///
    /// The teardown sees the value as the tests left it.
    pub fn with_teardown<T, F>(value: T, teardown: F) -> Self
    where
        T: Any,
        F: FnOnce(&mut T) -> CheckResult + 'static,
    {
        Self {
            value: Value::new(value),
            teardown: Some(Box::new(move |value: &mut Value| {
                match value.downcast_mut::<T>() {
                    Some(value) => teardown(value),
                    None => Err(Failure::error("fixture value changed type before teardown")),
                }
            })),
        }
    }
}

/// What a fixture factory can see while it runs
pub struct FixtureRequest<'a> {
    pub(crate) fixture: &'a FixtureDef,
    pub(crate) param: Option<&'a ParamValue>,
    pub(crate) context: &'a Context,
}

impl<'a> FixtureRequest<'a> {
    /// Name of the fixture being built
    pub fn fixture(&self) -> &str {
        &self.fixture.name
    }

    /// Node id of the item that triggered the setup
    pub fn node_id(&self) -> &str {
        self.context.node_id()
    }

    /// Current parameter of a parametrized fixture
    pub fn param(&self) -> CheckResult<&'a Param> {
        self.param.map(|p| &p.value).ok_or_else(|| {
            Failure::error(format!("fixture '{}' is not parametrized", self.fixture.name))
        })
    }

    /// Value of a declared dependency
    pub fn get<T: Any>(&self, name: &str) -> CheckResult<&T> {
        if !self.fixture.deps.iter().any(|d| d == name) {
            return Err(Failure::error(format!(
                "fixture '{}' did not declare a dependency on '{}'",
                self.fixture.name, name
            )));
        }
        self.context.raw::<T>(name)
    }
}

type Factory = Box<dyn Fn(&FixtureRequest<'_>) -> CheckResult<Setup>>;

/// A named fixture factory
pub struct FixtureDef {
    pub(crate) id: FixtureId,
    pub(crate) name: String,
    pub(crate) scope: Scope,
    pub(crate) deps: Vec<String>,
    pub(crate) params: Vec<ParamValue>,
    pub(crate) factory: Factory,
}

impl FixtureDef {
    /// Define a fixture; the factory runs phase one and returns a [`Setup`]
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&FixtureRequest<'_>) -> CheckResult<Setup> + 'static,
    {
        Self {
            id: FixtureId::next(),
            name: name.into(),
            scope: Scope::Function,
            deps: Vec::new(),
            params: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Set the scope (default: function)
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Declare fixtures this one is built from
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(names.into_iter().map(Into::into));
        self
    }

    /// Parametrize the fixture; every dependent test runs once per value
    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = ParamValue>,
    {
        self.params.extend(params);
        self
    }

    pub fn id(&self) -> FixtureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_scope(&self) -> Scope {
        self.scope
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub fn param_values(&self) -> &[ParamValue] {
        &self.params
    }

    pub fn is_parametrized(&self) -> bool {
        !self.params.is_empty()
    }
}

impl fmt::Debug for FixtureDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureDef")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("deps", &self.deps)
            .field("params", &self.params.len())
            .finish()
    }
}

/// Arena of fixture definitions, indexed by name
#[derive(Debug, Default)]
pub struct FixtureRegistry {
    defs: Vec<FixtureDef>,
    by_name: HashMap<String, usize>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; names are unique within a registry
    pub fn register(&mut self, def: FixtureDef) -> Result<FixtureId> {
        if self.by_name.contains_key(&def.name) {
            return Err(Error::DuplicateFixture(def.name));
        }
        let id = def.id;
        tracing::debug!(fixture = %def.name, scope = %def.scope, "registered fixture");
        self.by_name.insert(def.name.clone(), self.defs.len());
        self.defs.push(def);
        Ok(id)
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&FixtureDef> {
        self.by_name.get(name).map(|&index| &self.defs[index])
    }

    /// Definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &FixtureDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = FixtureRegistry::new();
        let id = registry
            .register(FixtureDef::new("city", |_| Ok(Setup::value("Singapore"))))
            .unwrap();
        let def = registry.get("city").unwrap();
        assert_eq!(def.id(), id);
        assert_eq!(def.get_scope(), Scope::Function);
        assert!(registry.get("town").is_none());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = FixtureRegistry::new();
        registry
            .register(FixtureDef::new("city", |_| Ok(Setup::value(1))))
            .unwrap();
        let err = registry
            .register(FixtureDef::new("city", |_| Ok(Setup::value(2))))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFixture(name) if name == "city"));
    }

    #[test]
    fn test_scope_ordering() {
        assert!(Scope::Function < Scope::Module);
        assert!(Scope::Module < Scope::Session);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = FixtureDef::new("a", |_| Ok(Setup::value(())));
        let b = FixtureDef::new("a", |_| Ok(Setup::value(())));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_param_value_ids() {
        assert_eq!(ParamValue::new(3).id, "3");
        assert_eq!(ParamValue::with_id("three", 3).id, "three");
    }
}
