//! Per-item context shared by a test body or by every step of a scenario
//!
//! Fixture values are lent into the context for the duration of one item and
//! handed back to their owning scope afterwards. A step may narrow a value
//! with [`Context::replace`]; the displaced original stays out of sight and is
//! what gets handed back for teardown.

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};

use crate::check::{CheckResult, Failure};
use crate::value::{Param, Value};

/// Named values visible to one test item
#[derive(Debug, Default)]
pub struct Context {
    node_id: String,
    values: HashMap<String, Value>,
    visible: HashSet<String>,
    lent: HashSet<String>,
    displaced: HashMap<String, Value>,
    params: HashMap<String, Param>,
}

impl Context {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Self::default()
        }
    }

    /// Node id of the item this context belongs to
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Lend a fixture value into the context
    pub(crate) fn lend(&mut self, name: &str, value: Value, visible: bool) {
        self.lent.insert(name.to_string());
        if visible {
            self.visible.insert(name.to_string());
        }
        self.values.insert(name.to_string(), value);
    }

    /// Take back the value owned by a fixture
    ///
    /// Returns the pre-narrowing original when the name was replaced.
    pub(crate) fn reclaim(&mut self, name: &str) -> Option<Value> {
        self.lent.remove(name);
        self.displaced
            .remove(name)
            .or_else(|| self.values.remove(name))
    }

    pub(crate) fn set_param(&mut self, name: &str, value: Param) {
        self.params.insert(name.to_string(), value);
    }

    /// Value lookup that ignores visibility, used by fixture factories
    pub(crate) fn raw<T: Any>(&self, name: &str) -> CheckResult<&T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| Failure::error(format!("fixture '{name}' is not available")))?;
        value.downcast_ref::<T>().ok_or_else(|| wrong_type::<T>(name))
    }

    /// Whether a visible value exists under `name`
    pub fn has(&self, name: &str) -> bool {
        self.visible.contains(name) && self.values.contains_key(name)
    }

    /// Borrow a visible value
    pub fn get<T: Any>(&self, name: &str) -> CheckResult<&T> {
        self.ensure_visible(name)?;
        self.raw(name)
    }

    /// Mutably borrow a visible value
    pub fn get_mut<T: Any>(&mut self, name: &str) -> CheckResult<&mut T> {
        self.ensure_visible(name)?;
        let value = self
            .values
            .get_mut(name)
            .ok_or_else(|| Failure::error(format!("fixture '{name}' is not available")))?;
        value.downcast_mut::<T>().ok_or_else(|| wrong_type::<T>(name))
    }

    /// Put a value under `name` for everything that runs after this point
    ///
    /// If `name` holds a lent fixture value, that original is set aside and
    /// no longer reachable through the context.
    pub fn replace(&mut self, name: &str, value: Value) {
        if let Some(previous) = self.values.remove(name) {
            if self.lent.contains(name) && !self.displaced.contains_key(name) {
                self.displaced.insert(name.to_string(), previous);
            }
        }
        self.visible.insert(name.to_string());
        self.values.insert(name.to_string(), value);
    }

    /// Shorthand for `replace` with a plain value
    pub fn insert<T: Any>(&mut self, name: &str, value: T) {
        self.replace(name, Value::new(value));
    }

    /// A parameter of the current item
    pub fn param(&self, name: &str) -> CheckResult<&Param> {
        self.params
            .get(name)
            .ok_or_else(|| Failure::error(format!("no parameter '{name}' for this item")))
    }

    /// Integer parameter
    pub fn int(&self, name: &str) -> CheckResult<i64> {
        let param = self.param(name)?;
        param.as_int().ok_or_else(|| param_type(name, "int", param))
    }

    /// Float parameter; integer values widen
    pub fn float(&self, name: &str) -> CheckResult<f64> {
        let param = self.param(name)?;
        param.as_float().ok_or_else(|| param_type(name, "float", param))
    }

    /// String parameter
    pub fn string(&self, name: &str) -> CheckResult<&str> {
        let param = self.param(name)?;
        param.as_str().ok_or_else(|| param_type(name, "str", param))
    }

    fn ensure_visible(&self, name: &str) -> CheckResult {
        if self.visible.contains(name) {
            return Ok(());
        }
        if self.values.contains_key(name) {
            Err(Failure::error(format!(
                "fixture '{name}' is set up for this item but not requested by it"
            )))
        } else {
            Err(Failure::error(format!("fixture '{name}' is not available")))
        }
    }
}

fn wrong_type<T>(name: &str) -> Failure {
    Failure::error(format!("fixture '{}' is not a {}", name, type_name::<T>()))
}

fn param_type(name: &str, expected: &str, actual: &Param) -> Failure {
    Failure::error(format!(
        "parameter '{}' is {} ({}), expected {}",
        name,
        actual.kind(),
        actual,
        expected
    ))
}
