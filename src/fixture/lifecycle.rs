//! Fixture lifecycle executor
//!
//! Every fixture instance moves through `Created -> Active -> TornDown`.
//! Phase one (the factory) runs on `enter`; phase two (the teardown) runs
//! when the owning scope exits, whatever happened to the tests in between.
//! An instance whose factory failed never becomes active and is dropped
//! without a teardown.

use serde::Serialize;

use super::registry::{FixtureDef, FixtureId, FixtureRequest, Scope, Teardown};
use crate::check::{guarded, CheckResult, Failure};
use crate::engine::context::Context;
use crate::value::Value;

/// State of a fixture instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Created,
    Active,
    TornDown,
}

/// A materialized fixture owned by one scope frame
pub struct FixtureInstance {
    id: FixtureId,
    name: String,
    param: Option<usize>,
    state: InstanceState,
    value: Option<Value>,
    teardown: Option<Teardown>,
}

impl FixtureInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }
}

/// Handle to an instance inside the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceKey {
    scope: Scope,
    slot: usize,
}

/// A teardown that failed
#[derive(Debug, Clone, Serialize)]
pub struct TeardownError {
    pub fixture: String,
    pub scope: Scope,
    pub message: String,
}

/// Instances of all three scopes, in acquisition order per scope
#[derive(Default)]
pub struct Lifecycle {
    function: Vec<FixtureInstance>,
    module: Vec<FixtureInstance>,
    session: Vec<FixtureInstance>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, scope: Scope) -> &Vec<FixtureInstance> {
        match scope {
            Scope::Function => &self.function,
            Scope::Module => &self.module,
            Scope::Session => &self.session,
        }
    }

    fn frame_mut(&mut self, scope: Scope) -> &mut Vec<FixtureInstance> {
        match scope {
            Scope::Function => &mut self.function,
            Scope::Module => &mut self.module,
            Scope::Session => &mut self.session,
        }
    }

    /// Find a reusable active instance
    ///
    /// Function-scoped fixtures are never reused across items, so callers
    /// only look up module and session instances.
    pub fn find(&self, scope: Scope, id: FixtureId, param: Option<usize>) -> Option<InstanceKey> {
        self.frame(scope)
            .iter()
            .position(|i| i.id == id && i.param == param && i.state == InstanceState::Active)
            .map(|slot| InstanceKey { scope, slot })
    }

    /// Run phase one of `def` and keep the instance in its scope frame
    pub fn enter(
        &mut self,
        def: &FixtureDef,
        param: Option<usize>,
        context: &Context,
    ) -> CheckResult<InstanceKey> {
        let frame = self.frame_mut(def.scope);
        let slot = frame.len();
        frame.push(FixtureInstance {
            id: def.id,
            name: def.name.clone(),
            param,
            state: InstanceState::Created,
            value: None,
            teardown: None,
        });

        let request = FixtureRequest {
            fixture: def,
            param: param.and_then(|index| def.params.get(index)),
            context,
        };
        tracing::debug!(fixture = %def.name, scope = %def.scope, node = %context.node_id(), "setup");

        match guarded(|| (def.factory)(&request)) {
            Ok(setup) => {
                let instance = &mut self.frame_mut(def.scope)[slot];
                instance.value = Some(setup.value);
                instance.teardown = setup.teardown;
                instance.state = InstanceState::Active;
                Ok(InstanceKey {
                    scope: def.scope,
                    slot,
                })
            }
            Err(failure) => {
                // Nothing was acquired, so there is nothing to tear down.
                self.frame_mut(def.scope).pop();
                Err(failure.context(format!("setup of fixture '{}'", def.name)))
            }
        }
    }

    /// Take the value out of an instance for the duration of an item
    pub fn lend(&mut self, key: InstanceKey) -> CheckResult<Value> {
        let instance = self
            .frame_mut(key.scope)
            .get_mut(key.slot)
            .ok_or_else(|| Failure::error("fixture instance no longer exists"))?;
        instance.value.take().ok_or_else(|| {
            Failure::error(format!("fixture '{}' is already in use", instance.name))
        })
    }

    /// Give a lent value back to its instance
    pub fn restore(&mut self, key: InstanceKey, value: Value) {
        if let Some(instance) = self.frame_mut(key.scope).get_mut(key.slot) {
            instance.value = Some(value);
        }
    }

    /// Number of instances currently held for `scope`
    pub fn active(&self, scope: Scope) -> usize {
        self.frame(scope)
            .iter()
            .filter(|i| i.state == InstanceState::Active)
            .count()
    }

    /// End a scope: tear down its instances in reverse acquisition order
    ///
    /// Every teardown runs even if an earlier one fails.
    pub fn exit(&mut self, scope: Scope) -> Vec<TeardownError> {
        let mut errors = Vec::new();
        let mut frame = std::mem::take(self.frame_mut(scope));

        while let Some(mut instance) = frame.pop() {
            if instance.state != InstanceState::Active {
                continue;
            }
            tracing::debug!(fixture = %instance.name, %scope, "teardown");

            let result = match (instance.teardown.take(), instance.value.as_mut()) {
                (Some(teardown), Some(value)) => guarded(|| teardown(value)),
                (Some(_), None) => Err(Failure::error("value was never returned to the fixture")),
                (None, _) => Ok(()),
            };
            instance.state = InstanceState::TornDown;

            if let Err(failure) = result {
                tracing::warn!(fixture = %instance.name, %scope, error = %failure, "teardown failed");
                errors.push(TeardownError {
                    fixture: instance.name.clone(),
                    scope,
                    message: failure.message,
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::registry::Setup;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logged(name: &'static str, log: &Log) -> FixtureDef {
        let log = log.clone();
        FixtureDef::new(name, move |_| {
            log.borrow_mut().push(format!("setup {name}"));
            let log = log.clone();
            Ok(Setup::with_teardown(name.to_string(), move |_| {
                log.borrow_mut().push(format!("teardown {name}"));
                Ok(())
            }))
        })
    }

    #[test]
    fn test_teardown_in_reverse_order() {
        let log: Log = Rc::default();
        let a = logged("a", &log);
        let b = logged("b", &log);
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        lifecycle.enter(&a, None, &ctx).unwrap();
        lifecycle.enter(&b, None, &ctx).unwrap();
        assert_eq!(lifecycle.active(Scope::Function), 2);

        let errors = lifecycle.exit(Scope::Function);
        assert!(errors.is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["setup a", "setup b", "teardown b", "teardown a"]
        );
        assert_eq!(lifecycle.active(Scope::Function), 0);
    }

    #[test]
    fn test_failed_setup_is_not_torn_down() {
        let log: Log = Rc::default();
        let a = logged("a", &log);
        let broken = FixtureDef::new("broken", |_| Err(Failure::error("no disk")));
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        lifecycle.enter(&a, None, &ctx).unwrap();
        let failure = lifecycle.enter(&broken, None, &ctx).unwrap_err();
        assert!(failure.message.contains("setup of fixture 'broken'"));

        lifecycle.exit(Scope::Function);
        assert_eq!(*log.borrow(), vec!["setup a", "teardown a"]);
    }

    #[test]
    fn test_failing_teardown_does_not_stop_others() {
        let log: Log = Rc::default();
        let a = logged("a", &log);
        let bad = FixtureDef::new("bad", |_| {
            Ok(Setup::with_teardown(0, |_| Err(Failure::error("close failed"))))
        });
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        lifecycle.enter(&a, None, &ctx).unwrap();
        lifecycle.enter(&bad, None, &ctx).unwrap();

        let errors = lifecycle.exit(Scope::Function);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].fixture, "bad");
        assert_eq!(*log.borrow(), vec!["setup a", "teardown a"]);
    }

    #[test]
    fn test_teardown_sees_mutated_value() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let seen_in_teardown = seen.clone();
        let def = FixtureDef::new("week", move |_| {
            let seen = seen_in_teardown.clone();
            Ok(Setup::with_teardown(vec!["mon".to_string()], move |week: &mut Vec<String>| {
                seen.borrow_mut().extend(week.iter().cloned());
                Ok(())
            }))
        });
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        let key = lifecycle.enter(&def, None, &ctx).unwrap();
        let mut value = lifecycle.lend(key).unwrap();
        assert!(lifecycle.lend(key).is_err());
        value.downcast_mut::<Vec<String>>().unwrap().push("tue".to_string());
        lifecycle.restore(key, value);

        lifecycle.exit(Scope::Function);
        assert_eq!(*seen.borrow(), vec!["mon", "tue"]);
    }

    #[test]
    fn test_module_instances_are_found_for_reuse() {
        let def = FixtureDef::new("db", |_| Ok(Setup::value(1))).scope(Scope::Module);
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.find(Scope::Module, def.id(), None).is_none());
        let key = lifecycle.enter(&def, None, &ctx).unwrap();
        assert_eq!(lifecycle.find(Scope::Module, def.id(), None), Some(key));
        assert!(lifecycle.find(Scope::Module, def.id(), Some(0)).is_none());

        lifecycle.exit(Scope::Module);
        assert!(lifecycle.find(Scope::Module, def.id(), None).is_none());
    }

    #[test]
    fn test_panicking_factory_becomes_failure() {
        let def = FixtureDef::new("boom", |_| panic!("factory exploded"));
        let ctx = Context::new("t");

        let mut lifecycle = Lifecycle::new();
        let failure = lifecycle.enter(&def, None, &ctx).unwrap_err();
        assert!(failure.message.contains("factory exploded"));
        assert_eq!(lifecycle.active(Scope::Function), 0);
    }
}
