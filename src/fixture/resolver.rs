//! Fixture resolution
//!
//! Computes the ordered list of fixtures an item needs: every requested name
//! plus its transitive dependencies, dependencies before dependents, each
//! fixture once.

use std::collections::HashMap;

use super::registry::{FixtureDef, FixtureRegistry};
use crate::common::{Error, Result};

/// Name lookup over a module registry layered on the session registry
#[derive(Clone, Copy)]
pub struct FixtureLookup<'a> {
    local: Option<&'a FixtureRegistry>,
    global: &'a FixtureRegistry,
}

impl<'a> FixtureLookup<'a> {
    pub fn new(global: &'a FixtureRegistry) -> Self {
        Self {
            local: None,
            global,
        }
    }

    /// Module fixtures shadow session fixtures of the same name
    pub fn with_local(global: &'a FixtureRegistry, local: &'a FixtureRegistry) -> Self {
        Self {
            local: Some(local),
            global,
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a FixtureDef> {
        self.local
            .and_then(|local| local.get(name))
            .or_else(|| self.global.get(name))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Resolve `requested` into a setup order
///
/// Fails on unknown names, dependency cycles, and fixtures that depend on a
/// fixture with a narrower scope.
pub fn resolve<'a>(
    lookup: &FixtureLookup<'a>,
    requested: &[String],
    requester: &str,
) -> Result<Vec<&'a FixtureDef>> {
    let mut order = Vec::new();
    let mut visits: HashMap<&'a str, Visit> = HashMap::new();
    let mut path: Vec<&'a str> = Vec::new();

    for name in requested {
        let def = lookup
            .get(name)
            .ok_or_else(|| Error::unknown_fixture(name, requester))?;
        visit(lookup, def, &mut visits, &mut path, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    lookup: &FixtureLookup<'a>,
    def: &'a FixtureDef,
    visits: &mut HashMap<&'a str, Visit>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<&'a FixtureDef>,
) -> Result<()> {
    match visits.get(def.name()) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = path.iter().position(|n| *n == def.name()).unwrap_or(0);
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(def.name());
            return Err(Error::CyclicDependency {
                cycle: cycle.join(" -> "),
            });
        }
        None => {}
    }

    visits.insert(def.name(), Visit::InProgress);
    path.push(def.name());

    for dep_name in def.deps() {
        let dep = lookup
            .get(dep_name)
            .ok_or_else(|| Error::unknown_fixture(dep_name, def.name()))?;
        if dep.get_scope() < def.get_scope() {
            return Err(Error::ScopeMismatch {
                fixture: def.name().to_string(),
                scope: def.get_scope().to_string(),
                dependency: dep.name().to_string(),
                dependency_scope: dep.get_scope().to_string(),
            });
        }
        visit(lookup, dep, visits, path, order)?;
    }

    path.pop();
    visits.insert(def.name(), Visit::Done);
    order.push(def);
    Ok(())
}
