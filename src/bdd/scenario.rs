//! Scenario binding and execution
//!
//! Binding turns the step lines of one scenario execution into references to
//! step definitions plus captured arguments. Running walks the bound steps in
//! order against a single [`Context`].

use super::feature::{Keyword, StepLine};
use super::pattern::StepArgs;
use super::steps::StepRegistry;
use crate::check::{guarded, CheckResult, Failure};
use crate::common::Result;
use crate::engine::context::Context;

/// A step line matched to its definition
#[derive(Debug, Clone)]
pub struct BoundStep {
    pub keyword: Keyword,
    pub text: String,
    pub line: usize,
    pub def: usize,
    pub args: StepArgs,
}

impl BoundStep {
    fn label(&self) -> String {
        format!("{} {} (line {})", self.keyword, self.text, self.line)
    }
}

/// Bind every step line to exactly one definition
pub fn bind(registry: &StepRegistry, steps: &[StepLine]) -> Result<Vec<BoundStep>> {
    steps
        .iter()
        .map(|step| {
            let (def, args) = registry.find(step.keyword, &step.text)?;
            Ok(BoundStep {
                keyword: step.keyword,
                text: step.text.clone(),
                line: step.line,
                def,
                args,
            })
        })
        .collect()
}

/// Fixture names a bound scenario needs, in first-use order
///
/// A name produced by an earlier step's target is satisfied by that step and
/// is not a fixture requirement from then on.
pub fn requirements(registry: &StepRegistry, bound: &[BoundStep]) -> Vec<String> {
    let mut needed: Vec<String> = Vec::new();
    let mut produced: Vec<&str> = Vec::new();

    for step in bound {
        let Some(def) = registry.get(step.def) else {
            continue;
        };
        for name in def.used() {
            if !produced.contains(&name.as_str()) && !needed.contains(name) {
                needed.push(name.clone());
            }
        }
        if let Some(target) = def.target() {
            produced.push(target);
        }
    }

    needed
}

/// Run bound steps in order; the first failure stops the scenario
pub fn run_steps(registry: &StepRegistry, bound: &[BoundStep], ctx: &mut Context) -> CheckResult {
    for step in bound {
        let def = registry
            .get(step.def)
            .ok_or_else(|| Failure::error(format!("no definition for step '{}'", step.text)))?;
        tracing::debug!(node = %ctx.node_id(), step = %step.label(), "step");

        guarded(|| def.call(ctx, &step.args)).map_err(|failure| {
            if failure.is_fault() {
                failure.context(step.label())
            } else {
                failure
            }
        })?;
    }
    Ok(())
}
