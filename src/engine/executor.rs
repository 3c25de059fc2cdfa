//! Test executor
//!
//! Runs collected items one at a time. Each item gets a fresh [`Context`];
//! fixture values are lent into it, the body or steps run, and the values go
//! back to their instances before the function scope is torn down. Module
//! instances are torn down after the last item of a module, session
//! instances after the last module.

use std::time::Instant;

use super::collect::{Collection, Item, ItemKind, PlannedFixture};
use super::context::Context;
use super::marker::XFailSpec;
use super::report::{ItemReport, Outcome, Reporter, RunReport};
use crate::bdd::{run_steps, StepRegistry};
use crate::check::{guarded, CheckResult, FailureKind};
use crate::fixture::{InstanceKey, Lifecycle, Scope, TeardownError};

/// Executor settings
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after the first item that fails the run
    pub exit_first: bool,
}

/// Run every collected item and report as results arrive
pub fn run(
    steps: &StepRegistry,
    collection: &Collection<'_>,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
) -> RunReport {
    let mut report = RunReport::default();
    report.summary.deselected = collection.deselected;
    let mut lifecycle = Lifecycle::new();
    let mut stop = false;

    for module in &collection.modules {
        if stop {
            break;
        }
        if module.items.is_empty() {
            continue;
        }
        tracing::info!(module = %module.name, items = module.items.len(), "module started");
        reporter.module_started(&module.name, module.items.len());

        for item in &module.items {
            let item_report = run_item(steps, item, &module.name, &mut lifecycle);
            report.summary.record(&item_report.outcome);
            report.summary.teardown_errors += item_report.teardown_errors.len();
            reporter.item_finished(&item_report);

            let failed = item_report.outcome.is_failure();
            report.items.push(item_report);
            if failed && options.exit_first {
                tracing::info!(node = %item.nodeid, "stopping after first failure");
                stop = true;
                break;
            }
        }

        finish_scope(&mut lifecycle, Scope::Module, &mut report, reporter);
    }
    finish_scope(&mut lifecycle, Scope::Session, &mut report, reporter);

    tracing::info!(summary = %report.summary.line(), "run finished");
    reporter.run_finished(&report);
    report
}

fn finish_scope(
    lifecycle: &mut Lifecycle,
    scope: Scope,
    report: &mut RunReport,
    reporter: &mut dyn Reporter,
) {
    let errors = lifecycle.exit(scope);
    if errors.is_empty() {
        return;
    }
    reporter.scope_errors(&errors);
    report.summary.teardown_errors += errors.len();
    report.scope_errors.extend(errors);
}

fn run_item(
    steps: &StepRegistry,
    item: &Item<'_>,
    module: &str,
    lifecycle: &mut Lifecycle,
) -> ItemReport {
    let started = Instant::now();
    let (outcome, teardown_errors) = execute(steps, item, lifecycle);
    tracing::debug!(node = %item.nodeid, outcome = outcome.label(), "item finished");

    ItemReport {
        nodeid: item.nodeid.clone(),
        module: module.to_string(),
        outcome,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        teardown_errors,
    }
}

fn execute(
    steps: &StepRegistry,
    item: &Item<'_>,
    lifecycle: &mut Lifecycle,
) -> (Outcome, Vec<TeardownError>) {
    if let Some(reason) = &item.marks.skip {
        return (
            Outcome::Skipped {
                reason: reason.clone(),
            },
            Vec::new(),
        );
    }
    if let ItemKind::Scenario(Err(e)) = &item.kind {
        return (
            Outcome::Errored {
                message: e.to_string(),
            },
            Vec::new(),
        );
    }

    let mut ctx = Context::new(item.nodeid.clone());
    for (name, value) in &item.params {
        ctx.set_param(name, value.clone());
    }

    let mut lent: Vec<(&str, InstanceKey)> = Vec::new();
    let setup = set_up(&item.plan, lifecycle, &mut ctx, &mut lent);

    let outcome = match setup {
        Err(failure) => match failure.kind {
            FailureKind::Skip => Outcome::Skipped {
                reason: failure.message,
            },
            FailureKind::XFail => Outcome::XFailed {
                reason: failure.message,
            },
            _ => Outcome::Errored {
                message: failure.message,
            },
        },
        Ok(()) => {
            let result = match &item.kind {
                ItemKind::Test(case) => guarded(|| (case.body)(&mut ctx)),
                ItemKind::Scenario(Ok(bound)) => run_steps(steps, bound, &mut ctx),
                ItemKind::Scenario(Err(_)) => Ok(()),
            };
            judge(result, item.marks.xfail.as_ref())
        }
    };

    for (name, key) in lent.into_iter().rev() {
        if let Some(value) = ctx.reclaim(name) {
            lifecycle.restore(key, value);
        }
    }
    let teardown_errors = lifecycle.exit(Scope::Function);

    (outcome, teardown_errors)
}

/// Acquire every planned fixture and lend its value into the context
///
/// Module and session instances are reused when one with the same parameter
/// is already active.
fn set_up<'p>(
    plan: &'p [PlannedFixture<'_>],
    lifecycle: &mut Lifecycle,
    ctx: &mut Context,
    lent: &mut Vec<(&'p str, InstanceKey)>,
) -> CheckResult {
    for planned in plan {
        let def = planned.def;
        let cached = match def.get_scope() {
            Scope::Function => None,
            scope => lifecycle.find(scope, def.id(), planned.param),
        };
        let key = match cached {
            Some(key) => key,
            None => lifecycle.enter(def, planned.param, ctx)?,
        };
        let value = lifecycle.lend(key)?;
        ctx.lend(def.name(), value, planned.visible);
        lent.push((def.name(), key));
    }
    Ok(())
}

/// Turn the body's result into an outcome, applying any xfail mark
fn judge(result: CheckResult, xfail: Option<&XFailSpec>) -> Outcome {
    match (result, xfail) {
        (Ok(()), None) => Outcome::Passed,
        (Ok(()), Some(spec)) => Outcome::XPassed {
            reason: spec.reason.clone(),
            strict: spec.strict,
        },
        (Err(failure), _) if failure.kind == FailureKind::Skip => Outcome::Skipped {
            reason: failure.message,
        },
        (Err(failure), _) if failure.kind == FailureKind::XFail => Outcome::XFailed {
            reason: failure.message,
        },
        (Err(failure), Some(spec)) if spec.absorbs(failure.kind) => Outcome::XFailed {
            reason: format!("{} ({})", spec.reason, failure.message),
        },
        (Err(failure), _) => Outcome::Failed {
            kind: failure.kind,
            message: failure.message,
        },
    }
}
