//! Outcomes, summaries and reporters

use colored::Colorize;
use serde::Serialize;

use crate::check::FailureKind;
use crate::fixture::TeardownError;

/// Final result of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { kind: FailureKind, message: String },
    Skipped { reason: String },
    XFailed { reason: String },
    XPassed { reason: String, strict: bool },
    /// The item could not run: fixture setup or step binding failed
    Errored { message: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed { .. } => "FAILED",
            Outcome::Skipped { .. } => "SKIPPED",
            Outcome::XFailed { .. } => "XFAIL",
            Outcome::XPassed { .. } => "XPASS",
            Outcome::Errored { .. } => "ERROR",
        }
    }

    /// Whether this outcome fails the run
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Failed { .. } | Outcome::Errored { .. } | Outcome::XPassed { strict: true, .. }
        )
    }

    /// Detail line shown under the node id, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed { message, .. } | Outcome::Errored { message } => Some(message.as_str()),
            Outcome::Skipped { reason }
            | Outcome::XFailed { reason }
            | Outcome::XPassed { reason, .. } => Some(reason.as_str()),
        }
    }
}

/// Report for one executed item
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub nodeid: String,
    pub module: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teardown_errors: Vec<TeardownError>,
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub errors: usize,
    pub deselected: usize,
    pub teardown_errors: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::XFailed { .. } => self.xfailed += 1,
            Outcome::XPassed { .. } => self.xpassed += 1,
            Outcome::Errored { .. } => self.errors += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.xfailed + self.xpassed + self.errors
    }

    /// `3 passed, 1 failed, 2 skipped` style line
    pub fn line(&self) -> String {
        let parts = [
            (self.failed, "failed"),
            (self.passed, "passed"),
            (self.skipped, "skipped"),
            (self.deselected, "deselected"),
            (self.xfailed, "xfailed"),
            (self.xpassed, "xpassed"),
            (self.errors, "errors"),
            (self.teardown_errors, "teardown errors"),
        ];
        let line = parts
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, name)| format!("{count} {name}"))
            .collect::<Vec<_>>()
            .join(", ");
        if line.is_empty() {
            "no tests ran".to_string()
        } else {
            line
        }
    }
}

/// Process exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    TestsFailed,
    CollectionFailed,
    UsageError,
    NoTestsCollected,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::TestsFailed => 1,
            ExitStatus::CollectionFailed => 2,
            ExitStatus::UsageError => 4,
            ExitStatus::NoTestsCollected => 5,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub items: Vec<ItemReport>,
    /// Teardown failures of module and session fixtures
    pub scope_errors: Vec<TeardownError>,
    pub summary: Summary,
}

impl RunReport {
    pub fn outcome(&self, nodeid: &str) -> Option<&Outcome> {
        self.items
            .iter()
            .find(|item| item.nodeid == nodeid)
            .map(|item| &item.outcome)
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.items.is_empty() {
            return ExitStatus::NoTestsCollected;
        }
        let failed = self.items.iter().any(|item| item.outcome.is_failure())
            || self.summary.teardown_errors > 0;
        if failed {
            ExitStatus::TestsFailed
        } else {
            ExitStatus::Ok
        }
    }
}

/// Receives events while the executor runs
pub trait Reporter {
    fn module_started(&mut self, _name: &str, _items: usize) {}

    fn item_finished(&mut self, _report: &ItemReport) {}

    fn scope_errors(&mut self, _errors: &[TeardownError]) {}

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Reporter that prints nothing
#[derive(Debug, Default)]
pub struct Silent;

impl Reporter for Silent {}

/// Colored terminal output
#[derive(Debug, Default)]
pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for TerminalReporter {
    fn module_started(&mut self, name: &str, items: usize) {
        println!("\n{} {} ({} items)", "Module:".blue().bold(), name.white().bold(), items);
    }

    fn item_finished(&mut self, report: &ItemReport) {
        let outcome = &report.outcome;
        let mark = match outcome {
            Outcome::Passed => "✓".green(),
            Outcome::Failed { .. } | Outcome::Errored { .. } => "✗".red(),
            Outcome::Skipped { .. } => "-".yellow(),
            Outcome::XFailed { .. } => "x".yellow(),
            Outcome::XPassed { strict, .. } => {
                if *strict {
                    "!".red()
                } else {
                    "!".yellow()
                }
            }
        };
        let label = match outcome {
            Outcome::Passed => outcome.label().green(),
            Outcome::Failed { .. } | Outcome::Errored { .. } => outcome.label().red().bold(),
            _ => outcome.label().yellow(),
        };

        if self.verbose {
            println!(
                "  {} {} {} {}",
                mark,
                report.nodeid,
                label,
                format!("({} ms)", report.duration_ms).dimmed()
            );
        } else {
            println!("  {} {} {}", mark, report.nodeid, label);
        }

        if let Some(detail) = outcome.detail() {
            if outcome.is_failure() || self.verbose {
                for line in detail.lines() {
                    println!("      {}", line.dimmed());
                }
            }
        }
        for error in &report.teardown_errors {
            println!(
                "      {} teardown of '{}': {}",
                "✗".red(),
                error.fixture,
                error.message
            );
        }
    }

    fn scope_errors(&mut self, errors: &[TeardownError]) {
        for error in errors {
            println!(
                "  {} {} teardown of '{}': {}",
                "✗".red(),
                error.scope,
                error.fixture,
                error.message
            );
        }
    }

    fn run_finished(&mut self, report: &RunReport) {
        let line = report.summary.line();
        let line = match report.exit_status() {
            ExitStatus::Ok => line.green().bold(),
            ExitStatus::NoTestsCollected => line.yellow().bold(),
            _ => line.red().bold(),
        };
        println!("\n{}", line);
    }
}
