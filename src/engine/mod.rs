//! Test engine: test model, collection, execution and reporting

pub mod case;
pub mod collect;
pub mod context;
pub mod executor;
pub mod marker;
pub mod report;

pub use case::{ParamRow, Parametrize, Session, TestCase, TestModule};
pub use collect::{collect, CollectOptions, Collection, Item, ItemKind, Selection};
pub use context::Context;
pub use executor::{run, RunOptions};
pub use marker::{Environment, ItemMarks, Mark, XFailSpec};
pub use report::{ExitStatus, ItemReport, Outcome, Reporter, RunReport, Silent, Summary, TerminalReporter};
