//! steprun - test fixtures and given/when/then scenarios
//!
//! Fixtures are named factories with a scope and an optional teardown.
//! Tests and scenarios ask for fixtures by name; the collector resolves
//! every request into a setup plan and the executor runs items one by one,
//! lending fixture values into a per-item [`engine::Context`].
//!
//! Scenarios come from `.feature` files and are bound to step definitions
//! registered on the [`engine::Session`].

#[macro_use]
pub mod check;

pub mod bdd;
pub mod cli;
pub mod collab;
pub mod commands;
pub mod common;
pub mod demo;
pub mod engine;
pub mod fixture;
pub mod value;

// Re-export commonly used types
pub use check::{CheckResult, Failure, FailureKind};
pub use common::{Error, Result};
pub use engine::{Context, Session, TestCase, TestModule};
pub use fixture::{FixtureDef, Scope, Setup};
