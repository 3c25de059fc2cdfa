//! Demonstration suites shipped with the binary
//!
//! `steprun run` executes these modules plus the scenarios found in the
//! features directory.

pub mod assertions;
pub mod config;
pub mod fixtures;
pub mod markers;
pub mod steps;

use std::path::Path;

use crate::common::Result;
use crate::engine::Session;

/// Build the demo session: shared fixtures, code modules and step library
///
/// Feature files are added separately by the caller.
pub fn session(data_dir: &Path) -> Result<Session> {
    let mut session = Session::new();
    fixtures::register_shared(&mut session)?;
    steps::register(&mut session)?;

    session.add_module(fixtures::module()?);
    session.add_module(assertions::module());
    session.add_module(markers::module());
    session.add_module(config::module(data_dir)?);
    session.add_module(config::data_module(data_dir));

    Ok(session)
}
