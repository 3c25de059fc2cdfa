//! Fixtures: named setup/teardown units that produce values for tests
//!
//! Definitions live in a [`FixtureRegistry`], the [`resolver`] orders them by
//! their declared dependencies, and the [`Lifecycle`] drives the two phases
//! of each instance.

pub mod lifecycle;
pub mod registry;
pub mod resolver;

pub use lifecycle::{InstanceKey, InstanceState, Lifecycle, TeardownError};
pub use registry::{FixtureDef, FixtureId, FixtureRegistry, FixtureRequest, ParamValue, Scope, Setup};
pub use resolver::{resolve, FixtureLookup};
