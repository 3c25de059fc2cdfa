//! Given/When/Then scenarios
//!
//! Feature files are parsed by [`feature`], their steps are bound against a
//! [`StepRegistry`] of compiled [`pattern`]s, and [`scenario`] runs the bound
//! steps over a per-item context.

pub mod feature;
pub mod pattern;
pub mod scenario;
pub mod steps;

pub use feature::{Feature, Keyword, ScenarioDef, ScenarioRun, StepLine};
pub use pattern::{StepArgs, StepPattern};
pub use scenario::{bind, requirements, run_steps, BoundStep};
pub use steps::{StepAction, StepDef, StepRegistry};
