//! Self-contained host world for running the orchestrator without an
//! external simulation.
//!
//! [`SandboxWorld`] implements every port the orchestrator and executor
//! need, on top of a `hecs` world with seeded randomness.

pub mod components;
pub mod scenario;
pub mod world;

pub use scenario::Scenario;
pub use world::{Command, EventSink, SandboxConfig, SandboxWorld};
