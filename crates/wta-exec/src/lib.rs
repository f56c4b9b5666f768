//! Engagement task execution for the WTA orchestrator.
//!
//! Turns solver assignments into per-unit attack tasks and advances each
//! through the navigate/approach/aim/fire/verify/egress stage machine,
//! a few tasks per tick, against injected lookup and actuation ports.

pub mod executor;
pub mod fsm;
pub mod ports;
pub mod registry;
pub mod task;

pub use executor::{ExecutorConfig, TaskExecutor, TickReport};
pub use ports::{AssignmentExecutor, EntityLookup, UnitController};
pub use task::{AttackTask, TaskStatistics};
pub use wta_core as core;

#[cfg(test)]
mod tests;
