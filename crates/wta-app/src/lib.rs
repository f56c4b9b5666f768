//! Headless orchestrator application.
//!
//! Loads an [`AppConfig`], builds a sandbox world and drives it through
//! the orchestrator against an external solver.

pub mod config;
pub mod host_loop;
pub mod runtime;

pub use config::{AppConfig, ConfigError};
pub use host_loop::{HostCommand, HostLoop};
pub use runtime::{RunSummary, Runtime};
