//! Engagement orchestrator.
//!
//! Couples a world sampler, a solver client and an assignment executor
//! through an [`EventBus`], replanning on a TTL-plus-event cadence.

pub mod event_bus;
pub mod orchestrator;
pub mod ports;
pub mod schedule;

pub use event_bus::EventBus;
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorStatistics};
pub use ports::WorldSampler;
pub use schedule::{ReplanSchedule, ScheduleConfig, ScheduleSummary};
