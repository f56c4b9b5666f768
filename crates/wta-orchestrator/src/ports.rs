//! World-side port of the orchestrator.

use wta_core::state::WorldSnapshot;

/// Source of world snapshots.
///
/// Called from the reporter and scheduler threads; implementations must
/// tolerate concurrent calls and should return promptly.
pub trait WorldSampler: Send + Sync {
    fn sample(&self) -> WorldSnapshot;
}
