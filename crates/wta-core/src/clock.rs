//! Monotonic seconds shared by the loops and the task timestamps.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Seconds elapsed since the first call in this process.
///
/// Monotonic, so TTL and cool-down comparisons never go backwards when the
/// wall clock is adjusted.
pub fn monotonic_secs() -> f64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64()
}
