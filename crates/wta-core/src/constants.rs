//! Orchestration constants and tuning parameters.
//!
//! These are the defaults behind every config struct; a deployment overrides
//! them through the JSON config rather than editing this file.

// --- Loop cadence ---

/// Status reporter period (seconds). ~1 Hz.
pub const REPORTER_PERIOD_SECS: f64 = 1.0;

/// Plan scheduler poll period (seconds). ~20 Hz.
pub const SCHEDULER_PERIOD_SECS: f64 = 0.05;

/// Executor driver period (seconds). ~20 Hz.
pub const EXECUTOR_PERIOD_SECS: f64 = 0.05;

/// Maximum events drained from the bus per scheduler iteration.
pub const MAX_EVENTS_PER_DRAIN: usize = 128;

/// Event reports waiting for the forwarder before new ones are dropped.
pub const MAX_PENDING_REPORTS: usize = 1024;

// --- Plan lifetime ---

/// TTL assumed for a plan whose response does not carry one (seconds).
pub const DEFAULT_PLAN_TTL_SECS: f64 = 2.0;

/// Minimum gap between two solve attempts (seconds).
pub const SOLVE_COOLDOWN_SECS: f64 = 0.5;

/// Status string of an accepted plan.
pub const PLAN_STATUS_OK: &str = "ok";

// --- Solver transport ---

/// Default solver endpoint.
pub const DEFAULT_SOLVER_ENDPOINT: &str = "127.0.0.1:5555";

/// Round-trip bound for a plan request (milliseconds).
pub const PLAN_REQUEST_TIMEOUT_MS: u64 = 1000;

/// Bound for the fire-and-forget status report (milliseconds).
pub const STATUS_REPORT_TIMEOUT_MS: u64 = 500;

/// Bound for kill/damage/fired reports (milliseconds).
pub const EVENT_REPORT_TIMEOUT_MS: u64 = 200;

/// Bound for forwarded log lines (milliseconds).
pub const LOG_REPORT_TIMEOUT_MS: u64 = 100;

/// Largest frame payload accepted on the wire (bytes).
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

// --- Task execution ---

/// Tasks advanced per executor tick. 0 disables the limit.
pub const MAX_TASKS_PER_TICK: usize = 2;

/// Distance at which Navigate hands over to Approach (meters).
pub const APPROACH_DISTANCE: f64 = 600.0;

/// Distance at which Approach hands over to Aiming (meters).
pub const ENGAGEMENT_DISTANCE: f64 = 400.0;

/// Retry budget per task.
pub const MAX_TASK_RETRIES: u32 = 10;

/// Wait between the fire command and damage assessment (seconds).
pub const VERIFY_SETTLE_SECS: f64 = 2.0;

/// Cruise altitude for navigate commands (meters).
pub const NAVIGATE_ALTITUDE: f64 = 300.0;

/// Altitude for egress commands (meters).
pub const EGRESS_ALTITUDE: f64 = 500.0;

/// How far an egress moves away from the last known threat (meters).
pub const EGRESS_DISTANCE: f64 = 3000.0;

// --- Solve config defaults (forwarded to the solver) ---

pub const BPSO_PARTICLES: u32 = 500;
pub const BPSO_ITERATIONS: u32 = 50;
pub const BPSO_W_MAX: f64 = 0.8;
pub const BPSO_W_MIN: f64 = 0.5;
pub const BPSO_C1: f64 = 2.2;
pub const BPSO_C2: f64 = 2.2;
pub const BPSO_V_MAX: f64 = 1.8;

/// Objective weight of destroyed target value.
pub const MODEL_VALUE_WEIGHT: f64 = 0.7;

/// Objective weight of expended platform cost.
pub const MODEL_COST_WEIGHT: f64 = 0.3;
