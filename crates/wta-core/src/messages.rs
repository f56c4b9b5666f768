//! Messages exchanged with the solving service.
//!
//! Reports are fire-and-forget; a plan request is answered by exactly one
//! plan response. The wire envelope around them lives in `wta-net`.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{EntitySide, LogLevel, PlanReason};
use crate::state::{AssignmentMatrix, PlatformState, Roster, TargetState, WorldSnapshot};
use crate::types::{EntityId, PlatformId, TargetId};

/// Binary particle-swarm parameters forwarded to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpsoConfig {
    pub n_particles: u32,
    pub n_iterations: u32,
    pub w_max: f64,
    pub w_min: f64,
    pub c1: f64,
    pub c2: f64,
    pub v_max: f64,
    pub use_gpu: bool,
    pub seed: Option<u64>,
}

impl Default for BpsoConfig {
    fn default() -> Self {
        Self {
            n_particles: BPSO_PARTICLES,
            n_iterations: BPSO_ITERATIONS,
            w_max: BPSO_W_MAX,
            w_min: BPSO_W_MIN,
            c1: BPSO_C1,
            c2: BPSO_C2,
            v_max: BPSO_V_MAX,
            use_gpu: false,
            seed: None,
        }
    }
}

/// Objective weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelWeights {
    pub value: f64,
    pub cost: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            value: MODEL_VALUE_WEIGHT,
            cost: MODEL_COST_WEIGHT,
        }
    }
}

/// Constraint toggles and weights of the assignment model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub enable_tier_constraint: bool,
    pub enable_coverage_constraint: bool,
    pub enable_distance_constraint: bool,
    pub weights: ModelWeights,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enable_tier_constraint: true,
            enable_coverage_constraint: true,
            enable_distance_constraint: true,
            weights: ModelWeights::default(),
        }
    }
}

/// Everything the solver needs to know about how to solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    pub bpso: BpsoConfig,
    pub model: ModelConfig,
}

/// Periodic world status, purely observational.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub timestamp: f64,
    pub platforms: Vec<PlatformState>,
    pub targets: Vec<TargetState>,
}

impl StatusReport {
    pub fn from_snapshot(timestamp: f64, snapshot: WorldSnapshot) -> Self {
        Self {
            timestamp,
            platforms: snapshot.platforms,
            targets: snapshot.targets,
        }
    }
}

/// An entity was destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillReport {
    pub timestamp: f64,
    pub entity_id: EntityId,
    pub side: EntitySide,
    /// Free-form description of the killer, if known.
    pub killed_by: String,
}

/// An entity took damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub timestamp: f64,
    pub entity_id: EntityId,
    pub side: EntitySide,
    pub amount: f64,
    pub source: String,
}

/// A platform fired at a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredReport {
    pub timestamp: f64,
    pub platform_id: PlatformId,
    pub target_id: TargetId,
    pub weapon: String,
    pub ammo_left: i32,
}

/// A log line forwarded to the solver's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: f64,
    pub level: LogLevel,
    /// Emitting component, e.g. `"orchestrator"`.
    pub component: String,
    pub message: String,
}

/// Ask the solver for a fresh assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub timestamp: f64,
    pub reason: PlanReason,
    pub config: SolveConfig,
    pub platforms: Vec<PlatformState>,
    pub targets: Vec<TargetState>,
}

impl PlanRequest {
    pub fn new(timestamp: f64, reason: PlanReason, config: SolveConfig, snapshot: WorldSnapshot) -> Self {
        Self {
            timestamp,
            reason,
            config,
            platforms: snapshot.platforms,
            targets: snapshot.targets,
        }
    }

    /// Matrix row/column order the solver will answer in.
    pub fn roster(&self) -> Roster {
        Roster {
            platforms: self.platforms.iter().map(|p| p.id).collect(),
            targets: self.targets.iter().map(|t| t.id).collect(),
        }
    }
}

/// Solver-side statistics of one solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    /// Solve wall time (seconds).
    pub computation_time: f64,
    pub iterations: u32,
    pub is_valid: bool,
    /// Share of targets covered by at least one platform.
    pub coverage_rate: f64,
}

/// The solver's answer to a [`PlanRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    /// `"ok"`, `"error"` or `"no_solution"`.
    pub status: String,
    pub timestamp: f64,
    pub best_fitness: f64,
    pub assignment: AssignmentMatrix,
    pub stats: PlanStats,
    /// Seconds this plan stays fresh.
    pub ttl_sec: f64,
    pub error_msg: Option<String>,
}

impl Default for PlanResponse {
    fn default() -> Self {
        Self {
            status: String::new(),
            timestamp: 0.0,
            best_fitness: 0.0,
            assignment: AssignmentMatrix::default(),
            stats: PlanStats::default(),
            ttl_sec: DEFAULT_PLAN_TTL_SECS,
            error_msg: None,
        }
    }
}

impl PlanResponse {
    pub fn ok(assignment: AssignmentMatrix, ttl_sec: f64) -> Self {
        Self {
            status: PLAN_STATUS_OK.to_string(),
            assignment,
            ttl_sec,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error_msg: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PLAN_STATUS_OK
    }

    pub fn n_platforms(&self) -> usize {
        self.assignment.n_platforms
    }

    pub fn n_targets(&self) -> usize {
        self.assignment.n_targets
    }
}

/// An accepted plan together with the roster it was solved against.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub response: PlanResponse,
    pub roster: Roster,
    /// Monotonic seconds at which the request was issued.
    pub solved_at: f64,
}

impl Plan {
    pub fn ttl_sec(&self) -> f64 {
        self.response.ttl_sec
    }

    /// Fresh while `now - solved_at < ttl_sec`.
    pub fn is_fresh(&self, now: f64) -> bool {
        now - self.solved_at < self.response.ttl_sec
    }
}
