//! Older solve request/response shapes, still spoken by some solver
//! deployments. Converted to and from the current messages at the wire
//! boundary and never seen past the client.

use serde::{Deserialize, Serialize};

use wta_core::constants::DEFAULT_PLAN_TTL_SECS;
use wta_core::messages::{PlanRequest, PlanResponse, PlanStats, SolveConfig};
use wta_core::state::{AssignmentMatrix, PlatformState, TargetState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySolveRequest {
    pub mission_id: String,
    pub timestamp: f64,
    pub config: SolveConfig,
    pub platforms: Vec<PlatformState>,
    pub targets: Vec<TargetState>,
}

impl LegacySolveRequest {
    pub fn from_plan_request(mission_id: impl Into<String>, request: &PlanRequest) -> Self {
        Self {
            mission_id: mission_id.into(),
            timestamp: request.timestamp,
            config: request.config.clone(),
            platforms: request.platforms.clone(),
            targets: request.targets.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyAssignmentDetails {
    pub is_valid: bool,
    pub coverage_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySolveStats {
    pub computation_time: f64,
    pub iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySolveResponse {
    pub status: String,
    pub best_fitness: f64,
    pub assignment: AssignmentMatrix,
    pub n_platforms: usize,
    pub n_targets: usize,
    pub details: LegacyAssignmentDetails,
    pub stats: LegacySolveStats,
    pub ttl_sec: f64,
}

impl Default for LegacySolveResponse {
    fn default() -> Self {
        Self {
            status: String::new(),
            best_fitness: 0.0,
            assignment: AssignmentMatrix::default(),
            n_platforms: 0,
            n_targets: 0,
            details: LegacyAssignmentDetails::default(),
            stats: LegacySolveStats::default(),
            ttl_sec: DEFAULT_PLAN_TTL_SECS,
        }
    }
}

impl From<LegacySolveResponse> for PlanResponse {
    fn from(legacy: LegacySolveResponse) -> Self {
        // The old format repeated the shape outside the matrix; trust the
        // outer counts when the matrix came without one.
        let mut assignment = legacy.assignment;
        if assignment.n_platforms == 0 && assignment.n_targets == 0 {
            assignment.n_platforms = legacy.n_platforms;
            assignment.n_targets = legacy.n_targets;
        }

        PlanResponse {
            status: legacy.status,
            timestamp: 0.0,
            best_fitness: legacy.best_fitness,
            assignment,
            stats: PlanStats {
                computation_time: legacy.stats.computation_time,
                iterations: legacy.stats.iterations,
                is_valid: legacy.details.is_valid,
                coverage_rate: legacy.details.coverage_rate,
            },
            ttl_sec: legacy.ttl_sec,
            error_msg: None,
        }
    }
}
