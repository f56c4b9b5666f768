//! Attack task data model and running statistics.
//!
//! Tasks live in the executor's task map keyed by platform id, never in
//! the host engine.

use std::time::{Duration, Instant};

use serde::Serialize;

use wta_core::constants::*;
use wta_core::enums::TaskStage;
use wta_core::types::{PlatformId, Position, TargetId};

/// Why a task ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The unit is dead or no longer known to the host.
    UnitLost,
    /// The host rejected a navigate command.
    NavigateRejected,
    /// The host rejected the egress command.
    EgressRejected,
    /// No position to egress from and no fallback point.
    NoEgressPoint,
    /// Aim/fire/verify retries exceeded the budget.
    RetriesExhausted,
    /// Removed by `cancel_task` or superseded by a new plan.
    Cancelled,
}

/// One unit's engagement of one target.
#[derive(Debug, Clone)]
pub struct AttackTask {
    pub platform_id: PlatformId,
    pub target_id: TargetId,
    /// Last known target position, refreshed while closing in.
    pub target_pos: Position,
    /// Weapon picked at the first firing attempt.
    pub weapon: Option<String>,
    pub stage: TaskStage,

    // --- Parameters ---
    /// Navigate hands over to Approach inside this distance (meters).
    pub approach_distance: f64,
    /// Approach hands over to Aiming inside this distance (meters).
    pub engagement_distance: f64,
    pub max_retries: u32,
    pub retry_count: u32,

    /// Unit ammo count captured just before the fire command.
    pub ammo_before_fire: i32,

    // --- Timing ---
    pub created_at: Instant,
    pub started_at: Option<Instant>,
    pub fire_command_at: Option<Instant>,
    pub completed_at: Option<Instant>,

    // --- Result ---
    pub failure: Option<FailReason>,
    /// Every stage this task has been in, in order, starting with Pending.
    pub stage_history: Vec<TaskStage>,
}

impl AttackTask {
    pub fn new(platform_id: PlatformId, target_id: TargetId) -> Self {
        Self {
            platform_id,
            target_id,
            target_pos: Position::default(),
            weapon: None,
            stage: TaskStage::Pending,
            approach_distance: APPROACH_DISTANCE,
            engagement_distance: ENGAGEMENT_DISTANCE,
            max_retries: MAX_TASK_RETRIES,
            retry_count: 0,
            ammo_before_fire: 0,
            created_at: Instant::now(),
            started_at: None,
            fire_command_at: None,
            completed_at: None,
            failure: None,
            stage_history: vec![TaskStage::Pending],
        }
    }

    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Move to `next`, recording it in the history. Illegal edges are
    /// refused and leave the task untouched.
    pub fn enter(&mut self, next: TaskStage) -> bool {
        if next == self.stage {
            return true;
        }
        if !self.stage.can_transition_to(next) {
            tracing::error!(
                platform_id = self.platform_id,
                from = self.stage.label(),
                to = next.label(),
                "refusing illegal stage transition"
            );
            return false;
        }
        self.stage = next;
        self.stage_history.push(next);
        if next.is_terminal() {
            self.completed_at = Some(Instant::now());
        }
        true
    }

    /// Spend one retry and rewind to `restart`. Fails the task once the
    /// budget is spent. Returns whether the task is still alive.
    pub fn mark_retry(&mut self, restart: TaskStage) -> bool {
        if !self.can_retry() {
            self.mark_failed(FailReason::RetriesExhausted);
            return false;
        }
        self.retry_count += 1;
        self.enter(restart)
    }

    pub fn mark_completed(&mut self) {
        self.enter(TaskStage::Completed);
    }

    pub fn mark_failed(&mut self, reason: FailReason) {
        if self.enter(TaskStage::Failed) {
            self.failure = Some(reason);
        }
    }

    /// Time since the executor admitted the task.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Time since the last fire command, if one was issued.
    pub fn since_fire_command(&self) -> Option<Duration> {
        self.fire_command_at.map(|t| t.elapsed())
    }
}

/// Running task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatistics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub active_tasks: u64,
}

impl TaskStatistics {
    pub fn on_task_created(&mut self) {
        self.total_tasks += 1;
        self.active_tasks += 1;
    }

    pub fn on_task_completed(&mut self) {
        self.completed_tasks += 1;
        self.active_tasks = self.active_tasks.saturating_sub(1);
    }

    pub fn on_task_failed(&mut self) {
        self.failed_tasks += 1;
        self.active_tasks = self.active_tasks.saturating_sub(1);
    }

    /// Completed share of all tasks ever created.
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.completed_tasks as f64 / self.total_tasks as f64
    }
}
