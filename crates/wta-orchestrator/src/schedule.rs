//! When to ask the solver for a new plan.
//!
//! [`ReplanSchedule`] is pure bookkeeping over monotonic seconds: it
//! never reads a clock, so the scheduler loop owns the only instance and
//! tests can drive it with chosen timestamps.

use serde::{Deserialize, Serialize};

use wta_core::constants::SOLVE_COOLDOWN_SECS;
use wta_core::enums::PlanReason;
use wta_core::events::Event;
use wta_core::messages::Plan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minimum gap after an accepted plan (seconds).
    pub solve_cooldown_secs: f64,
    /// Minimum gap after a failed or rejected request (seconds).
    pub failure_cooldown_secs: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            solve_cooldown_secs: SOLVE_COOLDOWN_SECS,
            failure_cooldown_secs: SOLVE_COOLDOWN_SECS,
        }
    }
}

/// Copyable view of the schedule for observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub pending_replan: bool,
    pub has_plan: bool,
    pub last_solve_ts: f64,
    pub next_allowed_solve_ts: f64,
    pub plan_ttl_secs: f64,
    pub plan_tasks: usize,
}

#[derive(Debug, Clone)]
pub struct ReplanSchedule {
    config: ScheduleConfig,
    pending_replan: bool,
    plan: Option<Plan>,
    last_solve_ts: f64,
    next_allowed_solve_ts: f64,
}

impl ReplanSchedule {
    /// Starts with a replan pending, so the first pass always asks.
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            pending_replan: true,
            plan: None,
            last_solve_ts: 0.0,
            next_allowed_solve_ts: 0.0,
        }
    }

    /// Note an event. Returns whether it marked a replan.
    pub fn observe(&mut self, event: &Event) -> bool {
        if event.triggers_replan() {
            self.pending_replan = true;
            true
        } else {
            false
        }
    }

    /// Pending trigger, no plan yet, or the cached plan has gone stale.
    pub fn need_replan(&self, now: f64) -> bool {
        self.pending_replan || self.plan.as_ref().map_or(true, |p| !p.is_fresh(now))
    }

    /// The cool-down has run out.
    pub fn may_solve(&self, now: f64) -> bool {
        now >= self.next_allowed_solve_ts
    }

    pub fn reason(&self) -> PlanReason {
        if self.pending_replan {
            PlanReason::EventTriggered
        } else {
            PlanReason::TtlExpired
        }
    }

    /// Adopt an accepted plan solved at `plan.solved_at`.
    pub fn on_success(&mut self, plan: Plan, now: f64) {
        self.last_solve_ts = plan.solved_at;
        self.plan = Some(plan);
        self.pending_replan = false;
        self.next_allowed_solve_ts = now + self.config.solve_cooldown_secs;
    }

    /// Keep the old plan and any pending trigger; only push the next
    /// attempt back.
    pub fn on_failure(&mut self, now: f64) {
        self.next_allowed_solve_ts = now + self.config.failure_cooldown_secs;
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn pending_replan(&self) -> bool {
        self.pending_replan
    }

    pub fn last_solve_ts(&self) -> f64 {
        self.last_solve_ts
    }

    pub fn next_allowed_solve_ts(&self) -> f64 {
        self.next_allowed_solve_ts
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            pending_replan: self.pending_replan,
            has_plan: self.plan.is_some(),
            last_solve_ts: self.last_solve_ts,
            next_allowed_solve_ts: self.next_allowed_solve_ts,
            plan_ttl_secs: self.plan.as_ref().map_or(0.0, Plan::ttl_sec),
            plan_tasks: self
                .plan
                .as_ref()
                .map_or(0, |p| p.response.assignment.assigned().count()),
        }
    }
}

impl Default for ReplanSchedule {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}
