//! Enumeration types used throughout the orchestrator.

use serde::{Deserialize, Serialize};

/// Capability role of a platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformRole {
    AntiPersonnel,
    AntiArmor,
    MultiRole,
    #[default]
    Unknown,
}

/// Target classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Infantry,
    Armor,
    Sam,
    #[default]
    Other,
}

/// Which side of the assignment an entity id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntitySide {
    Platform,
    Target,
}

/// Domain event category. Every kind except `PeriodicTick` is a replan
/// trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    EntityKilled,
    Damage,
    Fired,
    ReplanRequest,
    PeriodicTick,
}

impl EventKind {
    /// Whether an event of this kind marks the cached plan for
    /// reconsideration.
    pub fn triggers_replan(self) -> bool {
        !matches!(self, EventKind::PeriodicTick)
    }
}

/// Engagement task stage.
///
/// Forward order is `Pending → Navigate → Approach → Aiming → Firing →
/// Verify → Egress`, ending in `Completed` or `Failed`. The only backward
/// edges are the range-loss fallback `Aiming → Approach`, the retry
/// rewinds from `Aiming`/`Firing` to `Navigate`, and the failed-shot
/// rewinds from `Verify` to `Navigate`, `Approach` or `Aiming`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStage {
    #[default]
    Pending,
    Navigate,
    Approach,
    Aiming,
    Firing,
    Verify,
    Egress,
    Completed,
    Failed,
}

impl TaskStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStage::Completed | TaskStage::Failed)
    }

    /// Whether `self → next` is an edge of the stage graph.
    ///
    /// Every non-terminal stage may end in `Completed` (target already
    /// down) or `Failed` (unit lost, command failed, retries spent).
    pub fn can_transition_to(self, next: TaskStage) -> bool {
        use TaskStage::*;

        if self.is_terminal() {
            return false;
        }
        if next.is_terminal() {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Navigate)
                | (Navigate, Approach)
                | (Approach, Aiming)
                | (Aiming, Firing)
                | (Aiming, Approach)
                | (Aiming, Navigate)
                | (Firing, Verify)
                | (Firing, Navigate)
                | (Verify, Egress)
                | (Verify, Navigate)
                | (Verify, Approach)
                | (Verify, Aiming)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStage::Pending => "pending",
            TaskStage::Navigate => "navigate",
            TaskStage::Approach => "approach",
            TaskStage::Aiming => "aiming",
            TaskStage::Firing => "firing",
            TaskStage::Verify => "verify",
            TaskStage::Egress => "egress",
            TaskStage::Completed => "completed",
            TaskStage::Failed => "failed",
        }
    }
}

/// Reason attached to a plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanReason {
    /// A replan trigger arrived since the last accepted plan.
    EventTriggered,
    /// The cached plan aged past its TTL (or none exists yet).
    TtlExpired,
    /// Requested by an operator outside the scheduler.
    Manual,
}

impl PlanReason {
    pub fn label(self) -> &'static str {
        match self {
            PlanReason::EventTriggered => "event_triggered",
            PlanReason::TtlExpired => "ttl_expired",
            PlanReason::Manual => "manual",
        }
    }
}

/// Severity of a forwarded log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}
