//! Seams between the executor and the host engine.
//!
//! The executor only ever holds entity ids. Anything about a live entity
//! (is it alive, where is it, how much ammo) is asked of an
//! [`EntityLookup`], and every command goes through a [`UnitController`].
//! Both are best-effort: a `false` or `None` is an ordinary answer, never
//! a panic.

use wta_core::messages::Plan;
use wta_core::types::{PlatformId, Position, TargetId};

/// Read access to the host's view of units and targets.
pub trait EntityLookup: Send + Sync {
    fn unit_alive(&self, unit: PlatformId) -> bool;

    fn unit_position(&self, unit: PlatformId) -> Option<Position>;

    /// Expendable rounds left on the unit, all weapons combined.
    fn unit_ammo(&self, unit: PlatformId) -> Option<i32>;

    /// Preferred weapon for an attack run, if the unit carries any.
    fn best_weapon(&self, unit: PlatformId) -> Option<String>;

    fn target_alive(&self, target: TargetId) -> bool;

    fn target_position(&self, target: TargetId) -> Option<Position>;

    /// Unit within `tolerance` meters (ground plane) of `point`.
    fn has_reached(&self, unit: PlatformId, point: &Position, tolerance: f64) -> bool {
        self.unit_position(unit)
            .is_some_and(|p| p.horizontal_range_to(point) <= tolerance)
    }

    /// Unit within `distance` meters (ground plane) of the target.
    fn is_in_range(&self, unit: PlatformId, target: TargetId, distance: f64) -> bool {
        match (self.unit_position(unit), self.target_position(target)) {
            (Some(u), Some(t)) => u.horizontal_range_to(&t) <= distance,
            _ => false,
        }
    }

    /// Whether the unit holds fewer rounds than `before`.
    fn ammo_consumed_since(&self, unit: PlatformId, before: i32) -> bool {
        self.unit_ammo(unit).is_some_and(|now| now < before)
    }
}

/// Commands to a single unit. Each returns whether the host accepted it.
pub trait UnitController: Send + Sync {
    fn navigate_to(&self, unit: PlatformId, goal: Position) -> bool;

    fn aim_at(&self, unit: PlatformId, target: TargetId) -> bool;

    /// Set the unit up to engage. The host's own fire behaviour performs
    /// the actual discharge.
    fn fire_at(&self, unit: PlatformId, target: TargetId, weapon: &str) -> bool;

    fn egress_to(&self, unit: PlatformId, safe: Position) -> bool;

    fn stop(&self, unit: PlatformId);
}

/// What the orchestrator drives: hand over plans, advance tasks.
pub trait AssignmentExecutor: Send + Sync {
    /// Replace all active tasks with the assignment of `plan`.
    /// Returns the number of tasks created.
    fn apply_assignment(&self, plan: &Plan) -> usize;

    /// Advance a rate-limited batch of tasks by one step.
    /// Returns the number of tasks still active.
    fn tick(&self) -> usize;
}
