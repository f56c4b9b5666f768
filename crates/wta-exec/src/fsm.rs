//! Attack task stage machine.
//!
//! One handler per stage computes a [`Transition`] for a task from what
//! the lookup reports, issuing that stage's command on the way. Handlers
//! may refresh task data (target position, weapon, ammo snapshot) but never
//! touch `stage`; [`apply`] is the only place a stage changes, and it
//! goes through the checked edges of `TaskStage::can_transition_to`.

use std::time::{Duration, Instant};

use wta_core::enums::TaskStage;

use crate::executor::ExecutorConfig;
use crate::ports::{EntityLookup, UnitController};
use crate::task::{AttackTask, FailReason};

/// Ports and tuning a handler runs against.
pub struct StageContext<'a> {
    pub lookup: &'a dyn EntityLookup,
    pub controller: &'a dyn UnitController,
    pub config: &'a ExecutorConfig,
}

/// Outcome of one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep working on the current stage next tick.
    Stay,
    /// Move to another non-terminal stage.
    Enter(TaskStage),
    /// Spend a retry and rewind to the given stage.
    Retry(TaskStage),
    /// Objective met.
    Complete,
    Fail(FailReason),
}

type StageFn = fn(&mut AttackTask, &StageContext<'_>) -> Transition;

/// Handler for each non-terminal stage. `Pending` has none: it is promoted
/// to `Navigate` before dispatch.
fn handler(stage: TaskStage) -> Option<StageFn> {
    match stage {
        TaskStage::Navigate => Some(navigate),
        TaskStage::Approach => Some(approach),
        TaskStage::Aiming => Some(aiming),
        TaskStage::Firing => Some(firing),
        TaskStage::Verify => Some(verify),
        TaskStage::Egress => Some(egress),
        TaskStage::Pending | TaskStage::Completed | TaskStage::Failed => None,
    }
}

/// Advance a task by one step and return the stage it ends in.
pub fn step(task: &mut AttackTask, ctx: &StageContext<'_>) -> TaskStage {
    if task.stage == TaskStage::Pending {
        task.enter(TaskStage::Navigate);
    }

    let transition = match entry_check(task, ctx.lookup) {
        Some(t) => t,
        None => match handler(task.stage) {
            Some(f) => f(task, ctx),
            None => Transition::Stay,
        },
    };

    apply(task, transition);
    task.stage
}

/// Checks made before any stage runs: a dead unit fails the task, a dead
/// target completes it. Egress only cares about the unit.
fn entry_check(task: &AttackTask, lookup: &dyn EntityLookup) -> Option<Transition> {
    if !lookup.unit_alive(task.platform_id) {
        return Some(Transition::Fail(FailReason::UnitLost));
    }
    if task.stage != TaskStage::Egress && !lookup.target_alive(task.target_id) {
        return Some(Transition::Complete);
    }
    None
}

/// Apply a transition to the task.
pub fn apply(task: &mut AttackTask, transition: Transition) {
    let before = task.stage;
    match transition {
        Transition::Stay => return,
        Transition::Enter(next) => {
            task.enter(next);
        }
        Transition::Retry(restart) => {
            task.mark_retry(restart);
        }
        Transition::Complete => task.mark_completed(),
        Transition::Fail(reason) => task.mark_failed(reason),
    }

    if task.stage != before {
        tracing::info!(
            platform_id = task.platform_id,
            target_id = task.target_id,
            from = before.label(),
            to = task.stage.label(),
            retries = task.retry_count,
            "task stage changed"
        );
    }
}

fn navigate(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    refresh_target_position(task, ctx.lookup);

    let goal = task.target_pos.with_altitude(ctx.config.navigate_altitude);
    if !ctx.controller.navigate_to(task.platform_id, goal) {
        return Transition::Fail(FailReason::NavigateRejected);
    }

    if ctx
        .lookup
        .has_reached(task.platform_id, &task.target_pos, task.approach_distance)
    {
        return Transition::Enter(TaskStage::Approach);
    }
    Transition::Stay
}

fn approach(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    if ctx
        .lookup
        .is_in_range(task.platform_id, task.target_id, task.engagement_distance)
    {
        return Transition::Enter(TaskStage::Aiming);
    }

    // Re-issue every tick: host AI tends to drop the move order.
    refresh_target_position(task, ctx.lookup);
    let goal = task.target_pos.with_altitude(ctx.config.navigate_altitude);
    ctx.controller.navigate_to(task.platform_id, goal);
    Transition::Stay
}

fn aiming(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    // The unit may have overflown the target since the last tick.
    if !ctx
        .lookup
        .is_in_range(task.platform_id, task.target_id, task.engagement_distance)
    {
        return Transition::Enter(TaskStage::Approach);
    }

    if ctx.controller.aim_at(task.platform_id, task.target_id) {
        Transition::Enter(TaskStage::Firing)
    } else {
        Transition::Retry(TaskStage::Navigate)
    }
}

fn firing(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    if task.weapon.is_none() {
        task.weapon = ctx.lookup.best_weapon(task.platform_id);
        tracing::debug!(
            platform_id = task.platform_id,
            weapon = task.weapon.as_deref().unwrap_or("<default>"),
            "weapon selected"
        );
    }

    task.ammo_before_fire = ctx.lookup.unit_ammo(task.platform_id).unwrap_or(0);

    let weapon = task.weapon.as_deref().unwrap_or("");
    if ctx.controller.fire_at(task.platform_id, task.target_id, weapon) {
        task.fire_command_at = Some(Instant::now());
        Transition::Enter(TaskStage::Verify)
    } else {
        Transition::Retry(TaskStage::Navigate)
    }
}

fn verify(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    let settle = Duration::from_secs_f64(ctx.config.verify_settle_secs.max(0.0));
    match task.since_fire_command() {
        Some(waited) if waited < settle => return Transition::Stay,
        _ => {}
    }

    if ctx
        .lookup
        .ammo_consumed_since(task.platform_id, task.ammo_before_fire)
    {
        return Transition::Enter(TaskStage::Egress);
    }

    // No round left the rails: close in again from wherever we are.
    Transition::Retry(restart_point(task, ctx.lookup))
}

fn egress(task: &mut AttackTask, ctx: &StageContext<'_>) -> Transition {
    let safe = match ctx.config.egress_fallback {
        Some(p) => p,
        None => match ctx.lookup.unit_position(task.platform_id) {
            Some(here) => here
                .away_from(&task.target_pos, ctx.config.egress_distance)
                .with_altitude(ctx.config.egress_altitude),
            None => return Transition::Fail(FailReason::NoEgressPoint),
        },
    };

    if ctx.controller.egress_to(task.platform_id, safe) {
        Transition::Complete
    } else {
        Transition::Fail(FailReason::EgressRejected)
    }
}

/// Where a failed shot resumes: as far back as the unit's distance
/// from the target requires.
fn restart_point(task: &AttackTask, lookup: &dyn EntityLookup) -> TaskStage {
    if !lookup.has_reached(task.platform_id, &task.target_pos, task.approach_distance) {
        TaskStage::Navigate
    } else if !lookup.is_in_range(task.platform_id, task.target_id, task.engagement_distance) {
        TaskStage::Approach
    } else {
        TaskStage::Aiming
    }
}

fn refresh_target_position(task: &mut AttackTask, lookup: &dyn EntityLookup) {
    if let Some(pos) = lookup.target_position(task.target_id) {
        task.target_pos = pos;
    }
}
