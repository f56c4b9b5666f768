//! Task executor. Owns the active attack tasks and drives them.
//!
//! One mutex guards the task map, the registry, the statistics and the
//! round-robin cursor. It is held for the whole of every public operation,
//! so task admission, cancellation and processing never interleave.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use wta_core::constants::*;
use wta_core::messages::Plan;
use wta_core::state::Roster;
use wta_core::types::{PlatformId, Position, TargetId};

use crate::fsm::{self, StageContext};
use crate::ports::{AssignmentExecutor, EntityLookup, UnitController};
use crate::registry::{EntityRegistry, UnitStatus};
use crate::task::{AttackTask, FailReason, TaskStatistics};

/// How many finished tasks are kept for inspection.
const FINISHED_HISTORY: usize = 64;

/// Executor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Tasks advanced per tick. 0 = no limit.
    pub max_tasks_per_tick: usize,
    pub approach_distance: f64,
    pub engagement_distance: f64,
    pub max_retries: u32,
    /// Wait after a fire command before assessing the shot (seconds).
    pub verify_settle_secs: f64,
    pub navigate_altitude: f64,
    pub egress_altitude: f64,
    pub egress_distance: f64,
    /// Fixed egress point; when unset the unit runs directly away from
    /// its target.
    pub egress_fallback: Option<Position>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_tick: MAX_TASKS_PER_TICK,
            approach_distance: APPROACH_DISTANCE,
            engagement_distance: ENGAGEMENT_DISTANCE,
            max_retries: MAX_TASK_RETRIES,
            verify_settle_secs: VERIFY_SETTLE_SECS,
            navigate_altitude: NAVIGATE_ALTITUDE,
            egress_altitude: EGRESS_ALTITUDE,
            egress_distance: EGRESS_DISTANCE,
            egress_fallback: None,
        }
    }
}

/// Result of one `tick()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks advanced this tick.
    pub processed: usize,
    /// Tasks that reached Completed or Failed this tick.
    pub finished: usize,
    /// Tasks still active afterwards.
    pub active: usize,
}

#[derive(Default)]
struct ExecutorState {
    registry: EntityRegistry,
    tasks: BTreeMap<PlatformId, AttackTask>,
    stats: TaskStatistics,
    cursor: usize,
    max_tasks_per_tick: usize,
    finished: VecDeque<AttackTask>,
}

/// Owns the attack tasks, at most one per platform.
pub struct TaskExecutor {
    lookup: Arc<dyn EntityLookup>,
    controller: Arc<dyn UnitController>,
    config: ExecutorConfig,
    state: Mutex<ExecutorState>,
}

impl TaskExecutor {
    pub fn new(
        lookup: Arc<dyn EntityLookup>,
        controller: Arc<dyn UnitController>,
        config: ExecutorConfig,
    ) -> Self {
        let state = ExecutorState {
            max_tasks_per_tick: config.max_tasks_per_tick,
            ..Default::default()
        };
        Self {
            lookup,
            controller,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Build a task carrying this executor's distances and retry budget.
    pub fn new_task(&self, platform_id: PlatformId, target_id: TargetId) -> AttackTask {
        let mut task = AttackTask::new(platform_id, target_id);
        task.approach_distance = self.config.approach_distance;
        task.engagement_distance = self.config.engagement_distance;
        task.max_retries = self.config.max_retries;
        task
    }

    pub fn register_unit(&self, id: PlatformId) {
        self.state.lock().registry.register_unit(id);
    }

    pub fn register_target(&self, id: TargetId) {
        self.state.lock().registry.register_target(id);
    }

    pub fn register_roster(&self, roster: &Roster) {
        self.state.lock().registry.register_roster(roster);
    }

    /// Admit a task. Refused, with nothing changed, when the platform is
    /// unknown, dead, or already busy.
    pub fn add_attack_task(&self, task: AttackTask) -> bool {
        let mut state = self.state.lock();
        self.admit(&mut state, task)
    }

    /// Stop the unit and drop its task. Counts as a failure.
    pub fn cancel_task(&self, platform_id: PlatformId) -> bool {
        let mut state = self.state.lock();
        let Some(mut task) = state.tasks.remove(&platform_id) else {
            return false;
        };

        self.controller.stop(platform_id);
        state.registry.release(platform_id);
        task.mark_failed(FailReason::Cancelled);
        state.stats.on_task_failed();
        push_finished(&mut state.finished, task);
        tracing::info!(platform_id, "task cancelled");
        true
    }

    /// Stop every tasked unit and drop all tasks, each counted as failed.
    pub fn clear_all_tasks(&self) {
        let mut state = self.state.lock();
        self.clear_locked(&mut state);
    }

    /// Advance at most `max_tasks_per_tick` tasks by one step, picking up
    /// where the previous tick stopped.
    pub fn tick(&self) -> TickReport {
        let mut state = self.state.lock();
        if state.tasks.is_empty() {
            return TickReport::default();
        }

        let ids: Vec<PlatformId> = state.tasks.keys().copied().collect();
        let total = ids.len();
        let start = state.cursor % total;
        let batch = match state.max_tasks_per_tick {
            0 => total,
            limit => limit.min(total),
        };

        let ctx = StageContext {
            lookup: self.lookup.as_ref(),
            controller: self.controller.as_ref(),
            config: &self.config,
        };

        let mut finished = 0;
        for offset in 0..batch {
            let pid = ids[(start + offset) % total];
            let Some(task) = state.tasks.get_mut(&pid) else {
                continue;
            };

            let stage = fsm::step(task, &ctx);
            if !stage.is_terminal() {
                state.registry.set_status(pid, UnitStatus::for_stage(stage));
                continue;
            }

            let Some(task) = state.tasks.remove(&pid) else {
                continue;
            };
            if task.failure.is_none() {
                state.stats.on_task_completed();
            } else {
                state.stats.on_task_failed();
            }
            state.registry.release(pid);
            tracing::info!(
                platform_id = pid,
                target_id = task.target_id,
                outcome = stage.label(),
                elapsed_secs = task.elapsed().as_secs_f64(),
                "task finished"
            );
            push_finished(&mut state.finished, task);
            finished += 1;
        }

        state.cursor = (start + batch) % total;

        TickReport {
            processed: batch,
            finished,
            active: state.tasks.len(),
        }
    }

    /// Replace all tasks with those of an accepted plan.
    ///
    /// A plan whose status is not ok is ignored entirely. Matrix cells that
    /// point past the roster are skipped.
    pub fn apply_assignment(&self, plan: &Plan) -> usize {
        if !plan.response.is_ok() {
            tracing::warn!(status = %plan.response.status, "ignoring plan that is not ok");
            return 0;
        }
        if !plan.response.assignment.is_well_formed() {
            tracing::warn!(
                n_platforms = plan.response.n_platforms(),
                n_targets = plan.response.n_targets(),
                cells = plan.response.assignment.cells.len(),
                "ignoring plan whose matrix does not match its shape"
            );
            return 0;
        }

        let mut state = self.state.lock();
        state.registry.register_roster(&plan.roster);
        self.clear_locked(&mut state);

        let mut created = 0;
        for (i, j) in plan.response.assignment.assigned() {
            let (Some(&pid), Some(&tid)) = (plan.roster.platforms.get(i), plan.roster.targets.get(j))
            else {
                tracing::debug!(row = i, col = j, "assignment cell outside roster, skipped");
                continue;
            };
            if self.admit(&mut state, self.new_task(pid, tid)) {
                created += 1;
            }
        }

        tracing::info!(
            created,
            n_platforms = plan.response.n_platforms(),
            n_targets = plan.response.n_targets(),
            "assignment applied"
        );
        created
    }

    pub fn statistics(&self) -> TaskStatistics {
        self.state.lock().stats
    }

    pub fn active_task_count(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// 0 disables the limit.
    pub fn set_max_tasks_per_tick(&self, max_tasks: usize) {
        self.state.lock().max_tasks_per_tick = max_tasks;
    }

    /// Copy of the active task of a platform.
    pub fn task(&self, platform_id: PlatformId) -> Option<AttackTask> {
        self.state.lock().tasks.get(&platform_id).cloned()
    }

    /// Copies of all active tasks, by platform id.
    pub fn active_tasks(&self) -> Vec<AttackTask> {
        self.state.lock().tasks.values().cloned().collect()
    }

    /// Most recently finished tasks, oldest first.
    pub fn finished_tasks(&self) -> Vec<AttackTask> {
        self.state.lock().finished.iter().cloned().collect()
    }

    pub fn unit_status(&self, platform_id: PlatformId) -> Option<UnitStatus> {
        self.state.lock().registry.unit_status(platform_id)
    }

    fn admit(&self, state: &mut ExecutorState, mut task: AttackTask) -> bool {
        let pid = task.platform_id;
        if !state.registry.has_unit(pid) || !self.lookup.unit_alive(pid) {
            tracing::debug!(platform_id = pid, "admission refused: unit unknown or dead");
            return false;
        }
        if state.tasks.contains_key(&pid) {
            tracing::debug!(platform_id = pid, "admission refused: unit busy");
            return false;
        }

        if let Some(pos) = self.lookup.target_position(task.target_id) {
            task.target_pos = pos;
        }
        task.started_at = Some(std::time::Instant::now());

        state.registry.assign(pid, task.target_id);
        state.stats.on_task_created();
        tracing::info!(platform_id = pid, target_id = task.target_id, "task admitted");
        state.tasks.insert(pid, task);
        true
    }

    fn clear_locked(&self, state: &mut ExecutorState) {
        let tasks = std::mem::take(&mut state.tasks);
        for (pid, mut task) in tasks {
            self.controller.stop(pid);
            state.registry.release(pid);
            task.mark_failed(FailReason::Cancelled);
            state.stats.on_task_failed();
            push_finished(&mut state.finished, task);
        }
        state.cursor = 0;
    }
}

impl AssignmentExecutor for TaskExecutor {
    fn apply_assignment(&self, plan: &Plan) -> usize {
        TaskExecutor::apply_assignment(self, plan)
    }

    fn tick(&self) -> usize {
        TaskExecutor::tick(self).active
    }
}

fn push_finished(finished: &mut VecDeque<AttackTask>, task: AttackTask) {
    if finished.len() == FINISHED_HISTORY {
        finished.pop_front();
    }
    finished.push_back(task);
}
