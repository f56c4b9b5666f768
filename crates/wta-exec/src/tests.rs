//! Tests for task admission, the stage machine and round-robin ticking.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use wta_core::enums::TaskStage;
use wta_core::messages::{Plan, PlanResponse};
use wta_core::state::{AssignmentMatrix, Roster};
use wta_core::types::{PlatformId, Position, TargetId};

use crate::executor::{ExecutorConfig, TaskExecutor, TickReport};
use crate::ports::{EntityLookup, UnitController};
use crate::registry::UnitStatus;
use crate::task::{AttackTask, FailReason};

// ---- Mock host ----

#[derive(Debug, Clone)]
struct MockUnit {
    pos: Position,
    alive: bool,
    ammo: i32,
}

#[derive(Debug, Clone)]
struct MockTarget {
    pos: Position,
    alive: bool,
}

#[derive(Default)]
struct MockState {
    units: BTreeMap<PlatformId, MockUnit>,
    targets: BTreeMap<TargetId, MockTarget>,
    /// Navigate commands teleport the unit onto the goal.
    teleport: bool,
    reject_navigate: bool,
    reject_aim: bool,
    reject_fire: bool,
    reject_egress: bool,
    /// `unit_position` answers `None` while set.
    hide_positions: bool,
    /// Fire commands are accepted but no round leaves.
    dud_fire: bool,
    navigate_calls: Vec<PlatformId>,
    stops: Vec<PlatformId>,
    egressed: Vec<(PlatformId, Position)>,
}

#[derive(Default)]
struct MockHost {
    state: Mutex<MockState>,
}

impl MockHost {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn add_unit(&self, id: PlatformId, pos: Position, ammo: i32) {
        self.state.lock().units.insert(
            id,
            MockUnit {
                pos,
                alive: true,
                ammo,
            },
        );
    }

    fn add_target(&self, id: TargetId, pos: Position) {
        self.state
            .lock()
            .targets
            .insert(id, MockTarget { pos, alive: true });
    }

    fn kill_unit(&self, id: PlatformId) {
        if let Some(u) = self.state.lock().units.get_mut(&id) {
            u.alive = false;
        }
    }

    fn kill_target(&self, id: TargetId) {
        if let Some(t) = self.state.lock().targets.get_mut(&id) {
            t.alive = false;
        }
    }

    /// Relocate a unit without going through a command.
    fn move_unit(&self, id: PlatformId, pos: Position) {
        if let Some(u) = self.state.lock().units.get_mut(&id) {
            u.pos = pos;
        }
    }

    fn navigate_calls(&self) -> Vec<PlatformId> {
        self.state.lock().navigate_calls.clone()
    }
}

impl EntityLookup for MockHost {
    fn unit_alive(&self, unit: PlatformId) -> bool {
        self.state.lock().units.get(&unit).is_some_and(|u| u.alive)
    }

    fn unit_position(&self, unit: PlatformId) -> Option<Position> {
        let s = self.state.lock();
        if s.hide_positions {
            return None;
        }
        s.units.get(&unit).map(|u| u.pos)
    }

    fn unit_ammo(&self, unit: PlatformId) -> Option<i32> {
        self.state.lock().units.get(&unit).map(|u| u.ammo)
    }

    fn best_weapon(&self, unit: PlatformId) -> Option<String> {
        self.state
            .lock()
            .units
            .get(&unit)
            .filter(|u| u.ammo > 0)
            .map(|_| "missile".to_string())
    }

    fn target_alive(&self, target: TargetId) -> bool {
        self.state.lock().targets.get(&target).is_some_and(|t| t.alive)
    }

    fn target_position(&self, target: TargetId) -> Option<Position> {
        self.state.lock().targets.get(&target).map(|t| t.pos)
    }
}

impl UnitController for MockHost {
    fn navigate_to(&self, unit: PlatformId, goal: Position) -> bool {
        let mut s = self.state.lock();
        s.navigate_calls.push(unit);
        if s.reject_navigate {
            return false;
        }
        let teleport = s.teleport;
        match s.units.get_mut(&unit) {
            Some(u) => {
                if teleport {
                    u.pos = goal;
                }
                true
            }
            None => false,
        }
    }

    fn aim_at(&self, unit: PlatformId, _target: TargetId) -> bool {
        let s = self.state.lock();
        !s.reject_aim && s.units.contains_key(&unit)
    }

    fn fire_at(&self, unit: PlatformId, _target: TargetId, _weapon: &str) -> bool {
        let mut s = self.state.lock();
        if s.reject_fire {
            return false;
        }
        let dud = s.dud_fire;
        match s.units.get_mut(&unit) {
            Some(u) if u.ammo > 0 => {
                if !dud {
                    u.ammo -= 1;
                }
                true
            }
            _ => false,
        }
    }

    fn egress_to(&self, unit: PlatformId, safe: Position) -> bool {
        let mut s = self.state.lock();
        s.egressed.push((unit, safe));
        !s.reject_egress
    }

    fn stop(&self, unit: PlatformId) {
        self.state.lock().stops.push(unit);
    }
}

fn fast_config() -> ExecutorConfig {
    ExecutorConfig {
        verify_settle_secs: 0.0,
        ..Default::default()
    }
}

fn executor_with(host: &Arc<MockHost>, config: ExecutorConfig) -> TaskExecutor {
    TaskExecutor::new(host.clone(), host.clone(), config)
}

/// One unit 10 km out from one target, ids 1 and 1.
fn single_pair(teleport: bool) -> (Arc<MockHost>, TaskExecutor) {
    let host = MockHost::new();
    host.state.lock().teleport = teleport;
    host.add_unit(1, Position::new(-10_000.0, 0.0, 300.0), 4);
    host.add_target(1, Position::ground(0.0, 0.0));
    let exec = executor_with(&host, fast_config());
    exec.register_unit(1);
    exec.register_target(1);
    (host, exec)
}

fn ok_plan(roster: Roster, cells: &[(usize, usize)]) -> Plan {
    let mut matrix = AssignmentMatrix::new(roster.platforms.len(), roster.targets.len());
    for &(i, j) in cells {
        matrix.set(i, j, true);
    }
    Plan {
        response: PlanResponse::ok(matrix, 2.0),
        roster,
        solved_at: 0.0,
    }
}

fn run_until_idle(exec: &TaskExecutor, max_ticks: usize) {
    for _ in 0..max_ticks {
        if exec.tick().active == 0 {
            return;
        }
    }
}

fn assert_legal_history(task: &AttackTask) {
    assert_eq!(task.stage_history.first(), Some(&TaskStage::Pending));
    for pair in task.stage_history.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "illegal edge {:?} -> {:?} in {:?}",
            pair[0],
            pair[1],
            task.stage_history
        );
    }
}

// ---- Admission ----

#[test]
fn test_admission_requires_registered_live_unit() {
    let host = MockHost::new();
    host.add_unit(1, Position::default(), 1);
    host.add_unit(2, Position::default(), 1);
    host.add_target(1, Position::ground(100.0, 0.0));
    host.kill_unit(2);
    let exec = executor_with(&host, fast_config());

    assert!(!exec.add_attack_task(exec.new_task(1, 1)), "unregistered unit admitted");

    exec.register_unit(1);
    exec.register_unit(2);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    assert!(!exec.add_attack_task(exec.new_task(2, 1)), "dead unit admitted");
    assert_eq!(exec.active_task_count(), 1);
}

#[test]
fn test_double_admission_rejected() {
    let (_host, exec) = single_pair(false);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    assert!(!exec.add_attack_task(exec.new_task(1, 1)));

    let stats = exec.statistics();
    assert_eq!(stats.total_tasks, 1);
    assert_eq!(stats.active_tasks, 1);
    assert_eq!(exec.task(1).map(|t| t.target_pos), Some(Position::ground(0.0, 0.0)));
    assert_eq!(exec.unit_status(1), Some(UnitStatus::NavigatingToTarget));
}

#[test]
fn test_concurrent_admission_exactly_one_wins() {
    let (_host, exec) = single_pair(false);
    let exec = Arc::new(exec);

    let wins: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let exec = exec.clone();
                scope.spawn(move || exec.add_attack_task(exec.new_task(1, 1)))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum()
    });

    assert_eq!(wins, 1);
    assert_eq!(exec.active_task_count(), 1);
    assert_eq!(exec.statistics().total_tasks, 1);
}

// ---- Stage machine ----

#[test]
fn test_full_engagement_reaches_completed() {
    let (host, exec) = single_pair(true);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    run_until_idle(&exec, 20);

    let finished = exec.finished_tasks();
    assert_eq!(finished.len(), 1);
    let task = &finished[0];
    assert_eq!(task.stage, TaskStage::Completed);
    assert_eq!(
        task.stage_history,
        vec![
            TaskStage::Pending,
            TaskStage::Navigate,
            TaskStage::Approach,
            TaskStage::Aiming,
            TaskStage::Firing,
            TaskStage::Verify,
            TaskStage::Egress,
            TaskStage::Completed,
        ]
    );
    assert_eq!(task.weapon.as_deref(), Some("missile"));
    assert_eq!(task.ammo_before_fire, 4);
    assert_eq!(host.unit_ammo(1), Some(3));

    // Egress runs directly away from the target at egress altitude.
    let egressed = host.state.lock().egressed.clone();
    assert_eq!(egressed.len(), 1);
    let (_, safe) = egressed[0];
    assert!((safe.z - exec.config().egress_altitude).abs() < 1e-9);
    assert!(safe.horizontal_range_to(&Position::ground(0.0, 0.0)) > 2_000.0);

    let stats = exec.statistics();
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.active_tasks, 0);
    assert_eq!(exec.unit_status(1), Some(UnitStatus::Idle));
}

#[test]
fn test_target_killed_after_firing_completes() {
    let (host, exec) = single_pair(true);
    exec.register_roster(&Roster::sequential(1, 1));
    let created = exec.apply_assignment(&ok_plan(Roster::sequential(1, 1), &[(0, 0)]));
    assert_eq!(created, 1);
    let task = exec.task(1).unwrap();
    assert_eq!((task.platform_id, task.target_id), (1, 1));

    // Navigate, Approach, Aiming, Firing -> Verify.
    for _ in 0..4 {
        exec.tick();
    }
    assert_eq!(exec.task(1).map(|t| t.stage), Some(TaskStage::Verify));

    host.kill_target(1);
    run_until_idle(&exec, 5);

    let finished = exec.finished_tasks();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].stage, TaskStage::Completed);
    assert!(finished[0].failure.is_none());
    assert_legal_history(&finished[0]);
    assert_eq!(exec.statistics().completed_tasks, 1);
}

#[test]
fn test_unit_killed_mid_approach_fails_next_tick() {
    let host = MockHost::new();
    // Inside approach distance, outside engagement distance, not moving.
    host.add_unit(1, Position::new(500.0, 0.0, 300.0), 2);
    host.add_target(1, Position::ground(0.0, 0.0));
    let exec = executor_with(&host, fast_config());
    exec.register_unit(1);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    exec.tick();
    exec.tick();
    assert_eq!(exec.task(1).map(|t| t.stage), Some(TaskStage::Approach));
    let before = exec.statistics();

    host.kill_unit(1);
    let report = exec.tick();
    assert_eq!(report.finished, 1);
    assert_eq!(report.active, 0);

    let after = exec.statistics();
    assert_eq!(after.failed_tasks, before.failed_tasks + 1);
    assert_eq!(after.active_tasks, before.active_tasks - 1);

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.failure, Some(FailReason::UnitLost));
    assert_eq!(
        &task.stage_history[task.stage_history.len() - 2..],
        &[TaskStage::Approach, TaskStage::Failed]
    );
}

#[test]
fn test_aim_rejection_exhausts_retries() {
    let (host, exec) = single_pair(true);
    host.state.lock().reject_aim = true;
    let mut task = exec.new_task(1, 1);
    task.max_retries = 2;
    assert!(exec.add_attack_task(task));

    run_until_idle(&exec, 50);

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.stage, TaskStage::Failed);
    assert_eq!(task.failure, Some(FailReason::RetriesExhausted));
    assert_eq!(task.retry_count, 2);
    assert_legal_history(task);
    assert_eq!(exec.statistics().failed_tasks, 1);
}

#[test]
fn test_dud_shot_retries_from_aiming_when_still_in_range() {
    let (host, exec) = single_pair(true);
    host.state.lock().dud_fire = true;
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    // Navigate, Approach, Aiming, Firing, then Verify sees no round leave.
    for _ in 0..5 {
        exec.tick();
    }
    let task = exec.task(1).unwrap();
    assert_eq!(task.retry_count, 1);
    assert_eq!(task.stage, TaskStage::Aiming);
    assert_legal_history(&task);
}

#[test]
fn test_navigate_rejected_fails_task() {
    let (host, exec) = single_pair(false);
    host.state.lock().reject_navigate = true;
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    exec.tick();

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.failure, Some(FailReason::NavigateRejected));
    assert_eq!(
        task.stage_history,
        vec![TaskStage::Pending, TaskStage::Navigate, TaskStage::Failed]
    );
}

#[test]
fn test_verify_waits_for_settle_time() {
    let host = MockHost::new();
    host.state.lock().teleport = true;
    host.add_unit(1, Position::default(), 3);
    host.add_target(1, Position::ground(50.0, 0.0));
    let exec = executor_with(
        &host,
        ExecutorConfig {
            verify_settle_secs: 60.0,
            ..Default::default()
        },
    );
    exec.register_unit(1);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    for _ in 0..10 {
        exec.tick();
    }
    assert_eq!(exec.task(1).map(|t| t.stage), Some(TaskStage::Verify));
}

#[test]
fn test_egress_fallback_point_used() {
    let host = MockHost::new();
    host.state.lock().teleport = true;
    host.add_unit(1, Position::default(), 3);
    host.add_target(1, Position::ground(50.0, 0.0));
    let fallback = Position::new(-5_000.0, -5_000.0, 800.0);
    let exec = executor_with(
        &host,
        ExecutorConfig {
            verify_settle_secs: 0.0,
            egress_fallback: Some(fallback),
            ..Default::default()
        },
    );
    exec.register_unit(1);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    run_until_idle(&exec, 20);

    assert_eq!(host.state.lock().egressed, vec![(1, fallback)]);
}

#[test]
fn test_aiming_falls_back_to_approach_when_range_lost() {
    let (host, exec) = single_pair(true);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    exec.tick();
    exec.tick();
    assert_eq!(exec.task(1).map(|t| t.stage), Some(TaskStage::Aiming));

    // Overshoot well past engagement distance before the aim lands.
    host.move_unit(1, Position::new(3_000.0, 0.0, 300.0));
    exec.tick();

    let task = exec.task(1).unwrap();
    assert_eq!(task.stage, TaskStage::Approach);
    assert!(task.failure.is_none());
    assert_eq!(task.retry_count, 0);
    assert_eq!(
        &task.stage_history[task.stage_history.len() - 2..],
        &[TaskStage::Aiming, TaskStage::Approach]
    );
    assert_legal_history(&task);
}

#[test]
fn test_fire_rejection_retries_from_navigate_until_exhausted() {
    let (host, exec) = single_pair(true);
    host.state.lock().reject_fire = true;
    let mut task = exec.new_task(1, 1);
    task.max_retries = 2;
    assert!(exec.add_attack_task(task));

    // Navigate, Approach, Aiming, then Firing is refused.
    for _ in 0..4 {
        exec.tick();
    }
    let task = exec.task(1).unwrap();
    assert_eq!(task.stage, TaskStage::Navigate);
    assert_eq!(task.retry_count, 1);
    assert!(task.failure.is_none());
    assert_legal_history(&task);

    run_until_idle(&exec, 50);

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.stage, TaskStage::Failed);
    assert_eq!(task.failure, Some(FailReason::RetriesExhausted));
    assert_eq!(task.retry_count, 2);
    assert_legal_history(task);
    assert_eq!(host.unit_ammo(1), Some(4));
}

#[test]
fn test_egress_rejected_fails_task() {
    let (host, exec) = single_pair(true);
    host.state.lock().reject_egress = true;
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    run_until_idle(&exec, 20);

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.stage, TaskStage::Failed);
    assert_eq!(task.failure, Some(FailReason::EgressRejected));
    assert_eq!(
        &task.stage_history[task.stage_history.len() - 2..],
        &[TaskStage::Egress, TaskStage::Failed]
    );
    assert_legal_history(task);
    assert_eq!(host.state.lock().egressed.len(), 1);
    assert_eq!(host.unit_ammo(1), Some(3));
    assert_eq!(exec.statistics().failed_tasks, 1);
}

#[test]
fn test_egress_without_position_or_fallback_fails() {
    let (host, exec) = single_pair(true);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    for _ in 0..5 {
        exec.tick();
    }
    assert_eq!(exec.task(1).map(|t| t.stage), Some(TaskStage::Egress));
    assert!(exec.config().egress_fallback.is_none());

    host.state.lock().hide_positions = true;
    exec.tick();

    let task = &exec.finished_tasks()[0];
    assert_eq!(task.stage, TaskStage::Failed);
    assert_eq!(task.failure, Some(FailReason::NoEgressPoint));
    assert_eq!(
        &task.stage_history[task.stage_history.len() - 2..],
        &[TaskStage::Egress, TaskStage::Failed]
    );
    assert_legal_history(task);
    assert!(host.state.lock().egressed.is_empty());
}

// ---- Round-robin ----

fn busy_executor(n: PlatformId, limit: usize) -> (Arc<MockHost>, TaskExecutor) {
    let host = MockHost::new();
    host.add_target(100, Position::ground(0.0, 0.0));
    let exec = executor_with(
        &host,
        ExecutorConfig {
            max_tasks_per_tick: limit,
            ..fast_config()
        },
    );
    for id in 1..=n {
        // Far out and not moving: every tick re-issues navigate.
        host.add_unit(id, Position::new(50_000.0 + id as f64, 0.0, 300.0), 1);
        exec.register_unit(id);
        assert!(exec.add_attack_task(exec.new_task(id, 100)));
    }
    (host, exec)
}

#[test]
fn test_tick_processes_min_of_limit_and_active() {
    let (_host, exec) = busy_executor(5, 2);
    for _ in 0..7 {
        assert_eq!(exec.tick().processed, 2);
    }

    let (_host, exec) = busy_executor(1, 2);
    assert_eq!(exec.tick().processed, 1);

    let (_host, exec) = busy_executor(5, 0);
    assert_eq!(exec.tick().processed, 5, "0 means unlimited");
}

#[test]
fn test_round_robin_services_every_task() {
    let (host, exec) = busy_executor(5, 2);

    // ceil(5 / 2) = 3 ticks touch every unit.
    for _ in 0..3 {
        exec.tick();
    }
    let mut touched = host.navigate_calls();
    touched.sort_unstable();
    touched.dedup();
    assert_eq!(touched, vec![1, 2, 3, 4, 5]);

    // No unit is served twice before all have been served once.
    let calls = host.navigate_calls();
    let first_five: Vec<_> = calls.iter().take(5).copied().collect();
    let mut unique = first_five.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 5, "order was {first_five:?}");
}

#[test]
fn test_set_max_tasks_per_tick() {
    let (_host, exec) = busy_executor(6, 2);
    exec.set_max_tasks_per_tick(4);
    assert_eq!(exec.tick().processed, 4);
}

#[test]
fn test_tick_with_no_tasks_is_empty() {
    let host = MockHost::new();
    let exec = executor_with(&host, fast_config());
    assert_eq!(exec.tick(), TickReport::default());
}

// ---- Cancellation and plans ----

#[test]
fn test_cancel_task_stops_unit_and_counts_failure() {
    let (host, exec) = single_pair(false);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    assert!(exec.cancel_task(1));
    assert!(!exec.cancel_task(1));

    assert_eq!(host.state.lock().stops, vec![1]);
    let stats = exec.statistics();
    assert_eq!(stats.failed_tasks, 1);
    assert_eq!(stats.active_tasks, 0);
    assert_eq!(exec.finished_tasks()[0].failure, Some(FailReason::Cancelled));
}

#[test]
fn test_clear_all_tasks() {
    let (host, exec) = busy_executor(3, 2);
    exec.clear_all_tasks();

    assert_eq!(exec.active_task_count(), 0);
    assert_eq!(host.state.lock().stops.len(), 3);
    let stats = exec.statistics();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.failed_tasks, 3);
    assert_eq!(stats.active_tasks, 0);
    assert!(stats.success_rate().abs() < 1e-9);
}

#[test]
fn test_apply_assignment_maps_through_roster() {
    let host = MockHost::new();
    host.add_unit(7, Position::default(), 1);
    host.add_unit(9, Position::default(), 1);
    host.add_target(42, Position::ground(10_000.0, 0.0));
    host.add_target(43, Position::ground(20_000.0, 0.0));
    let exec = executor_with(&host, fast_config());

    let roster = Roster {
        platforms: vec![7, 9],
        targets: vec![42, 43],
    };
    let created = exec.apply_assignment(&ok_plan(roster, &[(0, 1), (1, 0)]));

    assert_eq!(created, 2);
    assert_eq!(exec.task(7).map(|t| t.target_id), Some(43));
    assert_eq!(exec.task(9).map(|t| t.target_id), Some(42));
}

#[test]
fn test_apply_assignment_replaces_previous_tasks() {
    let (host, exec) = busy_executor(2, 2);
    let roster = Roster {
        platforms: vec![1],
        targets: vec![100],
    };

    assert_eq!(exec.apply_assignment(&ok_plan(roster, &[(0, 0)])), 1);

    assert_eq!(exec.active_task_count(), 1);
    assert_eq!(host.state.lock().stops, vec![1, 2]);
    let stats = exec.statistics();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.failed_tasks, 2);
}

#[test]
fn test_apply_assignment_skips_cells_outside_roster() {
    let (_host, exec) = single_pair(false);
    // Matrix says 2x2 but the roster only knows one platform and target.
    let plan = Plan {
        response: PlanResponse::ok(AssignmentMatrix::from_cells(2, 2, vec![1, 0, 1, 1]), 2.0),
        roster: Roster::sequential(1, 1),
        solved_at: 0.0,
    };
    assert_eq!(exec.apply_assignment(&plan), 1);
    assert_eq!(exec.active_task_count(), 1);
}

#[test]
fn test_apply_assignment_short_buffer_rejected() {
    let (_host, exec) = single_pair(false);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));
    let plan = Plan {
        response: PlanResponse::ok(AssignmentMatrix::from_cells(3, 3, vec![1]), 2.0),
        roster: Roster::sequential(3, 3),
        solved_at: 0.0,
    };
    assert_eq!(exec.apply_assignment(&plan), 0);
    // The running task is left alone.
    assert_eq!(exec.active_task_count(), 1);
}

#[test]
fn test_apply_assignment_huge_declared_shape_returns_quickly() {
    let (_host, exec) = single_pair(false);
    let plan = Plan {
        response: PlanResponse::ok(AssignmentMatrix::from_cells(40_000, 40_000, vec![1]), 2.0),
        roster: Roster::sequential(1, 1),
        solved_at: 0.0,
    };
    let start = Instant::now();
    assert_eq!(exec.apply_assignment(&plan), 0);
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(exec.tick().active, 0);
}

#[test]
fn test_apply_assignment_second_target_for_busy_unit_ignored() {
    let host = MockHost::new();
    host.add_unit(1, Position::default(), 2);
    host.add_target(1, Position::ground(5_000.0, 0.0));
    host.add_target(2, Position::ground(6_000.0, 0.0));
    let exec = executor_with(&host, fast_config());

    let created = exec.apply_assignment(&ok_plan(Roster::sequential(1, 2), &[(0, 0), (0, 1)]));

    assert_eq!(created, 1);
    assert_eq!(exec.task(1).map(|t| t.target_id), Some(1));
}

#[test]
fn test_error_plan_ignored() {
    let (_host, exec) = single_pair(false);
    assert!(exec.add_attack_task(exec.new_task(1, 1)));

    let plan = Plan {
        response: PlanResponse::error("solver blew up"),
        roster: Roster::sequential(1, 1),
        solved_at: 0.0,
    };
    assert_eq!(exec.apply_assignment(&plan), 0);
    assert_eq!(exec.active_task_count(), 1, "existing task must survive");
    assert_eq!(exec.statistics().failed_tasks, 0);
}

#[test]
fn test_empty_plan_creates_nothing() {
    let host = MockHost::new();
    let exec = executor_with(&host, fast_config());
    let plan = ok_plan(Roster::default(), &[]);
    assert_eq!(exec.apply_assignment(&plan), 0);
    assert_eq!(exec.active_task_count(), 0);
}

// ---- Config ----

#[test]
fn test_executor_config_partial_json() {
    let cfg: ExecutorConfig = serde_json::from_str(r#"{"max_tasks_per_tick": 5}"#).unwrap();
    assert_eq!(cfg.max_tasks_per_tick, 5);
    assert_eq!(cfg.max_retries, ExecutorConfig::default().max_retries);
    assert!(cfg.egress_fallback.is_none());
}
