//! Orchestrator: four loops around one event bus.
//!
//! - reporter: samples the world about once a second and sends a status
//!   report, fire-and-forget.
//! - scheduler: drains events, decides when the cached plan needs
//!   replacing, asks the solver and hands accepted plans to the executor.
//! - forwarder: passes kill, damage and fired events on to the solver.
//!   The scheduler only queues them, so a slow solver never delays a
//!   replan.
//! - executor: ticks the task executor.
//!
//! The loops share nothing mutable except the two queues, the executor
//! (which locks internally) and a few counters. The cached plan belongs
//! to the scheduler thread alone.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use wta_core::clock::monotonic_secs;
use wta_core::constants::*;
use wta_core::events::{Event, EventPayload};
use wta_core::messages::{
    DamageReport, FiredReport, KillReport, Plan, PlanRequest, SolveConfig, StatusReport,
};
use wta_exec::AssignmentExecutor;
use wta_net::SolverClient;

use crate::event_bus::EventBus;
use crate::ports::WorldSampler;
use crate::schedule::{ReplanSchedule, ScheduleConfig, ScheduleSummary};

/// Longest single sleep inside a loop, bounding how long `stop()` waits.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub reporter_period_secs: f64,
    pub scheduler_period_secs: f64,
    pub executor_period_secs: f64,
    pub plan_request_timeout_ms: u64,
    pub max_events_per_drain: usize,
    /// Pass kill, damage and fired events on to the solver as reports.
    pub forward_events: bool,
    pub schedule: ScheduleConfig,
    pub solve: SolveConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            reporter_period_secs: REPORTER_PERIOD_SECS,
            scheduler_period_secs: SCHEDULER_PERIOD_SECS,
            executor_period_secs: EXECUTOR_PERIOD_SECS,
            plan_request_timeout_ms: PLAN_REQUEST_TIMEOUT_MS,
            max_events_per_drain: MAX_EVENTS_PER_DRAIN,
            forward_events: true,
            schedule: ScheduleConfig::default(),
            solve: SolveConfig::default(),
        }
    }
}

/// Counters since construction plus the scheduler's latest summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OrchestratorStatistics {
    pub status_reports_sent: u64,
    pub status_reports_failed: u64,
    pub events_processed: u64,
    pub plan_requests: u64,
    pub plans_accepted: u64,
    pub plans_rejected: u64,
    pub reports_forwarded: u64,
    pub reports_dropped: u64,
    pub executor_ticks: u64,
    pub schedule: ScheduleSummary,
}

#[derive(Default)]
struct Counters {
    status_reports_sent: AtomicU64,
    status_reports_failed: AtomicU64,
    events_processed: AtomicU64,
    plan_requests: AtomicU64,
    plans_accepted: AtomicU64,
    plans_rejected: AtomicU64,
    reports_forwarded: AtomicU64,
    reports_dropped: AtomicU64,
    executor_ticks: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct Shared {
    config: OrchestratorConfig,
    sampler: Arc<dyn WorldSampler>,
    solver: Arc<dyn SolverClient>,
    executor: Arc<dyn AssignmentExecutor>,
    bus: Arc<EventBus>,
    /// Events waiting to be reported to the solver.
    outbox: EventBus,
    running: AtomicBool,
    counters: Counters,
    summary: Mutex<ScheduleSummary>,
}

pub struct Orchestrator {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        sampler: Arc<dyn WorldSampler>,
        solver: Arc<dyn SolverClient>,
        executor: Arc<dyn AssignmentExecutor>,
    ) -> Self {
        let summary = ReplanSchedule::new(config.schedule.clone()).summary();
        Self {
            shared: Arc::new(Shared {
                config,
                sampler,
                solver,
                executor,
                bus: Arc::new(EventBus::new()),
                outbox: EventBus::new(),
                running: AtomicBool::new(false),
                counters: Counters::default(),
                summary: Mutex::new(summary),
            }),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the loops. Calling it while running does nothing.
    pub fn start(&self) -> std::io::Result<()> {
        let mut threads = self.threads.lock();
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let loops: [(&str, fn(&Shared)); 4] = [
            ("wta-reporter", run_reporter),
            ("wta-scheduler", run_scheduler),
            ("wta-forwarder", run_forwarder),
            ("wta-executor", run_executor),
        ];
        for (name, body) in loops {
            let shared = Arc::clone(&self.shared);
            let spawned = std::thread::Builder::new()
                .name(name.into())
                .spawn(move || body(&shared));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(e) => {
                    tracing::error!(thread = name, error = %e, "failed to spawn loop");
                    self.shared.running.store(false, Ordering::SeqCst);
                    join_all(&mut threads);
                    return Err(e);
                }
            }
        }

        tracing::info!("orchestrator started");
        Ok(())
    }

    /// Signal the loops and join them. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut threads = self.threads.lock();
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        join_all(&mut threads);
        if was_running {
            tracing::info!("orchestrator stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Inject an event from any thread.
    pub fn publish(&self, event: Event) {
        self.shared.bus.publish(event);
    }

    /// Handle for producers that outlive a borrow of the orchestrator.
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.shared.bus)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    pub fn statistics(&self) -> OrchestratorStatistics {
        let c = &self.shared.counters;
        OrchestratorStatistics {
            status_reports_sent: c.status_reports_sent.load(Ordering::Relaxed),
            status_reports_failed: c.status_reports_failed.load(Ordering::Relaxed),
            events_processed: c.events_processed.load(Ordering::Relaxed),
            plan_requests: c.plan_requests.load(Ordering::Relaxed),
            plans_accepted: c.plans_accepted.load(Ordering::Relaxed),
            plans_rejected: c.plans_rejected.load(Ordering::Relaxed),
            reports_forwarded: c.reports_forwarded.load(Ordering::Relaxed),
            reports_dropped: c.reports_dropped.load(Ordering::Relaxed),
            executor_ticks: c.executor_ticks.load(Ordering::Relaxed),
            schedule: *self.shared.summary.lock(),
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_all(threads: &mut Vec<JoinHandle<()>>) {
    for handle in threads.drain(..) {
        let name = handle.thread().name().unwrap_or("?").to_string();
        if handle.join().is_err() {
            tracing::error!(thread = %name, "loop panicked");
        }
    }
}

/// Sleep for `period` in short slices, returning early once stopped.
fn pause(running: &AtomicBool, period_secs: f64) {
    let deadline = Instant::now() + Duration::from_secs_f64(period_secs.max(0.0));
    while running.load(Ordering::SeqCst) {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        std::thread::sleep(left.min(SLEEP_SLICE));
    }
}

// ---- Reporter ----

fn run_reporter(shared: &Shared) {
    while shared.running.load(Ordering::SeqCst) {
        let report = StatusReport::from_snapshot(monotonic_secs(), shared.sampler.sample());
        match shared.solver.report_status(&report) {
            Ok(()) => bump(&shared.counters.status_reports_sent),
            Err(e) => {
                bump(&shared.counters.status_reports_failed);
                tracing::debug!(error = %e, "status report dropped");
            }
        }
        pause(&shared.running, shared.config.reporter_period_secs);
    }
}

// ---- Scheduler ----

fn run_scheduler(shared: &Shared) {
    let mut schedule = ReplanSchedule::new(shared.config.schedule.clone());
    while shared.running.load(Ordering::SeqCst) {
        scheduler_pass(shared, &mut schedule, monotonic_secs());
        *shared.summary.lock() = schedule.summary();
        pause(&shared.running, shared.config.scheduler_period_secs);
    }
}

fn scheduler_pass(shared: &Shared, schedule: &mut ReplanSchedule, now: f64) {
    let events = shared.bus.drain(shared.config.max_events_per_drain);
    for event in &events {
        bump(&shared.counters.events_processed);
        if schedule.observe(event) {
            tracing::debug!(kind = ?event.kind(), "replan triggered");
        }
    }

    if shared.config.forward_events {
        for event in events.into_iter().filter(is_reported) {
            if shared.outbox.len() >= MAX_PENDING_REPORTS {
                bump(&shared.counters.reports_dropped);
                tracing::debug!(kind = ?event.kind(), "report backlog full, event dropped");
                continue;
            }
            shared.outbox.publish(event);
        }
    }

    if schedule.need_replan(now) && schedule.may_solve(now) {
        request_plan(shared, schedule, now);
    }
}

fn request_plan(shared: &Shared, schedule: &mut ReplanSchedule, now: f64) {
    let snapshot = shared.sampler.sample();
    let roster = snapshot.roster();
    let reason = schedule.reason();
    let request = PlanRequest::new(now, reason, shared.config.solve.clone(), snapshot);
    let timeout = Duration::from_millis(shared.config.plan_request_timeout_ms);

    bump(&shared.counters.plan_requests);
    tracing::debug!(
        reason = reason.label(),
        platforms = roster.platforms.len(),
        targets = roster.targets.len(),
        "requesting plan"
    );

    match shared.solver.request_plan(&request, timeout) {
        Ok(response) if response.is_ok() && !response.assignment.is_well_formed() => {
            bump(&shared.counters.plans_rejected);
            tracing::warn!(
                n_platforms = response.n_platforms(),
                n_targets = response.n_targets(),
                cells = response.assignment.cells.len(),
                "plan matrix does not match its shape"
            );
            schedule.on_failure(now);
        }
        Ok(response) if response.is_ok() => {
            bump(&shared.counters.plans_accepted);
            tracing::info!(
                fitness = response.best_fitness,
                ttl_sec = response.ttl_sec,
                n_platforms = response.n_platforms(),
                n_targets = response.n_targets(),
                "plan accepted"
            );
            let plan = Plan {
                response,
                roster,
                solved_at: now,
            };
            schedule.on_success(plan, now);
            if let Some(plan) = schedule.plan() {
                shared.executor.apply_assignment(plan);
            }
        }
        Ok(response) => {
            bump(&shared.counters.plans_rejected);
            tracing::warn!(
                status = %response.status,
                error = response.error_msg.as_deref().unwrap_or(""),
                "solver declined to plan"
            );
            schedule.on_failure(now);
        }
        Err(e) => {
            bump(&shared.counters.plans_rejected);
            tracing::warn!(error = %e, "plan request failed");
            schedule.on_failure(now);
        }
    }
}

// ---- Forwarder ----

fn run_forwarder(shared: &Shared) {
    while shared.running.load(Ordering::SeqCst) {
        let Some(event) = shared.outbox.wait_and_pop_timeout(SLEEP_SLICE) else {
            continue;
        };
        if forward_event(shared.solver.as_ref(), &event) {
            bump(&shared.counters.reports_forwarded);
        } else {
            bump(&shared.counters.reports_dropped);
        }
    }
}

fn is_reported(event: &Event) -> bool {
    matches!(
        event.payload,
        EventPayload::EntityKilled { .. } | EventPayload::Damage { .. } | EventPayload::Fired { .. }
    )
}

/// Returns whether the solver took the report.
fn forward_event(solver: &dyn SolverClient, event: &Event) -> bool {
    let sent = match &event.payload {
        EventPayload::EntityKilled { entity_id, side } => solver.report_killed(&KillReport {
            timestamp: event.timestamp,
            entity_id: *entity_id,
            side: *side,
            killed_by: String::new(),
        }),
        EventPayload::Damage {
            entity_id,
            side,
            amount,
        } => solver.report_damage(&DamageReport {
            timestamp: event.timestamp,
            entity_id: *entity_id,
            side: *side,
            amount: *amount,
            source: String::new(),
        }),
        EventPayload::Fired {
            platform_id,
            target_id,
            weapon,
            ammo_left,
        } => solver.report_fired(&FiredReport {
            timestamp: event.timestamp,
            platform_id: *platform_id,
            target_id: *target_id,
            weapon: weapon.clone(),
            ammo_left: *ammo_left,
        }),
        EventPayload::ReplanRequest | EventPayload::PeriodicTick => return false,
    };
    match sent {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(kind = ?event.kind(), error = %e, "event report dropped");
            false
        }
    }
}

// ---- Executor ----

fn run_executor(shared: &Shared) {
    while shared.running.load(Ordering::SeqCst) {
        shared.executor.tick();
        bump(&shared.counters.executor_ticks);
        pause(&shared.running, shared.config.executor_period_secs);
    }
}
