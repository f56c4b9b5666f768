//! Whole-stack runs: sandbox world, task executor and orchestrator,
//! talking to a greedy solver over loopback TCP.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use wta_core::enums::EntitySide;
use wta_core::messages::PlanResponse;
use wta_core::state::{AmmoState, AssignmentMatrix, PlatformState, TargetState};
use wta_core::types::Position;
use wta_exec::{EntityLookup, ExecutorConfig, TaskExecutor};
use wta_net::codec::{read_frame, write_frame};
use wta_net::{Envelope, SolverClientConfig, TcpSolverClient};
use wta_orchestrator::{Orchestrator, OrchestratorConfig};
use wta_sandbox::{SandboxConfig, SandboxWorld, Scenario};

/// Solver that gives every armed platform row `i` the target column
/// `i % n_targets`, acking every report. Records what it receives.
fn spawn_greedy_solver() -> (String, Arc<Mutex<Vec<Envelope>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = listener.local_addr().unwrap().to_string();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            while let Ok(envelope) = read_frame(&mut stream) {
                let reply = match &envelope {
                    Envelope::PlanRequest(req) => {
                        let (n_p, n_t) = (req.platforms.len(), req.targets.len());
                        let mut matrix = AssignmentMatrix::new(n_p, n_t);
                        if n_t > 0 {
                            for (i, p) in req.platforms.iter().enumerate() {
                                if p.ammo.total() > 0 {
                                    matrix.set(i, i % n_t, true);
                                }
                            }
                        }
                        Envelope::PlanResponse(PlanResponse::ok(matrix, 5.0))
                    }
                    _ => Envelope::Ack,
                };
                log.lock().push(envelope);
                if write_frame(&mut stream, &reply).is_err() {
                    break;
                }
            }
        }
    });
    (endpoint, seen)
}

struct Rig {
    world: Arc<SandboxWorld>,
    executor: Arc<TaskExecutor>,
    orchestrator: Orchestrator,
    seen: Arc<Mutex<Vec<Envelope>>>,
    stepping: Arc<AtomicBool>,
    stepper: Option<JoinHandle<()>>,
}

impl Rig {
    /// Wire everything up and start; the world runs at ten times real time.
    fn start(scenario: &Scenario) -> Self {
        let (endpoint, seen) = spawn_greedy_solver();
        let world = Arc::new(SandboxWorld::from_scenario(SandboxConfig::default(), scenario));
        let executor = Arc::new(TaskExecutor::new(
            world.clone(),
            world.clone(),
            ExecutorConfig {
                max_tasks_per_tick: 0,
                verify_settle_secs: 0.1,
                ..Default::default()
            },
        ));
        let solver = Arc::new(TcpSolverClient::new(SolverClientConfig {
            endpoint,
            ..Default::default()
        }));
        let orchestrator = Orchestrator::new(
            OrchestratorConfig {
                reporter_period_secs: 0.2,
                ..Default::default()
            },
            world.clone(),
            solver,
            executor.clone(),
        );

        let bus = orchestrator.event_bus();
        world.set_event_sink(move |e| bus.publish(e));
        orchestrator.start().unwrap();

        let stepping = Arc::new(AtomicBool::new(true));
        let stepper = {
            let world = world.clone();
            let stepping = stepping.clone();
            std::thread::spawn(move || {
                while stepping.load(Ordering::SeqCst) {
                    world.step(0.05);
                    std::thread::sleep(Duration::from_millis(5));
                }
            })
        };

        Self {
            world,
            executor,
            orchestrator,
            seen,
            stepping,
            stepper: Some(stepper),
        }
    }

    fn wait_for(&self, limit: Duration, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if done(self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        done(self)
    }

    fn shutdown(&mut self) {
        self.orchestrator.stop();
        self.stepping.store(false, Ordering::SeqCst);
        if let Some(h) = self.stepper.take() {
            h.join().unwrap();
        }
    }
}

fn striker(id: i32, x: f64) -> PlatformState {
    PlatformState {
        id,
        position: Position::new(x, 0.0, 300.0),
        max_range: 5000.0,
        ammo: AmmoState {
            missile: 2,
            bomb: 0,
            rocket: 0,
        },
        hit_prob: 1.0,
        ..Default::default()
    }
}

fn site(id: i32, x: f64, y: f64) -> TargetState {
    TargetState {
        id,
        position: Position::ground(x, y),
        value: 40.0,
        ..Default::default()
    }
}

#[test]
fn test_strike_package_clears_all_targets() {
    let scenario = Scenario {
        platforms: vec![striker(1, 0.0), striker(2, 500.0)],
        targets: vec![site(1, 0.0, 1500.0), site(2, 500.0, 1500.0)],
    };
    let mut rig = Rig::start(&scenario);

    let cleared = rig.wait_for(Duration::from_secs(15), |r| r.world.alive_targets() == 0);
    // Let the cool-down lapse so the last kill is forwarded and replanned.
    std::thread::sleep(Duration::from_millis(700));
    rig.shutdown();
    assert!(cleared, "targets left: {}", rig.world.alive_targets());

    let seen = rig.seen.lock();
    let killed: Vec<i32> = seen
        .iter()
        .filter_map(|e| match e {
            Envelope::EntityKilled(k) if k.side == EntitySide::Target => Some(k.entity_id),
            _ => None,
        })
        .collect();
    assert!(killed.contains(&1) && killed.contains(&2), "kills reported: {killed:?}");
    assert!(seen.iter().any(|e| matches!(e, Envelope::Fired(_))));
    assert!(seen.iter().any(|e| matches!(e, Envelope::StatusReport(_))));

    let plans = seen.iter().filter(|e| matches!(e, Envelope::PlanRequest(_))).count();
    assert!(plans >= 2, "a kill should have triggered a replan");

    let stats = rig.orchestrator.statistics();
    assert!(stats.plans_accepted >= 2);
    assert!(rig.executor.statistics().total_tasks >= 2);
}

#[test]
fn test_unit_lost_mid_approach() {
    let scenario = Scenario {
        platforms: vec![striker(1, 0.0)],
        targets: vec![site(1, 0.0, 20_000.0)],
    };
    let mut rig = Rig::start(&scenario);

    assert!(rig.wait_for(Duration::from_secs(5), |r| r.executor.active_task_count() == 1));
    assert!(rig.wait_for(Duration::from_secs(5), |r| {
        r.world.unit(1).is_some_and(|u| u.position.y > 0.0)
    }));

    assert!(rig.world.kill_unit(1));
    assert!(rig.wait_for(Duration::from_secs(5), |r| r.executor.active_task_count() == 0));
    std::thread::sleep(Duration::from_millis(300));
    rig.shutdown();

    assert!(rig.world.target_alive(1));
    let seen = rig.seen.lock();
    assert!(seen.iter().any(|e| matches!(
        e,
        Envelope::EntityKilled(k) if k.side == EntitySide::Platform && k.entity_id == 1
    )));
    // The dead unit drops out of later status reports.
    let last_status = seen.iter().rev().find_map(|e| match e {
        Envelope::StatusReport(r) => Some(r),
        _ => None,
    });
    assert!(last_status.is_some_and(|r| r.platforms.is_empty()));
}
