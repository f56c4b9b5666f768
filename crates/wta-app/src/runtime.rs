//! Wiring of sandbox, executor, solver client and orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use wta_exec::{TaskExecutor, TaskStatistics};
use wta_net::{SolverLogSink, TcpSolverClient};
use wta_orchestrator::{Orchestrator, OrchestratorStatistics};
use wta_sandbox::{SandboxWorld, Scenario};

use crate::config::{AppConfig, ConfigError, ScenarioConfig};
use crate::host_loop::{HostCommand, HostLoop};

/// How often `run` checks its stop conditions.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a finished run looked like.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub wall_secs: f64,
    pub sandbox_secs: f64,
    pub frames: u64,
    pub units_alive: usize,
    pub targets_alive: usize,
    pub orchestrator: OrchestratorStatistics,
    pub tasks: TaskStatistics,
}

/// Read the scenario file, or generate the demo one.
pub fn load_scenario(config: &ScenarioConfig, seed: u64) -> Result<Scenario, ConfigError> {
    match &config.path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(Scenario::demo(config.demo_platforms, config.demo_targets, seed)),
    }
}

pub struct Runtime {
    config: AppConfig,
    world: Arc<SandboxWorld>,
    executor: Arc<TaskExecutor>,
    orchestrator: Orchestrator,
    log_sink: Option<SolverLogSink>,
    host: Option<HostLoop>,
    started_at: Option<Instant>,
}

impl Runtime {
    /// Build every part without starting any thread. Kill and fired
    /// events from the world go straight onto the orchestrator's bus.
    pub fn build(config: AppConfig, log_sink: Option<SolverLogSink>) -> Result<Self, ConfigError> {
        let scenario = load_scenario(&config.scenario, config.sandbox.seed)?;
        let world = Arc::new(SandboxWorld::from_scenario(config.sandbox.clone(), &scenario));
        let executor = Arc::new(TaskExecutor::new(
            world.clone(),
            world.clone(),
            config.executor.clone(),
        ));
        let solver = Arc::new(TcpSolverClient::new(config.solver.clone()));
        let orchestrator = Orchestrator::new(
            config.orchestrator.clone(),
            world.clone(),
            solver,
            executor.clone(),
        );

        let bus = orchestrator.event_bus();
        world.set_event_sink(move |event| bus.publish(event));

        // Log lines get their own connection so they never queue behind a
        // plan request.
        if let Some(sink) = &log_sink {
            sink.init(Arc::new(TcpSolverClient::new(config.solver.clone())));
        }

        tracing::info!(
            platforms = scenario.platforms.len(),
            targets = scenario.targets.len(),
            endpoint = %config.solver.endpoint,
            "runtime built"
        );
        Ok(Self {
            config,
            world,
            executor,
            orchestrator,
            log_sink,
            host: None,
            started_at: None,
        })
    }

    pub fn world(&self) -> &Arc<SandboxWorld> {
        &self.world
    }

    pub fn executor(&self) -> &Arc<TaskExecutor> {
        &self.executor
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Start the orchestrator loops and the host loop.
    pub fn start(&mut self) -> std::io::Result<()> {
        if self.host.is_some() {
            return Ok(());
        }
        if let Some(sink) = &self.log_sink {
            sink.enable();
        }
        self.orchestrator.start()?;
        match HostLoop::spawn(self.world.clone(), self.config.time_scale) {
            Ok(host) => self.host = Some(host),
            Err(e) => {
                self.orchestrator.stop();
                return Err(e);
            }
        }
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Forward a command to the host loop. False when not running.
    pub fn command(&self, command: HostCommand) -> bool {
        self.host.as_ref().is_some_and(|h| h.send(command))
    }

    /// Block until the run limit passes or no target is left, then stop.
    pub fn run(&mut self) -> std::io::Result<RunSummary> {
        self.start()?;
        let limit = self.config.run_secs.map(Duration::from_secs_f64);
        let started = self.started_at.unwrap_or_else(Instant::now);
        loop {
            if limit.is_some_and(|l| started.elapsed() >= l) {
                tracing::info!("run limit reached");
                break;
            }
            if self.world.alive_targets() == 0 {
                tracing::info!("all targets destroyed");
                break;
            }
            if self.world.alive_units() == 0 {
                tracing::info!("no units left");
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(self.stop())
    }

    /// Stop everything and summarize. Safe to call more than once.
    pub fn stop(&mut self) -> RunSummary {
        self.orchestrator.stop();
        let frames = self.host.take().map_or(0, |mut h| h.shutdown());
        if let Some(sink) = &self.log_sink {
            sink.disable();
        }
        RunSummary {
            wall_secs: self.started_at.map_or(0.0, |t| t.elapsed().as_secs_f64()),
            sandbox_secs: self.world.time(),
            frames,
            units_alive: self.world.alive_units(),
            targets_alive: self.world.alive_targets(),
            orchestrator: self.orchestrator.statistics(),
            tasks: self.executor.statistics(),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Some(sink) = &self.log_sink {
            sink.shutdown();
        }
    }
}
