//! Application config: one JSON file, every section optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wta_core::enums::LogLevel;
use wta_exec::ExecutorConfig;
use wta_net::SolverClientConfig;
use wta_orchestrator::OrchestratorConfig;
use wta_sandbox::SandboxConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the sandbox population comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// JSON scenario file. When unset a demo scenario is generated.
    pub path: Option<PathBuf>,
    pub demo_platforms: usize,
    pub demo_targets: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            path: None,
            demo_platforms: 4,
            demo_targets: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogForwardingConfig {
    pub enabled: bool,
    /// Component name shown on the solver's dashboard.
    pub component: String,
    pub min_level: LogLevel,
}

impl Default for LogForwardingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            component: "orchestrator".into(),
            min_level: LogLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub solver: SolverClientConfig,
    pub orchestrator: OrchestratorConfig,
    pub executor: ExecutorConfig,
    pub sandbox: SandboxConfig,
    pub scenario: ScenarioConfig,
    pub log_forwarding: LogForwardingConfig,
    /// Sandbox seconds per wall-clock second.
    pub time_scale: f64,
    /// Wall-clock run limit. Unset runs until every target is destroyed.
    pub run_secs: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            solver: SolverClientConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            executor: ExecutorConfig::default(),
            sandbox: SandboxConfig::default(),
            scenario: ScenarioConfig::default(),
            log_forwarding: LogForwardingConfig::default(),
            time_scale: 1.0,
            run_secs: None,
        }
    }
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall a loop or make every call time out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.orchestrator;
        let periods = [
            ("orchestrator.reporter_period_secs", o.reporter_period_secs),
            ("orchestrator.scheduler_period_secs", o.scheduler_period_secs),
            ("orchestrator.executor_period_secs", o.executor_period_secs),
            ("sandbox.step_secs", self.sandbox.step_secs),
            ("time_scale", self.time_scale),
        ];
        for (name, value) in periods {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let s = &self.solver;
        let timeouts = [
            ("orchestrator.plan_request_timeout_ms", o.plan_request_timeout_ms),
            ("solver.connect_timeout_ms", s.connect_timeout_ms),
            ("solver.status_timeout_ms", s.status_timeout_ms),
            ("solver.event_timeout_ms", s.event_timeout_ms),
            ("solver.log_timeout_ms", s.log_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }

        if o.max_events_per_drain == 0 {
            return Err(ConfigError::Invalid("orchestrator.max_events_per_drain must be non-zero".into()));
        }
        if s.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("solver.endpoint is empty".into()));
        }
        if let Some(limit) = self.run_secs {
            if !(limit > 0.0 && limit.is_finite()) {
                return Err(ConfigError::Invalid(format!("run_secs must be positive, got {limit}")));
            }
        }
        Ok(())
    }
}
