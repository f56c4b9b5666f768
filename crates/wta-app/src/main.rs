use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use wta_app::{AppConfig, Runtime};
use wta_core::enums::LogLevel;
use wta_net::SolverLogSink;

fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    let log_sink = config.log_forwarding.enabled.then(|| {
        SolverLogSink::new(
            config.log_forwarding.component.clone(),
            config.log_forwarding.min_level,
        )
    });
    init_tracing(log_sink.clone());

    let mut runtime = Runtime::build(config, log_sink).context("building runtime")?;
    let summary = runtime.run().context("running orchestrator")?;

    tracing::info!(
        wall_secs = summary.wall_secs,
        targets_alive = summary.targets_alive,
        plans_accepted = summary.orchestrator.plans_accepted,
        tasks_completed = summary.tasks.completed_tasks,
        "run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Terminal layer filtered by `RUST_LOG` (default `info`), plus the
/// solver dashboard layer when forwarding is on.
fn init_tracing(log_sink: Option<SolverLogSink>) {
    let terminal_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let terminal_layer = fmt::layer().with_target(false).with_filter(terminal_filter);

    match log_sink {
        Some(sink) => {
            let sink_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .without_time()
                .with_level(false)
                .with_writer(sink.clone())
                .with_filter(level_filter(sink.min_level()));
            tracing_subscriber::registry()
                .with(terminal_layer)
                .with(sink_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(terminal_layer).init();
        }
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}
