//! Forwarding of local log lines to the solver's dashboard.
//!
//! [`SolverLogSink`] is a [`MakeWriter`] for a `tracing-subscriber` fmt
//! layer. Each formatted event is buffered by a [`SolverLogWriter`] and
//! sent as one `Log` envelope when the writer drops. Nothing is sent
//! until [`SolverLogSink::init`] has supplied a client and the sink is
//! enabled.

use std::cell::Cell;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

use wta_core::clock::monotonic_secs;
use wta_core::enums::LogLevel;
use wta_core::messages::LogLine;

use crate::client::SolverClient;

thread_local! {
    /// Set while this thread is inside `send_log`, so log events raised by
    /// the transport itself are not forwarded again.
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

struct SinkInner {
    component: String,
    min_level: Mutex<LogLevel>,
    enabled: AtomicBool,
    client: RwLock<Option<Arc<dyn SolverClient>>>,
}

/// Cloneable handle; all clones share one state.
#[derive(Clone)]
pub struct SolverLogSink {
    inner: Arc<SinkInner>,
}

impl SolverLogSink {
    pub fn new(component: impl Into<String>, min_level: LogLevel) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                component: component.into(),
                min_level: Mutex::new(min_level),
                enabled: AtomicBool::new(false),
                client: RwLock::new(None),
            }),
        }
    }

    /// Attach the client lines go out through. A second call is ignored.
    pub fn init(&self, client: Arc<dyn SolverClient>) {
        let mut slot = self.inner.client.write();
        if slot.is_none() {
            *slot = Some(client);
        }
    }

    pub fn enable(&self) {
        if !self.inner.enabled.swap(true, Ordering::SeqCst) {
            tracing::info!(component = %self.inner.component, "log forwarding enabled");
        }
    }

    pub fn disable(&self) {
        if self.inner.enabled.swap(false, Ordering::SeqCst) {
            tracing::info!(component = %self.inner.component, "log forwarding disabled");
        }
    }

    /// Disable and release the client.
    pub fn shutdown(&self) {
        self.disable();
        self.inner.client.write().take();
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.client.read().is_some()
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.inner.min_level.lock() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.inner.min_level.lock()
    }

    pub fn component(&self) -> &str {
        &self.inner.component
    }

    /// Send one line if the sink is live and the level passes. Returns
    /// whether a send was attempted.
    pub fn forward(&self, level: LogLevel, message: &str) -> bool {
        self.inner.forward(level, message)
    }
}

impl SinkInner {
    fn forward(&self, level: LogLevel, message: &str) -> bool {
        if !self.enabled.load(Ordering::SeqCst) || level < *self.min_level.lock() {
            return false;
        }
        if FORWARDING.with(Cell::get) {
            return false;
        }
        let Some(client) = self.client.read().clone() else {
            return false;
        };

        let line = LogLine {
            timestamp: monotonic_secs(),
            level,
            component: self.component.clone(),
            message: message.trim_end_matches('\n').to_string(),
        };

        FORWARDING.with(|f| f.set(true));
        // Dropped on failure: a log line must never take the caller down.
        let _ = client.send_log(&line);
        FORWARDING.with(|f| f.set(false));
        true
    }
}

/// Map a tracing level onto the dashboard's four levels.
pub fn log_level_of(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warning,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

impl<'a> MakeWriter<'a> for SolverLogSink {
    type Writer = SolverLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SolverLogWriter {
            inner: Arc::clone(&self.inner),
            level: LogLevel::Info,
            buf: Vec::with_capacity(256),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SolverLogWriter {
            inner: Arc::clone(&self.inner),
            level: log_level_of(meta.level()),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer. Buffers the formatted event and forwards it on
/// [`Drop`].
pub struct SolverLogWriter {
    inner: Arc<SinkInner>,
    level: LogLevel,
    buf: Vec<u8>,
}

impl Write for SolverLogWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SolverLogWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let msg = String::from_utf8_lossy(&self.buf);
        self.inner.forward(self.level, &msg);
    }
}
