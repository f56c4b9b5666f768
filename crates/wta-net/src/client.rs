//! Client side of the solving service.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use wta_core::constants::*;
use wta_core::messages::{
    DamageReport, FiredReport, KillReport, LogLine, PlanRequest, PlanResponse, StatusReport,
};

use crate::codec::{read_frame, write_frame, Envelope};
use crate::error::NetError;
use crate::legacy::LegacySolveRequest;

/// Everything the orchestrator sends to the solver.
///
/// Reports are fire-and-forget with short timeouts; callers drop their
/// errors. `request_plan` is the one blocking round trip.
pub trait SolverClient: Send + Sync {
    fn report_status(&self, report: &StatusReport) -> Result<(), NetError>;

    fn report_killed(&self, report: &KillReport) -> Result<(), NetError>;

    fn report_damage(&self, report: &DamageReport) -> Result<(), NetError>;

    fn report_fired(&self, report: &FiredReport) -> Result<(), NetError>;

    fn send_log(&self, line: &LogLine) -> Result<(), NetError>;

    fn request_plan(
        &self,
        request: &PlanRequest,
        timeout: Duration,
    ) -> Result<PlanResponse, NetError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverClientConfig {
    /// `host:port`; a leading `tcp://` is accepted.
    pub endpoint: String,
    pub connect_timeout_ms: u64,
    pub status_timeout_ms: u64,
    pub event_timeout_ms: u64,
    pub log_timeout_ms: u64,
    /// Speak the older solve request/response pair instead of plan
    /// request/response.
    pub legacy_protocol: bool,
    pub mission_id: String,
}

impl Default for SolverClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOLVER_ENDPOINT.to_string(),
            connect_timeout_ms: PLAN_REQUEST_TIMEOUT_MS,
            status_timeout_ms: STATUS_REPORT_TIMEOUT_MS,
            event_timeout_ms: EVENT_REPORT_TIMEOUT_MS,
            log_timeout_ms: LOG_REPORT_TIMEOUT_MS,
            legacy_protocol: false,
            mission_id: String::new(),
        }
    }
}

/// Request/reply client over a single TCP connection.
///
/// Every call writes one frame and waits for one reply frame. The
/// connection is opened lazily and dropped after any failure, so a late
/// reply can never be read as the answer to the next request. The
/// connection lock doubles as the one-in-flight guard: a caller that
/// cannot take it within its timeout gets [`NetError::Busy`].
pub struct TcpSolverClient {
    config: SolverClientConfig,
    conn: Mutex<Option<TcpStream>>,
}

impl TcpSolverClient {
    pub fn new(config: SolverClientConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SolverClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    fn resolve(&self) -> Result<SocketAddr, NetError> {
        let endpoint = self
            .config
            .endpoint
            .strip_prefix("tcp://")
            .unwrap_or(&self.config.endpoint);
        endpoint
            .to_socket_addrs()
            .map_err(|e| NetError::BadEndpoint(format!("{endpoint}: {e}")))?
            .next()
            .ok_or_else(|| NetError::BadEndpoint(endpoint.to_string()))
    }

    fn round_trip(&self, envelope: &Envelope, timeout: Duration) -> Result<Envelope, NetError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.conn.try_lock_for(timeout).ok_or(NetError::Busy)?;

        self.exchange(&mut guard, envelope, deadline, timeout)
    }

    fn exchange(
        &self,
        conn: &mut Option<TcpStream>,
        envelope: &Envelope,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Envelope, NetError> {
        let remaining = || {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(NetError::Timeout(timeout))
            } else {
                Ok(left)
            }
        };

        // Taken out for the exchange and put back only on success.
        let mut stream = match conn.take() {
            Some(stream) => stream,
            None => self.connect(remaining()?, timeout)?,
        };

        let io = |e: NetError| match e {
            NetError::Io(err) => NetError::from_io(err, timeout),
            other => other,
        };

        stream.set_write_timeout(Some(remaining()?))?;
        write_frame(&mut stream, envelope).map_err(io)?;
        stream.set_read_timeout(Some(remaining()?))?;
        let reply = read_frame(&mut stream).map_err(io)?;

        *conn = Some(stream);
        Ok(reply)
    }

    fn connect(&self, budget: Duration, timeout: Duration) -> Result<TcpStream, NetError> {
        let addr = self.resolve()?;
        let limit = Duration::from_millis(self.config.connect_timeout_ms.max(1));
        let stream = TcpStream::connect_timeout(&addr, budget.min(limit))
            .map_err(|e| NetError::from_io(e, timeout))?;
        stream.set_nodelay(true)?;
        tracing::debug!(%addr, "connected to solver");
        Ok(stream)
    }

    fn report(&self, envelope: Envelope, timeout_ms: u64) -> Result<(), NetError> {
        match self.round_trip(&envelope, Duration::from_millis(timeout_ms.max(1)))? {
            Envelope::Ack => Ok(()),
            other => Err(NetError::UnexpectedReply {
                expected: "ack",
                got: other.label(),
            }),
        }
    }
}

impl SolverClient for TcpSolverClient {
    fn report_status(&self, report: &StatusReport) -> Result<(), NetError> {
        self.report(
            Envelope::StatusReport(report.clone()),
            self.config.status_timeout_ms,
        )
    }

    fn report_killed(&self, report: &KillReport) -> Result<(), NetError> {
        self.report(
            Envelope::EntityKilled(report.clone()),
            self.config.event_timeout_ms,
        )
    }

    fn report_damage(&self, report: &DamageReport) -> Result<(), NetError> {
        self.report(Envelope::Damage(report.clone()), self.config.event_timeout_ms)
    }

    fn report_fired(&self, report: &FiredReport) -> Result<(), NetError> {
        self.report(Envelope::Fired(report.clone()), self.config.event_timeout_ms)
    }

    fn send_log(&self, line: &LogLine) -> Result<(), NetError> {
        self.report(Envelope::Log(line.clone()), self.config.log_timeout_ms)
    }

    fn request_plan(
        &self,
        request: &PlanRequest,
        timeout: Duration,
    ) -> Result<PlanResponse, NetError> {
        let envelope = if self.config.legacy_protocol {
            Envelope::SolveRequest(LegacySolveRequest::from_plan_request(
                self.config.mission_id.clone(),
                request,
            ))
        } else {
            Envelope::PlanRequest(request.clone())
        };

        match self.round_trip(&envelope, timeout)? {
            Envelope::PlanResponse(response) => Ok(response),
            Envelope::SolveResponse(legacy) => {
                let mut response = PlanResponse::from(legacy);
                response.timestamp = request.timestamp;
                Ok(response)
            }
            other => Err(NetError::UnexpectedReply {
                expected: "plan_response",
                got: other.label(),
            }),
        }
    }
}
