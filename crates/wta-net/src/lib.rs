//! Transport to the external solving service.
//!
//! Length-framed bincode envelopes over TCP, a blocking request/reply
//! client, a `tracing` writer that forwards log lines to the solver, and
//! the adapter for the older solve message pair.

pub mod client;
pub mod codec;
pub mod error;
pub mod legacy;
pub mod log_sink;

pub use client::{SolverClient, SolverClientConfig, TcpSolverClient};
pub use codec::Envelope;
pub use error::NetError;
pub use log_sink::SolverLogSink;
