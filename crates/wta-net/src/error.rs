//! Transport error type.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from talking to the solving service.
///
/// None of these are fatal to the orchestrator: the caller logs, keeps its
/// last good plan and tries again after the cool-down.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot resolve solver endpoint: {0}")]
    BadEndpoint(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Frame too large: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Another request is still in flight")]
    Busy,

    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },
}

impl NetError {
    /// Fold socket timeouts into [`NetError::Timeout`].
    pub(crate) fn from_io(err: io::Error, timeout: Duration) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::Timeout(timeout),
            _ => NetError::Io(err),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout(_))
    }
}
