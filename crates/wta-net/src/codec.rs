//! Wire envelope and length-prefixed framing.
//!
//! A frame is a 4-byte big-endian payload length followed by the
//! bincode encoding of one [`Envelope`]. Frames above
//! [`MAX_FRAME_BYTES`] are refused in both directions.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use wta_core::constants::MAX_FRAME_BYTES;
use wta_core::messages::{
    DamageReport, FiredReport, KillReport, LogLine, PlanRequest, PlanResponse, StatusReport,
};

use crate::error::NetError;
use crate::legacy::{LegacySolveRequest, LegacySolveResponse};

/// One message on the wire. Variant order is part of the format; append
/// only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    StatusReport(StatusReport),
    EntityKilled(KillReport),
    Damage(DamageReport),
    Fired(FiredReport),
    PlanRequest(PlanRequest),
    PlanResponse(PlanResponse),
    Log(LogLine),
    /// Reply to any fire-and-forget report.
    Ack,
    SolveRequest(LegacySolveRequest),
    SolveResponse(LegacySolveResponse),
}

impl Envelope {
    pub fn label(&self) -> &'static str {
        match self {
            Envelope::StatusReport(_) => "status_report",
            Envelope::EntityKilled(_) => "entity_killed",
            Envelope::Damage(_) => "damage",
            Envelope::Fired(_) => "fired",
            Envelope::PlanRequest(_) => "plan_request",
            Envelope::PlanResponse(_) => "plan_response",
            Envelope::Log(_) => "log",
            Envelope::Ack => "ack",
            Envelope::SolveRequest(_) => "solve_request",
            Envelope::SolveResponse(_) => "solve_response",
        }
    }
}

/// Payload bytes of one envelope, without the length prefix.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, NetError> {
    let bytes = bincode::serialize(envelope).map_err(|e| NetError::Encode(e.to_string()))?;
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge {
            size: bytes.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, NetError> {
    bincode::deserialize(bytes).map_err(|e| NetError::Decode(e.to_string()))
}

pub fn write_frame<W: Write>(writer: &mut W, envelope: &Envelope) -> Result<(), NetError> {
    let payload = encode(envelope)?;
    let len = payload.len() as u32;

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Envelope, NetError> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_BYTES,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    decode(&payload)
}
