//! Core types and definitions for the WTA engagement orchestrator.
//!
//! This crate defines the vocabulary shared across all other crates:
//! entity records, assignment matrices, solver messages, domain events,
//! task stages and tuning constants. It has no dependency on threads,
//! sockets or any host engine.

pub mod clock;
pub mod constants;
pub mod enums;
pub mod events;
pub mod messages;
pub mod state;
pub mod types;
