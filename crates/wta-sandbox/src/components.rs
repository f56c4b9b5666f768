//! ECS components of the sandbox world.
//!
//! Every entity carries a [`Position`](wta_core::types::Position) plus
//! either a [`Unit`] or a [`Target`] record. Orders are separate
//! components so a `stop` is just their removal.

use wta_core::state::{PlatformState, TargetState};
use wta_core::types::{Position, TargetId};

/// Platform record. Its `position` field is stale; the `Position`
/// component is authoritative.
#[derive(Debug, Clone)]
pub struct Unit(pub PlatformState);

/// Target record, same convention as [`Unit`].
#[derive(Debug, Clone)]
pub struct Target(pub TargetState);

/// Where the unit is flying to.
#[derive(Debug, Clone, Copy)]
pub struct NavGoal(pub Position);

/// Target the unit is pointed at.
#[derive(Debug, Clone, Copy)]
pub struct AimAt(pub TargetId);

/// Weapon release set up, resolved on the next step.
#[derive(Debug, Clone)]
pub struct FireOrder {
    pub target: TargetId,
    pub weapon: String,
}

/// Marker: the unit is withdrawing.
#[derive(Debug, Clone, Copy)]
pub struct Egressing;
