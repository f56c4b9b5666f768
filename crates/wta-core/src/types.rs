//! Fundamental identifiers and geometric types.

use serde::{Deserialize, Serialize};

/// Stable integer key of an entity in the host world.
pub type EntityId = i32;

/// Id of a controllable platform (unit).
pub type PlatformId = EntityId;

/// Id of an engageable target.
pub type TargetId = EntityId;

/// Position in world space (meters, Cartesian).
/// x = East, y = North, z = Up (altitude).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane position (altitude zero).
    pub fn ground(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Range to another position in meters (3D distance).
    pub fn range_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Horizontal range (ignoring altitude). All engagement distances are
    /// measured this way.
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bearing to another position in radians (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.atan2(dy).rem_euclid(std::f64::consts::TAU)
    }

    /// Same ground point, different altitude.
    pub fn with_altitude(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Point `distance` meters from `self`, directly away from `threat`
    /// in the ground plane. A threat closer than 1 m is treated as 1 m
    /// due south of us, so the egress heads north.
    pub fn away_from(&self, threat: &Position, distance: f64) -> Position {
        let mut dx = self.x - threat.x;
        let mut dy = self.y - threat.y;
        let mut len = (dx * dx + dy * dy).sqrt();
        if len < 1.0 {
            dx = 0.0;
            dy = 1.0;
            len = 1.0;
        }
        Position::new(
            self.x + dx / len * distance,
            self.y + dy / len * distance,
            self.z,
        )
    }

    /// Step toward `goal` by at most `max_step` meters.
    pub fn step_toward(&self, goal: &Position, max_step: f64) -> Position {
        let dist = self.range_to(goal);
        if dist <= max_step || dist <= f64::EPSILON {
            return *goal;
        }
        let f = max_step / dist;
        Position::new(
            self.x + (goal.x - self.x) * f,
            self.y + (goal.y - self.y) * f,
            self.z + (goal.z - self.z) * f,
        )
    }
}
