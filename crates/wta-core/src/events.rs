//! Domain events injected by the host and consumed by the plan scheduler.

use serde::{Deserialize, Serialize};

use crate::clock::monotonic_secs;
use crate::enums::{EntitySide, EventKind};
use crate::types::{EntityId, PlatformId, TargetId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// A platform or target was destroyed.
    EntityKilled { entity_id: EntityId, side: EntitySide },
    /// A platform or target took damage.
    Damage {
        entity_id: EntityId,
        side: EntitySide,
        amount: f64,
    },
    /// A platform discharged a weapon.
    Fired {
        platform_id: PlatformId,
        target_id: TargetId,
        weapon: String,
        ammo_left: i32,
    },
    /// Someone asked for a fresh plan.
    ReplanRequest,
    /// Heartbeat from the host frame loop.
    PeriodicTick,
}

/// A timestamped domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic seconds (see [`crate::clock`]).
    pub timestamp: f64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            timestamp: monotonic_secs(),
            payload,
        }
    }

    pub fn at(timestamp: f64, payload: EventPayload) -> Self {
        Self { timestamp, payload }
    }

    pub fn entity_killed(entity_id: EntityId, side: EntitySide) -> Self {
        Self::new(EventPayload::EntityKilled { entity_id, side })
    }

    pub fn damage(entity_id: EntityId, side: EntitySide, amount: f64) -> Self {
        Self::new(EventPayload::Damage {
            entity_id,
            side,
            amount,
        })
    }

    pub fn fired(
        platform_id: PlatformId,
        target_id: TargetId,
        weapon: impl Into<String>,
        ammo_left: i32,
    ) -> Self {
        Self::new(EventPayload::Fired {
            platform_id,
            target_id,
            weapon: weapon.into(),
            ammo_left,
        })
    }

    pub fn replan_request() -> Self {
        Self::new(EventPayload::ReplanRequest)
    }

    pub fn periodic_tick() -> Self {
        Self::new(EventPayload::PeriodicTick)
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::EntityKilled { .. } => EventKind::EntityKilled,
            EventPayload::Damage { .. } => EventKind::Damage,
            EventPayload::Fired { .. } => EventKind::Fired,
            EventPayload::ReplanRequest => EventKind::ReplanRequest,
            EventPayload::PeriodicTick => EventKind::PeriodicTick,
        }
    }

    pub fn triggers_replan(&self) -> bool {
        self.kind().triggers_replan()
    }
}
