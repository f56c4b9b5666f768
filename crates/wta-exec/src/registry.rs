//! Units and targets the executor may schedule against.
//!
//! The registry is filled from the roster of each accepted plan and holds
//! only ids plus the executor's own view of what each unit is doing. Live
//! state (alive, position, ammo) always comes from the lookup port.

use std::collections::{BTreeMap, BTreeSet};

use wta_core::enums::TaskStage;
use wta_core::state::Roster;
use wta_core::types::{PlatformId, TargetId};

/// What the executor currently has a unit doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitStatus {
    #[default]
    Idle,
    NavigatingToTarget,
    Aiming,
    Firing,
    Egressing,
}

impl UnitStatus {
    /// Status shown for a unit whose task sits in `stage`.
    pub fn for_stage(stage: TaskStage) -> Self {
        match stage {
            TaskStage::Pending | TaskStage::Navigate | TaskStage::Approach => {
                UnitStatus::NavigatingToTarget
            }
            TaskStage::Aiming => UnitStatus::Aiming,
            TaskStage::Firing | TaskStage::Verify => UnitStatus::Firing,
            TaskStage::Egress => UnitStatus::Egressing,
            TaskStage::Completed | TaskStage::Failed => UnitStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct UnitEntry {
    status: UnitStatus,
    current_target: Option<TargetId>,
}

/// Known unit and target ids.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    units: BTreeMap<PlatformId, UnitEntry>,
    targets: BTreeSet<TargetId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Re-registering keeps its current status.
    pub fn register_unit(&mut self, id: PlatformId) {
        self.units.entry(id).or_default();
    }

    pub fn register_target(&mut self, id: TargetId) {
        self.targets.insert(id);
    }

    /// Register every id of a plan roster.
    pub fn register_roster(&mut self, roster: &Roster) {
        for &id in &roster.platforms {
            self.register_unit(id);
        }
        for &id in &roster.targets {
            self.register_target(id);
        }
    }

    pub fn has_unit(&self, id: PlatformId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn has_target(&self, id: TargetId) -> bool {
        self.targets.contains(&id)
    }

    pub fn unit_status(&self, id: PlatformId) -> Option<UnitStatus> {
        self.units.get(&id).map(|e| e.status)
    }

    pub fn current_target(&self, id: PlatformId) -> Option<TargetId> {
        self.units.get(&id).and_then(|e| e.current_target)
    }

    pub(crate) fn assign(&mut self, id: PlatformId, target: TargetId) {
        if let Some(entry) = self.units.get_mut(&id) {
            entry.status = UnitStatus::NavigatingToTarget;
            entry.current_target = Some(target);
        }
    }

    pub(crate) fn set_status(&mut self, id: PlatformId, status: UnitStatus) {
        if let Some(entry) = self.units.get_mut(&id) {
            entry.status = status;
        }
    }

    pub(crate) fn release(&mut self, id: PlatformId) {
        if let Some(entry) = self.units.get_mut(&id) {
            entry.status = UnitStatus::Idle;
            entry.current_target = None;
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Forget every id.
    pub fn clear(&mut self) {
        self.units.clear();
        self.targets.clear();
    }
}
