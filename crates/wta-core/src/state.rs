//! World records sampled from the host and the assignment matrix the
//! solver returns over them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{PlatformId, Position, TargetId};

/// Per-class munition counts of a platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoState {
    pub missile: i32,
    pub bomb: i32,
    pub rocket: i32,
}

impl AmmoState {
    pub fn total(&self) -> i32 {
        self.missile + self.bomb + self.rocket
    }
}

/// One magazine carried by a platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagazineDetail {
    /// Magazine class name.
    pub name: String,
    pub ammo_count: i32,
    pub loaded: bool,
}

/// A controllable platform as seen by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformState {
    pub id: PlatformId,
    pub role: PlatformRole,
    pub position: Position,
    /// Maximum engagement range (meters).
    pub max_range: f64,
    pub ammo: AmmoState,
    pub alive: bool,
    /// Target kinds (as solver type codes) this platform can engage.
    pub target_types: BTreeSet<i32>,
    /// Maximum number of targets assigned at once.
    pub max_targets: u32,
    pub quantity: u32,
    pub hit_prob: f64,
    pub cost: f64,
    /// Host class name of the vehicle.
    #[serde(default)]
    pub platform_type: String,
    #[serde(default)]
    pub magazines: Vec<MagazineDetail>,
    /// Remaining fuel (0.0 - 1.0).
    #[serde(default)]
    pub fuel: f64,
    /// Accumulated damage (0.0 = intact, 1.0 = destroyed).
    #[serde(default)]
    pub damage: f64,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            id: 0,
            role: PlatformRole::default(),
            position: Position::default(),
            max_range: 0.0,
            ammo: AmmoState::default(),
            alive: true,
            target_types: BTreeSet::new(),
            max_targets: 1,
            quantity: 1,
            hit_prob: 0.0,
            cost: 0.0,
            platform_type: String::new(),
            magazines: Vec::new(),
            fuel: 0.0,
            damage: 0.0,
        }
    }
}

/// An engageable target as seen by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub id: TargetId,
    pub kind: TargetKind,
    /// Ordering tier (0 engages first).
    pub tier: u32,
    pub value: f64,
    pub position: Position,
    /// Targets that must be destroyed before this one.
    pub prerequisites: Vec<TargetId>,
    pub alive: bool,
    /// Host display name of the target type.
    #[serde(default)]
    pub target_type: String,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            id: 0,
            kind: TargetKind::default(),
            tier: 0,
            value: 0.0,
            position: Position::default(),
            prerequisites: Vec::new(),
            alive: true,
            target_type: String::new(),
        }
    }
}

/// Everything one sample of the host world produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub platforms: Vec<PlatformState>,
    pub targets: Vec<TargetState>,
}

impl WorldSnapshot {
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty() && self.targets.is_empty()
    }

    /// Ids in sample order; the solver's matrix rows and columns follow it.
    pub fn roster(&self) -> Roster {
        Roster {
            platforms: self.platforms.iter().map(|p| p.id).collect(),
            targets: self.targets.iter().map(|t| t.id).collect(),
        }
    }
}

/// Ordered platform and target ids an assignment matrix indexes into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub platforms: Vec<PlatformId>,
    pub targets: Vec<TargetId>,
}

impl Roster {
    /// Roster where row `i` is platform `i + 1` and column `j` is target
    /// `j + 1`, the id scheme of hosts that number entities from one.
    pub fn sequential(n_platforms: usize, n_targets: usize) -> Self {
        Self {
            platforms: (1..=n_platforms as PlatformId).collect(),
            targets: (1..=n_targets as TargetId).collect(),
        }
    }
}

/// Dense row-major platform × target boolean matrix.
///
/// Cells hold 0 or 1 on the wire; any non-zero byte reads as assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentMatrix {
    pub n_platforms: usize,
    pub n_targets: usize,
    pub cells: Vec<u8>,
}

impl AssignmentMatrix {
    /// All-zero matrix of the given shape.
    pub fn new(n_platforms: usize, n_targets: usize) -> Self {
        Self {
            n_platforms,
            n_targets,
            cells: vec![0; n_platforms.checked_mul(n_targets).unwrap_or(0)],
        }
    }

    /// Wrap raw cells. The length is not checked here; lookups outside the
    /// buffer read as unassigned.
    pub fn from_cells(n_platforms: usize, n_targets: usize, cells: Vec<u8>) -> Self {
        Self {
            n_platforms,
            n_targets,
            cells,
        }
    }

    /// Flat offset of a cell, or `None` if it does not fit in `usize`.
    pub fn index(&self, platform: usize, target: usize) -> Option<usize> {
        platform.checked_mul(self.n_targets)?.checked_add(target)
    }

    pub fn is_assigned(&self, platform: usize, target: usize) -> bool {
        if platform >= self.n_platforms || target >= self.n_targets {
            return false;
        }
        self.index(platform, target)
            .and_then(|idx| self.cells.get(idx))
            .is_some_and(|c| *c > 0)
    }

    /// Set a cell. Coordinates outside the shape or the buffer are ignored.
    pub fn set(&mut self, platform: usize, target: usize, assigned: bool) {
        if platform >= self.n_platforms || target >= self.n_targets {
            return;
        }
        if let Some(cell) = self
            .index(platform, target)
            .and_then(|idx| self.cells.get_mut(idx))
        {
            *cell = u8::from(assigned);
        }
    }

    /// `(platform_index, target_index)` of every assigned cell, row-major.
    /// Walks the buffer, not the declared shape; cells past the shape are
    /// skipped.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n_targets = self.n_targets;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| n_targets > 0 && **c > 0)
            .map(move |(k, _)| (k / n_targets, k % n_targets))
            .filter(move |&(i, _)| i < self.n_platforms)
    }

    /// Whether the buffer length matches the declared shape.
    pub fn is_well_formed(&self) -> bool {
        self.n_platforms
            .checked_mul(self.n_targets)
            .is_some_and(|n| n == self.cells.len())
    }
}
