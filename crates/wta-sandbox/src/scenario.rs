//! Scenario files and a seeded demo generator.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use wta_core::enums::{PlatformRole, TargetKind};
use wta_core::state::{AmmoState, PlatformState, TargetState};
use wta_core::types::Position;

/// Solver type code of each target kind.
const TARGET_KINDS: [TargetKind; 4] = [
    TargetKind::Infantry,
    TargetKind::Armor,
    TargetKind::Sam,
    TargetKind::Other,
];

/// Initial population of a sandbox world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub platforms: Vec<PlatformState>,
    pub targets: Vec<TargetState>,
}

impl Scenario {
    /// `n_platforms` strike aircraft on a line south of the origin and
    /// `n_targets` ground targets scattered to the north, SAM sites in
    /// tier 0 and everything else in tier 1. Ids start at 1
    /// on each side. Same seed, same scenario.
    pub fn demo(n_platforms: usize, n_targets: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let all_kinds: BTreeSet<i32> = (0..TARGET_KINDS.len() as i32).collect();

        let platforms = (0..n_platforms)
            .map(|i| {
                let x = (i as f64 - (n_platforms as f64 - 1.0) / 2.0) * 500.0;
                PlatformState {
                    id: i as i32 + 1,
                    role: PlatformRole::MultiRole,
                    position: Position::new(x, -6000.0, 300.0),
                    max_range: 5000.0,
                    ammo: AmmoState {
                        missile: 2,
                        bomb: 1,
                        rocket: 0,
                    },
                    target_types: all_kinds.clone(),
                    max_targets: 1,
                    hit_prob: rng.gen_range(0.7..0.95),
                    cost: rng.gen_range(5.0..20.0),
                    platform_type: "strike".into(),
                    fuel: 1.0,
                    ..Default::default()
                }
            })
            .collect();

        let targets = (0..n_targets)
            .map(|j| {
                let kind = TARGET_KINDS[rng.gen_range(0..TARGET_KINDS.len())];
                TargetState {
                    id: j as i32 + 1,
                    kind,
                    tier: u32::from(kind != TargetKind::Sam),
                    value: rng.gen_range(10.0..100.0),
                    position: Position::ground(
                        rng.gen_range(-3000.0..3000.0),
                        rng.gen_range(2000.0..6000.0),
                    ),
                    target_type: format!("{kind:?}").to_lowercase(),
                    ..Default::default()
                }
            })
            .collect();

        Self { platforms, targets }
    }
}
