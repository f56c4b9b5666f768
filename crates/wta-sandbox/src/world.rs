//! In-process host world backed by a `hecs` ECS.
//!
//! [`SandboxWorld`] plays the part of the simulation the orchestrator is
//! normally embedded in: it is sampled for status reports, answers the
//! executor's lookups, accepts unit commands and, on every [`step`],
//! moves units and resolves fire orders. Kills and shots come out as
//! [`Event`]s through an optional sink, called after the world lock is
//! released so the sink may publish straight onto an event bus.
//!
//! [`step`]: SandboxWorld::step

use std::collections::{BTreeSet, HashMap};

use hecs::{Entity, World};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use wta_core::enums::EntitySide;
use wta_core::events::Event;
use wta_core::state::{PlatformState, TargetState, WorldSnapshot};
use wta_core::types::{PlatformId, Position, TargetId};
use wta_exec::{EntityLookup, UnitController};
use wta_orchestrator::WorldSampler;

use crate::components::*;
use crate::scenario::Scenario;

/// Munition classes in the order a unit prefers them.
const WEAPON_CLASSES: [&str; 3] = ["missile", "bomb", "rocket"];

pub type EventSink = Box<dyn Fn(Event) + Send + Sync>;

/// Unit command kinds, used to make the world refuse a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Command {
    Navigate,
    Aim,
    Fire,
    Egress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub seed: u64,
    /// Unit ground speed (m/s).
    pub unit_speed: f64,
    /// Simulated seconds per host frame.
    pub step_secs: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            unit_speed: 250.0,
            step_secs: 0.05,
        }
    }
}

struct SandboxState {
    world: World,
    units: HashMap<PlatformId, Entity>,
    targets: HashMap<TargetId, Entity>,
    rng: ChaCha8Rng,
    rejected: BTreeSet<(PlatformId, Command)>,
    time: f64,
}

impl SandboxState {
    fn unit_alive(&self, id: PlatformId) -> bool {
        self.units
            .get(&id)
            .and_then(|&e| self.world.get::<&Unit>(e).ok().map(|u| u.0.alive))
            .unwrap_or(false)
    }

    fn target_alive(&self, id: TargetId) -> bool {
        self.targets
            .get(&id)
            .and_then(|&e| self.world.get::<&Target>(e).ok().map(|t| t.0.alive))
            .unwrap_or(false)
    }

    /// Entity of a live unit that has not been told to refuse `command`.
    fn commandable(&self, id: PlatformId, command: Command) -> Option<Entity> {
        if self.rejected.contains(&(id, command)) || !self.unit_alive(id) {
            return None;
        }
        self.units.get(&id).copied()
    }

    fn position(&self, entity: Entity) -> Option<Position> {
        self.world.get::<&Position>(entity).ok().map(|p| *p)
    }

    fn clear_orders(&mut self, entity: Entity) {
        let _ = self.world.remove_one::<NavGoal>(entity);
        let _ = self.world.remove_one::<AimAt>(entity);
        let _ = self.world.remove_one::<FireOrder>(entity);
    }

    fn kill_unit(&mut self, id: PlatformId) -> Option<Event> {
        let entity = *self.units.get(&id)?;
        {
            let mut unit = self.world.get::<&mut Unit>(entity).ok()?;
            if !unit.0.alive {
                return None;
            }
            unit.0.alive = false;
            unit.0.damage = 1.0;
        }
        self.clear_orders(entity);
        tracing::info!(platform_id = id, "unit destroyed");
        Some(Event::entity_killed(id, EntitySide::Platform))
    }

    fn kill_target(&mut self, id: TargetId) -> Option<Event> {
        let entity = *self.targets.get(&id)?;
        let mut target = self.world.get::<&mut Target>(entity).ok()?;
        if !target.0.alive {
            return None;
        }
        target.0.alive = false;
        tracing::info!(target_id = id, "target destroyed");
        Some(Event::entity_killed(id, EntitySide::Target))
    }

    /// Move every unit with a goal, dropping the goal on arrival.
    fn move_units(&mut self, max_step: f64) {
        let mut arrived = Vec::new();
        for (entity, (unit, pos, goal)) in self.world.query_mut::<(&Unit, &mut Position, &NavGoal)>() {
            if !unit.0.alive {
                continue;
            }
            *pos = pos.step_toward(&goal.0, max_step);
            if *pos == goal.0 {
                arrived.push(entity);
            }
        }
        for entity in arrived {
            let _ = self.world.remove_one::<NavGoal>(entity);
        }
    }

    fn resolve_fire_orders(&mut self, events: &mut Vec<Event>) {
        let orders: Vec<(Entity, FireOrder)> = self
            .world
            .query_mut::<&FireOrder>()
            .into_iter()
            .map(|(e, order)| (e, order.clone()))
            .collect();

        for (entity, order) in orders {
            let _ = self.world.remove_one::<FireOrder>(entity);

            let shooter_pos = self.position(entity);
            let shot = match self.world.get::<&mut Unit>(entity) {
                Ok(mut unit) if unit.0.alive => consume_round(&mut unit.0, &order.weapon)
                    .map(|weapon| (unit.0.id, weapon, rounds(&unit.0), unit.0.hit_prob, unit.0.max_range)),
                _ => None,
            };
            let Some((platform_id, weapon, ammo_left, hit_prob, max_range)) = shot else {
                continue;
            };
            events.push(Event::fired(platform_id, order.target, weapon.clone(), ammo_left));

            let target_pos = self.targets.get(&order.target).and_then(|&e| self.position(e));
            let in_range = match (shooter_pos, target_pos) {
                (Some(a), Some(b)) => max_range <= 0.0 || a.range_to(&b) <= max_range,
                _ => false,
            };
            let hit = in_range && self.rng.gen_bool(hit_prob.clamp(0.0, 1.0));
            tracing::debug!(platform_id, target_id = order.target, %weapon, hit, "shot resolved");
            if hit {
                events.extend(self.kill_target(order.target));
            }
        }
    }
}

/// Rounds left across munition classes and magazines.
fn rounds(unit: &PlatformState) -> i32 {
    unit.ammo.total() + unit.magazines.iter().map(|m| m.ammo_count).sum::<i32>()
}

fn best_weapon(unit: &PlatformState) -> Option<String> {
    let by_class = [unit.ammo.missile, unit.ammo.bomb, unit.ammo.rocket];
    WEAPON_CLASSES
        .iter()
        .zip(by_class)
        .find(|(_, count)| *count > 0)
        .map(|(name, _)| name.to_string())
        .or_else(|| {
            unit.magazines
                .iter()
                .find(|m| m.ammo_count > 0)
                .map(|m| m.name.clone())
        })
}

fn has_round(unit: &PlatformState, weapon: &str) -> bool {
    match weapon {
        "" => best_weapon(unit).is_some(),
        "missile" => unit.ammo.missile > 0,
        "bomb" => unit.ammo.bomb > 0,
        "rocket" => unit.ammo.rocket > 0,
        name => unit.magazines.iter().any(|m| m.name == name && m.ammo_count > 0),
    }
}

/// Take one round of `weapon` (or the best available when empty).
/// Returns the weapon actually used.
fn consume_round(unit: &mut PlatformState, weapon: &str) -> Option<String> {
    let weapon = match weapon {
        "" => best_weapon(unit)?,
        name => name.to_string(),
    };
    let slot = match weapon.as_str() {
        "missile" => &mut unit.ammo.missile,
        "bomb" => &mut unit.ammo.bomb,
        "rocket" => &mut unit.ammo.rocket,
        name => &mut unit.magazines.iter_mut().find(|m| m.name == name)?.ammo_count,
    };
    if *slot <= 0 {
        return None;
    }
    *slot -= 1;
    Some(weapon)
}

pub struct SandboxWorld {
    config: SandboxConfig,
    state: Mutex<SandboxState>,
    sink: RwLock<Option<EventSink>>,
}

impl SandboxWorld {
    pub fn new(config: SandboxConfig) -> Self {
        let state = SandboxState {
            world: World::new(),
            units: HashMap::new(),
            targets: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            rejected: BTreeSet::new(),
            time: 0.0,
        };
        Self {
            config,
            state: Mutex::new(state),
            sink: RwLock::new(None),
        }
    }

    /// World populated from a scenario. Duplicate ids after the first are
    /// skipped.
    pub fn from_scenario(config: SandboxConfig, scenario: &Scenario) -> Self {
        let world = Self::new(config);
        for p in &scenario.platforms {
            if !world.spawn_unit(p.clone()) {
                tracing::warn!(platform_id = p.id, "duplicate platform id in scenario");
            }
        }
        for t in &scenario.targets {
            if !world.spawn_target(t.clone()) {
                tracing::warn!(target_id = t.id, "duplicate target id in scenario");
            }
        }
        world
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Returns false when the id is taken.
    pub fn spawn_unit(&self, unit: PlatformState) -> bool {
        let mut s = self.state.lock();
        if s.units.contains_key(&unit.id) {
            return false;
        }
        let id = unit.id;
        let entity = s.world.spawn((unit.position, Unit(unit)));
        s.units.insert(id, entity);
        true
    }

    /// Returns false when the id is taken.
    pub fn spawn_target(&self, target: TargetState) -> bool {
        let mut s = self.state.lock();
        if s.targets.contains_key(&target.id) {
            return false;
        }
        let id = target.id;
        let entity = s.world.spawn((target.position, Target(target)));
        s.targets.insert(id, entity);
        true
    }

    /// Route kill and fired events somewhere, typically an event bus.
    pub fn set_event_sink<F>(&self, sink: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        *self.sink.write() = Some(Box::new(sink));
    }

    /// Make the unit refuse (or accept again) one kind of command.
    pub fn set_rejecting(&self, unit: PlatformId, command: Command, reject: bool) {
        let mut s = self.state.lock();
        if reject {
            s.rejected.insert((unit, command));
        } else {
            s.rejected.remove(&(unit, command));
        }
    }

    /// Advance the world by `dt` seconds.
    pub fn step(&self, dt: f64) {
        let mut events = Vec::new();
        {
            let mut s = self.state.lock();
            s.time += dt;
            s.move_units(self.config.unit_speed * dt.max(0.0));
            s.resolve_fire_orders(&mut events);
        }
        self.emit(events);
    }

    /// Simulated seconds since construction.
    pub fn time(&self) -> f64 {
        self.state.lock().time
    }

    pub fn kill_unit(&self, id: PlatformId) -> bool {
        let event = self.state.lock().kill_unit(id);
        let killed = event.is_some();
        self.emit(event);
        killed
    }

    pub fn kill_target(&self, id: TargetId) -> bool {
        let event = self.state.lock().kill_target(id);
        let killed = event.is_some();
        self.emit(event);
        killed
    }

    /// Add damage to a live unit. Reaching 1.0 destroys it.
    pub fn damage_unit(&self, id: PlatformId, amount: f64) -> bool {
        let mut events = Vec::new();
        {
            let mut s = self.state.lock();
            let Some(&entity) = s.units.get(&id) else {
                return false;
            };
            let destroyed = match s.world.get::<&mut Unit>(entity) {
                Ok(mut unit) if unit.0.alive => {
                    unit.0.damage = (unit.0.damage + amount).min(1.0);
                    unit.0.damage >= 1.0
                }
                _ => return false,
            };
            events.push(Event::damage(id, EntitySide::Platform, amount));
            if destroyed {
                events.extend(s.kill_unit(id));
            }
        }
        self.emit(events);
        true
    }

    /// Current record of a unit, position included.
    pub fn unit(&self, id: PlatformId) -> Option<PlatformState> {
        let s = self.state.lock();
        let entity = *s.units.get(&id)?;
        let mut record = s.world.get::<&Unit>(entity).ok()?.0.clone();
        record.position = s.position(entity)?;
        Some(record)
    }

    pub fn target(&self, id: TargetId) -> Option<TargetState> {
        let s = self.state.lock();
        let entity = *s.targets.get(&id)?;
        let mut record = s.world.get::<&Target>(entity).ok()?.0.clone();
        record.position = s.position(entity)?;
        Some(record)
    }

    /// Goal the unit is currently flying to.
    pub fn nav_goal(&self, id: PlatformId) -> Option<Position> {
        let s = self.state.lock();
        let entity = *s.units.get(&id)?;
        s.world.get::<&NavGoal>(entity).ok().map(|g| g.0)
    }

    pub fn is_egressing(&self, id: PlatformId) -> bool {
        let s = self.state.lock();
        s.units
            .get(&id)
            .is_some_and(|&e| s.world.get::<&Egressing>(e).is_ok())
    }

    pub fn alive_targets(&self) -> usize {
        let s = self.state.lock();
        s.targets.keys().filter(|&&id| s.target_alive(id)).count()
    }

    pub fn alive_units(&self) -> usize {
        let s = self.state.lock();
        s.units.keys().filter(|&&id| s.unit_alive(id)).count()
    }

    fn emit(&self, events: impl IntoIterator<Item = Event>) {
        let sink = self.sink.read();
        let Some(sink) = sink.as_ref() else {
            return;
        };
        for event in events {
            sink(event);
        }
    }
}

impl WorldSampler for SandboxWorld {
    /// Live units and targets, each sorted by id.
    fn sample(&self) -> WorldSnapshot {
        let s = self.state.lock();

        let mut platforms: Vec<PlatformState> = s
            .world
            .query::<(&Unit, &Position)>()
            .iter()
            .filter(|(_, (unit, _))| unit.0.alive)
            .map(|(_, (unit, pos))| PlatformState {
                position: *pos,
                ..unit.0.clone()
            })
            .collect();
        platforms.sort_by_key(|p| p.id);

        let mut targets: Vec<TargetState> = s
            .world
            .query::<(&Target, &Position)>()
            .iter()
            .filter(|(_, (target, _))| target.0.alive)
            .map(|(_, (target, pos))| TargetState {
                position: *pos,
                ..target.0.clone()
            })
            .collect();
        targets.sort_by_key(|t| t.id);

        WorldSnapshot { platforms, targets }
    }
}

impl EntityLookup for SandboxWorld {
    fn unit_alive(&self, unit: PlatformId) -> bool {
        self.state.lock().unit_alive(unit)
    }

    fn unit_position(&self, unit: PlatformId) -> Option<Position> {
        let s = self.state.lock();
        let entity = *s.units.get(&unit)?;
        s.position(entity)
    }

    fn unit_ammo(&self, unit: PlatformId) -> Option<i32> {
        let s = self.state.lock();
        let entity = *s.units.get(&unit)?;
        let record = s.world.get::<&Unit>(entity).ok()?;
        Some(rounds(&record.0))
    }

    fn best_weapon(&self, unit: PlatformId) -> Option<String> {
        let s = self.state.lock();
        let entity = *s.units.get(&unit)?;
        let record = s.world.get::<&Unit>(entity).ok()?;
        best_weapon(&record.0)
    }

    fn target_alive(&self, target: TargetId) -> bool {
        self.state.lock().target_alive(target)
    }

    fn target_position(&self, target: TargetId) -> Option<Position> {
        let s = self.state.lock();
        let entity = *s.targets.get(&target)?;
        s.position(entity)
    }
}

impl UnitController for SandboxWorld {
    fn navigate_to(&self, unit: PlatformId, goal: Position) -> bool {
        let mut s = self.state.lock();
        let Some(entity) = s.commandable(unit, Command::Navigate) else {
            return false;
        };
        let _ = s.world.remove_one::<Egressing>(entity);
        s.world.insert_one(entity, NavGoal(goal)).is_ok()
    }

    fn aim_at(&self, unit: PlatformId, target: TargetId) -> bool {
        let mut s = self.state.lock();
        let Some(entity) = s.commandable(unit, Command::Aim) else {
            return false;
        };
        if !s.target_alive(target) {
            return false;
        }
        s.world.insert_one(entity, AimAt(target)).is_ok()
    }

    fn fire_at(&self, unit: PlatformId, target: TargetId, weapon: &str) -> bool {
        let mut s = self.state.lock();
        let Some(entity) = s.commandable(unit, Command::Fire) else {
            return false;
        };
        if !s.target_alive(target) {
            return false;
        }
        let loaded = s
            .world
            .get::<&Unit>(entity)
            .is_ok_and(|u| has_round(&u.0, weapon));
        if !loaded {
            return false;
        }
        let order = FireOrder {
            target,
            weapon: weapon.to_string(),
        };
        s.world.insert_one(entity, order).is_ok()
    }

    fn egress_to(&self, unit: PlatformId, safe: Position) -> bool {
        let mut s = self.state.lock();
        let Some(entity) = s.commandable(unit, Command::Egress) else {
            return false;
        };
        let _ = s.world.remove_one::<AimAt>(entity);
        s.world.insert(entity, (NavGoal(safe), Egressing)).is_ok()
    }

    fn stop(&self, unit: PlatformId) {
        let mut s = self.state.lock();
        if let Some(&entity) = s.units.get(&unit) {
            s.clear_orders(entity);
            let _ = s.world.remove_one::<Egressing>(entity);
        }
    }
}
