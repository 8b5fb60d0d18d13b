//! Enemy and projectile containers consumed by skill resolution.
//!
//! Skills never hold references into a container across a mutation. They
//! take a position snapshot, decide who is hit, then mutate through ids.
//! Removals are deferred: a killed enemy or destroyed projectile is
//! tombstoned and only leaves its slot at `compact()`, run at frame end.
//! Ids carry a generation so an id that outlives its slot dangles safely.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::status::{LifeSnapshot, StatusLedger};

/// Generational slot key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub index: u32,
    pub generation: u32,
}

pub type EnemyId = EntityKey;
pub type ProjectileId = EntityKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Hostile projectile; blocked by barriers and Cyclone
    Enemy,
    /// The player's Arc bolts, which pass through Ice Nova barriers
    ArcBolt,
    Other,
}

impl ProjectileKind {
    pub fn passes_barrier(&self) -> bool {
        matches!(self, ProjectileKind::ArcBolt)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub position: Vec2,
    pub life: f32,
    pub max_life: f32,
    /// Units per second before slows
    pub base_speed: f32,
    pub status: StatusLedger,
}

impl Enemy {
    pub fn new(position: Vec2, max_life: f32) -> Self {
        Self {
            position,
            life: max_life,
            max_life,
            base_speed: 60.0,
            status: StatusLedger::new(),
        }
    }

    pub fn with_speed(mut self, base_speed: f32) -> Self {
        self.base_speed = base_speed;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    pub fn current_speed(&self) -> f32 {
        self.base_speed * self.status.speed_multiplier()
    }

    pub fn life_snapshot(&self) -> LifeSnapshot {
        LifeSnapshot {
            current: self.life,
            max: self.max_life,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub kind: ProjectileKind,
}

impl Projectile {
    pub fn new(position: Vec2, velocity: Vec2, kind: ProjectileKind) -> Self {
        Self {
            position,
            velocity,
            kind,
        }
    }
}

/// Position of a live enemy at query time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySnapshot {
    pub id: EnemyId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub position: Vec2,
    pub kind: ProjectileKind,
}

/// What a damage application did to its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub dealt: f32,
    pub killed: bool,
}

/// Read/mutate surface skills need from the scene's enemy set.
///
/// Every mutator is a no-op on an id that is dead or no longer present.
pub trait EnemyContainer {
    /// Live enemies only
    fn snapshot(&self) -> Vec<EnemySnapshot>;

    fn position(&self, id: EnemyId) -> Option<Vec2>;

    fn is_alive(&self, id: EnemyId) -> bool;

    fn life(&self, id: EnemyId) -> Option<LifeSnapshot>;

    fn take_damage(&mut self, id: EnemyId, amount: f32) -> Option<DamageOutcome>;

    fn status_mut(&mut self, id: EnemyId) -> Option<&mut StatusLedger>;

    fn set_position(&mut self, id: EnemyId, position: Vec2);

    fn apply_slow(&mut self, id: EnemyId, percentage: f32, duration: f32) -> bool {
        self.status_mut(id)
            .map(|status| status.apply_slow(percentage, duration))
            .unwrap_or(false)
    }

    /// Live enemies whose snapshot position lies within `radius` of `center`
    fn within_radius(&self, center: Vec2, radius: f32) -> Vec<EnemySnapshot> {
        self.snapshot()
            .into_iter()
            .filter(|e| crate::geometry::within_circle(center, radius, e.position))
            .collect()
    }
}

pub trait ProjectileContainer {
    fn snapshot(&self) -> Vec<ProjectileSnapshot>;

    /// Returns false if the projectile was already gone
    fn destroy(&mut self, id: ProjectileId) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    tombstoned: bool,
}

/// Index-stable storage with deferred removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> EntityKey {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.tombstoned = false;
            return EntityKey {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
            tombstoned: false,
        });
        EntityKey {
            index,
            generation: 0,
        }
    }

    fn slot(&self, key: EntityKey) -> Option<&Slot<T>> {
        self.slots
            .get(key.index as usize)
            .filter(|s| s.generation == key.generation && s.value.is_some())
    }

    fn slot_mut(&mut self, key: EntityKey) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|s| s.generation == key.generation && s.value.is_some())
    }

    /// Live value for `key`; tombstoned entries are hidden
    pub fn get(&self, key: EntityKey) -> Option<&T> {
        self.slot(key)
            .filter(|s| !s.tombstoned)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut T> {
        self.slot_mut(key)
            .filter(|s| !s.tombstoned)
            .and_then(|s| s.value.as_mut())
    }

    /// Schedule removal at the next `compact()`. False if already gone.
    pub fn mark_removed(&mut self, key: EntityKey) -> bool {
        match self.slot_mut(key) {
            Some(slot) if !slot.tombstoned => {
                slot.tombstoned = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending_removal(&self, key: EntityKey) -> bool {
        self.slot(key).is_some_and(|s| s.tombstoned)
    }

    /// Free every tombstoned slot, returning the removed values.
    /// Freed slots bump their generation so old keys dangle.
    pub fn compact(&mut self) -> Vec<(EntityKey, T)> {
        let mut removed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.tombstoned {
                continue;
            }
            let key = EntityKey {
                index: index as u32,
                generation: slot.generation,
            };
            if let Some(value) = slot.value.take() {
                removed.push((key, value));
            }
            slot.tombstoned = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
            self.live = self.live.saturating_sub(1);
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            if slot.tombstoned {
                return None;
            }
            slot.value.as_ref().map(|value| {
                (
                    EntityKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityKey, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            if slot.tombstoned {
                return None;
            }
            let generation = slot.generation;
            slot.value.as_mut().map(|value| {
                (
                    EntityKey {
                        index: index as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Entries including those awaiting compaction
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

pub type EnemyArena = Arena<Enemy>;
pub type ProjectileArena = Arena<Projectile>;

impl EnemyContainer for EnemyArena {
    fn snapshot(&self) -> Vec<EnemySnapshot> {
        self.iter()
            .filter(|(_, e)| e.is_alive())
            .map(|(id, e)| EnemySnapshot {
                id,
                position: e.position,
            })
            .collect()
    }

    fn position(&self, id: EnemyId) -> Option<Vec2> {
        self.get(id).map(|e| e.position)
    }

    fn is_alive(&self, id: EnemyId) -> bool {
        self.get(id).is_some_and(|e| e.is_alive())
    }

    fn life(&self, id: EnemyId) -> Option<LifeSnapshot> {
        self.get(id).map(|e| e.life_snapshot())
    }

    fn take_damage(&mut self, id: EnemyId, amount: f32) -> Option<DamageOutcome> {
        let enemy = self.get_mut(id).filter(|e| e.is_alive())?;
        let dealt = amount.max(0.0).min(enemy.life);
        enemy.life -= dealt;
        let killed = !enemy.is_alive();
        if killed {
            self.mark_removed(id);
        }
        Some(DamageOutcome { dealt, killed })
    }

    fn status_mut(&mut self, id: EnemyId) -> Option<&mut StatusLedger> {
        self.get_mut(id)
            .filter(|e| e.is_alive())
            .map(|e| &mut e.status)
    }

    fn set_position(&mut self, id: EnemyId, position: Vec2) {
        if let Some(enemy) = self.get_mut(id) {
            enemy.position = position;
        }
    }
}

impl ProjectileContainer for ProjectileArena {
    fn snapshot(&self) -> Vec<ProjectileSnapshot> {
        self.iter()
            .map(|(id, p)| ProjectileSnapshot {
                id,
                position: p.position,
                kind: p.kind,
            })
            .collect()
    }

    fn destroy(&mut self, id: ProjectileId) -> bool {
        self.mark_removed(id)
    }
}

/// Enemies removed by `Scene::compact`, with their state at death
#[derive(Debug, Clone)]
pub struct FallenEnemy {
    pub id: EnemyId,
    pub enemy: Enemy,
}

/// Containers owned by the active scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub enemies: EnemyArena,
    pub projectiles: ProjectileArena,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_enemy(&mut self, enemy: Enemy) -> EnemyId {
        self.enemies.insert(enemy)
    }

    pub fn spawn_projectile(&mut self, projectile: Projectile) -> ProjectileId {
        self.projectiles.insert(projectile)
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id)
    }

    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|(_, e)| e.is_alive()).count()
    }

    /// Move projectiles along their velocity
    pub fn advance_projectiles(&mut self, dt: f32) {
        for (_, p) in self.projectiles.iter_mut() {
            p.position += p.velocity * dt;
        }
    }

    /// Frame-end removal of dead enemies and destroyed projectiles
    pub fn compact(&mut self) -> Vec<FallenEnemy> {
        self.projectiles.compact();
        self.enemies
            .compact()
            .into_iter()
            .map(|(id, enemy)| FallenEnemy { id, enemy })
            .collect()
    }
}
