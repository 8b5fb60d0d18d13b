//! Ice Nova: one pulsating ring per cast plus a lingering barrier.
//!
//! A nova expands to its effective max radius, resolves exactly one zoned
//! hit (inner ring freezes, outer ring chills), contracts, and completes.
//! The barrier spawned by the same cast runs on its own timer: it blocks
//! hostile projectiles every frame and damages and slows enemies on a tick.
//!
//! Pulses from different casts share a `NovaRehitGate`: an enemy struck by
//! one cast's pulse is skipped by another cast's pulse until the shape's
//! minimum re-hit interval has passed. A duplicated cast shares its
//! parent's cast id and is not gated against it.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::resolve::{Resolver, StatusApplication, Strike};
use super::{FreezeParams, SlowParams};
use crate::combat::damage::{DamageRange, DamageType};
use crate::geometry::{distance_ratio_zone, within_circle, RingZone};
use crate::passives::EffectiveParams;
use crate::scene::{EnemyId, ProjectileContainer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierParams {
    /// Seconds the barrier persists
    pub duration: f32,
    pub tick_interval: f32,
    /// Fraction of the nova's damage dealt per tick
    pub damage_multiplier: f32,
    pub slow: SlowParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IceNovaShape {
    pub max_radius: f32,
    /// Seconds from cast to max radius
    pub expand_time: f32,
    /// Seconds from max radius back to zero
    pub contract_time: f32,
    pub min_rehit_interval: f32,
    pub inner_multiplier: f32,
    pub outer_multiplier: f32,
    pub freeze: FreezeParams,
    pub chill: SlowParams,
    pub barrier: BarrierParams,
}

/// Last nova pulse to strike each enemy, keyed on the world's nova clock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovaRehitGate {
    clock: f32,
    next_cast: u64,
    last_hit: HashMap<EnemyId, (f32, u64)>,
}

impl NovaRehitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a fresh (non-duplicate) cast
    pub fn begin_cast(&mut self) -> u64 {
        self.next_cast += 1;
        self.next_cast
    }

    /// Id of the latest cast, shared by its duplicate
    pub fn current_cast(&self) -> u64 {
        self.next_cast
    }

    /// Advance the clock and forget hits older than `interval`
    pub fn tick(&mut self, dt: f32, interval: f32) {
        self.clock += dt;
        let clock = self.clock;
        self.last_hit.retain(|_, (at, _)| clock - *at < interval);
    }

    pub fn admits(&self, enemy: EnemyId, cast: u64, interval: f32) -> bool {
        match self.last_hit.get(&enemy) {
            Some(&(at, by)) => by == cast || self.clock - at >= interval,
            None => true,
        }
    }

    pub fn record(&mut self, enemy: EnemyId, cast: u64) {
        self.last_hit.insert(enemy, (self.clock, cast));
    }

    pub fn tracked(&self) -> usize {
        self.last_hit.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NovaPhase {
    Expanding,
    Contracting,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovaInstance {
    pub origin: Vec2,
    pub phase: NovaPhase,
    pub radius: f32,
    pub max_radius: f32,
    pub expansion_speed: f32,
    pub contraction_speed: f32,
    pub elapsed: f32,
    /// Hard stop regardless of phase
    pub lifetime: f32,
    /// Cast this pulse belongs to; duplicates share it
    pub cast: u64,
    pub damage: DamageRange,
    pub damage_type: DamageType,
    pub duplicate: bool,
}

impl NovaInstance {
    pub fn spawn(
        shape: &IceNovaShape,
        origin: Vec2,
        damage_type: DamageType,
        params: &EffectiveParams,
        duplicate: bool,
    ) -> Self {
        let max_radius = shape.max_radius * params.radius_multiplier;
        let expand_time = shape.expand_time.max(f32::EPSILON);
        let contract_time = shape.contract_time.max(f32::EPSILON);
        Self {
            origin,
            phase: NovaPhase::Expanding,
            radius: 0.0,
            max_radius,
            expansion_speed: max_radius / expand_time,
            contraction_speed: max_radius / contract_time,
            elapsed: 0.0,
            lifetime: expand_time + contract_time + 1.0,
            cast: 0,
            damage: params.damage,
            damage_type,
            duplicate,
        }
    }

    pub fn for_cast(mut self, cast: u64) -> Self {
        self.cast = cast;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.phase == NovaPhase::Complete
    }

    /// Advance one frame; returns landed hits
    pub fn advance(
        &mut self,
        dt: f32,
        shape: &IceNovaShape,
        resolver: &mut Resolver<'_>,
        gate: &mut NovaRehitGate,
    ) -> usize {
        if self.is_complete() {
            return 0;
        }
        self.elapsed += dt;
        let mut landed = 0;

        match self.phase {
            NovaPhase::Expanding => {
                self.radius = (self.radius + self.expansion_speed * dt).min(self.max_radius);
                if self.radius >= self.max_radius {
                    landed = self.resolve_pulse(shape, resolver, gate);
                    self.phase = NovaPhase::Contracting;
                }
            }
            NovaPhase::Contracting => {
                self.radius = (self.radius - self.contraction_speed * dt).max(0.0);
                if self.radius <= 0.0 {
                    self.phase = NovaPhase::Complete;
                }
            }
            NovaPhase::Complete => {}
        }

        if self.elapsed > self.lifetime {
            self.phase = NovaPhase::Complete;
        }
        landed
    }

    fn resolve_pulse(
        &self,
        shape: &IceNovaShape,
        resolver: &mut Resolver<'_>,
        gate: &mut NovaRehitGate,
    ) -> usize {
        let origin = self.origin;
        let radius = self.max_radius;
        let mut targets = resolver.targets(|p| within_circle(origin, radius, p));
        let in_range = targets.len();
        targets.retain(|t| gate.admits(t.id, self.cast, shape.min_rehit_interval));
        for target in &targets {
            gate.record(target.id, self.cast);
        }
        let landed = resolver.strike(&targets, |target| {
            let zone = distance_ratio_zone(origin, radius, target.position);
            let (multiplier, status) = match zone {
                RingZone::Inner => (shape.inner_multiplier, StatusApplication::Freeze(shape.freeze)),
                RingZone::Outer => (shape.outer_multiplier, StatusApplication::Chill(shape.chill)),
            };
            Strike {
                damage: self.damage.scaled(multiplier),
                damage_type: self.damage_type,
                status: Some(status),
                zone: Some(zone),
            }
        });
        debug!(
            landed,
            radius,
            gated = in_range - targets.len(),
            duplicate = self.duplicate,
            "ice nova pulse"
        );
        landed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub origin: Vec2,
    pub radius: f32,
    pub remaining: f32,
    pub tick_interval: f32,
    pub since_tick: f32,
    pub damage: DamageRange,
    pub damage_type: DamageType,
    pub slow: SlowParams,
}

impl Barrier {
    pub fn spawn(
        shape: &IceNovaShape,
        origin: Vec2,
        damage_type: DamageType,
        params: &EffectiveParams,
    ) -> Self {
        Self {
            origin,
            radius: shape.max_radius * params.radius_multiplier * params.barrier_multiplier,
            remaining: shape.barrier.duration,
            tick_interval: shape.barrier.tick_interval,
            since_tick: 0.0,
            damage: params.damage.scaled(shape.barrier.damage_multiplier),
            damage_type,
            slow: shape.barrier.slow,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Block projectiles, resolve due ticks, count down. Returns (hits, blocked).
    pub fn advance(
        &mut self,
        dt: f32,
        resolver: &mut Resolver<'_>,
        projectiles: &mut dyn ProjectileContainer,
    ) -> (usize, usize) {
        if self.is_expired() {
            return (0, 0);
        }
        let (origin, radius) = (self.origin, self.radius);

        let mut blocked = 0;
        for projectile in projectiles.snapshot() {
            if projectile.kind.passes_barrier() {
                continue;
            }
            if within_circle(origin, radius, projectile.position) && projectiles.destroy(projectile.id) {
                blocked += 1;
            }
        }

        let mut hits = 0;
        if self.tick_interval > 0.0 {
            // Ticks only fire while the barrier is up
            self.since_tick += dt.min(self.remaining);
            while self.since_tick >= self.tick_interval {
                self.since_tick -= self.tick_interval;
                let targets = resolver.targets(|p| within_circle(origin, radius, p));
                hits += resolver.strike(&targets, |_| {
                    Strike::plain(self.damage, self.damage_type)
                        .with_status(StatusApplication::Slow(self.slow))
                });
            }
        }

        self.remaining -= dt;
        (hits, blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;
    use crate::scene::{Enemy, Projectile, ProjectileKind, Scene};
    use crate::skills::resolve::OnHitProcs;
    use crate::skills::SkillKind;

    fn shape() -> IceNovaShape {
        IceNovaShape {
            max_radius: 160.0,
            expand_time: 0.5,
            contract_time: 0.1,
            min_rehit_interval: 0.1,
            inner_multiplier: 1.5,
            outer_multiplier: 0.7,
            freeze: FreezeParams {
                base: 1.5,
                per_chill_stack: 0.2,
            },
            chill: SlowParams {
                percentage: 0.3,
                duration: 4.0,
            },
            barrier: BarrierParams {
                duration: 10.0,
                tick_interval: 0.5,
                damage_multiplier: 0.1,
                slow: SlowParams {
                    percentage: 0.9,
                    duration: 1.0,
                },
            },
        }
    }

    fn params() -> EffectiveParams {
        EffectiveParams::plain(DamageRange::new(100.0, 100.0))
    }

    #[test]
    fn test_nova_lifecycle_hits_once() {
        let shape = shape();
        let mut scene = Scene::new();
        let inner = scene.spawn_enemy(Enemy::new(Vec2::new(20.0, 0.0), 1000.0));
        let outer = scene.spawn_enemy(Enemy::new(Vec2::new(100.0, 0.0), 1000.0));
        let mut rng = seeded(4);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();
        let mut nova = NovaInstance::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params(), false);
        let mut gate = NovaRehitGate::new();

        let mut frames = 0;
        let mut landed = 0;
        {
            let mut resolver =
                Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
            while !nova.is_complete() && frames < 100 {
                landed += nova.advance(1.0 / 60.0, &shape, &mut resolver, &mut gate);
                frames += 1;
            }
        }

        assert!(nova.is_complete());
        assert_eq!(landed, 2);
        // 0.5s expand + 0.1s contract at 60fps
        assert!((35..=40).contains(&frames), "took {frames} frames");

        let inner_enemy = scene.enemy(inner).unwrap();
        assert_eq!(inner_enemy.life, 850.0);
        assert!(inner_enemy.status.is_frozen());

        let outer_enemy = scene.enemy(outer).unwrap();
        assert_eq!(outer_enemy.life, 930.0);
        assert_eq!(outer_enemy.status.chill_stacks(), 1);
    }

    #[test]
    fn test_lifetime_timeout_completes_nova() {
        let shape = shape();
        let mut scene = Scene::new();
        let mut rng = seeded(4);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();
        let mut nova = NovaInstance::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params(), false);
        nova.contraction_speed = 0.0;
        let mut gate = NovaRehitGate::new();

        let mut resolver =
            Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
        for _ in 0..20 {
            nova.advance(0.1, &shape, &mut resolver, &mut gate);
        }
        assert!(nova.is_complete());
    }

    /// Two casts 0.05s apart against one enemy; returns how many pulses landed
    fn overlapping_casts(min_rehit_interval: f32) -> usize {
        let shape = IceNovaShape {
            min_rehit_interval,
            ..shape()
        };
        let mut scene = Scene::new();
        scene.spawn_enemy(Enemy::new(Vec2::new(50.0, 0.0), 10_000.0));
        let mut rng = seeded(9);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();
        let mut gate = NovaRehitGate::new();
        let mut first = NovaInstance::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params(), false)
            .for_cast(gate.begin_cast());

        let mut landed = 0;
        let mut resolver =
            Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
        let mut novas = Vec::new();
        for frame in 0..60 {
            if frame == 3 {
                novas.push(
                    NovaInstance::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params(), false)
                        .for_cast(gate.begin_cast()),
                );
            }
            gate.tick(1.0 / 60.0, shape.min_rehit_interval);
            landed += first.advance(1.0 / 60.0, &shape, &mut resolver, &mut gate);
            for nova in &mut novas {
                landed += nova.advance(1.0 / 60.0, &shape, &mut resolver, &mut gate);
            }
        }
        landed
    }

    #[test]
    fn test_rehit_interval_gates_other_casts() {
        assert_eq!(overlapping_casts(0.1), 1);
        assert_eq!(overlapping_casts(0.0), 2);
    }

    #[test]
    fn test_duplicate_pulse_shares_cast() {
        let mut gate = NovaRehitGate::new();
        let mut scene = Scene::new();
        let id = scene.spawn_enemy(Enemy::new(Vec2::ZERO, 100.0));
        let cast = gate.begin_cast();
        gate.record(id, cast);
        assert!(gate.admits(id, gate.current_cast(), 0.5));
        let next = gate.begin_cast();
        assert!(!gate.admits(id, next, 0.5));

        gate.tick(0.5, 0.5);
        assert_eq!(gate.tracked(), 0);
        assert!(gate.admits(id, 7, 0.5));
    }

    #[test]
    fn test_barrier_blocks_hostile_projectiles_only() {
        let shape = shape();
        let mut scene = Scene::new();
        let hostile = scene.spawn_projectile(Projectile::new(
            Vec2::new(10.0, 0.0),
            Vec2::ZERO,
            ProjectileKind::Enemy,
        ));
        let arc = scene.spawn_projectile(Projectile::new(
            Vec2::new(10.0, 0.0),
            Vec2::ZERO,
            ProjectileKind::ArcBolt,
        ));
        let mut rng = seeded(4);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();
        let mut barrier = Barrier::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params());

        let (_, blocked) = {
            let mut resolver =
                Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
            barrier.advance(0.016, &mut resolver, &mut scene.projectiles)
        };
        assert_eq!(blocked, 1);
        assert!(scene.projectile(hostile).is_none());
        assert!(scene.projectile(arc).is_some());
    }

    #[test]
    fn test_barrier_ticks_and_expires() {
        let shape = shape();
        let mut scene = Scene::new();
        let id = scene.spawn_enemy(Enemy::new(Vec2::new(30.0, 0.0), 1000.0));
        let mut rng = seeded(4);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();
        let mut barrier = Barrier::spawn(&shape, Vec2::ZERO, DamageType::Cold, &params());

        let mut total_hits = 0;
        {
            let mut resolver =
                Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
            for _ in 0..24 {
                total_hits += barrier.advance(0.5, &mut resolver, &mut scene.projectiles).0;
            }
        }
        // 10s at one tick per 0.5s
        assert_eq!(total_hits, 20);
        assert!(barrier.is_expired());
        let enemy = scene.enemy(id).unwrap();
        assert_eq!(enemy.life, 1000.0 - 20.0 * 10.0);
        assert!((enemy.status.speed_multiplier() - 0.1).abs() < 1e-5);
    }
}
