//! Batch hit resolution shared by every skill.
//!
//! A resolution pass first captures the targets (ids and positions), then
//! applies damage. Side effects of an early hit (a death, a shove) cannot
//! change who else the pass hits.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FreezeParams, SkillKind, SlowParams};
use crate::combat::damage::{DamageRange, DamageType};
use crate::combat::status::{DebuffKind, DebuffSpec};
use crate::geometry::RingZone;
use crate::rng::{chance, CombatRng};
use crate::scene::{EnemyContainer, EnemyId, EnemySnapshot};

/// Status applied alongside a strike's damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusApplication {
    Slow(SlowParams),
    /// Slow plus one chill stack
    Chill(SlowParams),
    Freeze(FreezeParams),
}

/// Per-target plan for one resolution pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub damage: DamageRange,
    pub damage_type: DamageType,
    pub status: Option<StatusApplication>,
    pub zone: Option<RingZone>,
}

impl Strike {
    pub fn plain(damage: DamageRange, damage_type: DamageType) -> Self {
        Self {
            damage,
            damage_type,
            status: None,
            zone: None,
        }
    }

    pub fn with_status(mut self, status: StatusApplication) -> Self {
        self.status = Some(status);
        self
    }
}

/// One landed hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub skill: SkillKind,
    pub target: EnemyId,
    pub amount: f32,
    pub damage_type: DamageType,
    pub zone: Option<RingZone>,
    pub killed: bool,
    /// Landed by a duplicated cast
    pub duplicate: bool,
}

/// On-hit proc with an activation chance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceDebuff {
    pub chance: f32,
    pub spec: DebuffSpec,
}

/// Stacking debuffs the player's passives attach to every skill hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnHitProcs {
    pub entropic_decay: Option<DebuffSpec>,
    pub necrotic_plague: Option<ChanceDebuff>,
    /// Neighbours within this distance catch the plague when a carrier dies
    pub plague_spread_radius: f32,
    pub singularity: Option<ChanceDebuff>,
    pub singularity_pull_radius: f32,
}

impl OnHitProcs {
    pub fn is_empty(&self) -> bool {
        self.entropic_decay.is_none() && self.necrotic_plague.is_none() && self.singularity.is_none()
    }
}

pub struct Resolver<'a> {
    enemies: &'a mut dyn EnemyContainer,
    rng: &'a mut CombatRng,
    procs: &'a OnHitProcs,
    hits: &'a mut Vec<HitRecord>,
    skill: SkillKind,
    duplicate: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        enemies: &'a mut dyn EnemyContainer,
        rng: &'a mut CombatRng,
        procs: &'a OnHitProcs,
        hits: &'a mut Vec<HitRecord>,
        skill: SkillKind,
    ) -> Self {
        Self {
            enemies,
            rng,
            procs,
            hits,
            skill,
            duplicate: false,
        }
    }

    /// Mark every hit from this resolver as coming from a duplicated cast
    pub fn duplicated(mut self, duplicate: bool) -> Self {
        self.duplicate = duplicate;
        self
    }

    pub fn skill(&self) -> SkillKind {
        self.skill
    }

    /// Snapshot of live enemies whose position satisfies `inside`
    pub fn targets(&self, inside: impl Fn(Vec2) -> bool) -> Vec<EnemySnapshot> {
        self.enemies
            .snapshot()
            .into_iter()
            .filter(|e| inside(e.position))
            .collect()
    }

    pub fn enemies(&mut self) -> &mut dyn EnemyContainer {
        &mut *self.enemies
    }

    /// Apply one strike per captured target. Returns the number of landed hits.
    ///
    /// Targets that died or vanished since the snapshot are skipped.
    pub fn strike(
        &mut self,
        targets: &[EnemySnapshot],
        mut plan: impl FnMut(&EnemySnapshot) -> Strike,
    ) -> usize {
        let mut landed = 0;
        for target in targets {
            let strike = plan(target);
            let amount = strike.damage.roll(&mut *self.rng);
            let Some(outcome) = self.enemies.take_damage(target.id, amount) else {
                continue;
            };
            landed += 1;
            debug!(
                skill = self.skill.as_str(),
                enemy = target.id.index,
                amount = outcome.dealt,
                killed = outcome.killed,
                duplicate = self.duplicate,
                "hit"
            );
            self.hits.push(HitRecord {
                skill: self.skill,
                target: target.id,
                amount: outcome.dealt,
                damage_type: strike.damage_type,
                zone: strike.zone,
                killed: outcome.killed,
                duplicate: self.duplicate,
            });
            if outcome.killed {
                continue;
            }
            if let Some(status) = strike.status {
                self.apply_status(target.id, status);
            }
            self.apply_procs(target.id);
        }
        landed
    }

    fn apply_status(&mut self, id: EnemyId, status: StatusApplication) {
        let Some(ledger) = self.enemies.status_mut(id) else {
            return;
        };
        match status {
            StatusApplication::Slow(slow) => {
                ledger.apply_slow(slow.percentage, slow.duration);
            }
            StatusApplication::Chill(chill) => ledger.apply_chill(chill.percentage, chill.duration),
            StatusApplication::Freeze(freeze) => {
                ledger.apply_freeze(freeze.base, freeze.per_chill_stack);
            }
        }
    }

    fn apply_procs(&mut self, id: EnemyId) {
        if self.procs.is_empty() {
            return;
        }
        let Some(ledger) = self.enemies.status_mut(id) else {
            return;
        };
        if let Some(spec) = self.procs.entropic_decay {
            ledger.apply_stacking_debuff(spec);
        }
        if let Some(plague) = self.procs.necrotic_plague {
            if chance(&mut *self.rng, plague.chance) {
                ledger.apply_stacking_debuff(plague.spec);
            }
        }
        if let Some(singularity) = self.procs.singularity {
            if !ledger.has(DebuffKind::Singularity) && chance(&mut *self.rng, singularity.chance) {
                ledger.apply_stacking_debuff(singularity.spec);
                debug!(enemy = id.index, "singularity seeded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::status::TickDamage;
    use crate::rng::seeded;
    use crate::scene::{Enemy, Scene};

    fn decay_spec() -> DebuffSpec {
        DebuffSpec {
            kind: DebuffKind::EntropicDecay,
            max_stacks: 5,
            duration: 4.0,
            tick_interval: 1.0,
            per_tick: TickDamage::MaxLifeFraction(0.02),
        }
    }

    #[test]
    fn test_strike_skips_dead_targets() {
        let mut scene = Scene::new();
        let a = scene.spawn_enemy(Enemy::new(Vec2::ZERO, 100.0));
        let b = scene.spawn_enemy(Enemy::new(Vec2::new(5.0, 0.0), 100.0));
        let mut rng = seeded(1);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();

        let mut resolver =
            Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::Cleave);
        let targets = resolver.targets(|_| true);
        resolver.enemies().take_damage(b, 1000.0);

        let landed = resolver.strike(&targets, |_| {
            Strike::plain(DamageRange::new(10.0, 10.0), DamageType::Physical)
        });
        assert_eq!(landed, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, a);
        assert_eq!(hits[0].amount, 10.0);
    }

    #[test]
    fn test_status_and_procs_applied_to_survivors() {
        let mut scene = Scene::new();
        let id = scene.spawn_enemy(Enemy::new(Vec2::ZERO, 100.0));
        let mut rng = seeded(1);
        let procs = OnHitProcs {
            entropic_decay: Some(decay_spec()),
            ..Default::default()
        };
        let mut hits = Vec::new();

        let mut resolver =
            Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::IceNova);
        let targets = resolver.targets(|_| true);
        resolver.strike(&targets, |_| {
            Strike::plain(DamageRange::new(1.0, 1.0), DamageType::Cold).with_status(
                StatusApplication::Chill(SlowParams {
                    percentage: 0.3,
                    duration: 4.0,
                }),
            )
        });

        let enemy = scene.enemy(id).unwrap();
        assert_eq!(enemy.status.chill_stacks(), 1);
        assert_eq!(enemy.status.stacks(DebuffKind::EntropicDecay), 1);
        assert!((enemy.current_speed() - enemy.base_speed * 0.7).abs() < 1e-3);
    }

    #[test]
    fn test_killing_blow_applies_no_status() {
        let mut scene = Scene::new();
        let id = scene.spawn_enemy(Enemy::new(Vec2::ZERO, 5.0));
        let mut rng = seeded(1);
        let procs = OnHitProcs::default();
        let mut hits = Vec::new();

        let mut resolver =
            Resolver::new(&mut scene.enemies, &mut rng, &procs, &mut hits, SkillKind::Cleave)
                .duplicated(true);
        let targets = resolver.targets(|_| true);
        resolver.strike(&targets, |_| {
            Strike::plain(DamageRange::new(50.0, 50.0), DamageType::Physical)
        });

        assert!(hits[0].killed);
        assert!(hits[0].duplicate);
        assert_eq!(hits[0].amount, 5.0);
        assert!(scene.enemies.is_pending_removal(id));
    }
}
