//! Active skills
//!
//! Three archetypes share the curve evaluator and the hit tests:
//! 1. Cleave: arc melee, resolved synchronously at activation
//! 2. Cyclone: continuous channel draining mana every frame
//! 3. Ice Nova: pulsating ring, one instance per cast, plus a lingering barrier
//!
//! Definitions are immutable once loaded. Everything that changes during
//! play lives in `SkillRuntime`.

pub mod cleave;
pub mod cooldown;
pub mod cyclone;
pub mod ice_nova;
pub mod resolve;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::combat::damage::{DamageRange, DamageType};
use crate::curve::DamageCurve;

pub use cleave::{CleaveShape, CleaveState};
pub use cooldown::SkillCooldownTracker;
pub use cyclone::{ChannelState, ChannelStep, CycloneChannel, CycloneShape};
pub use ice_nova::{Barrier, IceNovaShape, NovaInstance, NovaPhase, NovaRehitGate};
pub use resolve::{HitRecord, OnHitProcs, Resolver, StatusApplication, Strike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillKind {
    Cleave,
    Cyclone,
    IceNova,
}

impl SkillKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKind::Cleave => "cleave",
            SkillKind::Cyclone => "cyclone",
            SkillKind::IceNova => "ice_nova",
        }
    }

    pub fn all() -> [SkillKind; 3] {
        [SkillKind::Cleave, SkillKind::Cyclone, SkillKind::IceNova]
    }
}

/// Mana cost: `flat + per_level * level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManaCost {
    pub flat: f32,
    pub per_level: f32,
}

impl ManaCost {
    pub fn at_level(&self, level: u32) -> f32 {
        self.flat + self.per_level * level as f32
    }
}

/// A timed slow (also used for chill)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowParams {
    pub percentage: f32,
    /// Seconds
    pub duration: f32,
}

/// Freeze lasting `base + per_chill_stack * chill_stacks` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreezeParams {
    pub base: f32,
    pub per_chill_stack: f32,
}

/// Immutable per-skill configuration, generic over the archetype's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition<S> {
    pub id: String,
    pub name: String,
    pub mana_cost: ManaCost,
    /// Seconds; 0 means no cooldown
    pub cooldown: f32,
    pub damage_type: DamageType,
    pub damage: DamageCurve,
    /// Only spells can be duplicated by Quantum Entanglement
    pub spell: bool,
    pub shape: S,
}

impl<S> SkillDefinition<S> {
    pub fn cost_at(&self, level: u32) -> f32 {
        self.mana_cost.at_level(level)
    }

    /// Curve value plus the flat level-up bonus, before percentage modifiers
    pub fn base_damage(&self, level: u32, flat_bonus: f32) -> DamageRange {
        self.damage.evaluate(level).with_flat_bonus(flat_bonus)
    }
}

/// Why an activation was refused. Nothing is consumed on rejection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivationRejected {
    #[error("not enough mana: need {required:.1}, have {available:.1}")]
    InsufficientMana { required: f32, available: f32 },
    #[error("skill on cooldown for {remaining:.2}s")]
    OnCooldown { remaining: f32 },
    #[error("skill not learned")]
    NotLearned,
    #[error("already channeling")]
    AlreadyChanneling,
}

/// Mutable skill state owned by the combat world
#[derive(Debug, Clone, Default)]
pub struct SkillRuntime {
    pub cooldowns: SkillCooldownTracker,
    pub cleave: CleaveState,
    pub cyclone: ChannelState,
    pub novas: Vec<NovaInstance>,
    pub barriers: Vec<Barrier>,
    pub nova_gate: NovaRehitGate,
    damage_bonus: HashMap<SkillKind, f32>,
}

impl SkillRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level-up damage points: a flat amount added to both ends of each listed skill
    pub fn grant_damage_bonus(&mut self, skills: impl IntoIterator<Item = SkillKind>, flat: f32) {
        for skill in skills {
            *self.damage_bonus.entry(skill).or_insert(0.0) += flat;
        }
    }

    pub fn damage_bonus(&self, skill: SkillKind) -> f32 {
        self.damage_bonus.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn is_channeling(&self) -> bool {
        self.cyclone.is_channeling()
    }

    /// Resource gate. Checks only; the caller deducts on success.
    pub fn check_gate(
        &self,
        skill: SkillKind,
        cost: f32,
        mana: f32,
    ) -> Result<(), ActivationRejected> {
        if skill == SkillKind::Cyclone && self.is_channeling() {
            return Err(ActivationRejected::AlreadyChanneling);
        }
        if !self.cooldowns.is_ready(skill) {
            return Err(ActivationRejected::OnCooldown {
                remaining: self.cooldowns.remaining(skill),
            });
        }
        if mana < cost {
            return Err(ActivationRejected::InsufficientMana {
                required: cost,
                available: mana,
            });
        }
        Ok(())
    }

    /// True when nothing is in flight
    pub fn is_idle(&self) -> bool {
        !self.is_channeling() && self.novas.is_empty() && self.barriers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mana_cost_scales_with_level() {
        let cost = ManaCost {
            flat: 15.0,
            per_level: 3.0,
        };
        assert_eq!(cost.at_level(1), 18.0);
        assert_eq!(cost.at_level(50), 165.0);
    }

    #[test]
    fn test_gate_exact_mana_passes() {
        let runtime = SkillRuntime::new();
        assert!(runtime.check_gate(SkillKind::Cleave, 7.0, 7.0).is_ok());
        assert_eq!(
            runtime.check_gate(SkillKind::Cleave, 7.0, 6.0),
            Err(ActivationRejected::InsufficientMana {
                required: 7.0,
                available: 6.0
            })
        );
    }

    #[test]
    fn test_gate_cooldown_before_mana() {
        let mut runtime = SkillRuntime::new();
        runtime.cooldowns.start_cooldown(SkillKind::IceNova, 0.5);
        assert!(matches!(
            runtime.check_gate(SkillKind::IceNova, 10.0, 0.0),
            Err(ActivationRejected::OnCooldown { .. })
        ));
    }

    #[test]
    fn test_damage_bonus_accumulates() {
        let mut runtime = SkillRuntime::new();
        runtime.grant_damage_bonus(SkillKind::all(), 10.0);
        runtime.grant_damage_bonus([SkillKind::Cleave], 10.0);
        assert_eq!(runtime.damage_bonus(SkillKind::Cleave), 20.0);
        assert_eq!(runtime.damage_bonus(SkillKind::IceNova), 10.0);
    }
}
