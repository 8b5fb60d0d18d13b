//! Passive abilities and parameter composition.
//!
//! The player's `PassiveModifierSet` only grows. At every activation the
//! skill's definition and the set are folded into a fresh `EffectiveParams`;
//! nothing is written back into the definition. Percentage bonuses that
//! target the same parameter are summed first and applied once, so
//! acquisition order never changes the result.

pub mod cycling;
pub mod paste_tree;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::combat::damage::DamageRange;
use crate::combat::status::{DebuffKind, DebuffSpec, TickDamage};
use crate::skills::cleave::RealityParams;
use crate::skills::resolve::{ChanceDebuff, OnHitProcs};
use crate::skills::{SkillDefinition, SkillKind, SlowParams};

pub use cycling::{CyclePhase, CycleTick, PassiveState, PassiveStates};
pub use paste_tree::{PasteNode, PasteNodeEffect, PasteTree};

/// Skill parameter a stat bonus scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillStat {
    Damage,
    Radius,
}

/// Effect data for an acquired passive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PassiveEffect {
    /// Every `hits_required` Cleave hits, a wider amplified cone that slows
    CleaveReality {
        hits_required: u32,
        damage_multiplier: f32,
        cone_radius: f32,
        slow_percentage: f32,
        slow_duration: f32,
    },
    NovaOverload {
        radius_increase: f32,
        damage_increase: f32,
    },
    /// Chance to cast a spell a second time at reduced damage
    QuantumEntanglement {
        duplicate_chance: f32,
        duplicate_damage_multiplier: f32,
    },
    EntropicDecay {
        /// Fraction of max life per stack per tick
        damage_percentage: f32,
        duration: f32,
        max_stacks: u32,
        tick_interval: f32,
    },
    NecroticPlague {
        chance: f32,
        /// Fraction of current life per stack per second
        damage_percentage_per_second: f32,
        duration: f32,
        max_stacks: u32,
        spread_radius: f32,
    },
    SingularityCore {
        chance: f32,
        /// Seconds before collapse
        delay: f32,
        /// Multiple of the carrier's max life dealt on collapse
        damage_multiplier: f32,
        pull_radius: f32,
    },
    VoidEmbrace {
        hp_threshold: f32,
        regen_percentage: f32,
        duration: f32,
        cooldown: f32,
    },
    ParadoxArmor {
        damage_delay_percentage: f32,
        damage_delay_duration: f32,
        cooldown: f32,
    },
    ArcSingularity {
        damage_increase: f32,
        duration: f32,
        cooldown: f32,
    },
    BarrierAmplifier {
        size_multiplier: f32,
    },
    StatBonus {
        /// `None` applies to every skill
        skill: Option<SkillKind>,
        stat: SkillStat,
        percentage: f32,
    },
}

impl PassiveEffect {
    /// Passives with their own Ready / Triggered / Cooling-down cycle
    pub fn is_cycling(&self) -> bool {
        matches!(
            self,
            PassiveEffect::VoidEmbrace { .. }
                | PassiveEffect::ParadoxArmor { .. }
                | PassiveEffect::ArcSingularity { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PassiveEffect::CleaveReality { .. } => "cleave_reality",
            PassiveEffect::NovaOverload { .. } => "nova_overload",
            PassiveEffect::QuantumEntanglement { .. } => "quantum_entanglement",
            PassiveEffect::EntropicDecay { .. } => "entropic_decay",
            PassiveEffect::NecroticPlague { .. } => "necrotic_plague",
            PassiveEffect::SingularityCore { .. } => "singularity_core",
            PassiveEffect::VoidEmbrace { .. } => "void_embrace",
            PassiveEffect::ParadoxArmor { .. } => "paradox_armor",
            PassiveEffect::ArcSingularity { .. } => "arc_singularity",
            PassiveEffect::BarrierAmplifier { .. } => "barrier_amplifier",
            PassiveEffect::StatBonus { .. } => "stat_bonus",
        }
    }
}

/// Acquired passives keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveModifierSet {
    entries: BTreeMap<String, PassiveEffect>,
}

impl PassiveModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a passive. An id already present keeps its original effect.
    pub fn insert(&mut self, id: impl Into<String>, effect: PassiveEffect) -> bool {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, effect);
        true
    }

    pub fn get(&self, id: &str) -> Option<&PassiveEffect> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PassiveEffect)> {
        self.entries.iter().map(|(id, effect)| (id.as_str(), effect))
    }

    pub fn effects(&self) -> impl Iterator<Item = &PassiveEffect> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cleave_reality(&self) -> Option<RealityParams> {
        self.effects().find_map(|effect| match *effect {
            PassiveEffect::CleaveReality {
                hits_required,
                damage_multiplier,
                cone_radius,
                slow_percentage,
                slow_duration,
            } => Some(RealityParams {
                hits_required,
                damage_multiplier,
                cone_radius,
                slow: SlowParams {
                    percentage: slow_percentage,
                    duration: slow_duration,
                },
            }),
            _ => None,
        })
    }

    /// Stacking debuffs attached to skill hits
    pub fn on_hit_procs(&self) -> OnHitProcs {
        let mut procs = OnHitProcs::default();
        for effect in self.effects() {
            match *effect {
                PassiveEffect::EntropicDecay {
                    damage_percentage,
                    duration,
                    max_stacks,
                    tick_interval,
                } => {
                    procs.entropic_decay = Some(DebuffSpec {
                        kind: DebuffKind::EntropicDecay,
                        max_stacks,
                        duration,
                        tick_interval,
                        per_tick: TickDamage::MaxLifeFraction(damage_percentage),
                    });
                }
                PassiveEffect::NecroticPlague {
                    chance,
                    damage_percentage_per_second,
                    duration,
                    max_stacks,
                    spread_radius,
                } => {
                    procs.necrotic_plague = Some(ChanceDebuff {
                        chance,
                        spec: DebuffSpec {
                            kind: DebuffKind::NecroticPlague,
                            max_stacks,
                            duration,
                            tick_interval: 1.0,
                            per_tick: TickDamage::CurrentLifeFraction(damage_percentage_per_second),
                        },
                    });
                    procs.plague_spread_radius = spread_radius;
                }
                PassiveEffect::SingularityCore {
                    chance,
                    delay,
                    damage_multiplier,
                    pull_radius,
                } => {
                    procs.singularity = Some(ChanceDebuff {
                        chance,
                        spec: DebuffSpec {
                            kind: DebuffKind::Singularity,
                            max_stacks: 1,
                            duration: delay,
                            tick_interval: delay,
                            per_tick: TickDamage::MaxLifeFraction(damage_multiplier),
                        },
                    });
                    procs.singularity_pull_radius = pull_radius;
                }
                _ => {}
            }
        }
        procs
    }
}

/// Second, independent execution rolled at activation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateProc {
    pub chance: f32,
    pub damage_multiplier: f32,
}

/// Per-activation inputs that are not part of the definition
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivationContext {
    pub level: u32,
    /// Level-up flat damage points
    pub flat_damage_bonus: f32,
    /// Bonuses from triggered cycling passives, as a fraction
    pub transient_damage_bonus: f32,
}

/// Parameters for a single activation; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParams {
    pub damage: DamageRange,
    pub damage_multiplier: f32,
    pub radius_multiplier: f32,
    pub barrier_multiplier: f32,
    pub duplicate: Option<DuplicateProc>,
}

impl EffectiveParams {
    /// Unmodified parameters around a damage window
    pub fn plain(damage: DamageRange) -> Self {
        Self {
            damage,
            damage_multiplier: 1.0,
            radius_multiplier: 1.0,
            barrier_multiplier: 1.0,
            duplicate: None,
        }
    }

    /// Parameters for the duplicated execution, which can never duplicate again
    pub fn for_duplicate(&self, damage_multiplier: f32) -> Self {
        Self {
            damage: self.damage.scaled(damage_multiplier),
            damage_multiplier: self.damage_multiplier * damage_multiplier,
            duplicate: None,
            ..*self
        }
    }
}

/// Fold the definition and the acquired passives into activation parameters
pub fn compute_effective_params<S>(
    skill: SkillKind,
    definition: &SkillDefinition<S>,
    modifiers: &PassiveModifierSet,
    ctx: ActivationContext,
) -> EffectiveParams {
    let mut damage_bonus = ctx.transient_damage_bonus;
    let mut radius_bonus = 0.0;
    let mut barrier_bonus = 0.0;
    let mut duplicate: Option<DuplicateProc> = None;

    for effect in modifiers.effects() {
        match *effect {
            PassiveEffect::NovaOverload {
                radius_increase,
                damage_increase,
            } if skill == SkillKind::IceNova => {
                radius_bonus += radius_increase;
                damage_bonus += damage_increase;
            }
            PassiveEffect::BarrierAmplifier { size_multiplier } if skill == SkillKind::IceNova => {
                barrier_bonus += size_multiplier - 1.0;
            }
            PassiveEffect::StatBonus {
                skill: scope,
                stat,
                percentage,
            } if scope.is_none_or(|s| s == skill) => match stat {
                SkillStat::Damage => damage_bonus += percentage,
                SkillStat::Radius => radius_bonus += percentage,
            },
            PassiveEffect::QuantumEntanglement {
                duplicate_chance,
                duplicate_damage_multiplier,
            } if definition.spell => {
                let merged = match duplicate {
                    Some(existing) => DuplicateProc {
                        chance: existing.chance + duplicate_chance,
                        damage_multiplier: existing
                            .damage_multiplier
                            .max(duplicate_damage_multiplier),
                    },
                    None => DuplicateProc {
                        chance: duplicate_chance,
                        damage_multiplier: duplicate_damage_multiplier,
                    },
                };
                duplicate = Some(merged);
            }
            _ => {}
        }
    }

    let damage_multiplier = (1.0 + damage_bonus).max(0.0);
    let base = definition.base_damage(ctx.level, ctx.flat_damage_bonus);
    EffectiveParams {
        damage: base.scaled(damage_multiplier),
        damage_multiplier,
        radius_multiplier: (1.0 + radius_bonus).max(0.0),
        barrier_multiplier: (1.0 + barrier_bonus).max(0.0),
        duplicate,
    }
}
