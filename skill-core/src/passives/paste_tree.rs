//! Paste tree: the progression catalog that grants passives and skills.
//!
//! Acquiring a node is permanent. Passive nodes add to the player's
//! modifier set, skill nodes teach a skill.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::{PassiveEffect, SkillStat};
use crate::config::{ensure, read_config, ConfigError};
use crate::constants::TILE_SIZE;
use crate::player::Player;
use crate::skills::SkillKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PasteNodeEffect {
    Passive(PassiveEffect),
    SkillGrant(SkillKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteNode {
    pub id: String,
    pub name: String,
    pub branch: String,
    pub effect: PasteNodeEffect,
}

impl PasteNode {
    fn passive(id: &str, name: &str, branch: &str, effect: PassiveEffect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            branch: branch.into(),
            effect: PasteNodeEffect::Passive(effect),
        }
    }

    fn grant(id: &str, name: &str, branch: &str, skill: SkillKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            branch: branch.into(),
            effect: PasteNodeEffect::SkillGrant(skill),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteTree {
    pub nodes: Vec<PasteNode>,
}

impl Default for PasteTree {
    fn default() -> Self {
        Self {
            nodes: vec![
                PasteNode::passive(
                    "cleave_reality",
                    "Cleave Reality",
                    "warrior",
                    PassiveEffect::CleaveReality {
                        hits_required: 5,
                        damage_multiplier: 3.0,
                        cone_radius: 10.0 * TILE_SIZE,
                        slow_percentage: 0.7,
                        slow_duration: 3.0,
                    },
                ),
                PasteNode::grant("learn_cyclone", "Cyclone", "warrior", SkillKind::Cyclone),
                PasteNode::passive(
                    "honed_edge",
                    "Honed Edge",
                    "warrior",
                    PassiveEffect::StatBonus {
                        skill: Some(SkillKind::Cleave),
                        stat: SkillStat::Damage,
                        percentage: 0.2,
                    },
                ),
                PasteNode::grant("learn_ice_nova", "Ice Nova", "mage", SkillKind::IceNova),
                PasteNode::passive(
                    "nova_overload",
                    "Nova Overload",
                    "mage",
                    PassiveEffect::NovaOverload {
                        radius_increase: 0.5,
                        damage_increase: 0.25,
                    },
                ),
                PasteNode::passive(
                    "quantum_entanglement",
                    "Quantum Entanglement",
                    "mage",
                    PassiveEffect::QuantumEntanglement {
                        duplicate_chance: 0.2,
                        duplicate_damage_multiplier: 0.5,
                    },
                ),
                PasteNode::passive(
                    "double_size_barrier",
                    "Double Size Barrier",
                    "mage",
                    PassiveEffect::BarrierAmplifier {
                        size_multiplier: 2.0,
                    },
                ),
                PasteNode::passive(
                    "arc_singularity",
                    "Arc Singularity",
                    "mage",
                    PassiveEffect::ArcSingularity {
                        damage_increase: 0.5,
                        duration: 5.0,
                        cooldown: 15.0,
                    },
                ),
                PasteNode::passive(
                    "wide_reach",
                    "Wide Reach",
                    "mage",
                    PassiveEffect::StatBonus {
                        skill: None,
                        stat: SkillStat::Radius,
                        percentage: 0.1,
                    },
                ),
                PasteNode::passive(
                    "entropic_decay",
                    "Entropic Decay",
                    "void",
                    PassiveEffect::EntropicDecay {
                        damage_percentage: 0.02,
                        duration: 5.0,
                        max_stacks: 5,
                        tick_interval: 1.0,
                    },
                ),
                PasteNode::passive(
                    "necrotic_plague",
                    "Necrotic Plague",
                    "void",
                    PassiveEffect::NecroticPlague {
                        chance: 0.2,
                        damage_percentage_per_second: 0.1,
                        duration: 10.0,
                        max_stacks: 3,
                        spread_radius: 3.0 * TILE_SIZE,
                    },
                ),
                PasteNode::passive(
                    "singularity_core",
                    "Singularity Core",
                    "void",
                    PassiveEffect::SingularityCore {
                        chance: 0.05,
                        delay: 2.0,
                        damage_multiplier: 10.0,
                        pull_radius: 5.0 * TILE_SIZE,
                    },
                ),
                PasteNode::passive(
                    "void_embrace",
                    "Void Embrace",
                    "void",
                    PassiveEffect::VoidEmbrace {
                        hp_threshold: 0.3,
                        regen_percentage: 0.05,
                        duration: 3.0,
                        cooldown: 60.0,
                    },
                ),
                PasteNode::passive(
                    "paradox_armor",
                    "Paradox Armor",
                    "void",
                    PassiveEffect::ParadoxArmor {
                        damage_delay_percentage: 0.5,
                        damage_delay_duration: 3.0,
                        cooldown: 20.0,
                    },
                ),
            ],
        }
    }
}

impl PasteTree {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let tree: PasteTree = ron::from_str(source)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let tree = Self::from_ron_str(&read_config(path)?)?;
        info!(path = %path.display(), nodes = tree.nodes.len(), "paste tree loaded");
        Ok(tree)
    }

    pub fn node(&self, id: &str) -> Option<&PasteNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn branch<'a>(&'a self, branch: &'a str) -> impl Iterator<Item = &'a PasteNode> + 'a {
        self.nodes.iter().filter(move |n| n.branch == branch)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            ensure(!node.id.is_empty(), "<unnamed node>", "id", "must not be empty")?;
            ensure(seen.insert(node.id.as_str()), &node.id, "id", "is duplicated")?;
            if let PasteNodeEffect::Passive(effect) = &node.effect {
                validate_effect(&node.id, effect)?;
            }
        }
        Ok(())
    }

    /// Acquire `id` for `player`. `Ok(false)` if it was already acquired.
    pub fn acquire(&self, player: &mut Player, id: &str) -> Result<bool, ConfigError> {
        let Some(node) = self.node(id) else {
            warn!(node = id, "unknown paste node");
            return Err(ConfigError::UnknownPasteNode(id.to_string()));
        };
        if !player.record_node(id) {
            return Ok(false);
        }
        match &node.effect {
            PasteNodeEffect::Passive(effect) => {
                player.acquire_passive(id, effect.clone());
            }
            PasteNodeEffect::SkillGrant(skill) => {
                player.learn(*skill);
            }
        }
        info!(node = id, branch = %node.branch, "paste node acquired");
        Ok(true)
    }
}

fn fraction(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    ensure((0.0..=1.0).contains(&value), owner, field, "must be in [0, 1]")
}

fn non_negative(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    ensure(value >= 0.0 && value.is_finite(), owner, field, "must not be negative")
}

fn positive(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    ensure(value > 0.0 && value.is_finite(), owner, field, "must be positive")
}

fn validate_effect(owner: &str, effect: &PassiveEffect) -> Result<(), ConfigError> {
    match *effect {
        PassiveEffect::CleaveReality {
            hits_required,
            damage_multiplier,
            cone_radius,
            slow_percentage,
            slow_duration,
        } => {
            ensure(hits_required >= 1, owner, "hits_required", "must be at least 1")?;
            non_negative(owner, "damage_multiplier", damage_multiplier)?;
            positive(owner, "cone_radius", cone_radius)?;
            fraction(owner, "slow_percentage", slow_percentage)?;
            non_negative(owner, "slow_duration", slow_duration)
        }
        PassiveEffect::NovaOverload {
            radius_increase,
            damage_increase,
        } => {
            non_negative(owner, "radius_increase", radius_increase)?;
            non_negative(owner, "damage_increase", damage_increase)
        }
        PassiveEffect::QuantumEntanglement {
            duplicate_chance,
            duplicate_damage_multiplier,
        } => {
            fraction(owner, "duplicate_chance", duplicate_chance)?;
            non_negative(owner, "duplicate_damage_multiplier", duplicate_damage_multiplier)
        }
        PassiveEffect::EntropicDecay {
            damage_percentage,
            duration,
            max_stacks,
            tick_interval,
        } => {
            fraction(owner, "damage_percentage", damage_percentage)?;
            non_negative(owner, "duration", duration)?;
            ensure(max_stacks >= 1, owner, "max_stacks", "must be at least 1")?;
            positive(owner, "tick_interval", tick_interval)
        }
        PassiveEffect::NecroticPlague {
            chance,
            damage_percentage_per_second,
            duration,
            max_stacks,
            spread_radius,
        } => {
            fraction(owner, "chance", chance)?;
            fraction(owner, "damage_percentage_per_second", damage_percentage_per_second)?;
            non_negative(owner, "duration", duration)?;
            ensure(max_stacks >= 1, owner, "max_stacks", "must be at least 1")?;
            non_negative(owner, "spread_radius", spread_radius)
        }
        PassiveEffect::SingularityCore {
            chance,
            delay,
            damage_multiplier,
            pull_radius,
        } => {
            fraction(owner, "chance", chance)?;
            positive(owner, "delay", delay)?;
            non_negative(owner, "damage_multiplier", damage_multiplier)?;
            non_negative(owner, "pull_radius", pull_radius)
        }
        PassiveEffect::VoidEmbrace {
            hp_threshold,
            regen_percentage,
            duration,
            cooldown,
        } => {
            fraction(owner, "hp_threshold", hp_threshold)?;
            fraction(owner, "regen_percentage", regen_percentage)?;
            non_negative(owner, "duration", duration)?;
            non_negative(owner, "cooldown", cooldown)
        }
        PassiveEffect::ParadoxArmor {
            damage_delay_percentage,
            damage_delay_duration,
            cooldown,
        } => {
            fraction(owner, "damage_delay_percentage", damage_delay_percentage)?;
            non_negative(owner, "damage_delay_duration", damage_delay_duration)?;
            non_negative(owner, "cooldown", cooldown)
        }
        PassiveEffect::ArcSingularity {
            damage_increase,
            duration,
            cooldown,
        } => {
            non_negative(owner, "damage_increase", damage_increase)?;
            non_negative(owner, "duration", duration)?;
            non_negative(owner, "cooldown", cooldown)
        }
        PassiveEffect::BarrierAmplifier { size_multiplier } => {
            positive(owner, "size_multiplier", size_multiplier)
        }
        PassiveEffect::StatBonus { percentage, .. } => ensure(
            percentage.is_finite() && percentage > -1.0,
            owner,
            "percentage",
            "must be finite and above -1",
        ),
    }
}
