//! Player state consumed by skill resolution.
//!
//! The combat world reads position, aim, level and the acquired passives,
//! and reads/writes mana and life. Skills the player has not learned cannot
//! be cast.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::passives::{CycleTick, PassiveEffect, PassiveModifierSet, PassiveStates};
use crate::skills::SkillKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    /// Aim target in world space, used for facing
    pub aim: Vec2,
    pub level: u32,
    pub mana: f32,
    pub max_mana: f32,
    /// Mana per second
    pub mana_regen: f32,
    pub life: f32,
    pub max_life: f32,
    pub passives: PassiveModifierSet,
    pub passive_states: PassiveStates,
    learned: BTreeSet<SkillKind>,
    acquired_nodes: Vec<String>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            aim: Vec2::X,
            level: 1,
            mana: 100.0,
            max_mana: 100.0,
            mana_regen: 5.0,
            life: 100.0,
            max_life: 100.0,
            passives: PassiveModifierSet::new(),
            passive_states: PassiveStates::new(),
            learned: BTreeSet::from([SkillKind::Cleave]),
            acquired_nodes: Vec::new(),
        }
    }
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            aim: position + Vec2::X,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Set both current and max mana
    pub fn with_mana(mut self, mana: f32) -> Self {
        self.mana = mana;
        self.max_mana = mana;
        self
    }

    pub fn with_life(mut self, life: f32) -> Self {
        self.life = life;
        self.max_life = life;
        self
    }

    /// Returns false if already known
    pub fn learn(&mut self, skill: SkillKind) -> bool {
        let added = self.learned.insert(skill);
        if added {
            info!(skill = skill.as_str(), "skill learned");
        }
        added
    }

    pub fn knows(&self, skill: SkillKind) -> bool {
        self.learned.contains(&skill)
    }

    pub fn learned_skills(&self) -> impl Iterator<Item = SkillKind> + '_ {
        self.learned.iter().copied()
    }

    /// Add a passive and create its cycling state if it has one
    pub fn acquire_passive(&mut self, id: &str, effect: PassiveEffect) -> bool {
        let kind = effect.kind_name();
        let cycling = effect.is_cycling();
        if !self.passives.insert(id, effect) {
            return false;
        }
        if cycling {
            self.passive_states.sync(&self.passives);
        }
        info!(passive = id, kind, cycling, "passive acquired");
        true
    }

    /// Remember an acquired paste node. Returns false on repeats.
    pub fn record_node(&mut self, id: &str) -> bool {
        if self.has_node(id) {
            return false;
        }
        self.acquired_nodes.push(id.to_string());
        true
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.acquired_nodes.iter().any(|n| n == id)
    }

    pub fn acquired_nodes(&self) -> &[String] {
        &self.acquired_nodes
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    pub fn is_intangible(&self) -> bool {
        self.passive_states.is_intangible()
    }

    /// Incoming damage from the scene. Returns the amount taken now.
    pub fn receive_damage(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 || self.is_intangible() {
            return 0.0;
        }
        let immediate = self.passive_states.absorb_hit(amount);
        self.lose_life(immediate)
    }

    /// Apply the heal and released damage of a passive tick
    pub fn apply_cycle(&mut self, tick: &CycleTick) {
        if tick.heal > 0.0 {
            self.life = (self.life + tick.heal).min(self.max_life);
        }
        if tick.delayed_damage > 0.0 {
            let taken = self.lose_life(tick.delayed_damage);
            info!(taken, "delayed damage released");
        }
    }

    pub fn regenerate(&mut self, dt: f32) {
        self.mana = (self.mana + self.mana_regen * dt).min(self.max_mana);
    }

    fn lose_life(&mut self, amount: f32) -> f32 {
        let taken = amount.max(0.0).min(self.life.max(0.0));
        self.life -= taken;
        taken
    }
}

// ===== Tests =====
