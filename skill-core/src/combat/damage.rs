//! Damage values produced by the curve evaluator and consumed by hit resolution.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Damage types dealt by skills and passives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Cold,
    Necrotic,
    Chaos,
}

impl DamageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Cold => "cold",
            DamageType::Necrotic => "necrotic",
            DamageType::Chaos => "chaos",
        }
    }
}

/// Inclusive {min, max} damage window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: f32,
    pub max: f32,
}

impl DamageRange {
    pub const ZERO: DamageRange = DamageRange { min: 0.0, max: 0.0 };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Multiply both ends (zone multipliers, passive damage bonuses)
    pub fn scaled(self, multiplier: f32) -> Self {
        Self {
            min: self.min * multiplier,
            max: self.max * multiplier,
        }
    }

    /// Add a flat amount to both ends (level-up damage points)
    pub fn with_flat_bonus(self, bonus: f32) -> Self {
        Self {
            min: self.min + bonus,
            max: self.max + bonus,
        }
    }

    pub fn midpoint(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Uniform integer draw over `[floor(min), floor(max)]`.
    ///
    /// Negative or inverted windows collapse onto their lower bound.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if !self.min.is_finite() || !self.max.is_finite() {
            return 0.0;
        }
        let lo = self.min.max(0.0).floor() as i64;
        let hi = (self.max.max(0.0).floor() as i64).max(lo);
        if lo == hi {
            return lo as f32;
        }
        rng.gen_range(lo..=hi) as f32
    }
}

/// Result of one damage roll, applied immediately and never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageResult {
    pub amount: f32,
    pub damage_type: DamageType,
}

impl DamageResult {
    pub fn roll<R: Rng + ?Sized>(range: DamageRange, damage_type: DamageType, rng: &mut R) -> Self {
        Self {
            amount: range.roll(rng),
            damage_type,
        }
    }
}
