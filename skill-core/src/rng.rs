//! Deterministic RNG for combat rolls.
//!
//! Every random draw in the core (damage rolls, proc chances) goes through a
//! `CombatRng` owned by the combat world, so a seed plus an input sequence
//! replays the same fight.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Concrete generator used by the combat world
pub type CombatRng = Xoshiro256PlusPlus;

/// Create a seeded combat RNG
pub fn seeded(seed: u64) -> CombatRng {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Bernoulli draw that tolerates out-of-range probabilities from config
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.gen_bool(probability as f64)
}
