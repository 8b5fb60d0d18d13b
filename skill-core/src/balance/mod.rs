//! Monte-Carlo skill balance simulation.
//!
//! Runs seeded trials of every skill at a set of player levels against a
//! randomly placed dummy pack and reports damage per cast, damage per mana
//! and spread. Trials run in parallel with rayon; each trial's seed is
//! derived from SHA3 of (base seed, skill, level, trial) so a report is
//! reproducible on any thread count.

use bevy::math::Vec2;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::f32::consts::TAU;
use std::sync::Arc;
use tracing::info;

use crate::config::SkillBook;
use crate::engine::CombatWorld;
use crate::player::Player;
use crate::rng::seeded;
use crate::scene::Enemy;
use crate::skills::SkillKind;

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub levels: Vec<u32>,
    pub trials: u64,
    pub base_seed: u64,
    pub pack_size: usize,
    /// Dummies are effectively unkillable so damage is not capped by life
    pub enemy_life: f32,
    /// Pack is scattered uniformly over a disk of this radius around the player
    pub arena_radius: f32,
    pub mana_pool: f32,
    /// Seconds simulated after each cast
    pub duration: f32,
    pub frame_dt: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            levels: vec![1, 25, 50, 100],
            trials: 200,
            base_seed: 42,
            pack_size: 12,
            enemy_life: 1.0e9,
            arena_radius: 200.0,
            mana_pool: 1000.0,
            duration: 2.0,
            frame_dt: 1.0 / 60.0,
        }
    }
}

/// Aggregated results for one skill at one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillBalanceEntry {
    pub skill: SkillKind,
    pub level: u32,
    pub mean_damage: f32,
    pub std_deviation: f32,
    pub min_damage: f32,
    pub max_damage: f32,
    pub mean_mana: f32,
    pub damage_per_mana: f32,
    pub mean_hits: f32,
}

/// Overall balance assessment from the damage-per-mana spread at a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceGrade {
    Excellent, // ratio < 1.5
    Good,      // ratio < 2.0
    Fair,      // ratio < 3.0
    Poor,      // ratio < 5.0
    Critical,  // ratio >= 5.0
}

impl BalanceGrade {
    fn from_ratio(ratio: f32) -> Self {
        if ratio < 1.5 {
            BalanceGrade::Excellent
        } else if ratio < 2.0 {
            BalanceGrade::Good
        } else if ratio < 3.0 {
            BalanceGrade::Fair
        } else if ratio < 5.0 {
            BalanceGrade::Poor
        } else {
            BalanceGrade::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpread {
    pub level: u32,
    /// Best / worst damage per mana across skills
    pub ratio: f32,
    pub grade: BalanceGrade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub trials_per_entry: u64,
    pub entries: Vec<SkillBalanceEntry>,
    pub spreads: Vec<LevelSpread>,
}

impl BalanceReport {
    pub fn entry(&self, skill: SkillKind, level: u32) -> Option<&SkillBalanceEntry> {
        self.entries
            .iter()
            .find(|e| e.skill == skill && e.level == level)
    }
}

#[derive(Debug, Clone, Copy)]
struct TrialOutcome {
    damage: f32,
    mana: f32,
    hits: usize,
}

fn trial_seed(base_seed: u64, skill: SkillKind, level: u32, trial: u64) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(skill.as_str().as_bytes());
    hasher.update(level.to_le_bytes());
    hasher.update(trial.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Cast once into a fresh pack and follow the skill until it goes idle or the window closes
fn run_trial(
    book: &Arc<SkillBook>,
    config: &BalanceConfig,
    skill: SkillKind,
    level: u32,
    seed: u64,
) -> TrialOutcome {
    let mut player = Player::new(Vec2::ZERO)
        .with_level(level)
        .with_mana(config.mana_pool);
    player.mana_regen = 0.0;
    player.learn(skill);

    let mut world = CombatWorld::new(Arc::clone(book), player, seed.wrapping_add(1));
    let mut placement = seeded(seed);
    for _ in 0..config.pack_size {
        let r = config.arena_radius * placement.gen::<f32>().sqrt();
        let theta = placement.gen::<f32>() * TAU;
        let position = Vec2::new(r * theta.cos(), r * theta.sin());
        world.scene.spawn_enemy(Enemy::new(position, config.enemy_life));
    }
    world.set_aim(Vec2::X);

    let Ok(cast) = world.cast(skill) else {
        return TrialOutcome {
            damage: 0.0,
            mana: 0.0,
            hits: 0,
        };
    };
    let mut damage: f32 = cast.hits.iter().map(|h| h.amount).sum();
    let mut hits = cast.hits.len();

    let steps = (config.duration / config.frame_dt.max(1e-4)).ceil() as usize;
    for _ in 0..steps {
        if world.skills.is_idle() {
            break;
        }
        let frame = world.advance(config.frame_dt);
        damage += frame.skill_damage();
        hits += frame.hits.len();
    }

    TrialOutcome {
        damage,
        mana: config.mana_pool - world.player.mana,
        hits,
    }
}

/// Run the Monte-Carlo simulation with rayon parallelism
pub fn run_balance_simulation(book: &SkillBook, config: &BalanceConfig) -> BalanceReport {
    let book = Arc::new(book.clone());
    let jobs: Vec<(SkillKind, u32)> = SkillKind::all()
        .into_iter()
        .flat_map(|skill| config.levels.iter().map(move |&level| (skill, level)))
        .collect();

    let entries: Vec<SkillBalanceEntry> = jobs
        .par_iter()
        .map(|&(skill, level)| {
            let outcomes: Vec<TrialOutcome> = (0..config.trials)
                .into_par_iter()
                .map(|trial| {
                    let seed = trial_seed(config.base_seed, skill, level, trial);
                    run_trial(&book, config, skill, level, seed)
                })
                .collect();
            summarize(skill, level, &outcomes)
        })
        .collect();

    let spreads = config
        .levels
        .iter()
        .map(|&level| level_spread(level, &entries))
        .collect();

    info!(
        entries = entries.len(),
        trials = config.trials,
        "balance simulation complete"
    );
    BalanceReport {
        trials_per_entry: config.trials,
        entries,
        spreads,
    }
}

fn summarize(skill: SkillKind, level: u32, outcomes: &[TrialOutcome]) -> SkillBalanceEntry {
    if outcomes.is_empty() {
        return SkillBalanceEntry {
            skill,
            level,
            mean_damage: 0.0,
            std_deviation: 0.0,
            min_damage: 0.0,
            max_damage: 0.0,
            mean_mana: 0.0,
            damage_per_mana: 0.0,
            mean_hits: 0.0,
        };
    }
    let n = outcomes.len() as f32;
    let mean = outcomes.iter().map(|o| o.damage).sum::<f32>() / n;
    let variance = outcomes
        .iter()
        .map(|o| (o.damage - mean).powi(2))
        .sum::<f32>()
        / n;
    let min = outcomes.iter().map(|o| o.damage).fold(f32::MAX, f32::min);
    let max = outcomes.iter().map(|o| o.damage).fold(f32::MIN, f32::max);
    let mean_mana = outcomes.iter().map(|o| o.mana).sum::<f32>() / n;
    let mean_hits = outcomes.iter().map(|o| o.hits as f32).sum::<f32>() / n;

    SkillBalanceEntry {
        skill,
        level,
        mean_damage: mean,
        std_deviation: variance.sqrt(),
        min_damage: min,
        max_damage: max,
        mean_mana,
        damage_per_mana: if mean_mana > 0.0 { mean / mean_mana } else { 0.0 },
        mean_hits,
    }
}

fn level_spread(level: u32, entries: &[SkillBalanceEntry]) -> LevelSpread {
    let efficiencies: Vec<f32> = entries
        .iter()
        .filter(|e| e.level == level && e.damage_per_mana > 0.0)
        .map(|e| e.damage_per_mana)
        .collect();
    let best = efficiencies.iter().cloned().fold(0.0, f32::max);
    let worst = efficiencies.iter().cloned().fold(f32::MAX, f32::min);
    let ratio = if efficiencies.is_empty() || worst <= 0.001 {
        1.0
    } else {
        best / worst
    };
    LevelSpread {
        level,
        ratio,
        grade: BalanceGrade::from_ratio(ratio),
    }
}
