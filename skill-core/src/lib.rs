//! Path of Python - Skill-Effect Core Library
//!
//! Deterministic combat logic for the three active skills and the passive
//! tree that modifies them:
//! - Level-indexed damage curves with linear interpolation
//! - Geometric hit tests (arc sweeps, rings, radius queries)
//! - Per-enemy status ledger (freeze, chill, slow, damage-over-time)
//! - Cleave, Cyclone and Ice Nova state machines plus the Ice Barrier
//! - Passive modifier composition (stat bonuses, procs, and the cycling
//!   Void Embrace, Paradox Armor and Arc Singularity states)
//! - Frame stepper and Bevy plugin
//! - RON skill/passive configuration and a Monte-Carlo balance report

pub mod balance;
pub mod combat;
pub mod config;
pub mod constants;
pub mod curve;
pub mod engine;
pub mod geometry;
pub mod logging;
pub mod passives;
pub mod player;
pub mod rng;
pub mod scene;
pub mod skills;
