//! Centralized tuning constants for the skill core.
//!
//! Default skill and passive numbers live in `config` as the single source
//! of truth; this file holds the values shared across modules.

// =====================================================
// World
// =====================================================

/// Size of one map tile in world units (pixels)
pub const TILE_SIZE: f32 = 32.0;

// =====================================================
// Hit testing
// =====================================================

/// distance / radius below which a point is in the inner ring
pub const INNER_RING_RATIO: f32 = 0.33;

// =====================================================
// Status effects
// =====================================================

/// Slow percentage used to represent a freeze
pub const FREEZE_SLOW: f32 = 1.0;

/// Upper bound on chill stacks an enemy can carry
pub const MAX_CHILL_STACKS: u32 = 10;

// =====================================================
// Passives
// =====================================================

/// Interval between Void Embrace regeneration pulses (seconds)
pub const VOID_EMBRACE_REGEN_INTERVAL: f32 = 1.0;

/// Speed at which a pending singularity drags nearby enemies (units/s)
pub const SINGULARITY_PULL_SPEED: f32 = 50.0;

// =====================================================
// Engine
// =====================================================

/// Frame delta clamp so a stalled frame cannot resolve minutes of channeling at once
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Default RNG seed for a combat world
pub const DEFAULT_COMBAT_SEED: u64 = 42;

/// Flat damage added to every learned skill on level-up
pub const LEVEL_UP_DAMAGE_BONUS: f32 = 10.0;
