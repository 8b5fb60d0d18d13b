//! Damage values and per-enemy status effects.

pub mod damage;
pub mod status;

pub use damage::{DamageRange, DamageResult, DamageType};
pub use status::{DebuffKind, DebuffSpec, LifeSnapshot, StatusLedger, StatusTick, TickDamage};
