//! Skill book loading and validation.
//!
//! Definitions are read once from RON and validated before any frame runs.
//! After that the book is immutable and shared as `Arc<SkillBook>`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::combat::damage::DamageType;
use crate::constants::TILE_SIZE;
use crate::curve::{Breakpoint, CurveError, DamageCurve, ScalingCurve};
use crate::skills::cyclone::ChannelDrain;
use crate::skills::ice_nova::BarrierParams;
use crate::skills::{
    CleaveShape, CycloneShape, FreezeParams, IceNovaShape, ManaCost, SkillDefinition, SkillKind,
    SlowParams,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("skill '{skill}' has an invalid damage curve: {source}")]
    InvalidCurve {
        skill: String,
        #[source]
        source: CurveError,
    },
    #[error("skill '{skill}' has an invalid {curve} curve: {source}")]
    InvalidScaling {
        skill: String,
        curve: &'static str,
        #[source]
        source: CurveError,
    },
    #[error("'{owner}': {field} {reason}")]
    InvalidParameter {
        owner: String,
        field: &'static str,
        reason: String,
    },
    #[error("unknown paste node '{0}'")]
    UnknownPasteNode(String),
}

/// Fail with `InvalidParameter` unless `ok`
pub(crate) fn ensure(
    ok: bool,
    owner: &str,
    field: &'static str,
    reason: &str,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            owner: owner.to_string(),
            field,
            reason: reason.to_string(),
        })
    }
}

pub(crate) fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every skill definition the core knows how to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBook {
    pub cleave: SkillDefinition<CleaveShape>,
    pub cyclone: SkillDefinition<CycloneShape>,
    pub ice_nova: SkillDefinition<IceNovaShape>,
}

impl Default for SkillBook {
    fn default() -> Self {
        Self {
            cleave: SkillDefinition {
                id: "cleave".into(),
                name: "Cleave".into(),
                mana_cost: ManaCost {
                    flat: 7.0,
                    per_level: 0.0,
                },
                cooldown: 0.0,
                damage_type: DamageType::Physical,
                damage: DamageCurve::constant(50.0, 200.0),
                spell: false,
                shape: CleaveShape {
                    arc_degrees: 90.0,
                    attack_range: 6.0 * TILE_SIZE,
                },
            },
            cyclone: SkillDefinition {
                id: "cyclone".into(),
                name: "Cyclone".into(),
                mana_cost: ManaCost {
                    flat: 10.0,
                    per_level: 5.0,
                },
                cooldown: 0.0,
                damage_type: DamageType::Physical,
                damage: DamageCurve::from_points(&[
                    Breakpoint::new(1, 10.0, 20.0),
                    Breakpoint::new(50, 50.0, 100.0),
                    Breakpoint::new(100, 100.0, 200.0),
                    Breakpoint::new(200, 1000.0, 2000.0),
                ]),
                spell: false,
                shape: CycloneShape {
                    base_radius: 3.375 * TILE_SIZE,
                    radius_scale: ScalingCurve::from_points(&[(1, 1.0), (100, 1.5), (200, 2.0)]),
                    hit_interval: 0.05,
                    rotation_speed: ScalingCurve::from_points(&[
                        (1, 100.0),
                        (50, 500.0),
                        (100, 900.0),
                        (200, 1800.0),
                    ]),
                    drain: ChannelDrain {
                        base_fraction: 0.1,
                        per_level_fraction: 0.002,
                    },
                },
            },
            ice_nova: SkillDefinition {
                id: "ice_nova".into(),
                name: "Ice Nova".into(),
                mana_cost: ManaCost {
                    flat: 15.0,
                    per_level: 3.0,
                },
                cooldown: 0.5,
                damage_type: DamageType::Cold,
                damage: DamageCurve::from_points(&[
                    Breakpoint::new(1, 15.0, 30.0),
                    Breakpoint::new(50, 300.0, 500.0),
                    Breakpoint::new(100, 3000.0, 3000.0),
                ]),
                spell: true,
                shape: IceNovaShape {
                    max_radius: 5.0 * TILE_SIZE,
                    expand_time: 0.5,
                    contract_time: 0.1,
                    min_rehit_interval: 0.1,
                    inner_multiplier: 1.5,
                    outer_multiplier: 0.7,
                    freeze: FreezeParams {
                        base: 1.5,
                        per_chill_stack: 0.2,
                    },
                    chill: SlowParams {
                        percentage: 0.3,
                        duration: 4.0,
                    },
                    barrier: BarrierParams {
                        duration: 10.0,
                        tick_interval: 0.5,
                        damage_multiplier: 0.1,
                        slow: SlowParams {
                            percentage: 0.9,
                            duration: 1.0,
                        },
                    },
                },
            },
        }
    }
}

impl SkillBook {
    /// Parse and validate
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let book: SkillBook = ron::from_str(source)?;
        book.validate()?;
        Ok(book)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let book = Self::from_ron_str(&read_config(path)?).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "skill book rejected");
        })?;
        info!(path = %path.display(), "skill book loaded");
        Ok(book)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_definition(&self.cleave)?;
        validate_definition(&self.cyclone)?;
        validate_definition(&self.ice_nova)?;

        let id = self.cleave.id.as_str();
        let cleave = &self.cleave.shape;
        ensure(
            cleave.arc_degrees > 0.0 && cleave.arc_degrees <= 360.0,
            id,
            "arc_degrees",
            "must be in (0, 360]",
        )?;
        ensure(cleave.attack_range > 0.0, id, "attack_range", "must be positive")?;

        let id = self.cyclone.id.as_str();
        let cyclone = &self.cyclone.shape;
        ensure(cyclone.base_radius > 0.0, id, "base_radius", "must be positive")?;
        ensure(cyclone.hit_interval > 0.0, id, "hit_interval", "must be positive")?;
        ensure(
            cyclone.drain.base_fraction >= 0.0 && cyclone.drain.per_level_fraction >= 0.0,
            id,
            "drain",
            "must not be negative",
        )?;
        for (curve, scaling) in [
            ("rotation_speed", &cyclone.rotation_speed),
            ("radius_scale", &cyclone.radius_scale),
        ] {
            scaling
                .validate()
                .map_err(|source| ConfigError::InvalidScaling {
                    skill: id.to_string(),
                    curve,
                    source,
                })?;
        }
        ensure(
            cyclone.radius_scale.evaluate(0) > 0.0,
            id,
            "radius_scale",
            "must be positive",
        )?;

        let id = self.ice_nova.id.as_str();
        let nova = &self.ice_nova.shape;
        ensure(nova.max_radius > 0.0, id, "max_radius", "must be positive")?;
        ensure(nova.expand_time > 0.0, id, "expand_time", "must be positive")?;
        ensure(nova.contract_time > 0.0, id, "contract_time", "must be positive")?;
        ensure(
            nova.inner_multiplier >= 0.0 && nova.outer_multiplier >= 0.0,
            id,
            "ring multipliers",
            "must not be negative",
        )?;
        ensure(
            (0.0..=1.0).contains(&nova.chill.percentage),
            id,
            "chill.percentage",
            "must be in [0, 1]",
        )?;
        ensure(
            nova.freeze.base >= 0.0 && nova.freeze.per_chill_stack >= 0.0,
            id,
            "freeze",
            "must not be negative",
        )?;
        ensure(nova.barrier.duration >= 0.0, id, "barrier.duration", "must not be negative")?;
        ensure(
            nova.barrier.tick_interval > 0.0,
            id,
            "barrier.tick_interval",
            "must be positive",
        )?;
        ensure(
            (0.0..=1.0).contains(&nova.barrier.slow.percentage),
            id,
            "barrier.slow.percentage",
            "must be in [0, 1]",
        )?;
        Ok(())
    }

    /// Upfront mana cost at `level`
    pub fn cost(&self, skill: SkillKind, level: u32) -> f32 {
        match skill {
            SkillKind::Cleave => self.cleave.cost_at(level),
            SkillKind::Cyclone => self.cyclone.cost_at(level),
            SkillKind::IceNova => self.ice_nova.cost_at(level),
        }
    }

    pub fn cooldown(&self, skill: SkillKind) -> f32 {
        match skill {
            SkillKind::Cleave => self.cleave.cooldown,
            SkillKind::Cyclone => self.cyclone.cooldown,
            SkillKind::IceNova => self.ice_nova.cooldown,
        }
    }

    pub fn name(&self, skill: SkillKind) -> &str {
        match skill {
            SkillKind::Cleave => &self.cleave.name,
            SkillKind::Cyclone => &self.cyclone.name,
            SkillKind::IceNova => &self.ice_nova.name,
        }
    }
}

fn validate_definition<S>(definition: &SkillDefinition<S>) -> Result<(), ConfigError> {
    let id = definition.id.as_str();
    ensure(!id.is_empty(), "<unnamed skill>", "id", "must not be empty")?;
    definition
        .damage
        .validate()
        .map_err(|source| ConfigError::InvalidCurve {
            skill: id.to_string(),
            source,
        })?;
    let cost = definition.mana_cost;
    ensure(
        cost.flat.is_finite() && cost.per_level.is_finite() && cost.flat >= 0.0,
        id,
        "mana_cost",
        "must be finite and not negative",
    )?;
    ensure(definition.cooldown >= 0.0, id, "cooldown", "must not be negative")?;
    Ok(())
}
