//! Cleave: a melee arc resolved once, synchronously, at activation.
//!
//! With Cleave Reality acquired, landed hits accumulate; reaching the
//! threshold fires a wider cone with amplified damage and a heavy slow, then
//! resets the counter.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::resolve::{Resolver, StatusApplication, Strike};
use super::SlowParams;
use crate::combat::damage::DamageType;
use crate::geometry::{facing_angle, within_cone};
use crate::passives::EffectiveParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaveShape {
    /// Full arc width in degrees
    pub arc_degrees: f32,
    pub attack_range: f32,
}

impl CleaveShape {
    pub fn half_width(&self) -> f32 {
        self.arc_degrees.to_radians() * 0.5
    }
}

/// Cleave Reality tuning, read from the acquired passive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealityParams {
    pub hits_required: u32,
    pub damage_multiplier: f32,
    pub cone_radius: f32,
    pub slow: SlowParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CleavePhase {
    #[default]
    Idle,
    Resolving,
}

/// Last swing, kept for presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaveSwing {
    pub origin: Vec2,
    pub facing: f32,
    pub radius: f32,
    pub reality: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaveOutcome {
    pub landed: usize,
    pub reality_landed: usize,
    pub reality_triggered: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaveState {
    pub phase: CleavePhase,
    /// Landed hits since the last Reality trigger
    pub reality_hits: u32,
    pub last_swing: Option<CleaveSwing>,
}

impl CleaveState {
    /// Resolve one swing from `origin` toward `aim`
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &mut self,
        shape: &CleaveShape,
        origin: Vec2,
        aim: Vec2,
        damage_type: DamageType,
        params: &EffectiveParams,
        reality: Option<&RealityParams>,
        resolver: &mut Resolver<'_>,
    ) -> CleaveOutcome {
        self.phase = CleavePhase::Resolving;
        let facing = facing_angle(origin, aim);
        let half_width = shape.half_width();
        let range = shape.attack_range * params.radius_multiplier;

        let targets = resolver.targets(|p| within_cone(origin, range, facing, half_width, p));
        let landed = resolver.strike(&targets, |_| Strike::plain(params.damage, damage_type));
        self.reality_hits += landed as u32;

        let mut outcome = CleaveOutcome {
            landed,
            ..Default::default()
        };

        if let Some(reality) = reality {
            if self.reality_hits >= reality.hits_required {
                info!(hits = self.reality_hits, "cleave reality triggered");
                self.reality_hits = 0;
                outcome.reality_triggered = true;

                let cone = reality.cone_radius * params.radius_multiplier;
                let amplified = params.damage.scaled(reality.damage_multiplier);
                let targets = resolver.targets(|p| within_cone(origin, cone, facing, half_width, p));
                outcome.reality_landed = resolver.strike(&targets, |_| {
                    Strike::plain(amplified, damage_type)
                        .with_status(StatusApplication::Slow(reality.slow))
                });
            }
        }

        self.last_swing = Some(CleaveSwing {
            origin,
            facing,
            radius: range,
            reality: outcome.reality_triggered,
        });
        self.phase = CleavePhase::Idle;
        outcome
    }
}
