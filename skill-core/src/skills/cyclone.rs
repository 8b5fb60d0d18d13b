//! Cyclone: a continuous channel.
//!
//! Entering the channel costs an upfront amount; after that mana drains
//! every frame at a rate scaled by level and max mana. Hits land on a fixed
//! interval driven by an elapsed-time accumulator, and every hit also
//! destroys projectiles inside the radius.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::resolve::{Resolver, Strike};
use crate::combat::damage::{DamageRange, DamageType};
use crate::curve::ScalingCurve;
use crate::geometry::within_circle;
use crate::passives::EffectiveParams;
use crate::scene::ProjectileContainer;

/// Per-second drain as a fraction of max mana: `base + per_level * level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDrain {
    pub base_fraction: f32,
    pub per_level_fraction: f32,
}

impl ChannelDrain {
    pub fn per_second(&self, level: u32, max_mana: f32) -> f32 {
        max_mana * (self.base_fraction + self.per_level_fraction * level as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycloneShape {
    pub base_radius: f32,
    /// Multiplier on `base_radius` by player level
    pub radius_scale: ScalingCurve,
    /// Seconds between hit resolutions
    pub hit_interval: f32,
    /// Degrees per second by level
    pub rotation_speed: ScalingCurve,
    pub drain: ChannelDrain,
}

impl CycloneShape {
    /// Level-scaled radius before passives
    pub fn radius_at(&self, level: u32) -> f32 {
        self.base_radius * self.radius_scale.evaluate(level)
    }
}

/// Result of advancing a channel by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStep {
    Continue { hits: usize, projectiles_destroyed: usize },
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycloneChannel {
    pub radius: f32,
    pub damage: DamageRange,
    pub damage_type: DamageType,
    /// Degrees, kept in [0, 360)
    pub rotation_angle: f32,
    pub rotation_speed: f32,
    pub hit_interval: f32,
    pub drain_per_second: f32,
    pub since_hit: f32,
    pub elapsed: f32,
}

impl CycloneChannel {
    /// Parameters are fixed for the lifetime of the channel
    pub fn start(
        shape: &CycloneShape,
        level: u32,
        max_mana: f32,
        damage_type: DamageType,
        params: &EffectiveParams,
    ) -> Self {
        Self {
            radius: shape.radius_at(level) * params.radius_multiplier,
            damage: params.damage,
            damage_type,
            rotation_angle: 0.0,
            rotation_speed: shape.rotation_speed.evaluate(level),
            hit_interval: shape.hit_interval,
            drain_per_second: shape.drain.per_second(level, max_mana),
            since_hit: 0.0,
            elapsed: 0.0,
        }
    }

    /// Drain, rotate and resolve due hits around `center`.
    ///
    /// When the drain empties the pool the channel ends without hitting this frame.
    pub fn advance(
        &mut self,
        dt: f32,
        center: Vec2,
        mana: &mut f32,
        resolver: &mut Resolver<'_>,
        projectiles: &mut dyn ProjectileContainer,
    ) -> ChannelStep {
        let drain = self.drain_per_second * dt;
        if *mana - drain <= 0.0 {
            *mana = 0.0;
            return ChannelStep::Exhausted;
        }
        *mana -= drain;
        self.elapsed += dt;
        self.rotation_angle = (self.rotation_angle + self.rotation_speed * dt).rem_euclid(360.0);

        let mut hits = 0;
        let mut projectiles_destroyed = 0;
        if self.hit_interval <= 0.0 {
            return ChannelStep::Continue {
                hits,
                projectiles_destroyed,
            };
        }

        self.since_hit += dt;
        while self.since_hit >= self.hit_interval {
            self.since_hit -= self.hit_interval;
            let radius = self.radius;
            let targets = resolver.targets(|p| within_circle(center, radius, p));
            hits += resolver.strike(&targets, |_| Strike::plain(self.damage, self.damage_type));

            for projectile in projectiles.snapshot() {
                if within_circle(center, radius, projectile.position) && projectiles.destroy(projectile.id)
                {
                    projectiles_destroyed += 1;
                }
            }
        }
        if projectiles_destroyed > 0 {
            debug!(projectiles_destroyed, "cyclone blocked projectiles");
        }
        ChannelStep::Continue {
            hits,
            projectiles_destroyed,
        }
    }
}

/// Channel archetype states
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ChannelState {
    Channeling(CycloneChannel),
    #[default]
    Stopped,
}

impl ChannelState {
    pub fn is_channeling(&self) -> bool {
        matches!(self, ChannelState::Channeling(_))
    }

    pub fn channel(&self) -> Option<&CycloneChannel> {
        match self {
            ChannelState::Channeling(channel) => Some(channel),
            ChannelState::Stopped => None,
        }
    }

    /// Returns true if a channel was running
    pub fn stop(&mut self) -> bool {
        let was = self.is_channeling();
        *self = ChannelState::Stopped;
        was
    }
}
