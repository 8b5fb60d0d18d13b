use bevy::math::Vec2;
use serde::Serialize;

use super::world::CombatWorld;
use crate::skills::cleave::CleaveSwing;
use crate::skills::NovaPhase;

#[derive(Debug, Clone, Serialize)]
pub struct CycloneVisual {
    pub center: Vec2,
    pub radius: f32,
    /// Degrees
    pub rotation_angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NovaVisual {
    pub origin: Vec2,
    pub radius: f32,
    pub phase: NovaPhase,
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarrierVisual {
    pub origin: Vec2,
    pub radius: f32,
    pub remaining: f32,
}

/// Read-only projection of live skill instances for a renderer
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillVisuals {
    pub cyclone: Option<CycloneVisual>,
    pub novas: Vec<NovaVisual>,
    pub barriers: Vec<BarrierVisual>,
    pub last_swing: Option<CleaveSwing>,
}

impl SkillVisuals {
    pub fn capture(world: &CombatWorld) -> Self {
        let skills = &world.skills;
        Self {
            cyclone: skills.cyclone.channel().map(|channel| CycloneVisual {
                center: world.player.position,
                radius: channel.radius,
                rotation_angle: channel.rotation_angle,
            }),
            novas: skills
                .novas
                .iter()
                .map(|nova| NovaVisual {
                    origin: nova.origin,
                    radius: nova.radius,
                    phase: nova.phase,
                    duplicate: nova.duplicate,
                })
                .collect(),
            barriers: skills
                .barriers
                .iter()
                .map(|barrier| BarrierVisual {
                    origin: barrier.origin,
                    radius: barrier.radius,
                    remaining: barrier.remaining,
                })
                .collect(),
            last_swing: skills.cleave.last_swing,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl CombatWorld {
    pub fn visuals(&self) -> SkillVisuals {
        SkillVisuals::capture(self)
    }
}
