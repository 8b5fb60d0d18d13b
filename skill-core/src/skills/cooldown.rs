//! Per-skill cooldown timers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::SkillKind;

/// Tracks cooldowns for all skills, ticked once per frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillCooldownTracker {
    /// skill → remaining cooldown seconds
    pub cooldowns: HashMap<SkillKind, f32>,
}

impl SkillCooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a skill is off cooldown
    pub fn is_ready(&self, skill: SkillKind) -> bool {
        self.cooldowns.get(&skill).is_none_or(|cd| *cd <= 0.0)
    }

    /// Start cooldown for a skill; zero-length cooldowns are not recorded
    pub fn start_cooldown(&mut self, skill: SkillKind, duration: f32) {
        if duration > 0.0 {
            self.cooldowns.insert(skill, duration);
        }
    }

    /// Tick all cooldowns by delta time
    pub fn tick(&mut self, delta: f32) {
        for cd in self.cooldowns.values_mut() {
            *cd = (*cd - delta).max(0.0);
        }
        self.cooldowns.retain(|_, cd| *cd > 0.0);
    }

    /// Get remaining cooldown for a skill
    pub fn remaining(&self, skill: SkillKind) -> f32 {
        self.cooldowns.get(&skill).copied().unwrap_or(0.0)
    }
}
