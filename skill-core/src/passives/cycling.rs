//! Active-cycling passives.
//!
//! Void Embrace, Paradox Armor and Arc Singularity each run a small
//! Ready → Triggered → Cooling-down machine. Their state lives in one
//! typed variant per passive, keyed by passive id, and is advanced once per
//! frame before any skill runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::{PassiveEffect, PassiveModifierSet};
use crate::constants::VOID_EMBRACE_REGEN_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CyclePhase {
    #[default]
    Ready,
    Triggered {
        remaining: f32,
    },
    CoolingDown {
        remaining: f32,
    },
}

impl CyclePhase {
    pub fn name(&self) -> &'static str {
        match self {
            CyclePhase::Ready => "ready",
            CyclePhase::Triggered { .. } => "triggered",
            CyclePhase::CoolingDown { .. } => "cooling_down",
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, CyclePhase::Triggered { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoidEmbraceParams {
    pub hp_threshold: f32,
    pub regen_percentage: f32,
    pub duration: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParadoxArmorParams {
    pub delay_percentage: f32,
    pub delay_duration: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSingularityParams {
    pub damage_increase: f32,
    pub duration: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PassiveState {
    VoidEmbrace {
        params: VoidEmbraceParams,
        phase: CyclePhase,
        since_regen: f32,
    },
    ParadoxArmor {
        params: ParadoxArmorParams,
        phase: CyclePhase,
        /// Damage held back until the delay window closes
        delayed: f32,
    },
    ArcSingularity {
        params: ArcSingularityParams,
        phase: CyclePhase,
    },
}

impl PassiveState {
    pub fn from_effect(effect: &PassiveEffect) -> Option<Self> {
        match *effect {
            PassiveEffect::VoidEmbrace {
                hp_threshold,
                regen_percentage,
                duration,
                cooldown,
            } => Some(PassiveState::VoidEmbrace {
                params: VoidEmbraceParams {
                    hp_threshold,
                    regen_percentage,
                    duration,
                    cooldown,
                },
                phase: CyclePhase::Ready,
                since_regen: 0.0,
            }),
            PassiveEffect::ParadoxArmor {
                damage_delay_percentage,
                damage_delay_duration,
                cooldown,
            } => Some(PassiveState::ParadoxArmor {
                params: ParadoxArmorParams {
                    delay_percentage: damage_delay_percentage,
                    delay_duration: damage_delay_duration,
                    cooldown,
                },
                phase: CyclePhase::Ready,
                delayed: 0.0,
            }),
            PassiveEffect::ArcSingularity {
                damage_increase,
                duration,
                cooldown,
            } => Some(PassiveState::ArcSingularity {
                params: ArcSingularityParams {
                    damage_increase,
                    duration,
                    cooldown,
                },
                phase: CyclePhase::Ready,
            }),
            _ => None,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        match self {
            PassiveState::VoidEmbrace { phase, .. }
            | PassiveState::ParadoxArmor { phase, .. }
            | PassiveState::ArcSingularity { phase, .. } => *phase,
        }
    }
}

/// Step a timed phase. Triggered rolls into CoolingDown, CoolingDown into Ready.
fn step_phase(phase: &mut CyclePhase, dt: f32, cooldown: f32) -> bool {
    match phase {
        CyclePhase::Ready => false,
        CyclePhase::Triggered { remaining } => {
            *remaining -= dt;
            if *remaining <= 0.0 {
                *phase = CyclePhase::CoolingDown {
                    remaining: cooldown,
                };
                true
            } else {
                false
            }
        }
        CyclePhase::CoolingDown { remaining } => {
            *remaining -= dt;
            if *remaining <= 0.0 {
                *phase = CyclePhase::Ready;
                true
            } else {
                false
            }
        }
    }
}

/// What the player must apply after a cycling tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleTick {
    pub heal: f32,
    pub delayed_damage: f32,
    pub intangible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveStates {
    states: BTreeMap<String, PassiveState>,
}

impl PassiveStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state for newly acquired cycling passives
    pub fn sync(&mut self, modifiers: &PassiveModifierSet) {
        for (id, effect) in modifiers.iter() {
            if self.states.contains_key(id) {
                continue;
            }
            if let Some(state) = PassiveState::from_effect(effect) {
                self.states.insert(id.to_string(), state);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&PassiveState> {
        self.states.get(id)
    }

    pub fn phase(&self, id: &str) -> Option<CyclePhase> {
        self.states.get(id).map(PassiveState::phase)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Advance every cycling passive by `dt`
    pub fn tick(&mut self, dt: f32, life: f32, max_life: f32) -> CycleTick {
        let mut out = CycleTick::default();
        let life_fraction = if max_life > 0.0 { life / max_life } else { 0.0 };

        for (id, state) in self.states.iter_mut() {
            match state {
                PassiveState::VoidEmbrace {
                    params,
                    phase,
                    since_regen,
                } => {
                    if *phase == CyclePhase::Ready && life_fraction <= params.hp_threshold {
                        *phase = CyclePhase::Triggered {
                            remaining: params.duration,
                        };
                        *since_regen = 0.0;
                        info!(passive = %id, "void embrace triggered");
                    }
                    if phase.is_triggered() {
                        *since_regen += dt;
                        while *since_regen >= VOID_EMBRACE_REGEN_INTERVAL {
                            *since_regen -= VOID_EMBRACE_REGEN_INTERVAL;
                            out.heal += max_life * params.regen_percentage;
                        }
                    }
                    if step_phase(phase, dt, params.cooldown) {
                        info!(passive = %id, phase = phase.name(), "void embrace");
                    }
                    if phase.is_triggered() {
                        out.intangible = true;
                    }
                }
                PassiveState::ParadoxArmor {
                    params,
                    phase,
                    delayed,
                } => {
                    let was_triggered = phase.is_triggered();
                    if step_phase(phase, dt, params.cooldown) {
                        if was_triggered {
                            out.delayed_damage += *delayed;
                            *delayed = 0.0;
                        }
                        info!(passive = %id, phase = phase.name(), "paradox armor");
                    }
                }
                PassiveState::ArcSingularity { params, phase } => {
                    if step_phase(phase, dt, params.cooldown) {
                        info!(passive = %id, phase = phase.name(), "arc singularity");
                    }
                }
            }
        }
        out
    }

    /// Route an incoming hit through Paradox Armor. Returns the damage to take now.
    pub fn absorb_hit(&mut self, amount: f32) -> f32 {
        let mut immediate = amount;
        for (id, state) in self.states.iter_mut() {
            if let PassiveState::ParadoxArmor {
                params,
                phase,
                delayed,
            } = state
            {
                if *phase == CyclePhase::Ready {
                    let held = immediate * params.delay_percentage.clamp(0.0, 1.0);
                    *delayed += held;
                    immediate -= held;
                    *phase = CyclePhase::Triggered {
                        remaining: params.delay_duration,
                    };
                    info!(passive = %id, held, "paradox armor delayed damage");
                }
            }
        }
        immediate
    }

    /// Arc Singularity fires on any skill cast while ready
    pub fn on_skill_cast(&mut self) {
        for (id, state) in self.states.iter_mut() {
            if let PassiveState::ArcSingularity { params, phase } = state {
                if *phase == CyclePhase::Ready {
                    *phase = CyclePhase::Triggered {
                        remaining: params.duration,
                    };
                    info!(passive = %id, "arc singularity triggered");
                }
            }
        }
    }

    /// Damage fraction granted by triggered cycling passives
    pub fn transient_damage_bonus(&self) -> f32 {
        self.states
            .values()
            .map(|state| match state {
                PassiveState::ArcSingularity { params, phase } if phase.is_triggered() => {
                    params.damage_increase
                }
                _ => 0.0,
            })
            .sum()
    }

    pub fn is_intangible(&self) -> bool {
        self.states.values().any(|state| {
            matches!(state, PassiveState::VoidEmbrace { phase, .. } if phase.is_triggered())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states_with(id: &str, effect: PassiveEffect) -> PassiveStates {
        let mut set = PassiveModifierSet::new();
        set.insert(id, effect);
        let mut states = PassiveStates::new();
        states.sync(&set);
        states
    }

    #[test]
    fn test_non_cycling_passives_have_no_state() {
        let states = states_with(
            "nova_overload",
            PassiveEffect::NovaOverload {
                radius_increase: 0.5,
                damage_increase: 0.5,
            },
        );
        assert!(states.is_empty());
    }

    #[test]
    fn test_void_embrace_cycle() {
        let mut states = states_with(
            "void_embrace",
            PassiveEffect::VoidEmbrace {
                hp_threshold: 0.3,
                regen_percentage: 0.05,
                duration: 3.0,
                cooldown: 10.0,
            },
        );

        let healthy = states.tick(0.5, 90.0, 100.0);
        assert!(!healthy.intangible);
        assert_eq!(states.phase("void_embrace"), Some(CyclePhase::Ready));

        let low = states.tick(0.5, 20.0, 100.0);
        assert!(low.intangible);
        assert!(states.is_intangible());

        let mut healed = 0.0;
        for _ in 0..5 {
            healed += states.tick(0.5, 20.0, 100.0).heal;
        }
        // triggered for 3s total: regen at 1s, 2s and 3s
        assert!((healed - 15.0).abs() < 1e-3, "healed {healed}");
        assert!(matches!(
            states.phase("void_embrace"),
            Some(CyclePhase::CoolingDown { .. })
        ));
        assert!(!states.is_intangible());

        // still low but cooling down: no retrigger
        states.tick(5.0, 20.0, 100.0);
        assert!(!states.is_intangible());
        states.tick(5.0, 90.0, 100.0);
        assert_eq!(states.phase("void_embrace"), Some(CyclePhase::Ready));
    }

    #[test]
    fn test_paradox_armor_delays_first_hit() {
        let mut states = states_with(
            "paradox_armor",
            PassiveEffect::ParadoxArmor {
                damage_delay_percentage: 0.4,
                damage_delay_duration: 2.0,
                cooldown: 5.0,
            },
        );

        let now = states.absorb_hit(100.0);
        assert!((now - 60.0).abs() < 1e-4);
        // second hit while triggered passes straight through
        assert_eq!(states.absorb_hit(50.0), 50.0);

        assert_eq!(states.tick(1.0, 50.0, 100.0).delayed_damage, 0.0);
        let due = states.tick(1.0, 50.0, 100.0);
        assert!((due.delayed_damage - 40.0).abs() < 1e-4);
        assert!(matches!(
            states.phase("paradox_armor"),
            Some(CyclePhase::CoolingDown { .. })
        ));
    }

    #[test]
    fn test_arc_singularity_bonus_window() {
        let mut states = states_with(
            "arc_singularity",
            PassiveEffect::ArcSingularity {
                damage_increase: 0.5,
                duration: 4.0,
                cooldown: 8.0,
            },
        );
        assert_eq!(states.transient_damage_bonus(), 0.0);
        states.on_skill_cast();
        assert_eq!(states.transient_damage_bonus(), 0.5);

        states.tick(4.0, 100.0, 100.0);
        assert_eq!(states.transient_damage_bonus(), 0.0);
        // cooling down: casts do not retrigger
        states.on_skill_cast();
        assert_eq!(states.transient_damage_bonus(), 0.0);

        states.tick(8.0, 100.0, 100.0);
        states.on_skill_cast();
        assert_eq!(states.transient_damage_bonus(), 0.5);
    }

    #[test]
    fn test_sync_is_additive() {
        let mut set = PassiveModifierSet::new();
        set.insert(
            "arc_singularity",
            PassiveEffect::ArcSingularity {
                damage_increase: 0.5,
                duration: 4.0,
                cooldown: 8.0,
            },
        );
        let mut states = PassiveStates::new();
        states.sync(&set);
        states.on_skill_cast();
        states.sync(&set);
        // existing state survives a resync
        assert!(states.phase("arc_singularity").unwrap().is_triggered());
    }
}
