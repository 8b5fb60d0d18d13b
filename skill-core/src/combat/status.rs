//! Per-enemy status effect ledger.
//!
//! Tracks one active slow (freeze is a 100% slow), chill stacks and the
//! stacking debuffs registered by on-hit passives. Only one slow percentage
//! is active at a time: the strongest wins, and an equal-or-stronger
//! application refreshes the duration.

use serde::{Deserialize, Serialize};

use crate::constants::{FREEZE_SLOW, MAX_CHILL_STACKS};

/// Fraction of a tick interval treated as already elapsed
const TICK_SLACK: f32 = 1e-3;

/// Stacking debuffs applied by passives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    EntropicDecay,
    NecroticPlague,
    Singularity,
}

/// How a debuff converts stacks into damage on each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickDamage {
    /// Flat damage per stack
    Flat(f32),
    /// Fraction of max life per stack
    MaxLifeFraction(f32),
    /// Fraction of current life per stack
    CurrentLifeFraction(f32),
}

impl TickDamage {
    fn amount(&self, stacks: u32, life: LifeSnapshot) -> f32 {
        let stacks = stacks as f32;
        match *self {
            TickDamage::Flat(per_stack) => per_stack * stacks,
            TickDamage::MaxLifeFraction(f) => life.max * f * stacks,
            TickDamage::CurrentLifeFraction(f) => life.current.max(0.0) * f * stacks,
        }
    }
}

/// Parameters for one stacking debuff application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebuffSpec {
    pub kind: DebuffKind,
    pub max_stacks: u32,
    /// Seconds the debuff lives after its latest application
    pub duration: f32,
    /// Seconds between damage ticks
    pub tick_interval: f32,
    pub per_tick: TickDamage,
}

/// Life values a tick needs to size its damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeSnapshot {
    pub current: f32,
    pub max: f32,
}

/// The single active slow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    pub percentage: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingDebuff {
    pub spec: DebuffSpec,
    pub stacks: u32,
    pub remaining: f32,
    pub since_last_tick: f32,
}

/// Damage and events produced by one ledger tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTick {
    pub damage: f32,
    /// Singularities that reached their detonation tick this frame
    pub collapsed: Vec<f32>,
    pub expired: Vec<DebuffKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusLedger {
    slow: Option<SlowEffect>,
    chill_stacks: u32,
    debuffs: Vec<StackingDebuff>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strongest-percentage-wins. A weaker slow never shortens or replaces
    /// a stronger one that is still running.
    pub fn apply_slow(&mut self, percentage: f32, duration: f32) -> bool {
        if duration <= 0.0 || !percentage.is_finite() {
            return false;
        }
        let percentage = percentage.clamp(0.0, 1.0);
        match self.slow {
            Some(active) if percentage < active.percentage => false,
            _ => {
                self.slow = Some(SlowEffect {
                    percentage,
                    remaining: duration,
                });
                true
            }
        }
    }

    /// Chill: a slow that also adds a chill stack
    pub fn apply_chill(&mut self, percentage: f32, duration: f32) {
        self.apply_slow(percentage, duration);
        self.chill_stacks = (self.chill_stacks + 1).min(MAX_CHILL_STACKS);
    }

    /// Freeze for `base + per_stack * chill_stacks` seconds. Returns the duration used.
    pub fn apply_freeze(&mut self, base: f32, per_stack: f32) -> f32 {
        let duration = base + per_stack * self.chill_stacks as f32;
        self.apply_slow(FREEZE_SLOW, duration);
        duration
    }

    /// Add a stack (up to `max_stacks`) and re-arm the duration.
    /// Returns the stack count after application.
    pub fn apply_stacking_debuff(&mut self, spec: DebuffSpec) -> u32 {
        if spec.max_stacks == 0 {
            return 0;
        }
        if let Some(existing) = self.debuffs.iter_mut().find(|d| d.spec.kind == spec.kind) {
            existing.stacks = (existing.stacks + 1).min(spec.max_stacks);
            existing.remaining = spec.duration;
            existing.spec = spec;
            existing.stacks
        } else {
            self.debuffs.push(StackingDebuff {
                spec,
                stacks: 1,
                remaining: spec.duration,
                since_last_tick: 0.0,
            });
            1
        }
    }

    /// Advance timers by `dt` seconds, returning periodic damage due this frame
    pub fn tick(&mut self, dt: f32, life: LifeSnapshot) -> StatusTick {
        let mut out = StatusTick::default();

        if let Some(slow) = self.slow.as_mut() {
            slow.remaining -= dt;
            if slow.remaining <= 0.0 {
                self.slow = None;
                self.chill_stacks = 0;
            }
        }

        for debuff in &mut self.debuffs {
            // Ticks only fire while the debuff is alive
            let live_time = dt.min(debuff.remaining.max(0.0));
            debuff.since_last_tick += live_time;
            debuff.remaining -= dt;

            let interval = debuff.spec.tick_interval;
            if interval <= 0.0 {
                continue;
            }
            // Summed frame deltas drift below the interval; a relative slack keeps the last tick
            let slack = interval * TICK_SLACK;
            while debuff.since_last_tick + slack >= interval {
                debuff.since_last_tick -= interval;
                let amount = debuff.spec.per_tick.amount(debuff.stacks, life);
                if debuff.spec.kind == DebuffKind::Singularity {
                    out.collapsed.push(amount);
                    debuff.remaining = 0.0;
                    break;
                }
                out.damage += amount;
            }
        }

        self.debuffs.retain(|d| {
            let keep = d.remaining > 0.0;
            if !keep {
                out.expired.push(d.spec.kind);
            }
            keep
        });

        out
    }

    /// Instantaneous movement multiplier, `max(0, 1 - slow)`
    pub fn speed_multiplier(&self) -> f32 {
        self.slow
            .map(|s| (1.0 - s.percentage).max(0.0))
            .unwrap_or(1.0)
    }

    pub fn active_slow(&self) -> Option<SlowEffect> {
        self.slow
    }

    pub fn is_frozen(&self) -> bool {
        self.slow.is_some_and(|s| s.percentage >= FREEZE_SLOW)
    }

    pub fn chill_stacks(&self) -> u32 {
        self.chill_stacks
    }

    pub fn stacks(&self, kind: DebuffKind) -> u32 {
        self.debuff(kind).map(|d| d.stacks).unwrap_or(0)
    }

    pub fn debuff(&self, kind: DebuffKind) -> Option<&StackingDebuff> {
        self.debuffs.iter().find(|d| d.spec.kind == kind)
    }

    pub fn has(&self, kind: DebuffKind) -> bool {
        self.debuff(kind).is_some()
    }

    pub fn is_clear(&self) -> bool {
        self.slow.is_none() && self.debuffs.is_empty() && self.chill_stacks == 0
    }
}
