use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::combat::status::DebuffKind;
use crate::config::SkillBook;
use crate::constants::{
    DEFAULT_COMBAT_SEED, LEVEL_UP_DAMAGE_BONUS, MAX_FRAME_DELTA, SINGULARITY_PULL_SPEED,
};
use crate::geometry::within_circle;
use crate::logging::TimingSpan;
use crate::passives::{compute_effective_params, ActivationContext, EffectiveParams};
use crate::player::Player;
use crate::rng::{chance, seeded, CombatRng};
use crate::scene::{EnemyContainer, EnemyId, FallenEnemy, Scene};
use crate::skills::{
    ActivationRejected, Barrier, ChannelState, ChannelStep, CycloneChannel, HitRecord,
    NovaInstance, OnHitProcs, Resolver, SkillKind, SkillRuntime,
};

/// Result of an accepted activation
#[derive(Debug, Clone, Serialize)]
pub struct CastReport {
    pub skill: SkillKind,
    pub mana_spent: f32,
    pub duplicated: bool,
    /// Hits resolved synchronously at activation (Cleave)
    pub hits: Vec<HitRecord>,
}

/// Everything one `advance` call resolved
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub hits: Vec<HitRecord>,
    /// Damage from debuff ticks and singularity collapses
    pub status_damage: f32,
    pub projectiles_destroyed: usize,
    pub channel_exhausted: bool,
    pub collapses: usize,
    pub plague_spread: usize,
    pub fallen: usize,
}

impl FrameReport {
    pub fn skill_damage(&self) -> f32 {
        self.hits.iter().map(|h| h.amount).sum()
    }
}

/// The player, their skill runtime and the scene, stepped one frame at a time.
///
/// Frame order: projectile movement, player passives, skill instances,
/// enemy status, then compaction of the dead.
#[derive(Resource)]
pub struct CombatWorld {
    book: Arc<SkillBook>,
    pub player: Player,
    pub skills: SkillRuntime,
    pub scene: Scene,
    rng: CombatRng,
    clock: f32,
    frame: u64,
}

impl Default for CombatWorld {
    fn default() -> Self {
        Self::new(Arc::new(SkillBook::default()), Player::default(), DEFAULT_COMBAT_SEED)
    }
}

impl CombatWorld {
    pub fn new(book: Arc<SkillBook>, player: Player, seed: u64) -> Self {
        Self {
            book,
            player,
            skills: SkillRuntime::new(),
            scene: Scene::new(),
            rng: seeded(seed),
            clock: 0.0,
            frame: 0,
        }
    }

    pub fn book(&self) -> &SkillBook {
        &self.book
    }

    /// Simulation seconds since creation
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn set_aim(&mut self, aim: Vec2) {
        self.player.aim = aim;
    }

    /// Activate a skill. A rejection consumes nothing.
    pub fn cast(&mut self, skill: SkillKind) -> Result<CastReport, ActivationRejected> {
        if !self.player.knows(skill) {
            debug!(skill = skill.as_str(), "cast rejected: not learned");
            return Err(ActivationRejected::NotLearned);
        }
        let level = self.player.level;
        let cost = self.book.cost(skill, level);
        if let Err(rejected) = self.skills.check_gate(skill, cost, self.player.mana) {
            debug!(skill = skill.as_str(), reason = %rejected, "cast rejected");
            return Err(rejected);
        }

        self.player.mana -= cost;
        self.skills.cooldowns.start_cooldown(skill, self.book.cooldown(skill));
        self.player.passive_states.on_skill_cast();

        let params = self.effective_params(skill);
        info!(
            skill = skill.as_str(),
            level,
            cost,
            min = params.damage.min,
            max = params.damage.max,
            "skill cast"
        );

        let mut hits = Vec::new();
        self.execute(skill, &params, false, &mut hits);

        let mut duplicated = false;
        if let Some(proc) = params.duplicate {
            if chance(&mut self.rng, proc.chance) {
                info!(skill = skill.as_str(), "cast duplicated");
                let copy = params.for_duplicate(proc.damage_multiplier);
                self.execute(skill, &copy, true, &mut hits);
                duplicated = true;
            }
        }

        Ok(CastReport {
            skill,
            mana_spent: cost,
            duplicated,
            hits,
        })
    }

    /// Parameters the next cast of `skill` would use
    pub fn effective_params(&self, skill: SkillKind) -> EffectiveParams {
        let ctx = ActivationContext {
            level: self.player.level,
            flat_damage_bonus: self.skills.damage_bonus(skill),
            transient_damage_bonus: self.player.passive_states.transient_damage_bonus(),
        };
        let passives = &self.player.passives;
        match skill {
            SkillKind::Cleave => compute_effective_params(skill, &self.book.cleave, passives, ctx),
            SkillKind::Cyclone => compute_effective_params(skill, &self.book.cyclone, passives, ctx),
            SkillKind::IceNova => {
                compute_effective_params(skill, &self.book.ice_nova, passives, ctx)
            }
        }
    }

    fn execute(
        &mut self,
        skill: SkillKind,
        params: &EffectiveParams,
        duplicate: bool,
        hits: &mut Vec<HitRecord>,
    ) {
        let book = Arc::clone(&self.book);
        match skill {
            SkillKind::Cleave => {
                let procs = self.player.passives.on_hit_procs();
                let reality = self.player.passives.cleave_reality();
                let mut resolver =
                    Resolver::new(&mut self.scene.enemies, &mut self.rng, &procs, hits, skill)
                        .duplicated(duplicate);
                self.skills.cleave.resolve(
                    &book.cleave.shape,
                    self.player.position,
                    self.player.aim,
                    book.cleave.damage_type,
                    params,
                    reality.as_ref(),
                    &mut resolver,
                );
            }
            SkillKind::Cyclone => {
                let channel = CycloneChannel::start(
                    &book.cyclone.shape,
                    self.player.level,
                    self.player.max_mana,
                    book.cyclone.damage_type,
                    params,
                );
                self.skills.cyclone = ChannelState::Channeling(channel);
            }
            SkillKind::IceNova => {
                let shape = &book.ice_nova.shape;
                let origin = self.player.position;
                let damage_type = book.ice_nova.damage_type;
                let cast = if duplicate {
                    self.skills.nova_gate.current_cast()
                } else {
                    self.skills.nova_gate.begin_cast()
                };
                let nova = NovaInstance::spawn(shape, origin, damage_type, params, duplicate);
                self.skills.novas.push(nova.for_cast(cast));
                // the barrier belongs to the original cast
                if !duplicate {
                    self.skills
                        .barriers
                        .push(Barrier::spawn(shape, origin, damage_type, params));
                }
            }
        }
    }

    /// Returns true if a channel was running
    pub fn stop_channel(&mut self) -> bool {
        let stopped = self.skills.cyclone.stop();
        if stopped {
            info!("cyclone stopped");
        }
        stopped
    }

    /// Raise the player's level and grant the flat damage bonus to learned skills
    pub fn level_up(&mut self) {
        self.player.level += 1;
        self.skills
            .grant_damage_bonus(self.player.learned_skills(), LEVEL_UP_DAMAGE_BONUS);
        info!(level = self.player.level, "level up");
    }

    /// Damage from the scene to the player, routed through defensive passives
    pub fn damage_player(&mut self, amount: f32) -> f32 {
        self.player.receive_damage(amount)
    }

    /// Step the world by `dt` seconds
    pub fn advance(&mut self, dt: f32) -> FrameReport {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        let _span = TimingSpan::new("combat_frame");
        self.frame += 1;
        self.clock += dt;
        let mut report = FrameReport {
            frame: self.frame,
            dt,
            ..Default::default()
        };

        self.scene.advance_projectiles(dt);

        let cycle = self
            .player
            .passive_states
            .tick(dt, self.player.life, self.player.max_life);
        self.player.apply_cycle(&cycle);
        self.player.regenerate(dt);

        let procs = self.player.passives.on_hit_procs();
        self.advance_skills(dt, &procs, &mut report);
        self.advance_status(dt, &procs, &mut report);

        let fallen = self.scene.compact();
        report.plague_spread = self.spread_plague(&fallen, procs.plague_spread_radius);
        report.fallen = fallen.len();

        if !report.hits.is_empty() || report.fallen > 0 {
            debug!(
                frame = self.frame,
                hits = report.hits.len(),
                fallen = report.fallen,
                "frame resolved"
            );
        }
        report
    }

    fn advance_skills(&mut self, dt: f32, procs: &OnHitProcs, report: &mut FrameReport) {
        let book = Arc::clone(&self.book);
        self.skills.cooldowns.tick(dt);

        if let ChannelState::Channeling(channel) = &mut self.skills.cyclone {
            let mut resolver = Resolver::new(
                &mut self.scene.enemies,
                &mut self.rng,
                procs,
                &mut report.hits,
                SkillKind::Cyclone,
            );
            let step = channel.advance(
                dt,
                self.player.position,
                &mut self.player.mana,
                &mut resolver,
                &mut self.scene.projectiles,
            );
            match step {
                ChannelStep::Continue {
                    projectiles_destroyed,
                    ..
                } => report.projectiles_destroyed += projectiles_destroyed,
                ChannelStep::Exhausted => {
                    self.skills.cyclone.stop();
                    report.channel_exhausted = true;
                    info!("cyclone ended: mana exhausted");
                }
            }
        }

        self.skills
            .nova_gate
            .tick(dt, book.ice_nova.shape.min_rehit_interval);
        for nova in &mut self.skills.novas {
            let mut resolver = Resolver::new(
                &mut self.scene.enemies,
                &mut self.rng,
                procs,
                &mut report.hits,
                SkillKind::IceNova,
            )
            .duplicated(nova.duplicate);
            nova.advance(dt, &book.ice_nova.shape, &mut resolver, &mut self.skills.nova_gate);
        }
        self.skills.novas.retain(|nova| !nova.is_complete());

        for barrier in &mut self.skills.barriers {
            let mut resolver = Resolver::new(
                &mut self.scene.enemies,
                &mut self.rng,
                procs,
                &mut report.hits,
                SkillKind::IceNova,
            );
            let (_, blocked) = barrier.advance(dt, &mut resolver, &mut self.scene.projectiles);
            report.projectiles_destroyed += blocked;
        }
        self.skills.barriers.retain(|barrier| !barrier.is_expired());
    }

    fn advance_status(&mut self, dt: f32, procs: &OnHitProcs, report: &mut FrameReport) {
        let pull_radius = procs.singularity_pull_radius;
        self.pull_toward_singularities(dt, pull_radius);

        let mut collapses: Vec<(EnemyId, Vec2, f32)> = Vec::new();
        for snapshot in self.scene.enemies.snapshot() {
            let Some(enemy) = self.scene.enemies.get_mut(snapshot.id) else {
                continue;
            };
            let life = enemy.life_snapshot();
            let tick = enemy.status.tick(dt, life);
            for amount in tick.collapsed {
                collapses.push((snapshot.id, enemy.position, amount));
            }
            if tick.damage > 0.0 {
                if let Some(outcome) = self.scene.enemies.take_damage(snapshot.id, tick.damage) {
                    report.status_damage += outcome.dealt;
                }
            }
        }

        for (carrier, center, amount) in collapses {
            let mut victims = vec![carrier];
            victims.extend(
                self.scene
                    .enemies
                    .within_radius(center, pull_radius)
                    .into_iter()
                    .map(|e| e.id)
                    .filter(|id| *id != carrier),
            );
            for id in &victims {
                if let Some(outcome) = self.scene.enemies.take_damage(*id, amount) {
                    report.status_damage += outcome.dealt;
                }
            }
            report.collapses += 1;
            info!(enemy = carrier.index, amount, victims = victims.len(), "singularity collapsed");
        }
    }

    /// Drag enemies near a pending singularity toward its carrier
    fn pull_toward_singularities(&mut self, dt: f32, radius: f32) {
        if radius <= 0.0 || dt <= 0.0 {
            return;
        }
        let live = self.scene.enemies.snapshot();
        let centers: Vec<(EnemyId, Vec2)> = live
            .iter()
            .filter(|e| {
                self.scene
                    .enemies
                    .get(e.id)
                    .is_some_and(|enemy| enemy.status.has(DebuffKind::Singularity))
            })
            .map(|e| (e.id, e.position))
            .collect();

        let step = SINGULARITY_PULL_SPEED * dt;
        for (carrier, center) in centers {
            for other in &live {
                if other.id == carrier || !within_circle(center, radius, other.position) {
                    continue;
                }
                let Some(position) = self.scene.enemies.position(other.id) else {
                    continue;
                };
                let offset = center - position;
                let distance = offset.length();
                if distance <= f32::EPSILON {
                    continue;
                }
                let moved = position + offset / distance * step.min(distance);
                self.scene.enemies.set_position(other.id, moved);
            }
        }
    }

    /// Plague carriers that died this frame infect their neighbours
    fn spread_plague(&mut self, fallen: &[FallenEnemy], radius: f32) -> usize {
        if radius <= 0.0 {
            return 0;
        }
        let mut infected = 0;
        for dead in fallen {
            let Some(plague) = dead.enemy.status.debuff(DebuffKind::NecroticPlague) else {
                continue;
            };
            let spec = plague.spec;
            for neighbour in self.scene.enemies.within_radius(dead.enemy.position, radius) {
                if let Some(status) = self.scene.enemies.status_mut(neighbour.id) {
                    status.apply_stacking_debuff(spec);
                    infected += 1;
                }
            }
        }
        if infected > 0 {
            info!(infected, "necrotic plague spread");
        }
        infected
    }
}
