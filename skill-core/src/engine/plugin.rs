use bevy::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use crate::config::SkillBook;
use crate::constants::DEFAULT_COMBAT_SEED;
use crate::engine::world::CombatWorld;
use crate::player::Player;
use crate::skills::{ActivationRejected, HitRecord, SkillKind};

/// Wires a `CombatWorld` into an app.
///
/// Input arrives as `CastSkill` / `StopChannel` events; every landed hit
/// leaves as a `SkillHitEvent`.
pub struct SkillCombatPlugin {
    pub book: Arc<SkillBook>,
    pub seed: u64,
}

impl Default for SkillCombatPlugin {
    fn default() -> Self {
        Self {
            book: Arc::new(SkillBook::default()),
            seed: DEFAULT_COMBAT_SEED,
        }
    }
}

impl Plugin for SkillCombatPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<CombatWorld>() {
            let world = CombatWorld::new(Arc::clone(&self.book), Player::default(), self.seed);
            app.insert_resource(world);
        }

        app.init_resource::<CombatStats>()
            .add_event::<CastSkill>()
            .add_event::<StopChannel>()
            .add_event::<SkillHitEvent>()
            .add_event::<CastRejected>()
            .add_systems(Update, (handle_cast_requests, advance_combat_world).chain());
    }
}

/// Request to activate a skill, optionally re-aiming first
#[derive(Event, Debug, Clone)]
pub struct CastSkill {
    pub skill: SkillKind,
    pub aim: Option<Vec2>,
}

#[derive(Event, Debug, Clone)]
pub struct StopChannel;

#[derive(Event, Debug, Clone)]
pub struct SkillHitEvent(pub HitRecord);

#[derive(Event, Debug, Clone)]
pub struct CastRejected {
    pub skill: SkillKind,
    pub reason: ActivationRejected,
}

/// Running totals across frames
#[derive(Resource, Debug, Clone, Default, Serialize)]
pub struct CombatStats {
    pub frames: u64,
    pub casts: u64,
    pub duplicated_casts: u64,
    pub rejected_casts: u64,
    pub hits: u64,
    pub skill_damage: f64,
    pub status_damage: f64,
    pub kills: u64,
    pub projectiles_destroyed: u64,
}

impl CombatStats {
    fn record_hit(&mut self, hit: &HitRecord) {
        self.hits += 1;
        self.skill_damage += hit.amount as f64;
    }
}

fn handle_cast_requests(
    mut combat: ResMut<CombatWorld>,
    mut stats: ResMut<CombatStats>,
    mut casts: EventReader<CastSkill>,
    mut stops: EventReader<StopChannel>,
    mut hit_events: EventWriter<SkillHitEvent>,
    mut rejections: EventWriter<CastRejected>,
) {
    if stops.read().count() > 0 {
        combat.stop_channel();
    }

    for request in casts.read() {
        if let Some(aim) = request.aim {
            combat.set_aim(aim);
        }
        match combat.cast(request.skill) {
            Ok(report) => {
                stats.casts += 1;
                if report.duplicated {
                    stats.duplicated_casts += 1;
                }
                for hit in report.hits {
                    stats.record_hit(&hit);
                    hit_events.send(SkillHitEvent(hit));
                }
            }
            Err(reason) => {
                stats.rejected_casts += 1;
                rejections.send(CastRejected {
                    skill: request.skill,
                    reason,
                });
            }
        }
    }
}

fn advance_combat_world(
    time: Res<Time>,
    mut combat: ResMut<CombatWorld>,
    mut stats: ResMut<CombatStats>,
    mut hit_events: EventWriter<SkillHitEvent>,
) {
    let report = combat.advance(time.delta_secs());
    stats.frames += 1;
    stats.status_damage += report.status_damage as f64;
    stats.kills += report.fallen as u64;
    stats.projectiles_destroyed += report.projectiles_destroyed as u64;
    for hit in report.hits {
        stats.record_hit(&hit);
        hit_events.send(SkillHitEvent(hit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Enemy;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(SkillCombatPlugin::default())
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
        app
    }

    #[test]
    fn test_cast_event_produces_hits() {
        let mut app = app();
        let target = {
            let mut combat = app.world_mut().resource_mut::<CombatWorld>();
            combat.scene.spawn_enemy(Enemy::new(Vec2::new(60.0, 0.0), 10_000.0))
        };
        app.world_mut().send_event(CastSkill {
            skill: SkillKind::Cleave,
            aim: Some(Vec2::new(100.0, 0.0)),
        });
        app.update();

        let stats = app.world().resource::<CombatStats>();
        assert_eq!(stats.casts, 1);
        assert_eq!(stats.hits, 1);
        let combat = app.world().resource::<CombatWorld>();
        assert!(combat.scene.enemy(target).unwrap().life < 10_000.0);
    }

    #[test]
    fn test_rejection_is_reported() {
        let mut app = app();
        app.world_mut().send_event(CastSkill {
            skill: SkillKind::IceNova,
            aim: None,
        });
        app.update();
        let stats = app.world().resource::<CombatStats>();
        assert_eq!(stats.casts, 0);
        assert_eq!(stats.rejected_casts, 1);
    }

    #[test]
    fn test_frames_advance_with_time() {
        let mut app = app();
        for _ in 0..3 {
            app.update();
        }
        let combat = app.world().resource::<CombatWorld>();
        assert_eq!(combat.frame(), 3);
        // first update carries no delta
        assert!((combat.clock() - 0.2).abs() < 1e-4);
    }
}
