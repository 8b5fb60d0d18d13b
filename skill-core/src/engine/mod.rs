//! Combat frame stepper and ECS integration.
//!
//! `CombatWorld` owns everything a fight mutates and advances it by an
//! explicit `dt`:
//!   1. Scene step (projectile movement)
//!   2. Player passives (cycling state, regeneration)
//!   3. Skill instances (cooldowns, Cyclone, novas, barriers)
//!   4. Enemy status (pulls, debuff ticks, collapses)
//!   5. End-of-frame compaction and plague spread
//!
//! `SkillCombatPlugin` drives it from Bevy's `Update` schedule.

pub mod plugin;
pub mod visuals;
pub mod world;

pub use plugin::{
    CastRejected, CastSkill, CombatStats, SkillCombatPlugin, SkillHitEvent, StopChannel,
};
pub use visuals::{BarrierVisual, CycloneVisual, NovaVisual, SkillVisuals};
pub use world::{CastReport, CombatWorld, FrameReport};

// =====================================================
// Tests
// =====================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Enemy, Projectile, ProjectileKind};
    use crate::skills::{NovaPhase, SkillKind};
    use bevy::math::Vec2;

    fn nova_world() -> CombatWorld {
        let mut world = CombatWorld::default();
        world.player.learn(SkillKind::IceNova);
        world.player.mana = 100.0;
        world
    }

    #[test]
    fn test_visuals_track_nova_lifecycle() {
        let mut world = nova_world();
        world.cast(SkillKind::IceNova).unwrap();

        let visuals = world.visuals();
        assert_eq!(visuals.novas.len(), 1);
        assert_eq!(visuals.novas[0].phase, NovaPhase::Expanding);
        assert_eq!(visuals.barriers.len(), 1);
        assert!(visuals.cyclone.is_none());

        // 0.5s expand + 0.1s contract
        for _ in 0..8 {
            world.advance(0.1);
        }
        let visuals = world.visuals();
        assert!(visuals.novas.is_empty());
        assert_eq!(visuals.barriers.len(), 1);
    }

    #[test]
    fn test_visuals_serialize() {
        let mut world = nova_world();
        world.cast(SkillKind::IceNova).unwrap();
        world.advance(0.1);
        let json = world.visuals().to_json().unwrap();
        assert!(json.contains("\"novas\""));
        assert!(json.contains("Expanding"));
    }

    #[test]
    fn test_barrier_blocks_hostile_but_not_arc_bolts() {
        let mut world = nova_world();
        world.cast(SkillKind::IceNova).unwrap();
        let hostile = world.scene.spawn_projectile(Projectile::new(
            Vec2::new(40.0, 0.0),
            Vec2::ZERO,
            ProjectileKind::Enemy,
        ));
        let bolt = world.scene.spawn_projectile(Projectile::new(
            Vec2::new(-40.0, 0.0),
            Vec2::ZERO,
            ProjectileKind::ArcBolt,
        ));
        let report = world.advance(0.016);
        assert_eq!(report.projectiles_destroyed, 1);
        assert!(world.scene.projectile(hostile).is_none());
        assert!(world.scene.projectile(bolt).is_some());
    }

    #[test]
    fn test_dead_enemies_compacted_at_frame_end() {
        let mut world = CombatWorld::default();
        world.set_aim(Vec2::new(100.0, 0.0));
        let id = world.scene.spawn_enemy(Enemy::new(Vec2::new(50.0, 0.0), 1.0));
        world.cast(SkillKind::Cleave).unwrap();
        // tombstoned, not yet removed
        assert!(world.scene.enemies.is_pending_removal(id));
        let report = world.advance(0.016);
        assert_eq!(report.fallen, 1);
        assert_eq!(world.scene.live_enemy_count(), 0);
    }
}
