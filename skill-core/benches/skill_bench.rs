use bevy::math::Vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use skill_core::config::SkillBook;
use skill_core::engine::CombatWorld;
use skill_core::geometry::{point_at, within_cone};
use skill_core::passives::PasteTree;
use skill_core::player::Player;
use skill_core::scene::Enemy;
use skill_core::skills::SkillKind;

fn bench_curves(c: &mut Criterion) {
    let book = SkillBook::default();

    c.bench_function("damage_curve_evaluate", |b| {
        b.iter(|| {
            for level in 0..200 {
                black_box(book.ice_nova.damage.evaluate(black_box(level)));
            }
        })
    });

    c.bench_function("rotation_speed_evaluate", |b| {
        b.iter(|| {
            for level in 0..200 {
                black_box(book.cyclone.shape.rotation_speed.evaluate(black_box(level)));
            }
        })
    });

    c.bench_function("within_cone_1000", |b| {
        let points: Vec<Vec2> = (0..1000)
            .map(|i| point_at(Vec2::ZERO, i as f32 * 0.01, (i % 300) as f32))
            .collect();
        b.iter(|| {
            points
                .iter()
                .filter(|p| within_cone(Vec2::ZERO, 192.0, 0.0, 0.785, **p))
                .count()
        })
    });
}

/// Fully specced player inside a grid of tough enemies
fn crowded_world(enemies: usize) -> CombatWorld {
    let mut player = Player::new(Vec2::ZERO).with_level(60).with_mana(1.0e6);
    let tree = PasteTree::default();
    for node in ["learn_cyclone", "learn_ice_nova", "entropic_decay", "necrotic_plague"] {
        tree.acquire(&mut player, node).unwrap();
    }
    let mut world = CombatWorld::new(Arc::new(SkillBook::default()), player, 1);
    let side = (enemies as f32).sqrt().ceil() as usize;
    for i in 0..enemies {
        let x = (i % side) as f32 * 12.0 - side as f32 * 6.0;
        let y = (i / side) as f32 * 12.0 - side as f32 * 6.0;
        world
            .scene
            .spawn_enemy(Enemy::new(Vec2::new(x, y), 1.0e9));
    }
    world
}

fn bench_frames(c: &mut Criterion) {
    c.bench_function("advance_idle_1000_enemies", |b| {
        let mut world = crowded_world(1000);
        b.iter(|| black_box(world.advance(1.0 / 60.0)))
    });

    c.bench_function("advance_cyclone_1000_enemies", |b| {
        let mut world = crowded_world(1000);
        world.cast(SkillKind::Cyclone).unwrap();
        b.iter(|| {
            // keep the channel alive across iterations
            world.player.mana = world.player.max_mana;
            black_box(world.advance(1.0 / 60.0))
        })
    });

    c.bench_function("cast_ice_nova_pulse_1000_enemies", |b| {
        b.iter_batched(
            || {
                let mut world = crowded_world(1000);
                world.cast(SkillKind::IceNova).unwrap();
                world
            },
            |mut world| {
                // expand to max radius and pulse
                for _ in 0..32 {
                    world.advance(1.0 / 60.0);
                }
                world
            },
            criterion::BatchSize::LargeInput,
        )
    });

    c.bench_function("cleave_swing_1000_enemies", |b| {
        let mut world = crowded_world(1000);
        world.set_aim(Vec2::new(100.0, 0.0));
        b.iter(|| {
            world.player.mana = world.player.max_mana;
            black_box(world.cast(SkillKind::Cleave).unwrap().hits.len())
        })
    });
}

criterion_group!(benches, bench_curves, bench_frames);
criterion_main!(benches);
