//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Damage curves: clamped outside their breakpoints, monotone when the breakpoints are
//! - Arc tests: inside strictly within the half-width, outside beyond it
//! - Ring zones: split at one third of the radius
//! - Damage rolls: integral and inside the window
//! - Status: slows never weaken while active

use bevy::math::Vec2;
use proptest::prelude::*;
use std::f32::consts::PI;

use skill_core::combat::damage::DamageRange;
use skill_core::combat::status::StatusLedger;
use skill_core::curve::{Breakpoint, DamageCurve};
use skill_core::geometry::{
    distance_ratio_zone, normalize_angle, point_at, within_arc, RingZone,
};
use skill_core::rng::seeded;

/// Sorted breakpoints whose min and max never decrease
fn monotone_curve() -> impl Strategy<Value = DamageCurve> {
    prop::collection::vec((1u32..40, 0.0f32..100.0, 0.0f32..100.0), 1..8).prop_map(|steps| {
        let mut level = 0;
        let mut min = 0.0;
        let mut width = 0.0;
        let points = steps
            .into_iter()
            .map(|(dl, dmin, dwidth)| {
                level += dl;
                min += dmin;
                width += dwidth;
                Breakpoint::new(level, min, min + width)
            })
            .collect();
        DamageCurve::new(points).unwrap()
    })
}

// ============================================================
// Curve Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_curve_monotone(curve in monotone_curve(), level in 0u32..400) {
        let here = curve.evaluate(level);
        let next = curve.evaluate(level + 1);
        prop_assert!(next.min + 1e-3 >= here.min, "min fell from {} to {}", here.min, next.min);
        prop_assert!(next.max + 1e-3 >= here.max, "max fell from {} to {}", here.max, next.max);
        prop_assert!(here.min <= here.max + 1e-3);
    }

    #[test]
    fn prop_curve_clamps_outside_breakpoints(curve in monotone_curve(), beyond in 0u32..1000) {
        let points = curve.points();
        let first = points[0];
        let last = points[points.len() - 1];

        let below = curve.evaluate(first.level.saturating_sub(beyond));
        prop_assert_eq!(below, DamageRange::new(first.min, first.max));

        let above = curve.evaluate(last.level + beyond);
        prop_assert_eq!(above, DamageRange::new(last.min, last.max));
    }

    #[test]
    fn prop_curve_hits_breakpoints_exactly(curve in monotone_curve(), pick in any::<prop::sample::Index>()) {
        let points = curve.points();
        let point = points[pick.index(points.len())];
        let range = curve.evaluate(point.level);
        prop_assert!((range.min - point.min).abs() < 1e-3);
        prop_assert!((range.max - point.max).abs() < 1e-3);
    }
}

// ============================================================
// Geometry Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_normalize_angle_in_range(angle in -1000.0f32..1000.0) {
        let a = normalize_angle(angle);
        prop_assert!(a > -PI - 1e-5 && a <= PI + 1e-5, "{} normalized to {}", angle, a);
    }

    #[test]
    fn prop_arc_contains_inside_offsets(
        facing in -PI..PI,
        half_width in 0.1f32..1.5,
        fraction in -0.98f32..0.98,
        distance in 1.0f32..500.0,
        cx in -1000.0f32..1000.0,
        cy in -1000.0f32..1000.0,
    ) {
        let center = Vec2::new(cx, cy);
        let point = point_at(center, facing + fraction * half_width, distance);
        prop_assert!(within_arc(center, facing, half_width, point));
    }

    #[test]
    fn prop_arc_excludes_outside_offsets(
        facing in -PI..PI,
        half_width in 0.1f32..1.5,
        past in 0.02f32..1.6,
        left in any::<bool>(),
        distance in 1.0f32..500.0,
    ) {
        let sign = if left { 1.0 } else { -1.0 };
        let point = point_at(Vec2::ZERO, facing + sign * (half_width + past), distance);
        prop_assert!(!within_arc(Vec2::ZERO, facing, half_width, point));
    }

    #[test]
    fn prop_zone_threshold(
        radius in 10.0f32..500.0,
        angle in -PI..PI,
        inner in 0.0f32..0.32,
        outer in 0.34f32..1.0,
    ) {
        let center = Vec2::new(40.0, -25.0);
        let near = point_at(center, angle, inner * radius);
        let far = point_at(center, angle, outer * radius);
        prop_assert_eq!(distance_ratio_zone(center, radius, near), RingZone::Inner);
        prop_assert_eq!(distance_ratio_zone(center, radius, far), RingZone::Outer);
    }
}

// ============================================================
// Damage and Status Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_roll_stays_in_window(min in 0.0f32..1000.0, width in 0.0f32..1000.0, seed in any::<u64>()) {
        let range = DamageRange::new(min, min + width);
        let mut rng = seeded(seed);
        for _ in 0..16 {
            let amount = range.roll(&mut rng);
            prop_assert_eq!(amount.fract(), 0.0);
            prop_assert!(amount >= min.floor() && amount <= (min + width).floor());
        }
    }

    #[test]
    fn prop_slow_never_weakens(
        slows in prop::collection::vec((0.0f32..1.0, 0.1f32..5.0), 1..12),
    ) {
        let mut ledger = StatusLedger::new();
        let mut strongest: f32 = 0.0;
        for (percentage, duration) in slows {
            ledger.apply_slow(percentage, duration);
            strongest = strongest.max(percentage);
            let active = ledger.active_slow().unwrap();
            prop_assert_eq!(active.percentage, strongest);
        }
    }
}
