//! Geometric hit tests for skill shapes.
//!
//! World positions are screen-space (y grows downward). Angular tests invert
//! the y component so angles read counter-clockwise from +x, the same way the
//! facing angle is derived from the aim target.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::constants::INNER_RING_RATIO;

/// Ring classification inside a circular area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingZone {
    Inner,
    Outer,
}

/// Screen-space offset converted to a y-up vector
fn y_up(from: Vec2, to: Vec2) -> Vec2 {
    Vec2::new(to.x - from.x, -(to.y - from.y))
}

/// Wrap an angle into (-PI, PI]. Values already in range come back unchanged.
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle;
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

/// Facing angle from `origin` toward the aim target; +x when they coincide
pub fn facing_angle(origin: Vec2, aim: Vec2) -> f32 {
    let dir = y_up(origin, aim);
    if dir.length_squared() == 0.0 {
        return 0.0;
    }
    dir.y.atan2(dir.x)
}

pub fn within_circle(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance(point) <= radius
}

/// Angular containment; the boundary itself is inside
pub fn within_arc(center: Vec2, facing: f32, half_width: f32, point: Vec2) -> bool {
    let v = y_up(center, point);
    if v.length_squared() == 0.0 {
        return true;
    }
    let diff = normalize_angle(v.y.atan2(v.x) - facing);
    diff.abs() <= half_width
}

/// Circle and arc together: the cone used by Cleave
pub fn within_cone(center: Vec2, radius: f32, facing: f32, half_width: f32, point: Vec2) -> bool {
    within_circle(center, radius, point) && within_arc(center, facing, half_width, point)
}

/// Inner ring when `distance / radius < 0.33`, outer otherwise
pub fn distance_ratio_zone(center: Vec2, radius: f32, point: Vec2) -> RingZone {
    if radius <= 0.0 {
        return RingZone::Inner;
    }
    if center.distance(point) / radius < INNER_RING_RATIO {
        RingZone::Inner
    } else {
        RingZone::Outer
    }
}

/// Point at `distance` along `angle` (y-up convention) expressed in screen space
pub fn point_at(center: Vec2, angle: f32, distance: f32) -> Vec2 {
    Vec2::new(
        center.x + distance * angle.cos(),
        center.y - distance * angle.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(FRAC_PI_4), FRAC_PI_4);
        assert_eq!(normalize_angle(PI), PI);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_facing_uses_inverted_y() {
        let origin = Vec2::new(100.0, 100.0);
        // aim straight up on screen (smaller y) faces +90 degrees
        let up = facing_angle(origin, Vec2::new(100.0, 50.0));
        assert!((up - PI / 2.0).abs() < 1e-6);
        assert_eq!(facing_angle(origin, origin), 0.0);
    }

    #[test]
    fn test_circle_boundary_inclusive() {
        let c = Vec2::ZERO;
        assert!(within_circle(c, 10.0, Vec2::new(10.0, 0.0)));
        assert!(!within_circle(c, 10.0, Vec2::new(10.001, 0.0)));
    }

    #[test]
    fn test_arc_boundary_is_hit() {
        let c = Vec2::ZERO;
        // screen (10, -10) is 45 degrees above +x
        assert!(within_arc(c, 0.0, FRAC_PI_4, Vec2::new(10.0, -10.0)));
        let just_outside = point_at(c, 45.001f32.to_radians(), 10.0);
        assert!(!within_arc(c, 0.0, FRAC_PI_4, just_outside));
    }

    #[test]
    fn test_arc_wraps_across_pi() {
        let c = Vec2::ZERO;
        let facing = PI - 0.1;
        let behind_wrap = point_at(c, -PI + 0.1, 5.0);
        assert!(within_arc(c, facing, 0.25, behind_wrap));
        assert!(!within_arc(c, 0.0, 0.25, behind_wrap));
    }

    #[test]
    fn test_zone_threshold() {
        let c = Vec2::ZERO;
        assert_eq!(distance_ratio_zone(c, 100.0, Vec2::new(33.0, 0.0)), RingZone::Outer);
        assert_eq!(distance_ratio_zone(c, 100.0, Vec2::new(32.9, 0.0)), RingZone::Inner);
        assert_eq!(distance_ratio_zone(c, 100.0, Vec2::new(90.0, 0.0)), RingZone::Outer);
    }

    #[test]
    fn test_cone() {
        let c = Vec2::ZERO;
        assert!(within_cone(c, 50.0, 0.0, FRAC_PI_4, Vec2::new(40.0, 0.0)));
        assert!(!within_cone(c, 50.0, 0.0, FRAC_PI_4, Vec2::new(60.0, 0.0)));
        assert!(!within_cone(c, 50.0, 0.0, FRAC_PI_4, Vec2::new(-40.0, 0.0)));
    }
}
