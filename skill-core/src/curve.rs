//! Piecewise-linear level scaling.
//!
//! A `DamageCurve` maps player level to a {min, max} damage window through
//! ordered breakpoints. Below the first breakpoint and above the last the
//! curve clamps; between two breakpoints both ends interpolate
//! independently. `ScalingCurve` is the single-valued variant (Cyclone
//! rotation speed).
//!
//! Curves are validated once at config load. Evaluation never divides by
//! zero, even on an unvalidated curve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::damage::DamageRange;

/// A (level, min, max) anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub level: u32,
    pub min: f32,
    pub max: f32,
}

impl Breakpoint {
    pub const fn new(level: u32, min: f32, max: f32) -> Self {
        Self { level, min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("curve has no breakpoints")]
    Empty,
    #[error("breakpoint {index} has level {level}, below previous level {previous}")]
    DecreasingLevel {
        index: usize,
        previous: u32,
        level: u32,
    },
    #[error("breakpoint at level {level} has min {min} greater than max {max}")]
    InvertedRange { level: u32, min: f32, max: f32 },
    #[error("breakpoint at level {level} is not finite")]
    NonFinite { level: u32 },
}

/// Interpolation weight of `level` inside `[l1, l2]`; zero on a degenerate segment
fn segment_t(level: u32, l1: u32, l2: u32) -> f32 {
    if l2 <= l1 {
        return 0.0;
    }
    (level - l1) as f32 / (l2 - l1) as f32
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Evaluate raw breakpoints at `level`. `None` only for an empty list.
pub fn evaluate(level: u32, points: &[Breakpoint]) -> Option<DamageRange> {
    let first = points.first()?;
    let last = points.last()?;

    if level <= first.level {
        return Some(DamageRange::new(first.min, first.max));
    }
    if level >= last.level {
        return Some(DamageRange::new(last.min, last.max));
    }

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.level <= level && level <= b.level {
            let t = segment_t(level, a.level, b.level);
            return Some(DamageRange::new(lerp(a.min, b.min, t), lerp(a.max, b.max, t)));
        }
    }

    // Only reachable on unsorted input
    Some(DamageRange::new(last.min, last.max))
}

/// Validated damage breakpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageCurve {
    points: Vec<Breakpoint>,
}

impl DamageCurve {
    pub fn new(points: Vec<Breakpoint>) -> Result<Self, CurveError> {
        let curve = Self { points };
        curve.validate()?;
        Ok(curve)
    }

    /// Flat curve: the same window at every level
    pub fn constant(min: f32, max: f32) -> Self {
        Self {
            points: vec![Breakpoint::new(1, min, max)],
        }
    }

    /// Build from known-good points; callers run `validate` at load time
    pub(crate) fn from_points(points: &[Breakpoint]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        if self.points.is_empty() {
            return Err(CurveError::Empty);
        }
        for (index, point) in self.points.iter().enumerate() {
            if !point.min.is_finite() || !point.max.is_finite() {
                return Err(CurveError::NonFinite { level: point.level });
            }
            if point.min > point.max {
                return Err(CurveError::InvertedRange {
                    level: point.level,
                    min: point.min,
                    max: point.max,
                });
            }
            if index > 0 {
                let previous = self.points[index - 1].level;
                if point.level < previous {
                    return Err(CurveError::DecreasingLevel {
                        index,
                        previous,
                        level: point.level,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, level: u32) -> DamageRange {
        evaluate(level, &self.points).unwrap_or(DamageRange::ZERO)
    }
}

/// Single-valued (level, value) curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalingCurve {
    points: Vec<(u32, f32)>,
}

impl ScalingCurve {
    pub fn new(points: Vec<(u32, f32)>) -> Result<Self, CurveError> {
        let curve = Self { points };
        curve.validate()?;
        Ok(curve)
    }

    pub(crate) fn from_points(points: &[(u32, f32)]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        let as_breakpoints: Vec<Breakpoint> = self
            .points
            .iter()
            .map(|&(level, value)| Breakpoint::new(level, value, value))
            .collect();
        DamageCurve {
            points: as_breakpoints,
        }
        .validate()
    }

    pub fn evaluate(&self, level: u32) -> f32 {
        let (Some(&(first_level, first)), Some(&(last_level, last))) =
            (self.points.first(), self.points.last())
        else {
            return 0.0;
        };
        if level <= first_level {
            return first;
        }
        if level >= last_level {
            return last;
        }
        self.points
            .windows(2)
            .find(|pair| pair[0].0 <= level && level <= pair[1].0)
            .map(|pair| lerp(pair[0].1, pair[1].1, segment_t(level, pair[0].0, pair[1].0)))
            .unwrap_or(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point() -> DamageCurve {
        DamageCurve::new(vec![
            Breakpoint::new(1, 39.0, 53.0),
            Breakpoint::new(50, 300.0, 500.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_clamps_below_and_above() {
        let curve = two_point();
        assert_eq!(curve.evaluate(0), DamageRange::new(39.0, 53.0));
        assert_eq!(curve.evaluate(1), DamageRange::new(39.0, 53.0));
        assert_eq!(curve.evaluate(50), DamageRange::new(300.0, 500.0));
        assert_eq!(curve.evaluate(100), DamageRange::new(300.0, 500.0));
    }

    #[test]
    fn test_interpolates_min_and_max_independently() {
        let curve = DamageCurve::new(vec![
            Breakpoint::new(0, 0.0, 100.0),
            Breakpoint::new(10, 50.0, 100.0),
        ])
        .unwrap();
        let mid = curve.evaluate(5);
        assert!((mid.min - 25.0).abs() < 1e-4);
        assert!((mid.max - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_cyclone_breakpoints() {
        let curve = DamageCurve::new(vec![
            Breakpoint::new(1, 10.0, 20.0),
            Breakpoint::new(50, 50.0, 100.0),
            Breakpoint::new(100, 100.0, 200.0),
            Breakpoint::new(200, 1000.0, 2000.0),
        ])
        .unwrap();
        let at_150 = curve.evaluate(150);
        assert!((at_150.min - 550.0).abs() < 1e-3);
        assert!((at_150.max - 1100.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_segment_does_not_divide_by_zero() {
        let curve = DamageCurve::new(vec![
            Breakpoint::new(1, 10.0, 20.0),
            Breakpoint::new(10, 30.0, 40.0),
            Breakpoint::new(10, 90.0, 100.0),
            Breakpoint::new(20, 100.0, 110.0),
        ])
        .unwrap();
        let at_10 = curve.evaluate(10);
        assert!(at_10.min.is_finite() && at_10.max.is_finite());
        let at_15 = curve.evaluate(15);
        assert!((at_15.min - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_malformed_curves() {
        assert_eq!(DamageCurve::new(vec![]), Err(CurveError::Empty));
        assert!(matches!(
            DamageCurve::new(vec![
                Breakpoint::new(10, 1.0, 2.0),
                Breakpoint::new(5, 1.0, 2.0)
            ]),
            Err(CurveError::DecreasingLevel { index: 1, .. })
        ));
        assert!(matches!(
            DamageCurve::new(vec![Breakpoint::new(1, 5.0, 2.0)]),
            Err(CurveError::InvertedRange { level: 1, .. })
        ));
        assert!(matches!(
            DamageCurve::new(vec![Breakpoint::new(1, f32::NAN, 2.0)]),
            Err(CurveError::NonFinite { level: 1 })
        ));
    }

    #[test]
    fn test_free_evaluate_empty() {
        assert!(evaluate(5, &[]).is_none());
    }

    #[test]
    fn test_scaling_curve() {
        let speed =
            ScalingCurve::new(vec![(1, 100.0), (50, 500.0), (100, 900.0), (200, 1800.0)]).unwrap();
        assert_eq!(speed.evaluate(0), 100.0);
        assert_eq!(speed.evaluate(300), 1800.0);
        assert!((speed.evaluate(75) - 700.0).abs() < 1e-3);
        assert!(ScalingCurve::new(vec![]).is_err());
    }
}
