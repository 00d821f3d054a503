//! Curve-mode values: an attribute is a constant, a curve, or a random
//! interpolation between two constants or two curves.

use crate::curves::{lerp_f32, FloatKeyframes, Gradient};
use ember_core::{EmberError, Result};
use glam::{Vec3, Vec4};
use std::fmt;

/// How an attribute is evaluated over a particle's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveMode {
    Constant,
    Curve,
    TwoConstants,
    TwoCurves,
}

impl CurveMode {
    pub const NAMES: [&'static str; 4] = ["constant", "curve", "two_constants", "two_curves"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveMode::Constant => "constant",
            CurveMode::Curve => "curve",
            CurveMode::TwoConstants => "two_constants",
            CurveMode::TwoCurves => "two_curves",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "constant" => Ok(CurveMode::Constant),
            "curve" => Ok(CurveMode::Curve),
            "two_constants" => Ok(CurveMode::TwoConstants),
            "two_curves" => Ok(CurveMode::TwoCurves),
            other => Err(EmberError::invalid_enum(other, &Self::NAMES)),
        }
    }

    /// Whether evaluation consumes a per-particle random scalar
    pub fn is_random(&self) -> bool {
        matches!(self, CurveMode::TwoConstants | CurveMode::TwoCurves)
    }

    /// Fail unless the mode is Constant or TwoConstants
    pub fn require_constant(&self, attribute: &'static str) -> Result<()> {
        match self {
            CurveMode::Constant | CurveMode::TwoConstants => Ok(()),
            other => Err(EmberError::UnsupportedCurveMode {
                attribute,
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CurveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar attribute value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarCurve {
    Constant(f32),
    Curve(FloatKeyframes),
    TwoConstants { min: f32, max: f32 },
    TwoCurves { min: FloatKeyframes, max: FloatKeyframes },
}

impl Default for ScalarCurve {
    fn default() -> Self {
        ScalarCurve::Constant(0.0)
    }
}

impl ScalarCurve {
    pub fn mode(&self) -> CurveMode {
        match self {
            ScalarCurve::Constant(_) => CurveMode::Constant,
            ScalarCurve::Curve(_) => CurveMode::Curve,
            ScalarCurve::TwoConstants { .. } => CurveMode::TwoConstants,
            ScalarCurve::TwoCurves { .. } => CurveMode::TwoCurves,
        }
    }

    /// Evaluate at normalized time `t` using the per-particle `random` in [0, 1)
    pub fn evaluate(&self, t: f32, random: f32) -> f32 {
        match self {
            ScalarCurve::Constant(v) => *v,
            ScalarCurve::Curve(curve) => curve.sample(t),
            ScalarCurve::TwoConstants { min, max } => lerp_f32(*min, *max, random),
            ScalarCurve::TwoCurves { min, max } => {
                lerp_f32(min.sample(t), max.sample(t), random)
            }
        }
    }

    /// Largest value the attribute can take
    pub fn max_value(&self) -> f32 {
        match self {
            ScalarCurve::Constant(v) => *v,
            ScalarCurve::Curve(curve) => curve.max_value(),
            ScalarCurve::TwoConstants { min, max } => min.max(*max),
            ScalarCurve::TwoCurves { min, max } => min.max_value().max(max.max_value()),
        }
    }

    /// Smallest value the attribute can take
    pub fn min_value(&self) -> f32 {
        match self {
            ScalarCurve::Constant(v) => *v,
            ScalarCurve::Curve(curve) => curve.min_value(),
            ScalarCurve::TwoConstants { min, max } => min.min(*max),
            ScalarCurve::TwoCurves { min, max } => min.min_value().min(max.min_value()),
        }
    }

    /// (low, high) of the lifetime-averaged value, for displacement bounds
    pub fn average_range(&self) -> (f32, f32) {
        let (a, b) = match self {
            ScalarCurve::Constant(v) => (*v, *v),
            ScalarCurve::Curve(curve) => (curve.average_value(), curve.average_value()),
            ScalarCurve::TwoConstants { min, max } => (*min, *max),
            ScalarCurve::TwoCurves { min, max } => (min.average_value(), max.average_value()),
        };
        (a.min(b), a.max(b))
    }
}

/// A per-axis vector attribute value. All three axes share one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorCurve {
    Constant(Vec3),
    Curve([FloatKeyframes; 3]),
    TwoConstants { min: Vec3, max: Vec3 },
    TwoCurves {
        min: [FloatKeyframes; 3],
        max: [FloatKeyframes; 3],
    },
}

impl Default for VectorCurve {
    fn default() -> Self {
        VectorCurve::Constant(Vec3::ZERO)
    }
}

impl VectorCurve {
    pub fn mode(&self) -> CurveMode {
        match self {
            VectorCurve::Constant(_) => CurveMode::Constant,
            VectorCurve::Curve(_) => CurveMode::Curve,
            VectorCurve::TwoConstants { .. } => CurveMode::TwoConstants,
            VectorCurve::TwoCurves { .. } => CurveMode::TwoCurves,
        }
    }

    pub fn evaluate(&self, t: f32, random: f32) -> Vec3 {
        match self {
            VectorCurve::Constant(v) => *v,
            VectorCurve::Curve(c) => Vec3::new(c[0].sample(t), c[1].sample(t), c[2].sample(t)),
            VectorCurve::TwoConstants { min, max } => min.lerp(*max, random),
            VectorCurve::TwoCurves { min, max } => {
                let lo = Vec3::new(min[0].sample(t), min[1].sample(t), min[2].sample(t));
                let hi = Vec3::new(max[0].sample(t), max[1].sample(t), max[2].sample(t));
                lo.lerp(hi, random)
            }
        }
    }

    /// Per-axis (min, max) over every value the attribute can take
    pub fn value_range(&self) -> (Vec3, Vec3) {
        match self {
            VectorCurve::Constant(v) => (*v, *v),
            VectorCurve::Curve(c) => (curve_min(c), curve_max(c)),
            VectorCurve::TwoConstants { min, max } => (min.min(*max), min.max(*max)),
            VectorCurve::TwoCurves { min, max } => (
                curve_min(min).min(curve_min(max)),
                curve_max(min).max(curve_max(max)),
            ),
        }
    }

    /// Per-axis (low, high) of the lifetime-averaged value
    pub fn average_range(&self) -> (Vec3, Vec3) {
        let (a, b) = match self {
            VectorCurve::Constant(v) => (*v, *v),
            VectorCurve::Curve(c) => (curve_average(c), curve_average(c)),
            VectorCurve::TwoConstants { min, max } => (*min, *max),
            VectorCurve::TwoCurves { min, max } => (curve_average(min), curve_average(max)),
        };
        (a.min(b), a.max(b))
    }
}

fn curve_min(c: &[FloatKeyframes; 3]) -> Vec3 {
    Vec3::new(c[0].min_value(), c[1].min_value(), c[2].min_value())
}

fn curve_max(c: &[FloatKeyframes; 3]) -> Vec3 {
    Vec3::new(c[0].max_value(), c[1].max_value(), c[2].max_value())
}

fn curve_average(c: &[FloatKeyframes; 3]) -> Vec3 {
    Vec3::new(
        c[0].average_value(),
        c[1].average_value(),
        c[2].average_value(),
    )
}

/// An RGBA attribute value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorCurve {
    Constant(Vec4),
    Gradient(Gradient),
    TwoConstants { min: Vec4, max: Vec4 },
    TwoGradients { min: Gradient, max: Gradient },
}

impl Default for ColorCurve {
    fn default() -> Self {
        ColorCurve::Constant(Vec4::ONE)
    }
}

impl ColorCurve {
    pub fn mode(&self) -> CurveMode {
        match self {
            ColorCurve::Constant(_) => CurveMode::Constant,
            ColorCurve::Gradient(_) => CurveMode::Curve,
            ColorCurve::TwoConstants { .. } => CurveMode::TwoConstants,
            ColorCurve::TwoGradients { .. } => CurveMode::TwoCurves,
        }
    }

    pub fn evaluate(&self, t: f32, random: f32) -> Vec4 {
        match self {
            ColorCurve::Constant(c) => *c,
            ColorCurve::Gradient(g) => g.evaluate(t),
            ColorCurve::TwoConstants { min, max } => min.lerp(*max, random),
            ColorCurve::TwoGradients { min, max } => min.evaluate(t).lerp(max.evaluate(t), random),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!(CurveMode::parse("two_curves").unwrap(), CurveMode::TwoCurves);
        assert!(matches!(
            CurveMode::parse("spline"),
            Err(EmberError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn require_constant_rejects_curves() {
        assert!(CurveMode::TwoConstants.require_constant("start_speed").is_ok());
        let err = CurveMode::Curve.require_constant("start_speed").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported curve mode for start_speed: curve");
    }

    #[test]
    fn scalar_two_constants_uses_random() {
        let v = ScalarCurve::TwoConstants { min: 2.0, max: 4.0 };
        assert!((v.evaluate(0.3, 0.5) - 3.0).abs() < 1e-6);
        assert_eq!(v.max_value(), 4.0);
        assert_eq!(v.min_value(), 2.0);
        assert!(v.mode().is_random());
    }

    #[test]
    fn scalar_two_curves_blends_samples() {
        let v = ScalarCurve::TwoCurves {
            min: FloatKeyframes::flat(0.0),
            max: FloatKeyframes::from_keys(&[(0.0, 0.0), (1.0, 10.0)]).unwrap(),
        };
        assert!((v.evaluate(0.5, 0.5) - 2.5).abs() < 1e-6);
        assert_eq!(v.max_value(), 10.0);
    }

    #[test]
    fn vector_ranges() {
        let v = VectorCurve::TwoConstants {
            min: Vec3::new(1.0, -2.0, 0.0),
            max: Vec3::new(-1.0, 2.0, 0.0),
        };
        let (lo, hi) = v.value_range();
        assert_eq!(lo, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn color_two_gradients() {
        let c = ColorCurve::TwoGradients {
            min: Gradient::linear(Vec4::ZERO, Vec4::ZERO),
            max: Gradient::linear(Vec4::ONE, Vec4::ONE),
        };
        let v = c.evaluate(0.2, 0.25);
        assert!((v - Vec4::splat(0.25)).length() < 1e-6);
    }
}
