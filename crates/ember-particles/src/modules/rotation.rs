//! Rotation over lifetime (angular velocity in radians per second)

use crate::values::{CurveMode, ScalarCurve, VectorCurve};
use glam::Vec3;

/// Angular velocity around Z only, or separately per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngularVelocity {
    Z(ScalarCurve),
    PerAxis(VectorCurve),
}

impl Default for AngularVelocity {
    fn default() -> Self {
        AngularVelocity::Z(ScalarCurve::Constant(45f32.to_radians()))
    }
}

impl AngularVelocity {
    pub fn mode(&self) -> CurveMode {
        match self {
            AngularVelocity::Z(c) => c.mode(),
            AngularVelocity::PerAxis(c) => c.mode(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationOverLifetime {
    pub enabled: bool,
    pub angular_velocity: AngularVelocity,
}

impl RotationOverLifetime {
    pub fn evaluate(&self, t: f32, random: f32) -> Vec3 {
        if !self.enabled {
            return Vec3::ZERO;
        }
        match &self.angular_velocity {
            AngularVelocity::Z(c) => Vec3::new(0.0, 0.0, c.evaluate(t, random)),
            AngularVelocity::PerAxis(c) => c.evaluate(t, random),
        }
    }

    pub fn needs_random(&self) -> bool {
        self.enabled && self.angular_velocity.mode().is_random()
    }
}
