//! Velocity over lifetime

use crate::emitter::SimulationSpace;
use crate::values::VectorCurve;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityOverLifetime {
    pub enabled: bool,
    pub velocity: VectorCurve,
    /// Frame the velocity is expressed in
    pub space: SimulationSpace,
}

impl VelocityOverLifetime {
    /// Velocity at normalized age `t` for a particle with random scalar `random`
    pub fn evaluate(&self, t: f32, random: f32) -> Vec3 {
        if !self.enabled {
            return Vec3::ZERO;
        }
        self.velocity.evaluate(t, random)
    }

    /// Whether allocation has to draw a per-particle random scalar
    pub fn needs_random(&self) -> bool {
        self.enabled && self.velocity.mode().is_random()
    }

    /// Per-axis (min, max) displacement over a lifetime of `lifetime` seconds
    pub fn displacement_range(&self, lifetime: f32) -> (Vec3, Vec3) {
        if !self.enabled {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let (lo, hi) = self.velocity.average_range();
        (
            (lo * lifetime).min(Vec3::ZERO),
            (hi * lifetime).max(Vec3::ZERO),
        )
    }
}
