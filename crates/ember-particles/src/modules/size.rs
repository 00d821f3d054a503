//! Size over lifetime

use crate::values::{CurveMode, ScalarCurve, VectorCurve};
use glam::Vec3;

/// Size multiplier, either uniform or separate per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeCurve {
    Uniform(ScalarCurve),
    PerAxis(VectorCurve),
}

impl Default for SizeCurve {
    fn default() -> Self {
        SizeCurve::Uniform(ScalarCurve::Constant(1.0))
    }
}

impl SizeCurve {
    pub fn mode(&self) -> CurveMode {
        match self {
            SizeCurve::Uniform(c) => c.mode(),
            SizeCurve::PerAxis(c) => c.mode(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeOverLifetime {
    pub enabled: bool,
    pub size: SizeCurve,
}

impl SizeOverLifetime {
    /// Per-axis size multiplier at normalized age `t`
    pub fn evaluate(&self, t: f32, random: f32) -> Vec3 {
        if !self.enabled {
            return Vec3::ONE;
        }
        match &self.size {
            SizeCurve::Uniform(c) => Vec3::splat(c.evaluate(t, random)),
            SizeCurve::PerAxis(c) => c.evaluate(t, random),
        }
    }

    pub fn needs_random(&self) -> bool {
        self.enabled && self.size.mode().is_random()
    }

    /// Largest multiplier reachable over the lifetime.
    /// Billboards only grow in X/Y; meshes grow along all three axes.
    pub fn max_size_in_gradient(&self, mesh_mode: bool) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        match &self.size {
            SizeCurve::Uniform(c) => c.max_value(),
            SizeCurve::PerAxis(c) => {
                let (_, hi) = c.value_range();
                if mesh_mode {
                    hi.max_element()
                } else {
                    hi.x.max(hi.y)
                }
            }
        }
    }
}
