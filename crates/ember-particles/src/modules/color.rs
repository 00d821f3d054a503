//! Color over lifetime

use crate::values::ColorCurve;
use glam::Vec4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorOverLifetime {
    pub enabled: bool,
    pub color: ColorCurve,
}

impl ColorOverLifetime {
    /// Color multiplier at normalized age `t`
    pub fn evaluate(&self, t: f32, random: f32) -> Vec4 {
        if !self.enabled {
            return Vec4::ONE;
        }
        self.color.evaluate(t, random)
    }

    pub fn needs_random(&self) -> bool {
        self.enabled && self.color.mode().is_random()
    }

    /// Per-channel (min, max) over every stored key, for GPU range compression
    pub fn ranges(&self) -> (Vec4, Vec4) {
        match &self.color {
            ColorCurve::Constant(c) => (*c, *c),
            ColorCurve::TwoConstants { min, max } => (min.min(*max), min.max(*max)),
            ColorCurve::Gradient(g) => {
                let (lo, hi) = g.rgb_range();
                let (alo, ahi) = g.alpha_range();
                (lo.extend(alo), hi.extend(ahi))
            }
            ColorCurve::TwoGradients { min, max } => {
                let (lo_a, hi_a) = min.rgb_range();
                let (lo_b, hi_b) = max.rgb_range();
                let (alo_a, ahi_a) = min.alpha_range();
                let (alo_b, ahi_b) = max.alpha_range();
                (
                    lo_a.min(lo_b).extend(alo_a.min(alo_b)),
                    hi_a.max(hi_b).extend(ahi_a.max(ahi_b)),
                )
            }
        }
    }
}
