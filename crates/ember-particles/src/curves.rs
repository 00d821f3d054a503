//! Piecewise-linear keyframe curves and color gradients over normalized lifetime

use ember_core::{EmberError, Result};
use glam::{Vec3, Vec4};

/// Maximum keyframes stored in a [`FloatKeyframes`] curve
pub const MAX_CURVE_KEYS: usize = 4;
/// Maximum RGB keys and, independently, alpha keys in a [`Gradient`]
pub const MAX_GRADIENT_KEYS: usize = 8;

/// Linear interpolation between two floats
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation between two RGBA colors
pub fn lerp_color(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a.lerp(b, t)
}

/// A scalar curve of at most four `(key, value)` pairs, keys in [0, 1].
///
/// Stored as a flat `[key0, value0, key1, value1, ..]` array so the layout
/// matches what GPU-side evaluation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatKeyframes {
    elements: [f32; MAX_CURVE_KEYS * 2],
    count: usize,
}

impl FloatKeyframes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from `(key, value)` pairs
    pub fn from_keys(keys: &[(f32, f32)]) -> Result<Self> {
        let mut curve = Self::new();
        for &(key, value) in keys {
            curve.add(key, value)?;
        }
        Ok(curve)
    }

    /// Flat curve holding `value` across the whole lifetime
    pub fn flat(value: f32) -> Self {
        let mut curve = Self::new();
        curve.push(0.0, value);
        curve.push(1.0, value);
        curve
    }

    /// Straight ramp from `start` at key 0 to `end` at key 1
    pub fn linear(start: f32, end: f32) -> Self {
        let mut curve = Self::new();
        curve.push(0.0, start);
        curve.push(1.0, end);
        curve
    }

    /// Append a keyframe. The fourth key always lands on `key = 1`.
    pub fn add(&mut self, key: f32, value: f32) -> Result<()> {
        if self.count >= MAX_CURVE_KEYS {
            return Err(EmberError::CurveCapacity {
                max_keys: MAX_CURVE_KEYS,
            });
        }
        let key = if self.count == MAX_CURVE_KEYS - 1 {
            1.0
        } else {
            key
        };
        self.push(key, value);
        Ok(())
    }

    fn push(&mut self, key: f32, value: f32) {
        let offset = self.count * 2;
        self.elements[offset] = key;
        self.elements[offset + 1] = value;
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn key(&self, index: usize) -> (f32, f32) {
        (self.elements[index * 2], self.elements[index * 2 + 1])
    }

    pub fn keys(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        (0..self.count).map(|i| self.key(i))
    }

    /// Packed `[key, value, ..]` elements for GPU upload
    pub fn elements(&self) -> &[f32] {
        &self.elements[..self.count * 2]
    }

    /// Segment-weighted average of the curve's values.
    ///
    /// Sums `(v_i + v_{i+1}) * (k_{i+1} - k_i)` over adjacent keys and
    /// divides by the segment count. This is an estimate for bounds, not an
    /// exact integral.
    pub fn average_value(&self) -> f32 {
        match self.count {
            0 => 0.0,
            1 => self.elements[1],
            n => {
                let mut total = 0.0;
                for i in 0..n - 1 {
                    let (k0, v0) = self.key(i);
                    let (k1, v1) = self.key(i + 1);
                    total += (v0 + v1) * (k1 - k0);
                }
                total / (n - 1) as f32
            }
        }
    }

    pub fn max_value(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.keys().map(|(_, v)| v).fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min_value(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.keys().map(|(_, v)| v).fold(f32::INFINITY, f32::min)
    }

    /// Sample the curve at normalized time `t`, clamping outside the keys
    pub fn sample(&self, t: f32) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        let (first_key, first_value) = self.key(0);
        if t <= first_key {
            return first_value;
        }
        for i in 1..self.count {
            let (k1, v1) = self.key(i);
            if t <= k1 {
                let (k0, v0) = self.key(i - 1);
                let span = k1 - k0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return lerp_f32(v0, v1, (t - k0) / span);
            }
        }
        self.key(self.count - 1).1
    }
}

/// A color gradient with independent RGB and alpha key sets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gradient {
    rgb_keys: [f32; MAX_GRADIENT_KEYS],
    rgb_values: [Vec3; MAX_GRADIENT_KEYS],
    rgb_count: usize,
    alpha_keys: [f32; MAX_GRADIENT_KEYS],
    alpha_values: [f32; MAX_GRADIENT_KEYS],
    alpha_count: usize,
}

impl Gradient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-key gradient from `start` to `end`
    pub fn linear(start: Vec4, end: Vec4) -> Self {
        let mut gradient = Self::new();
        gradient.push_rgb(0.0, start.truncate());
        gradient.push_rgb(1.0, end.truncate());
        gradient.push_alpha(0.0, start.w);
        gradient.push_alpha(1.0, end.w);
        gradient
    }

    pub fn add_color_rgb(&mut self, key: f32, color: Vec3) -> Result<()> {
        if self.rgb_count >= MAX_GRADIENT_KEYS {
            return Err(EmberError::GradientCapacity {
                channel: "rgb",
                max_keys: MAX_GRADIENT_KEYS,
            });
        }
        self.push_rgb(key, color);
        Ok(())
    }

    pub fn add_color_alpha(&mut self, key: f32, alpha: f32) -> Result<()> {
        if self.alpha_count >= MAX_GRADIENT_KEYS {
            return Err(EmberError::GradientCapacity {
                channel: "alpha",
                max_keys: MAX_GRADIENT_KEYS,
            });
        }
        self.push_alpha(key, alpha);
        Ok(())
    }

    fn push_rgb(&mut self, key: f32, color: Vec3) {
        self.rgb_keys[self.rgb_count] = key;
        self.rgb_values[self.rgb_count] = color;
        self.rgb_count += 1;
    }

    fn push_alpha(&mut self, key: f32, alpha: f32) {
        self.alpha_keys[self.alpha_count] = key;
        self.alpha_values[self.alpha_count] = alpha;
        self.alpha_count += 1;
    }

    pub fn rgb_key_count(&self) -> usize {
        self.rgb_count
    }

    pub fn alpha_key_count(&self) -> usize {
        self.alpha_count
    }

    pub fn evaluate_rgb(&self, t: f32) -> Vec3 {
        let keys = &self.rgb_keys[..self.rgb_count];
        let values = &self.rgb_values[..self.rgb_count];
        match locate(keys, t) {
            Segment::Empty => Vec3::ONE,
            Segment::Exact(i) => values[i],
            Segment::Between(i, f) => values[i].lerp(values[i + 1], f),
        }
    }

    pub fn evaluate_alpha(&self, t: f32) -> f32 {
        let keys = &self.alpha_keys[..self.alpha_count];
        let values = &self.alpha_values[..self.alpha_count];
        match locate(keys, t) {
            Segment::Empty => 1.0,
            Segment::Exact(i) => values[i],
            Segment::Between(i, f) => lerp_f32(values[i], values[i + 1], f),
        }
    }

    pub fn evaluate(&self, t: f32) -> Vec4 {
        self.evaluate_rgb(t).extend(self.evaluate_alpha(t))
    }

    /// Per-channel (min, max) over stored RGB keys
    pub fn rgb_range(&self) -> (Vec3, Vec3) {
        if self.rgb_count == 0 {
            return (Vec3::ONE, Vec3::ONE);
        }
        self.rgb_values[..self.rgb_count].iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), v| (lo.min(*v), hi.max(*v)),
        )
    }

    /// (min, max) over stored alpha keys
    pub fn alpha_range(&self) -> (f32, f32) {
        if self.alpha_count == 0 {
            return (1.0, 1.0);
        }
        self.alpha_values[..self.alpha_count]
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }
}

enum Segment {
    Empty,
    Exact(usize),
    Between(usize, f32),
}

fn locate(keys: &[f32], t: f32) -> Segment {
    if keys.is_empty() {
        return Segment::Empty;
    }
    if t <= keys[0] {
        return Segment::Exact(0);
    }
    for i in 1..keys.len() {
        if t <= keys[i] {
            let span = keys[i] - keys[i - 1];
            if span <= f32::EPSILON {
                return Segment::Exact(i);
            }
            return Segment::Between(i - 1, (t - keys[i - 1]) / span);
        }
    }
    Segment::Exact(keys.len() - 1)
}
