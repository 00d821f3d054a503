//! Texture sheet animation: flipbook frames over a particle's lifetime

use crate::curves::FloatKeyframes;
use crate::values::ScalarCurve;
use ember_core::Result;
use glam::{UVec2, Vec4};

/// Which frames of the sheet the animation walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetAnimation {
    #[default]
    WholeSheet,
    SingleRow { row: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSheetAnimation {
    pub enabled: bool,
    /// Columns (x) and rows (y) of the sheet
    pub tiles: UVec2,
    pub animation: SheetAnimation,
    /// Normalized position in the frame sequence, 0 = first frame, 1 = wrap
    pub frame_over_time: ScalarCurve,
    /// Frame index the sequence starts from (Constant or TwoConstants)
    pub start_frame: ScalarCurve,
    /// Times the sequence repeats over one lifetime
    pub cycles: u32,
}

impl Default for TextureSheetAnimation {
    fn default() -> Self {
        Self {
            enabled: false,
            tiles: UVec2::ONE,
            animation: SheetAnimation::WholeSheet,
            frame_over_time: ScalarCurve::Curve(FloatKeyframes::linear(0.0, 1.0)),
            start_frame: ScalarCurve::Constant(0.0),
            cycles: 1,
        }
    }
}

impl TextureSheetAnimation {
    pub fn validate(&self) -> Result<()> {
        self.start_frame
            .mode()
            .require_constant("texture_sheet_animation.start_frame")
    }

    pub fn frame_count(&self) -> u32 {
        let tiles = self.tiles.max(UVec2::ONE);
        match self.animation {
            SheetAnimation::WholeSheet => tiles.x * tiles.y,
            SheetAnimation::SingleRow { .. } => tiles.x,
        }
    }

    pub fn needs_frame_random(&self) -> bool {
        self.enabled && self.frame_over_time.mode().is_random()
    }

    pub fn needs_start_random(&self) -> bool {
        self.enabled && self.start_frame.mode().is_random()
    }

    /// Frame index shown at normalized age `t`
    pub fn frame_index(&self, t: f32, frame_random: f32, start_random: f32) -> u32 {
        let count = self.frame_count() as i64;
        let phase = (t * self.cycles.max(1) as f32).fract();
        let start = self.start_frame.evaluate(0.0, start_random).floor();
        let offset = (self.frame_over_time.evaluate(phase, frame_random) * count as f32).floor();
        ((start + offset) as i64).rem_euclid(count) as u32
    }

    /// UV rectangle of `frame` as (scale.x, scale.y, offset.x, offset.y)
    pub fn uv_rect(&self, frame: u32) -> Vec4 {
        let tiles = self.tiles.max(UVec2::ONE);
        let scale_x = 1.0 / tiles.x as f32;
        let scale_y = 1.0 / tiles.y as f32;
        let frame = frame % self.frame_count();
        let (col, row) = match self.animation {
            SheetAnimation::WholeSheet => (frame % tiles.x, frame / tiles.x),
            SheetAnimation::SingleRow { row } => (frame, row.min(tiles.y - 1)),
        };
        Vec4::new(scale_x, scale_y, col as f32 * scale_x, row as f32 * scale_y)
    }

    /// UV rectangle of the first frame a particle shows, baked at allocation
    pub fn start_uv(&self, start_random: f32) -> Vec4 {
        if !self.enabled {
            return Vec4::new(1.0, 1.0, 0.0, 0.0);
        }
        let start = self.start_frame.evaluate(0.0, start_random).floor() as i64;
        let frame = start.rem_euclid(self.frame_count() as i64) as u32;
        self.uv_rect(frame)
    }
}
