//! Lightweight xorshift32 PRNG plus per-feature seed slots.
//!
//! Every emission-time random draw goes through a named [`SeedSlot`]: the
//! generator is re-seeded from the slot before the draw and the slot stores
//! the advanced state afterwards. Each feature therefore sees the same
//! sequence regardless of which other features are enabled.

use std::f32::consts::TAU;

pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Current internal state
    pub fn seed(&self) -> u32 {
        self.state
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.state = if seed == 0 { 1 } else { seed };
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits fit the f32 mantissa exactly
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform point on the unit sphere surface
    pub fn unit_sphere_point(&mut self) -> [f32; 3] {
        let z = self.next_f32() * 2.0 - 1.0;
        let a = self.next_f32() * TAU;
        let r = (1.0 - z * z).max(0.0).sqrt();
        [r * a.cos(), r * a.sin(), z]
    }

    /// Uniform point inside the unit sphere
    pub fn inside_unit_sphere(&mut self) -> [f32; 3] {
        let [x, y, z] = self.unit_sphere_point();
        let range = self.next_f32().cbrt();
        [x * range, y * range, z * range]
    }

    /// Uniform point on the unit circle edge within `arc` radians
    pub fn unit_arc_point(&mut self, arc: f32) -> [f32; 2] {
        let angle = self.next_f32() * arc;
        [angle.cos(), angle.sin()]
    }

    /// Uniform point inside the unit disk sector spanning `arc` radians
    pub fn inside_unit_arc(&mut self, arc: f32) -> [f32; 2] {
        let [x, y] = self.unit_arc_point(arc);
        let range = self.next_f32().sqrt();
        [x * range, y * range]
    }

    /// Uniform point inside the box [-0.5, 0.5]^3
    pub fn inside_half_unit_box(&mut self) -> [f32; 3] {
        [
            self.next_f32() - 0.5,
            self.next_f32() - 0.5,
            self.next_f32() - 0.5,
        ]
    }
}

/// Identifies which feature a random draw belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSlot {
    Burst,
    StartDelay,
    StartColor,
    StartSize,
    StartRotation,
    StartLifetime,
    StartSpeed,
    VelocityOverLifetime,
    ColorOverLifetime,
    SizeOverLifetime,
    RotationOverLifetime,
    TextureStartFrame,
    TextureFrameOverTime,
    ShapeExtrusion,
    ShapeArc,
    ShapePosition,
    ShapeDirection,
}

impl SeedSlot {
    /// Offset index into [`SEED_OFFSETS`]. Index 1 is reserved.
    pub const fn index(self) -> usize {
        match self {
            SeedSlot::Burst => 0,
            SeedSlot::StartDelay => 2,
            SeedSlot::StartColor => 3,
            SeedSlot::StartSize => 4,
            SeedSlot::StartRotation => 5,
            SeedSlot::StartLifetime => 6,
            SeedSlot::StartSpeed => 7,
            SeedSlot::VelocityOverLifetime => 8,
            SeedSlot::ColorOverLifetime => 9,
            SeedSlot::SizeOverLifetime => 10,
            SeedSlot::RotationOverLifetime => 11,
            SeedSlot::TextureStartFrame => 12,
            SeedSlot::TextureFrameOverTime => 13,
            SeedSlot::ShapeExtrusion => 14,
            SeedSlot::ShapeArc => 15,
            SeedSlot::ShapePosition => 16,
            SeedSlot::ShapeDirection => 17,
        }
    }
}

/// Per-slot offsets added to the base seed so slots start decorrelated
pub const SEED_OFFSETS: [u32; 18] = [
    0x2357_1a3e, 0xc34f_56fe, 0x1337_1337, 0x1246_0f3b, 0x6aed_452e, 0xdab3_7a7c,
    0x9c1f_33a1, 0x5e02_8d47, 0x3f8a_c219, 0xe671_0b5d, 0x0b49_7fe3, 0x7d2c_e6a8,
    0xa513_9c74, 0x48f6_2d0e, 0xf0b8_5193, 0x26cd_a8f1, 0x81e4_3b5c, 0xcb97_e027,
];

/// Stored generator state for each feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSlots {
    pub burst: u32,
    pub start_delay: u32,
    pub start_color: u32,
    pub start_size: u32,
    pub start_rotation: u32,
    pub start_lifetime: u32,
    pub start_speed: u32,
    pub velocity_over_lifetime: u32,
    pub color_over_lifetime: u32,
    pub size_over_lifetime: u32,
    pub rotation_over_lifetime: u32,
    pub texture_start_frame: u32,
    pub texture_frame_over_time: u32,
    pub shape_extrusion: u32,
    pub shape_arc: u32,
    pub shape_position: u32,
    pub shape_direction: u32,
}

impl SeedSlots {
    pub fn from_base(base: u32) -> Self {
        let at = |slot: SeedSlot| base.wrapping_add(SEED_OFFSETS[slot.index()]);
        Self {
            burst: at(SeedSlot::Burst),
            start_delay: at(SeedSlot::StartDelay),
            start_color: at(SeedSlot::StartColor),
            start_size: at(SeedSlot::StartSize),
            start_rotation: at(SeedSlot::StartRotation),
            start_lifetime: at(SeedSlot::StartLifetime),
            start_speed: at(SeedSlot::StartSpeed),
            velocity_over_lifetime: at(SeedSlot::VelocityOverLifetime),
            color_over_lifetime: at(SeedSlot::ColorOverLifetime),
            size_over_lifetime: at(SeedSlot::SizeOverLifetime),
            rotation_over_lifetime: at(SeedSlot::RotationOverLifetime),
            texture_start_frame: at(SeedSlot::TextureStartFrame),
            texture_frame_over_time: at(SeedSlot::TextureFrameOverTime),
            shape_extrusion: at(SeedSlot::ShapeExtrusion),
            shape_arc: at(SeedSlot::ShapeArc),
            shape_position: at(SeedSlot::ShapePosition),
            shape_direction: at(SeedSlot::ShapeDirection),
        }
    }

    pub fn get_mut(&mut self, slot: SeedSlot) -> &mut u32 {
        match slot {
            SeedSlot::Burst => &mut self.burst,
            SeedSlot::StartDelay => &mut self.start_delay,
            SeedSlot::StartColor => &mut self.start_color,
            SeedSlot::StartSize => &mut self.start_size,
            SeedSlot::StartRotation => &mut self.start_rotation,
            SeedSlot::StartLifetime => &mut self.start_lifetime,
            SeedSlot::StartSpeed => &mut self.start_speed,
            SeedSlot::VelocityOverLifetime => &mut self.velocity_over_lifetime,
            SeedSlot::ColorOverLifetime => &mut self.color_over_lifetime,
            SeedSlot::SizeOverLifetime => &mut self.size_over_lifetime,
            SeedSlot::RotationOverLifetime => &mut self.rotation_over_lifetime,
            SeedSlot::TextureStartFrame => &mut self.texture_start_frame,
            SeedSlot::TextureFrameOverTime => &mut self.texture_frame_over_time,
            SeedSlot::ShapeExtrusion => &mut self.shape_extrusion,
            SeedSlot::ShapeArc => &mut self.shape_arc,
            SeedSlot::ShapePosition => &mut self.shape_position,
            SeedSlot::ShapeDirection => &mut self.shape_direction,
        }
    }
}

/// Routes draws through seed slots, or through a free-running entropy
/// generator when auto-random-seed is on.
pub struct SeededRandom {
    rng: ParticleRng,
    seeds: SeedSlots,
    entropy: Option<ParticleRng>,
}

impl SeededRandom {
    pub fn new(seed: u32, auto_random_seed: bool) -> Self {
        let mut random = Self {
            rng: ParticleRng::new(seed),
            seeds: SeedSlots::default(),
            entropy: None,
        };
        random.reseed(seed, auto_random_seed);
        random
    }

    /// Reset every slot from `seed`, or switch to entropy draws
    pub fn reseed(&mut self, seed: u32, auto_random_seed: bool) {
        self.seeds = SeedSlots::from_base(seed);
        self.entropy = auto_random_seed.then(|| ParticleRng::new(::rand::random::<u32>()));
    }

    pub fn is_auto(&self) -> bool {
        self.entropy.is_some()
    }

    pub fn seeds(&self) -> &SeedSlots {
        &self.seeds
    }

    /// Run `f` against the generator positioned at `slot`'s stored state
    pub fn draw<R>(&mut self, slot: SeedSlot, f: impl FnOnce(&mut ParticleRng) -> R) -> R {
        if let Some(entropy) = self.entropy.as_mut() {
            return f(entropy);
        }
        let stored = self.seeds.get_mut(slot);
        self.rng.set_seed(*stored);
        let result = f(&mut self.rng);
        *stored = self.rng.seed();
        result
    }

    /// Single float in [0, 1) from `slot`
    pub fn float(&mut self, slot: SeedSlot) -> f32 {
        self.draw(slot, |rng| rng.next_f32())
    }
}
