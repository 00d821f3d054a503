//! Emission shapes: where a particle spawns and which way it flies.
//!
//! Shapes sample in a "+Z forward" local frame; [`ShapeModule::generate`]
//! reverses the Z component of the final direction so particles fly toward
//! -Z, the engine's forward convention.

use crate::rand::{SeedSlot, SeededRandom};
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Which part of a cone particles spawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConeEmitType {
    #[default]
    Base,
    BaseShell,
    Volume,
    VolumeShell,
}

impl ConeEmitType {
    fn is_shell(self) -> bool {
        matches!(self, ConeEmitType::BaseShell | ConeEmitType::VolumeShell)
    }

    fn is_volume(self) -> bool {
        matches!(self, ConeEmitType::Volume | ConeEmitType::VolumeShell)
    }
}

/// How a circle picks the spawn angle within its arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcMode {
    /// Uniformly random within the arc
    #[default]
    Random,
    /// Sweep around the arc as emission time advances
    Loop,
}

/// Emission shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Uniform interior of an axis-aligned box of full side lengths `size`
    Box { size: Vec3 },
    Sphere { radius: f32, emit_from_shell: bool },
    /// Sphere restricted to the +Z half
    Hemisphere { radius: f32, emit_from_shell: bool },
    Cone {
        /// Half-angle of the spread in radians
        angle: f32,
        radius: f32,
        length: f32,
        emit_type: ConeEmitType,
    },
    /// Disk (or ring) sector in the XY plane
    Circle {
        radius: f32,
        /// Arc in radians, at most TAU
        arc: f32,
        emit_from_edge: bool,
        arc_mode: ArcMode,
        /// Loop mode sweep speed in revolutions per second
        arc_speed: f32,
    },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Cone {
            angle: 25f32.to_radians(),
            radius: 1.0,
            length: 5.0,
            emit_type: ConeEmitType::Base,
        }
    }
}

impl Shape {
    /// Sample `(position, direction)` in the +Z forward frame
    pub fn sample(&self, random: &mut SeededRandom, emission_time: f32) -> (Vec3, Vec3) {
        match *self {
            Shape::Box { size } => {
                let p = random.draw(SeedSlot::ShapePosition, |rng| rng.inside_half_unit_box());
                (Vec3::from_array(p) * size, Vec3::Z)
            }
            Shape::Sphere {
                radius,
                emit_from_shell,
            } => {
                let p = sphere_point(random, emit_from_shell) * radius;
                (p, p.try_normalize().unwrap_or(Vec3::Z))
            }
            Shape::Hemisphere {
                radius,
                emit_from_shell,
            } => {
                let mut p = sphere_point(random, emit_from_shell) * radius;
                if p.z < 0.0 {
                    p.z = -p.z;
                }
                (p, p.try_normalize().unwrap_or(Vec3::Z))
            }
            Shape::Cone {
                angle,
                radius,
                length,
                emit_type,
            } => {
                let [x, y] = random.draw(SeedSlot::ShapePosition, |rng| {
                    if emit_type.is_shell() {
                        rng.unit_arc_point(TAU)
                    } else {
                        rng.inside_unit_arc(TAU)
                    }
                });
                let (sin_a, cos_a) = angle.sin_cos();
                let mut position = Vec3::new(x * radius, y * radius, 0.0);
                let direction = Vec3::new(x * sin_a, y * sin_a, cos_a)
                    .try_normalize()
                    .unwrap_or(Vec3::Z);
                if emit_type.is_volume() {
                    let along = random.float(SeedSlot::ShapeExtrusion) * length;
                    position += direction * along;
                }
                (position, direction)
            }
            Shape::Circle {
                radius,
                arc,
                emit_from_edge,
                arc_mode,
                arc_speed,
            } => {
                let theta = match arc_mode {
                    ArcMode::Random => random.float(SeedSlot::ShapeArc) * arc,
                    ArcMode::Loop if arc > 0.0 => (emission_time * arc_speed * TAU).rem_euclid(arc),
                    ArcMode::Loop => 0.0,
                };
                let range = if emit_from_edge {
                    1.0
                } else {
                    random.float(SeedSlot::ShapePosition).sqrt()
                };
                let direction = Vec3::new(theta.cos(), theta.sin(), 0.0);
                (direction * (radius * range), direction)
            }
        }
    }

    /// Conservative (min, max) of spawn positions
    pub fn position_bounds(&self) -> (Vec3, Vec3) {
        match *self {
            Shape::Box { size } => (-size.abs() * 0.5, size.abs() * 0.5),
            Shape::Sphere { radius, .. } => (Vec3::splat(-radius.abs()), Vec3::splat(radius.abs())),
            Shape::Hemisphere { radius, .. } => {
                let r = radius.abs();
                (Vec3::new(-r, -r, 0.0), Vec3::splat(r))
            }
            Shape::Cone {
                angle,
                radius,
                length,
                emit_type,
            } => {
                let r = radius.abs();
                if emit_type.is_volume() {
                    let lateral = r + length.abs() * cone_lateral(angle);
                    (
                        Vec3::new(-lateral, -lateral, 0.0),
                        Vec3::new(lateral, lateral, length.abs()),
                    )
                } else {
                    (Vec3::new(-r, -r, 0.0), Vec3::new(r, r, 0.0))
                }
            }
            Shape::Circle { radius, .. } => {
                let r = radius.abs();
                (Vec3::new(-r, -r, 0.0), Vec3::new(r, r, 0.0))
            }
        }
    }

    /// Conservative (min, max) of unit directions, in the +Z forward frame
    fn direction_bounds_forward(&self) -> (Vec3, Vec3) {
        match *self {
            Shape::Box { .. } => (Vec3::Z, Vec3::Z),
            Shape::Sphere { .. } => (Vec3::NEG_ONE, Vec3::ONE),
            Shape::Hemisphere { .. } => (Vec3::new(-1.0, -1.0, 0.0), Vec3::ONE),
            Shape::Cone { angle, .. } => {
                let lateral = cone_lateral(angle);
                (
                    Vec3::new(-lateral, -lateral, angle.cos().min(1.0)),
                    Vec3::new(lateral, lateral, 1.0),
                )
            }
            Shape::Circle { .. } => (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
        }
    }
}

fn sphere_point(random: &mut SeededRandom, shell: bool) -> Vec3 {
    Vec3::from_array(random.draw(SeedSlot::ShapePosition, |rng| {
        if shell {
            rng.unit_sphere_point()
        } else {
            rng.inside_unit_sphere()
        }
    }))
}

fn cone_lateral(angle: f32) -> f32 {
    if angle.abs() >= FRAC_PI_2 {
        1.0
    } else {
        angle.sin().abs()
    }
}

/// Shape module: the configured shape plus direction randomisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeModule {
    pub enabled: bool,
    pub shape: Shape,
    /// 0 keeps the shape's direction, 1 replaces it with a uniform random one
    pub random_direction_amount: f32,
}

impl Default for ShapeModule {
    fn default() -> Self {
        Self {
            enabled: true,
            shape: Shape::default(),
            random_direction_amount: 0.0,
        }
    }
}

impl ShapeModule {
    /// Spawn position and unit direction for one particle.
    /// A disabled module emits from the origin straight down -Z.
    pub fn generate(&self, random: &mut SeededRandom, emission_time: f32) -> (Vec3, Vec3) {
        if !self.enabled {
            return (Vec3::ZERO, Vec3::NEG_Z);
        }
        let (position, mut direction) = self.shape.sample(random, emission_time);
        if self.random_direction_amount > 0.0 {
            let r = Vec3::from_array(random.draw(SeedSlot::ShapeDirection, |rng| {
                rng.unit_sphere_point()
            }));
            direction = direction
                .lerp(r, self.random_direction_amount.min(1.0))
                .try_normalize()
                .unwrap_or(r);
        }
        direction.z = -direction.z;
        (position, direction)
    }

    /// Conservative (min, max) of spawn positions
    pub fn position_bounds(&self) -> (Vec3, Vec3) {
        if !self.enabled {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.shape.position_bounds()
    }

    /// Conservative (min, max) of emitted directions, after the Z reversal
    pub fn direction_bounds(&self) -> (Vec3, Vec3) {
        if !self.enabled {
            return (Vec3::NEG_Z, Vec3::NEG_Z);
        }
        if self.random_direction_amount > 0.0 {
            return (Vec3::NEG_ONE, Vec3::ONE);
        }
        let (lo, hi) = self.shape.direction_bounds_forward();
        (Vec3::new(lo.x, lo.y, -hi.z), Vec3::new(hi.x, hi.y, -lo.z))
    }
}
