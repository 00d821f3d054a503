//! Conservative bounding box from the module configuration.
//!
//! Nothing here looks at live particles. The box covers every position a
//! particle could reach under the current settings and is meant for culling.

use crate::emitter::{EmitterConfig, RenderMode, SimulationSpace};
use crate::modules::ParticleModules;
use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn expand(&self, amount: Vec3) -> Self {
        Self::new(self.min - amount, self.max + amount)
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around this one after rotating it and moving it by `translation`
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for corner in self.corners() {
            let p = rotation * corner + translation;
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Largest start values, recomputed explicitly after configuration changes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CachedMaxima {
    pub max_start_lifetime: f32,
    pub min_start_speed: f32,
    pub max_start_speed: f32,
    pub max_start_size: f32,
    pub max_size_over_lifetime: f32,
}

impl CachedMaxima {
    pub fn compute(config: &EmitterConfig, modules: &ParticleModules) -> Self {
        let mesh_mode = config.render_mode == RenderMode::Mesh;
        Self {
            max_start_lifetime: config.max_start_lifetime(),
            min_start_speed: config.start_speed.min_value(),
            max_start_speed: config.start_speed.max_value(),
            max_start_size: config.start_size.max_value().max(0.0),
            max_size_over_lifetime: modules
                .size_over_lifetime
                .max_size_in_gradient(mesh_mode)
                .max(0.0),
        }
    }
}

/// Emitter-local bounds. `emitter_rotation` is needed to bring world-space
/// gravity and world-space velocity into the emitter frame.
pub fn estimate_local_bounds(
    config: &EmitterConfig,
    modules: &ParticleModules,
    cached: &CachedMaxima,
    emitter_rotation: Quat,
) -> Aabb {
    let lifetime = cached.max_start_lifetime;
    let (pos_min, pos_max) = modules.shape.position_bounds();
    let (dir_min, dir_max) = modules.shape.direction_bounds();

    // Straight-line travel: every direction/speed extreme, scaled to the
    // longest lifetime. Ages start at zero so the origin stays inside.
    let candidates = [
        dir_min * cached.min_start_speed,
        dir_min * cached.max_start_speed,
        dir_max * cached.min_start_speed,
        dir_max * cached.max_start_speed,
    ];
    let mut lo = Vec3::ZERO;
    let mut hi = Vec3::ZERO;
    for c in candidates {
        lo = lo.min(c * lifetime);
        hi = hi.max(c * lifetime);
    }

    let velocity = &modules.velocity_over_lifetime;
    if velocity.enabled {
        let (v_lo, v_hi) = velocity.displacement_range(lifetime);
        let displacement = match velocity.space {
            SimulationSpace::Local => Aabb::new(v_lo, v_hi),
            SimulationSpace::World => {
                Aabb::new(v_lo, v_hi).transformed(emitter_rotation.inverse(), Vec3::ZERO)
            }
        };
        lo += displacement.min.min(Vec3::ZERO);
        hi += displacement.max.max(Vec3::ZERO);
    }

    let gravity = emitter_rotation.inverse() * (config.gravity * config.gravity_modifier);
    let drop = 0.5 * gravity * lifetime * lifetime;
    lo += drop.min(Vec3::ZERO);
    hi += drop.max(Vec3::ZERO);

    let half_size = cached.max_start_size * cached.max_size_over_lifetime;
    Aabb::new(pos_min + lo, pos_max + hi).expand(Vec3::splat(half_size))
}
