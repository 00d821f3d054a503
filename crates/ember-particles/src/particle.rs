//! Particle vertex layout and spawn-time attribute generation

use crate::emitter::{EmitterConfig, RenderMode, SimulationSpace, StartRotation, StartSize};
use crate::modules::ParticleModules;
use crate::rand::{SeedSlot, SeededRandom};
use crate::sync::MeshVertexProvider;
use crate::values::{ColorCurve, CurveMode};
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};

/// GPU vertex data, 192 bytes (12 rows of vec4).
/// Every vertex of a particle carries the full particle record.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// Billboard: xy = corner offset, zw = corner uv. Mesh: xyz = vertex position
    pub corner: [f32; 4],
    pub mesh_color: [f32; 4],
    /// xy = uv with the start frame baked in, zw = frame scale
    pub texcoord: [f32; 4],
    pub position_life: [f32; 4],   // xyz = spawn position, w = lifetime
    pub direction_time: [f32; 4],  // xyz = direction, w = spawn time
    pub start_color: [f32; 4],
    pub size_speed: [f32; 4],      // xyz = start size, w = start speed
    pub rotation: [f32; 4],        // xyz = start rotation (radians)
    pub random0: [f32; 4],         // color, size, rotation, frame-over-time
    pub random1: [f32; 4],         // start frame, velocity
    pub world_position: [f32; 4],
    pub world_rotation: [f32; 4],  // quaternion xyzw
}

pub const VERTEX_STRIDE: usize = std::mem::size_of::<ParticleVertex>();

/// Quad corners as (x, y, u, v)
pub const BILLBOARD_CORNERS: [[f32; 4]; 4] = [
    [-0.5, -0.5, 0.0, 1.0],
    [0.5, -0.5, 1.0, 1.0],
    [0.5, 0.5, 1.0, 0.0],
    [-0.5, 0.5, 0.0, 0.0],
];

pub const BILLBOARD_VERTEX_COUNT: usize = BILLBOARD_CORNERS.len();

impl ParticleVertex {
    pub fn spawn_time(&self) -> f32 {
        self.direction_time[3]
    }

    pub fn lifetime(&self) -> f32 {
        self.position_life[3]
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position_life[0], self.position_life[1], self.position_life[2])
    }

    pub fn direction(&self) -> Vec3 {
        Vec3::new(
            self.direction_time[0],
            self.direction_time[1],
            self.direction_time[2],
        )
    }
}

/// Everything decided about a particle at the moment it is emitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnAttributes {
    pub time: f32,
    pub lifetime: f32,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec4,
    pub size: Vec3,
    pub rotation: Vec3,
    pub speed: f32,
    pub random0: Vec4,
    pub random1: Vec4,
    /// (scale.x, scale.y, offset.x, offset.y) of the starting sheet frame
    pub start_uv: Vec4,
    pub world_position: Vec3,
    pub world_rotation: Quat,
}

impl SpawnAttributes {
    /// Draw every start value for a particle emitted at `time`.
    ///
    /// `emission_time` is the position inside the current cycle; curve-mode
    /// start lifetimes are sampled at `emission_time / duration`. `pose` is
    /// the emitter's world pose, stored only in world simulation space.
    pub fn generate(
        config: &EmitterConfig,
        modules: &ParticleModules,
        random: &mut SeededRandom,
        shape_sample: (Vec3, Vec3),
        time: f32,
        emission_time: f32,
        pose: (Vec3, Quat),
    ) -> Self {
        let (position, direction) = shape_sample;
        let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Z);

        let cycle_t = (emission_time / config.duration).clamp(0.0, 1.0);
        let lifetime = config
            .start_lifetime
            .evaluate(cycle_t, draw_if(random, SeedSlot::StartLifetime, config.start_lifetime.mode()));

        let color = match config.start_color {
            ColorCurve::TwoConstants { .. } => {
                let r = random.float(SeedSlot::StartColor);
                config.start_color.evaluate(0.0, r)
            }
            other => other.evaluate(0.0, 0.0),
        };

        let size = match config.start_size {
            StartSize::Uniform(c) => Vec3::splat(c.evaluate(
                0.0,
                draw_if(random, SeedSlot::StartSize, c.mode()),
            )),
            StartSize::PerAxis(c) => {
                let r = draw_vec3_if(random, SeedSlot::StartSize, c.mode());
                config.start_size.evaluate(r)
            }
        };

        let rotation = match config.start_rotation {
            StartRotation::Z(c) => Vec3::new(
                0.0,
                0.0,
                c.evaluate(0.0, draw_if(random, SeedSlot::StartRotation, c.mode())),
            ),
            StartRotation::PerAxis(c) => {
                let r = draw_vec3_if(random, SeedSlot::StartRotation, c.mode());
                config.start_rotation.evaluate(r)
            }
        };

        let speed = config.start_speed.evaluate(
            0.0,
            draw_if(random, SeedSlot::StartSpeed, config.start_speed.mode()),
        );

        let mut random0 = Vec4::ZERO;
        let mut random1 = Vec4::ZERO;
        if modules.color_over_lifetime.needs_random() {
            random0.x = random.float(SeedSlot::ColorOverLifetime);
        }
        if modules.size_over_lifetime.needs_random() {
            random0.y = random.float(SeedSlot::SizeOverLifetime);
        }
        if modules.rotation_over_lifetime.needs_random() {
            random0.z = random.float(SeedSlot::RotationOverLifetime);
        }
        let sheet = &modules.texture_sheet_animation;
        if sheet.needs_frame_random() {
            random0.w = random.float(SeedSlot::TextureFrameOverTime);
        }
        if sheet.needs_start_random() {
            random1.x = random.float(SeedSlot::TextureStartFrame);
        }
        if modules.velocity_over_lifetime.needs_random() {
            random1.y = random.float(SeedSlot::VelocityOverLifetime);
        }
        let start_uv = sheet.start_uv(random1.x);

        let (world_position, world_rotation) = match config.simulation_space {
            SimulationSpace::World => pose,
            SimulationSpace::Local => (Vec3::ZERO, Quat::IDENTITY),
        };

        Self {
            time,
            lifetime,
            position,
            direction,
            color,
            size,
            rotation,
            speed,
            random0,
            random1,
            start_uv,
            world_position,
            world_rotation,
        }
    }

    /// Whether the particle would already be dead at `current_time`
    pub fn expired_at(&self, current_time: f32) -> bool {
        current_time - self.time >= self.lifetime
    }

    /// Fill one particle's vertices. `out.len()` must match the render mode:
    /// four for billboards, the template's vertex count for meshes.
    pub fn write_vertices(
        &self,
        render_mode: RenderMode,
        mesh: Option<&dyn MeshVertexProvider>,
        out: &mut [ParticleVertex],
    ) {
        let template = ParticleVertex {
            corner: [0.0; 4],
            mesh_color: [1.0; 4],
            texcoord: [0.0; 4],
            position_life: self.position.extend(self.lifetime).to_array(),
            direction_time: self.direction.extend(self.time).to_array(),
            start_color: self.color.to_array(),
            size_speed: self.size.extend(self.speed).to_array(),
            rotation: self.rotation.extend(0.0).to_array(),
            random0: self.random0.to_array(),
            random1: self.random1.to_array(),
            world_position: self.world_position.extend(0.0).to_array(),
            world_rotation: self.world_rotation.to_array(),
        };
        let uv = self.start_uv;

        match (render_mode, mesh) {
            (RenderMode::Mesh, Some(mesh)) => {
                for (i, vertex) in out.iter_mut().enumerate() {
                    let p = mesh.position(i);
                    let t = mesh.uv(i);
                    *vertex = ParticleVertex {
                        corner: [p.x, p.y, p.z, 1.0],
                        mesh_color: mesh.color(i).to_array(),
                        texcoord: [t.x * uv.x + uv.z, t.y * uv.y + uv.w, uv.x, uv.y],
                        ..template
                    };
                }
            }
            _ => {
                for (vertex, corner) in out.iter_mut().zip(BILLBOARD_CORNERS) {
                    *vertex = ParticleVertex {
                        corner,
                        texcoord: [
                            corner[2] * uv.x + uv.z,
                            corner[3] * uv.y + uv.w,
                            uv.x,
                            uv.y,
                        ],
                        ..template
                    };
                }
            }
        }
    }
}

/// One draw from `slot` when `mode` randomizes, 0 otherwise
fn draw_if(random: &mut SeededRandom, slot: SeedSlot, mode: CurveMode) -> f32 {
    if mode.is_random() {
        random.float(slot)
    } else {
        0.0
    }
}

fn draw_vec3_if(random: &mut SeededRandom, slot: SeedSlot, mode: CurveMode) -> Vec3 {
    if mode.is_random() {
        random.draw(slot, |rng| Vec3::new(rng.next_f32(), rng.next_f32(), rng.next_f32()))
    } else {
        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::TextureSheetAnimation;
    use crate::sync::MeshTemplate;
    use crate::values::ScalarCurve;
    use glam::{UVec2, Vec2};

    fn spawn(config: &EmitterConfig, modules: &ParticleModules) -> SpawnAttributes {
        let mut random = SeededRandom::new(config.random_seed, false);
        SpawnAttributes::generate(
            config,
            modules,
            &mut random,
            (Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -2.0)),
            0.5,
            0.5,
            (Vec3::new(10.0, 0.0, 0.0), Quat::from_rotation_y(1.0)),
        )
    }

    #[test]
    fn vertex_is_192_bytes() {
        assert_eq!(VERTEX_STRIDE, 192);
        assert_eq!(std::mem::align_of::<ParticleVertex>(), 4);
    }

    #[test]
    fn constant_start_values() {
        let config = EmitterConfig {
            start_lifetime: ScalarCurve::Constant(2.0),
            start_speed: ScalarCurve::Constant(3.0),
            ..Default::default()
        };
        let attrs = spawn(&config, &ParticleModules::default());
        assert_eq!(attrs.lifetime, 2.0);
        assert_eq!(attrs.speed, 3.0);
        assert_eq!(attrs.size, Vec3::ONE);
        assert_eq!(attrs.color, Vec4::ONE);
        assert_eq!(attrs.direction, Vec3::NEG_Z);
        assert_eq!(attrs.random0, Vec4::ZERO);
        assert_eq!(attrs.random1, Vec4::ZERO);
        assert_eq!(attrs.start_uv, Vec4::new(1.0, 1.0, 0.0, 0.0));
    }

    #[test]
    fn local_space_drops_the_pose() {
        let config = EmitterConfig::default();
        let attrs = spawn(&config, &ParticleModules::default());
        assert_eq!(attrs.world_position, Vec3::ZERO);
        assert_eq!(attrs.world_rotation, Quat::IDENTITY);

        let config = EmitterConfig {
            simulation_space: SimulationSpace::World,
            ..Default::default()
        };
        let attrs = spawn(&config, &ParticleModules::default());
        assert_eq!(attrs.world_position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(attrs.world_rotation, Quat::from_rotation_y(1.0));
    }

    #[test]
    fn two_constant_start_values_stay_in_range() {
        let config = EmitterConfig {
            start_speed: ScalarCurve::TwoConstants { min: 2.0, max: 4.0 },
            start_lifetime: ScalarCurve::TwoConstants { min: 1.0, max: 1.5 },
            random_seed: 99,
            auto_random_seed: false,
            ..Default::default()
        };
        let modules = ParticleModules::default();
        let mut random = SeededRandom::new(config.random_seed, false);
        for _ in 0..200 {
            let attrs = SpawnAttributes::generate(
                &config,
                &modules,
                &mut random,
                (Vec3::ZERO, Vec3::NEG_Z),
                0.0,
                0.0,
                (Vec3::ZERO, Quat::IDENTITY),
            );
            assert!((2.0..=4.0).contains(&attrs.speed));
            assert!((1.0..=1.5).contains(&attrs.lifetime));
        }
    }

    #[test]
    fn expiry_check() {
        let attrs = spawn(&EmitterConfig::default(), &ParticleModules::default());
        assert!(!attrs.expired_at(0.5 + 4.9));
        assert!(attrs.expired_at(0.5 + 5.0));
    }

    #[test]
    fn billboard_vertices_bake_start_frame() {
        let mut modules = ParticleModules::default();
        modules.texture_sheet_animation = TextureSheetAnimation {
            enabled: true,
            tiles: UVec2::new(2, 2),
            start_frame: ScalarCurve::Constant(3.0),
            ..Default::default()
        };
        let attrs = spawn(&EmitterConfig::default(), &modules);
        let mut out = [ParticleVertex::default(); BILLBOARD_VERTEX_COUNT];
        attrs.write_vertices(RenderMode::Billboard, None, &mut out);

        // Frame 3 of a 2x2 sheet is the bottom-right tile
        assert_eq!(out[0].texcoord, [0.5, 1.0, 0.5, 0.5]);
        assert_eq!(out[2].texcoord, [1.0, 0.5, 0.5, 0.5]);
        for v in &out {
            assert_eq!(v.position_life, [1.0, 2.0, 3.0, 5.0]);
            assert_eq!(v.spawn_time(), 0.5);
            assert_eq!(v.direction(), Vec3::NEG_Z);
        }
        assert_eq!(out[1].corner, BILLBOARD_CORNERS[1]);
    }

    #[test]
    fn mesh_vertices_copy_template() {
        let mesh = MeshTemplate {
            positions: vec![Vec3::X, Vec3::Y, Vec3::Z],
            colors: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::ONE],
        };
        let attrs = spawn(&EmitterConfig::default(), &ParticleModules::default());
        let mut out = [ParticleVertex::default(); 3];
        attrs.write_vertices(RenderMode::Mesh, Some(&mesh), &mut out);
        assert_eq!(out[1].corner, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(out[2].mesh_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[2].texcoord, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out[0].size_speed, [1.0, 1.0, 1.0, 5.0]);
    }
}
