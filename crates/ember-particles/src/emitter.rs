//! Emitter configuration (main settings, optionally parsed from TOML)

use crate::curves::{FloatKeyframes, Gradient};
use crate::modules::{
    AngularVelocity, Burst, ParticleModules, SheetAnimation, SizeCurve,
};
use crate::shape::{ArcMode, ConeEmitType, Shape};
use crate::values::{ColorCurve, CurveMode, ScalarCurve, VectorCurve};
use ember_core::{Color, EmberError, Result};
use glam::{UVec2, Vec3, Vec4};

/// Frame particles move in once emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationSpace {
    /// Particles follow the emitter transform
    #[default]
    Local,
    /// Particles keep the emitter pose they were spawned with
    World,
}

impl SimulationSpace {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(SimulationSpace::Local),
            "world" => Ok(SimulationSpace::World),
            other => Err(EmberError::invalid_enum(other, &["local", "world"])),
        }
    }
}

/// How each particle is drawn, which decides vertices per particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One camera-facing quad (4 vertices)
    #[default]
    Billboard,
    /// One copy of the template mesh supplied by a `MeshVertexProvider`
    Mesh,
}

/// Delay between `play()` and the first emission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartDelay {
    Constant(f32),
    Random { min: f32, max: f32 },
}

impl Default for StartDelay {
    fn default() -> Self {
        StartDelay::Constant(0.0)
    }
}

/// Start size, uniform or per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartSize {
    Uniform(ScalarCurve),
    PerAxis(VectorCurve),
}

impl StartSize {
    pub fn mode(&self) -> CurveMode {
        match self {
            StartSize::Uniform(c) => c.mode(),
            StartSize::PerAxis(c) => c.mode(),
        }
    }

    pub fn evaluate(&self, random: Vec3) -> Vec3 {
        match self {
            StartSize::Uniform(c) => Vec3::splat(c.evaluate(0.0, random.x)),
            StartSize::PerAxis(c) => match c {
                VectorCurve::TwoConstants { min, max } => Vec3::new(
                    min.x + (max.x - min.x) * random.x,
                    min.y + (max.y - min.y) * random.y,
                    min.z + (max.z - min.z) * random.z,
                ),
                other => other.evaluate(0.0, random.x),
            },
        }
    }

    /// Largest extent along any axis
    pub fn max_value(&self) -> f32 {
        match self {
            StartSize::Uniform(c) => c.max_value(),
            StartSize::PerAxis(c) => c.value_range().1.max_element(),
        }
    }
}

/// Start rotation in radians, around Z only or per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartRotation {
    Z(ScalarCurve),
    PerAxis(VectorCurve),
}

impl StartRotation {
    pub fn mode(&self) -> CurveMode {
        match self {
            StartRotation::Z(c) => c.mode(),
            StartRotation::PerAxis(c) => c.mode(),
        }
    }

    pub fn evaluate(&self, random: Vec3) -> Vec3 {
        match self {
            StartRotation::Z(c) => Vec3::new(0.0, 0.0, c.evaluate(0.0, random.z)),
            StartRotation::PerAxis(VectorCurve::TwoConstants { min, max }) => {
                *min + (*max - *min) * random
            }
            StartRotation::PerAxis(c) => c.evaluate(0.0, random.x),
        }
    }
}

/// Main settings of a particle system
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// Length of one emission cycle in seconds
    pub duration: f32,
    pub looping: bool,
    pub play_on_awake: bool,
    pub start_delay: StartDelay,
    /// Curve modes are sampled by normalized emission time
    pub start_lifetime: ScalarCurve,
    pub start_speed: ScalarCurve,
    pub start_size: StartSize,
    pub start_rotation: StartRotation,
    pub start_color: ColorCurve,
    pub gravity: Vec3,
    pub gravity_modifier: f32,
    pub simulation_space: SimulationSpace,
    pub simulation_speed: f32,
    pub max_particles: usize,
    pub random_seed: u32,
    pub auto_random_seed: bool,
    pub render_mode: RenderMode,
    /// Clamp applied to each update's scaled elapsed time
    pub max_elapsed_time: Option<f32>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            looping: true,
            play_on_awake: true,
            start_delay: StartDelay::default(),
            start_lifetime: ScalarCurve::Constant(5.0),
            start_speed: ScalarCurve::Constant(5.0),
            start_size: StartSize::Uniform(ScalarCurve::Constant(1.0)),
            start_rotation: StartRotation::Z(ScalarCurve::Constant(0.0)),
            start_color: ColorCurve::Constant(Vec4::ONE),
            gravity: Vec3::new(0.0, -9.81, 0.0),
            gravity_modifier: 0.0,
            simulation_space: SimulationSpace::Local,
            simulation_speed: 1.0,
            max_particles: 1000,
            random_seed: 0,
            auto_random_seed: true,
            render_mode: RenderMode::Billboard,
            max_elapsed_time: None,
        }
    }
}

impl EmitterConfig {
    /// Reject values and curve modes the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        // Zero duration would make the loop wrap spin forever
        if !(self.duration > 0.0) {
            return Err(EmberError::ValueOutOfRange {
                field: "duration".to_string(),
                min: f64::from(f32::EPSILON),
                max: f64::from(f32::MAX),
                value: f64::from(self.duration),
            });
        }
        if !(self.simulation_speed >= 0.0) {
            return Err(EmberError::ValueOutOfRange {
                field: "simulation_speed".to_string(),
                min: 0.0,
                max: f64::from(f32::MAX),
                value: f64::from(self.simulation_speed),
            });
        }
        self.start_speed.mode().require_constant("start_speed")?;
        self.start_size.mode().require_constant("start_size")?;
        self.start_rotation.mode().require_constant("start_rotation")?;
        self.start_color.mode().require_constant("start_color")?;
        Ok(())
    }

    /// Longest lifetime any particle can be given
    pub fn max_start_lifetime(&self) -> f32 {
        self.start_lifetime.max_value().max(0.0)
    }

    /// Parse main settings from a TOML table
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = table.get("duration") {
            config.duration = toml_f32(v, config.duration);
        }
        if let Some(v) = table.get("looping") {
            config.looping = v.as_bool().unwrap_or(config.looping);
        }
        if let Some(v) = table.get("play_on_awake") {
            config.play_on_awake = v.as_bool().unwrap_or(config.play_on_awake);
        }
        if let Some(v) = table.get("start_delay") {
            config.start_delay = match v.as_table() {
                Some(t) => StartDelay::Random {
                    min: t.get("min").map(|m| toml_f32(m, 0.0)).unwrap_or(0.0),
                    max: t.get("max").map(|m| toml_f32(m, 0.0)).unwrap_or(0.0),
                },
                None => StartDelay::Constant(toml_f32(v, 0.0)),
            };
        }
        if let Some(v) = table.get("start_lifetime") {
            config.start_lifetime = parse_scalar_curve(v)?;
        }
        if let Some(v) = table.get("start_speed") {
            config.start_speed = parse_scalar_curve(v)?;
        }
        if let Some(v) = table.get("start_size") {
            config.start_size = if is_vector_value(v) {
                StartSize::PerAxis(parse_vector_curve(v)?)
            } else {
                StartSize::Uniform(parse_scalar_curve(v)?)
            };
        }
        if let Some(v) = table.get("start_rotation") {
            config.start_rotation = if is_vector_value(v) {
                StartRotation::PerAxis(parse_vector_curve(v)?)
            } else {
                StartRotation::Z(parse_scalar_curve(v)?)
            };
        }
        if let Some(v) = table.get("start_color") {
            config.start_color = parse_color_curve(v)?;
        }
        if let Some(v) = table.get("gravity") {
            config.gravity = toml_vec3(v, config.gravity);
        }
        if let Some(v) = table.get("gravity_modifier") {
            config.gravity_modifier = toml_f32(v, config.gravity_modifier);
        }
        if let Some(v) = table.get("simulation_space") {
            config.simulation_space = SimulationSpace::parse(expect_str(v)?)?;
        }
        if let Some(v) = table.get("simulation_speed") {
            config.simulation_speed = toml_f32(v, config.simulation_speed);
        }
        if let Some(v) = table.get("max_particles") {
            let n = v.as_integer().unwrap_or(config.max_particles as i64);
            config.max_particles = n.clamp(0, 100_000) as usize;
        }
        if let Some(v) = table.get("random_seed") {
            config.random_seed = v.as_integer().unwrap_or(0) as u32;
        }
        if let Some(v) = table.get("auto_random_seed") {
            config.auto_random_seed = v.as_bool().unwrap_or(config.auto_random_seed);
        }
        if let Some(v) = table.get("render_mode") {
            config.render_mode = match expect_str(v)? {
                "billboard" => RenderMode::Billboard,
                "mesh" => RenderMode::Mesh,
                other => return Err(EmberError::invalid_enum(other, &["billboard", "mesh"])),
            };
        }
        if let Some(v) = table.get("max_elapsed_time") {
            config.max_elapsed_time = Some(toml_f32(v, 1.0 / 3.0));
        }

        Ok(config)
    }
}

impl ParticleModules {
    /// Parse the module set from a TOML table with one sub-table per module
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut modules = Self::default();

        if let Some(t) = sub_table(table, "emission")? {
            let emission = &mut modules.emission;
            read_enabled(t, &mut emission.enabled);
            if let Some(v) = t.get("rate_over_time") {
                emission.rate_over_time = toml_f32(v, emission.rate_over_time);
            }
            if let Some(v) = t.get("rate_over_distance") {
                emission.rate_over_distance = toml_f32(v, emission.rate_over_distance);
            }
            if let Some(bursts) = t.get("bursts").and_then(|v| v.as_array()) {
                for burst in bursts {
                    emission.add_burst(parse_burst(burst)?);
                }
            }
        }

        if let Some(t) = sub_table(table, "shape")? {
            let shape = &mut modules.shape;
            read_enabled(t, &mut shape.enabled);
            if let Some(v) = t.get("random_direction_amount") {
                shape.random_direction_amount = toml_f32(v, 0.0);
            }
            shape.shape = parse_shape(t)?;
        }

        if let Some(t) = sub_table(table, "velocity_over_lifetime")? {
            let module = &mut modules.velocity_over_lifetime;
            module.enabled = true;
            read_enabled(t, &mut module.enabled);
            if let Some(v) = t.get("velocity") {
                module.velocity = parse_vector_curve(v)?;
            }
            if let Some(v) = t.get("space") {
                module.space = SimulationSpace::parse(expect_str(v)?)?;
            }
        }

        if let Some(t) = sub_table(table, "color_over_lifetime")? {
            let module = &mut modules.color_over_lifetime;
            module.enabled = true;
            read_enabled(t, &mut module.enabled);
            if let Some(v) = t.get("color") {
                module.color = parse_color_curve(v)?;
            }
        }

        if let Some(t) = sub_table(table, "size_over_lifetime")? {
            let module = &mut modules.size_over_lifetime;
            module.enabled = true;
            read_enabled(t, &mut module.enabled);
            if let Some(v) = t.get("size") {
                module.size = SizeCurve::Uniform(parse_scalar_curve(v)?);
            }
            if let Some(v) = t.get("per_axis") {
                module.size = SizeCurve::PerAxis(parse_vector_curve(v)?);
            }
        }

        if let Some(t) = sub_table(table, "rotation_over_lifetime")? {
            let module = &mut modules.rotation_over_lifetime;
            module.enabled = true;
            read_enabled(t, &mut module.enabled);
            if let Some(v) = t.get("angular_velocity") {
                module.angular_velocity = AngularVelocity::Z(parse_scalar_curve(v)?);
            }
            if let Some(v) = t.get("per_axis") {
                module.angular_velocity = AngularVelocity::PerAxis(parse_vector_curve(v)?);
            }
        }

        if let Some(t) = sub_table(table, "texture_sheet_animation")? {
            let module = &mut modules.texture_sheet_animation;
            module.enabled = true;
            read_enabled(t, &mut module.enabled);
            if let Some(arr) = t.get("tiles").and_then(|v| v.as_array()) {
                if arr.len() >= 2 {
                    module.tiles = UVec2::new(
                        arr[0].as_integer().unwrap_or(1).max(1) as u32,
                        arr[1].as_integer().unwrap_or(1).max(1) as u32,
                    );
                }
            }
            if let Some(v) = t.get("animation") {
                module.animation = match expect_str(v)? {
                    "whole_sheet" => SheetAnimation::WholeSheet,
                    "single_row" => SheetAnimation::SingleRow {
                        row: t.get("row").and_then(|r| r.as_integer()).unwrap_or(0).max(0) as u32,
                    },
                    other => {
                        return Err(EmberError::invalid_enum(other, &["whole_sheet", "single_row"]))
                    }
                };
            }
            if let Some(v) = t.get("frame_over_time") {
                module.frame_over_time = parse_scalar_curve(v)?;
            }
            if let Some(v) = t.get("start_frame") {
                module.start_frame = parse_scalar_curve(v)?;
            }
            if let Some(v) = t.get("cycles") {
                module.cycles = v.as_integer().unwrap_or(1).max(1) as u32;
            }
        }

        Ok(modules)
    }
}

// ── Curve parsing ──

/// A bare number is a constant; a table names its `mode`
fn parse_scalar_curve(v: &toml::Value) -> Result<ScalarCurve> {
    let Some(t) = v.as_table() else {
        return Ok(ScalarCurve::Constant(expect_f32(v)?));
    };
    Ok(match curve_mode(t)? {
        CurveMode::Constant => ScalarCurve::Constant(field_f32(t, "value")?),
        CurveMode::Curve => ScalarCurve::Curve(parse_keys(field(t, "keys")?)?),
        CurveMode::TwoConstants => ScalarCurve::TwoConstants {
            min: field_f32(t, "min")?,
            max: field_f32(t, "max")?,
        },
        CurveMode::TwoCurves => ScalarCurve::TwoCurves {
            min: parse_keys(field(t, "min_keys")?)?,
            max: parse_keys(field(t, "max_keys")?)?,
        },
    })
}

/// A bare `[x, y, z]` array is a constant; a table names its `mode`
fn parse_vector_curve(v: &toml::Value) -> Result<VectorCurve> {
    let Some(t) = v.as_table() else {
        return Ok(VectorCurve::Constant(expect_vec3(v)?));
    };
    Ok(match curve_mode(t)? {
        CurveMode::Constant => VectorCurve::Constant(expect_vec3(field(t, "value")?)?),
        CurveMode::Curve => VectorCurve::Curve(parse_axis_keys(field(t, "keys")?)?),
        CurveMode::TwoConstants => VectorCurve::TwoConstants {
            min: expect_vec3(field(t, "min")?)?,
            max: expect_vec3(field(t, "max")?)?,
        },
        CurveMode::TwoCurves => VectorCurve::TwoCurves {
            min: parse_axis_keys(field(t, "min_keys")?)?,
            max: parse_axis_keys(field(t, "max_keys")?)?,
        },
    })
}

/// A bare `[r, g, b, a]` array is a constant; a table names its `mode`
fn parse_color_curve(v: &toml::Value) -> Result<ColorCurve> {
    let Some(t) = v.as_table() else {
        return Ok(ColorCurve::Constant(expect_vec4(v)?));
    };
    Ok(match curve_mode(t)? {
        CurveMode::Constant => ColorCurve::Constant(expect_vec4(field(t, "value")?)?),
        CurveMode::Curve => ColorCurve::Gradient(parse_gradient(t)?),
        CurveMode::TwoConstants => ColorCurve::TwoConstants {
            min: expect_vec4(field(t, "min")?)?,
            max: expect_vec4(field(t, "max")?)?,
        },
        CurveMode::TwoCurves => ColorCurve::TwoGradients {
            min: parse_gradient(expect_table(field(t, "min")?)?)?,
            max: parse_gradient(expect_table(field(t, "max")?)?)?,
        },
    })
}

fn curve_mode(t: &toml::value::Table) -> Result<CurveMode> {
    CurveMode::parse(expect_str(field(t, "mode")?)?)
}

/// `[[key, value], ...]`
fn parse_keys(v: &toml::Value) -> Result<FloatKeyframes> {
    let mut curve = FloatKeyframes::new();
    for pair in expect_array(v)? {
        let pair = expect_array(pair)?;
        if pair.len() < 2 {
            return Err(EmberError::ParseError(
                "curve keys must be [key, value] pairs".to_string(),
            ));
        }
        curve.add(expect_f32(&pair[0])?, expect_f32(&pair[1])?)?;
    }
    Ok(curve)
}

/// Three key lists, one per axis
fn parse_axis_keys(v: &toml::Value) -> Result<[FloatKeyframes; 3]> {
    let axes = expect_array(v)?;
    if axes.len() != 3 {
        return Err(EmberError::ParseError(format!(
            "expected 3 per-axis key lists, got {}",
            axes.len()
        )));
    }
    Ok([parse_keys(&axes[0])?, parse_keys(&axes[1])?, parse_keys(&axes[2])?])
}

/// `rgb_keys = [[t, r, g, b], ..]`, `alpha_keys = [[t, a], ..]`
fn parse_gradient(t: &toml::value::Table) -> Result<Gradient> {
    let mut gradient = Gradient::new();
    if let Some(keys) = t.get("rgb_keys") {
        for key in expect_array(keys)? {
            let k = expect_array(key)?;
            if k.len() < 4 {
                return Err(EmberError::ParseError(
                    "rgb keys must be [t, r, g, b]".to_string(),
                ));
            }
            gradient.add_color_rgb(
                expect_f32(&k[0])?,
                Vec3::new(expect_f32(&k[1])?, expect_f32(&k[2])?, expect_f32(&k[3])?),
            )?;
        }
    }
    if let Some(keys) = t.get("alpha_keys") {
        for key in expect_array(keys)? {
            let k = expect_array(key)?;
            if k.len() < 2 {
                return Err(EmberError::ParseError(
                    "alpha keys must be [t, a]".to_string(),
                ));
            }
            gradient.add_color_alpha(expect_f32(&k[0])?, expect_f32(&k[1])?)?;
        }
    }
    Ok(gradient)
}

/// `{ time, min, max }` or `[time, min, max]`
fn parse_burst(v: &toml::Value) -> Result<Burst> {
    if let Some(t) = v.as_table() {
        let time = field_f32(t, "time")?;
        let min = field(t, "min")?.as_integer().unwrap_or(0).max(0) as u32;
        let max = t
            .get("max")
            .and_then(|m| m.as_integer())
            .map(|m| m.max(0) as u32)
            .unwrap_or(min);
        return Ok(Burst::new(time, min, max));
    }
    let arr = expect_array(v)?;
    if arr.len() < 3 {
        return Err(EmberError::ParseError(
            "bursts must be [time, min, max]".to_string(),
        ));
    }
    Ok(Burst::new(
        expect_f32(&arr[0])?,
        arr[1].as_integer().unwrap_or(0).max(0) as u32,
        arr[2].as_integer().unwrap_or(0).max(0) as u32,
    ))
}

fn parse_shape(t: &toml::value::Table) -> Result<Shape> {
    let kind = match t.get("type") {
        Some(v) => expect_str(v)?,
        None => "cone",
    };
    let radius = t.get("radius").map(|v| toml_f32(v, 1.0)).unwrap_or(1.0);
    let shell = t
        .get("emit_from_shell")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok(match kind {
        "box" => Shape::Box {
            size: t.get("size").map(|v| toml_vec3(v, Vec3::ONE)).unwrap_or(Vec3::ONE),
        },
        "sphere" => Shape::Sphere {
            radius,
            emit_from_shell: shell,
        },
        "hemisphere" => Shape::Hemisphere {
            radius,
            emit_from_shell: shell,
        },
        "cone" => Shape::Cone {
            angle: t
                .get("angle")
                .map(|v| toml_f32(v, 25.0))
                .unwrap_or(25.0)
                .to_radians(),
            radius,
            length: t.get("length").map(|v| toml_f32(v, 5.0)).unwrap_or(5.0),
            emit_type: match t.get("emit_type").map(expect_str).transpose()? {
                None | Some("base") => ConeEmitType::Base,
                Some("base_shell") => ConeEmitType::BaseShell,
                Some("volume") => ConeEmitType::Volume,
                Some("volume_shell") => ConeEmitType::VolumeShell,
                Some(other) => {
                    return Err(EmberError::invalid_enum(
                        other,
                        &["base", "base_shell", "volume", "volume_shell"],
                    ))
                }
            },
        },
        "circle" => Shape::Circle {
            radius,
            arc: t
                .get("arc")
                .map(|v| toml_f32(v, 360.0))
                .unwrap_or(360.0)
                .to_radians(),
            emit_from_edge: t
                .get("emit_from_edge")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            arc_mode: match t.get("arc_mode").map(expect_str).transpose()? {
                None | Some("random") => ArcMode::Random,
                Some("loop") => ArcMode::Loop,
                Some(other) => return Err(EmberError::invalid_enum(other, &["random", "loop"])),
            },
            arc_speed: t.get("arc_speed").map(|v| toml_f32(v, 1.0)).unwrap_or(1.0),
        },
        other => {
            return Err(EmberError::invalid_enum(
                other,
                &["box", "sphere", "hemisphere", "cone", "circle"],
            ))
        }
    })
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_vec3(v: &toml::Value, default: Vec3) -> Vec3 {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 3 {
            return Vec3::new(
                toml_f32(&arr[0], default.x),
                toml_f32(&arr[1], default.y),
                toml_f32(&arr[2], default.z),
            );
        }
    }
    default
}

fn type_name(v: &toml::Value) -> String {
    v.type_str().to_string()
}

fn expect_f32(v: &toml::Value) -> Result<f32> {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .ok_or_else(|| EmberError::InvalidFieldType {
            expected: "number".to_string(),
            got: type_name(v),
        })
}

fn expect_str(v: &toml::Value) -> Result<&str> {
    v.as_str().ok_or_else(|| EmberError::InvalidFieldType {
        expected: "string".to_string(),
        got: type_name(v),
    })
}

fn expect_array(v: &toml::Value) -> Result<&Vec<toml::Value>> {
    v.as_array().ok_or_else(|| EmberError::InvalidFieldType {
        expected: "array".to_string(),
        got: type_name(v),
    })
}

fn expect_table(v: &toml::Value) -> Result<&toml::value::Table> {
    v.as_table().ok_or_else(|| EmberError::InvalidFieldType {
        expected: "table".to_string(),
        got: type_name(v),
    })
}

fn expect_vec3(v: &toml::Value) -> Result<Vec3> {
    let arr = expect_array(v)?;
    if arr.len() < 3 {
        return Err(EmberError::ParseError(format!(
            "expected [x, y, z], got {} elements",
            arr.len()
        )));
    }
    Ok(Vec3::new(
        expect_f32(&arr[0])?,
        expect_f32(&arr[1])?,
        expect_f32(&arr[2])?,
    ))
}

/// `[r, g, b, a]`, or an opaque `"#rrggbb"` string
fn expect_vec4(v: &toml::Value) -> Result<Vec4> {
    if let Some(hex) = v.as_str().and_then(|s| s.strip_prefix('#')) {
        let rgb = u32::from_str_radix(hex, 16)
            .map_err(|_| EmberError::ParseError(format!("invalid hex color '#{hex}'")))?;
        return Ok(Color::from_hex(rgb).to_vec4());
    }
    let arr = expect_array(v)?;
    if arr.len() < 4 {
        return Err(EmberError::ParseError(format!(
            "expected [r, g, b, a], got {} elements",
            arr.len()
        )));
    }
    Ok(Vec4::new(
        expect_f32(&arr[0])?,
        expect_f32(&arr[1])?,
        expect_f32(&arr[2])?,
        expect_f32(&arr[3])?,
    ))
}

/// Whether a value describes a per-axis vector rather than a scalar
fn is_vector_value(v: &toml::Value) -> bool {
    match v {
        toml::Value::Array(_) => true,
        toml::Value::Table(t) => t.get("min").or_else(|| t.get("value")).is_some_and(|m| m.is_array())
            || t.get("keys").or_else(|| t.get("min_keys")).is_some_and(|k| {
                k.as_array()
                    .and_then(|a| a.first())
                    .and_then(|first| first.as_array())
                    .and_then(|first| first.first())
                    .is_some_and(|inner| inner.is_array())
            }),
        _ => false,
    }
}

fn field<'a>(t: &'a toml::value::Table, key: &str) -> Result<&'a toml::Value> {
    t.get(key)
        .ok_or_else(|| EmberError::ParseError(format!("missing required field '{key}'")))
}

fn field_f32(t: &toml::value::Table, key: &str) -> Result<f32> {
    expect_f32(field(t, key)?)
}

fn sub_table<'a>(
    table: &'a toml::value::Table,
    key: &str,
) -> Result<Option<&'a toml::value::Table>> {
    table.get(key).map(expect_table).transpose()
}

fn read_enabled(t: &toml::value::Table, enabled: &mut bool) {
    if let Some(v) = t.get("enabled").and_then(|v| v.as_bool()) {
        *enabled = v;
    }
}
