//! Ember Particles - ring-buffered particle simulation core
//!
//! Provides a bounded particle pool that lives entirely in a GPU-ready
//! vertex layout:
//! - Ring buffer with retire/free cursors and a three-frame reuse delay
//! - Deterministic emission from per-feature seed slots
//! - Rate-over-time, rate-over-distance and scheduled burst emission
//! - Shapes, curves, gradients and over-lifetime modules
//! - Conservative bounds from the module configuration
//!
//! The engine plugs in through [`WorldPoseProvider`], [`GpuBufferSink`] and
//! [`MeshVertexProvider`].

pub mod bounds;
pub mod curves;
pub mod emitter;
pub mod modules;
pub mod particle;
pub mod rand;
pub mod ring;
pub mod shape;
pub mod sync;
pub mod system;
pub mod values;

pub use bounds::{Aabb, CachedMaxima};
pub use curves::{FloatKeyframes, Gradient};
pub use emitter::{EmitterConfig, RenderMode, SimulationSpace, StartDelay, StartRotation, StartSize};
pub use modules::ParticleModules;
pub use particle::{ParticleVertex, VERTEX_STRIDE};
pub use ring::{ParticleRing, RingCursors};
pub use shape::{Shape, ShapeModule};
pub use sync::{GpuBufferSink, MeshTemplate, MeshVertexProvider, MirrorBuffer, WorldPoseProvider};
pub use system::{ParticleSystem, PlaybackState};
pub use values::{ColorCurve, CurveMode, ScalarCurve, VectorCurve};
