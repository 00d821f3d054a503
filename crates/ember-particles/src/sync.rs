//! Narrow interfaces to the engine around the simulation core
//!
//! The particle system never reaches into a scene graph or a graphics API.
//! It reads the emitter pose through [`WorldPoseProvider`], hands packed
//! vertex ranges to a [`GpuBufferSink`], and reads template vertices from a
//! [`MeshVertexProvider`] when rendering meshes.

use crate::particle::{ParticleVertex, VERTEX_STRIDE};
use ember_core::Transform;
use glam::{Quat, Vec2, Vec3, Vec4};

/// World pose of the emitter, queried once per frame and once per particle
pub trait WorldPoseProvider {
    fn world_position(&self) -> Vec3;
    fn world_rotation(&self) -> Quat;
}

impl WorldPoseProvider for Transform {
    fn world_position(&self) -> Vec3 {
        self.position
    }

    fn world_rotation(&self) -> Quat {
        self.rotation
    }
}

/// Destination of the per-frame vertex upload.
/// `data` may be one of two halves of a wrapped range.
pub trait GpuBufferSink {
    fn upload_range(&mut self, byte_offset: usize, data: &[u8]);
}

/// Template mesh copied into every particle in mesh render mode
pub trait MeshVertexProvider {
    fn vertex_count(&self) -> usize;
    fn position(&self, index: usize) -> Vec3;
    fn color(&self, index: usize) -> Vec4;
    fn uv(&self, index: usize) -> Vec2;
}

/// In-memory template mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshTemplate {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
}

impl MeshVertexProvider for MeshTemplate {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, index: usize) -> Vec3 {
        self.positions.get(index).copied().unwrap_or(Vec3::ZERO)
    }

    fn color(&self, index: usize) -> Vec4 {
        self.colors.get(index).copied().unwrap_or(Vec4::ONE)
    }

    fn uv(&self, index: usize) -> Vec2 {
        self.uvs.get(index).copied().unwrap_or(Vec2::ZERO)
    }
}

/// CPU copy of everything uploaded, for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct MirrorBuffer {
    bytes: Vec<u8>,
    upload_calls: usize,
    bytes_uploaded: usize,
}

impl MirrorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of `upload_range` calls received
    pub fn upload_calls(&self) -> usize {
        self.upload_calls
    }

    pub fn bytes_uploaded(&self) -> usize {
        self.bytes_uploaded
    }

    /// Vertex at `index`, if that much has been uploaded
    pub fn vertex(&self, index: usize) -> Option<ParticleVertex> {
        let start = index * VERTEX_STRIDE;
        let bytes = self.bytes.get(start..start + VERTEX_STRIDE)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

impl GpuBufferSink for MirrorBuffer {
    fn upload_range(&mut self, byte_offset: usize, data: &[u8]) {
        let end = byte_offset + data.len();
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        self.bytes[byte_offset..end].copy_from_slice(data);
        self.upload_calls += 1;
        self.bytes_uploaded += data.len();
    }
}
