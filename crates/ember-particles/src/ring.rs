//! Fixed-capacity ring of particle slots.
//!
//! Slots move Free -> New -> Active -> Retired -> Free, and the state of a
//! slot is implied by which cursor range it sits in:
//!
//! ```text
//!   [first_retired, first_active)  retired, the GPU may still read them
//!   [first_active,  first_new)     alive and uploaded
//!   [first_new,     first_free)    alive, waiting for upload
//! ```
//!
//! Capacity is `max_particles + 1`; the spare slot tells a full ring apart
//! from an empty one.

use crate::particle::{ParticleVertex, VERTEX_STRIDE};
use crate::sync::GpuBufferSink;
use std::ops::Range;

/// Slack added to a particle's age when testing for expiry
pub const RETIRE_EPSILON: f32 = 0.0001;

/// Frames a retired slot waits before it may be overwritten.
/// The GPU is assumed to lag the CPU by at most two frames.
pub const FREE_DELAY_FRAMES: u64 = 3;

/// Snapshot of the four cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingCursors {
    pub first_retired: usize,
    pub first_active: usize,
    pub first_new: usize,
    pub first_free: usize,
}

pub struct ParticleRing {
    capacity: usize,
    vertices_per_particle: usize,
    vertices: Vec<ParticleVertex>,
    /// Draw counter at which each slot was retired
    retired_at: Vec<u64>,
    cursors: RingCursors,
}

impl ParticleRing {
    pub fn new(max_particles: usize, vertices_per_particle: usize) -> Self {
        let capacity = max_particles + 1;
        let vertices_per_particle = vertices_per_particle.max(1);
        Self {
            capacity,
            vertices_per_particle,
            vertices: vec![ParticleVertex::default(); capacity * vertices_per_particle],
            retired_at: vec![0; capacity],
            cursors: RingCursors::default(),
        }
    }

    pub fn max_particles(&self) -> usize {
        self.capacity - 1
    }

    /// Slot count including the sentinel
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn vertices_per_particle(&self) -> usize {
        self.vertices_per_particle
    }

    /// Bytes per particle in the uploaded buffer
    pub fn particle_stride(&self) -> usize {
        self.vertices_per_particle * VERTEX_STRIDE
    }

    /// Size of the GPU buffer this ring uploads into
    pub fn buffer_byte_len(&self) -> usize {
        self.capacity * self.particle_stride()
    }

    pub fn cursors(&self) -> RingCursors {
        self.cursors
    }

    /// Staging copy of every slot
    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    pub fn slot_vertices(&self, slot: usize) -> &[ParticleVertex] {
        let start = slot * self.vertices_per_particle;
        &self.vertices[start..start + self.vertices_per_particle]
    }

    fn next(&self, cursor: usize) -> usize {
        (cursor + 1) % self.capacity
    }

    fn distance(&self, from: usize, to: usize) -> usize {
        if to >= from {
            to - from
        } else {
            self.capacity - from + to
        }
    }

    /// Particles in `[first_retired, first_new)`: uploaded and not yet freed
    pub fn alive_count(&self) -> usize {
        self.distance(self.cursors.first_retired, self.cursors.first_new)
    }

    /// Particles allocated since the last upload
    pub fn pending_count(&self) -> usize {
        self.distance(self.cursors.first_new, self.cursors.first_free)
    }

    /// Slots holding live or not-yet-reusable data
    pub fn occupied_count(&self) -> usize {
        self.distance(self.cursors.first_retired, self.cursors.first_free)
    }

    pub fn is_full(&self) -> bool {
        self.next(self.cursors.first_free) == self.cursors.first_retired
    }

    /// Move expired particles from Active to Retired, stamping each with
    /// `draw_counter`. Stops at the first particle still alive.
    pub fn retire_expired(&mut self, current_time: f32, draw_counter: u64) -> usize {
        let mut retired = 0;
        while self.cursors.first_active != self.cursors.first_new {
            let slot = self.cursors.first_active;
            let head = self.vertices[slot * self.vertices_per_particle];
            let age = current_time - head.spawn_time();
            if age + RETIRE_EPSILON < head.lifetime() {
                break;
            }
            self.retired_at[slot] = draw_counter;
            self.cursors.first_active = self.next(slot);
            retired += 1;
        }
        retired
    }

    /// Release retired slots once the GPU can no longer be reading them
    pub fn free_retired(&mut self, draw_counter: u64) -> usize {
        let mut freed = 0;
        while self.cursors.first_retired != self.cursors.first_active {
            let slot = self.cursors.first_retired;
            if draw_counter.saturating_sub(self.retired_at[slot]) < FREE_DELAY_FRAMES {
                break;
            }
            self.cursors.first_retired = self.next(slot);
            freed += 1;
        }
        freed
    }

    /// Claim the next free slot and return its vertices for writing.
    /// `None` when the ring is full.
    pub fn allocate(&mut self) -> Option<&mut [ParticleVertex]> {
        if self.is_full() {
            return None;
        }
        let slot = self.cursors.first_free;
        self.cursors.first_free = self.next(slot);
        let start = slot * self.vertices_per_particle;
        Some(&mut self.vertices[start..start + self.vertices_per_particle])
    }

    /// Copy `[first_new, first_free)` into `sink` (two copies when the range
    /// wraps) and mark it uploaded. Returns the number of particles copied.
    pub fn upload<S: GpuBufferSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let RingCursors {
            first_new,
            first_free,
            ..
        } = self.cursors;
        if first_new == first_free {
            return 0;
        }
        let uploaded = self.pending_count();
        if first_new < first_free {
            self.upload_slots(sink, first_new..first_free);
        } else {
            self.upload_slots(sink, first_new..self.capacity);
            if first_free > 0 {
                self.upload_slots(sink, 0..first_free);
            }
        }
        self.cursors.first_new = first_free;
        uploaded
    }

    fn upload_slots<S: GpuBufferSink + ?Sized>(&self, sink: &mut S, slots: Range<usize>) {
        let vpp = self.vertices_per_particle;
        let data = &self.vertices[slots.start * vpp..slots.end * vpp];
        sink.upload_range(slots.start * self.particle_stride(), bytemuck::cast_slice(data));
    }

    /// Slot ranges to draw: `[first_active, first_free)`, split at the wrap
    pub fn draw_ranges(&self) -> Vec<Range<usize>> {
        let RingCursors {
            first_active,
            first_free,
            ..
        } = self.cursors;
        if first_active == first_free {
            Vec::new()
        } else if first_active < first_free {
            vec![first_active..first_free]
        } else if first_free == 0 {
            vec![first_active..self.capacity]
        } else {
            vec![first_active..self.capacity, 0..first_free]
        }
    }

    /// Drop every particle and rewind all cursors
    pub fn clear(&mut self) {
        self.cursors = RingCursors::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::MirrorBuffer;

    fn push(ring: &mut ParticleRing, time: f32, lifetime: f32) -> bool {
        match ring.allocate() {
            Some(slot) => {
                for v in slot.iter_mut() {
                    v.direction_time[3] = time;
                    v.position_life[3] = lifetime;
                }
                true
            }
            None => false,
        }
    }

    /// Run one frame the way the particle system does: retire, free, then upload
    fn tick(ring: &mut ParticleRing, now: f32, frame: &mut u64, sink: &mut MirrorBuffer) {
        ring.retire_expired(now, *frame);
        ring.free_retired(*frame);
        ring.upload(sink);
        *frame += 1;
    }

    #[test]
    fn empty_ring() {
        let ring = ParticleRing::new(8, 4);
        assert_eq!(ring.capacity(), 9);
        assert_eq!(ring.max_particles(), 8);
        assert_eq!(ring.alive_count(), 0);
        assert_eq!(ring.particle_stride(), 4 * 192);
        assert!(!ring.is_full());
        assert!(ring.draw_ranges().is_empty());
    }

    #[test]
    fn allocate_until_full() {
        let mut ring = ParticleRing::new(3, 4);
        assert!(push(&mut ring, 0.0, 1.0));
        assert!(push(&mut ring, 0.0, 1.0));
        assert!(push(&mut ring, 0.0, 1.0));
        assert!(ring.is_full());
        assert!(!push(&mut ring, 0.0, 1.0));
        assert_eq!(ring.pending_count(), 3);
        // Pending particles are not counted alive until uploaded
        assert_eq!(ring.alive_count(), 0);
        let mut sink = MirrorBuffer::new();
        assert_eq!(ring.upload(&mut sink), 3);
        assert_eq!(ring.alive_count(), 3);
        assert_eq!(sink.bytes().len(), 3 * ring.particle_stride());
    }

    #[test]
    fn expiry_respects_epsilon() {
        let mut ring = ParticleRing::new(4, 1);
        push(&mut ring, 0.0, 1.0);
        ring.upload(&mut MirrorBuffer::new());
        assert_eq!(ring.retire_expired(0.99, 0), 0);
        // Within epsilon of the lifetime counts as expired
        assert_eq!(ring.retire_expired(0.99995, 0), 1);
    }

    #[test]
    fn retirement_stops_at_first_live_particle() {
        let mut ring = ParticleRing::new(4, 1);
        push(&mut ring, 0.0, 1.0);
        push(&mut ring, 0.0, 5.0);
        push(&mut ring, 0.0, 1.0);
        ring.upload(&mut MirrorBuffer::new());
        assert_eq!(ring.retire_expired(2.0, 0), 1);
        assert_eq!(ring.cursors().first_active, 1);
    }

    #[test]
    fn pending_particles_never_retire() {
        let mut ring = ParticleRing::new(4, 1);
        push(&mut ring, 0.0, 0.1);
        assert_eq!(ring.retire_expired(10.0, 0), 0);
    }

    #[test]
    fn no_reuse_before_three_frames() {
        let mut ring = ParticleRing::new(2, 1);
        let mut sink = MirrorBuffer::new();
        let mut frame = 0u64;

        push(&mut ring, 0.0, 0.5);
        push(&mut ring, 0.0, 0.5);
        tick(&mut ring, 0.0, &mut frame, &mut sink);
        assert!(ring.is_full());

        // Both retire at draw counter 1
        tick(&mut ring, 1.0, &mut frame, &mut sink);
        assert_eq!(ring.cursors().first_active, 2);
        assert_eq!(ring.alive_count(), 2);
        assert!(!push(&mut ring, 1.0, 0.5));

        tick(&mut ring, 1.1, &mut frame, &mut sink);
        assert!(!push(&mut ring, 1.1, 0.5));
        tick(&mut ring, 1.2, &mut frame, &mut sink);
        assert!(!push(&mut ring, 1.2, 0.5));

        // Draw counter 4 is three frames after retirement
        ring.retire_expired(1.3, frame);
        assert_eq!(ring.free_retired(frame), 2);
        assert!(push(&mut ring, 1.3, 0.5));
    }

    #[test]
    fn alive_count_matches_live_slots_under_churn() {
        let mut ring = ParticleRing::new(16, 1);
        let mut sink = MirrorBuffer::new();
        let mut frame = 0u64;
        let mut issued: Vec<(f32, f32)> = Vec::new();

        for step in 0..400 {
            let now = step as f32 * 0.1;
            ring.retire_expired(now, frame);
            ring.free_retired(frame);
            for k in 0..(step % 5) {
                let lifetime = 0.35 + 0.1 * (k % 2) as f32;
                if push(&mut ring, now, lifetime) {
                    issued.push((now, lifetime));
                }
            }
            ring.upload(&mut sink);
            frame += 1;

            assert!(ring.alive_count() <= ring.max_particles());
            assert!(ring.occupied_count() <= ring.max_particles());

            // Every slot in [first_active, first_new) holds an unexpired particle
            let c = ring.cursors();
            let mut slot = c.first_active;
            while slot != c.first_new {
                let head = ring.slot_vertices(slot)[0];
                assert!(now - head.spawn_time() < head.lifetime() + 0.2);
                slot = (slot + 1) % ring.capacity();
            }
        }
        assert!(!issued.is_empty());
    }

    #[test]
    fn wrapped_upload_is_split_in_two() {
        let mut ring = ParticleRing::new(3, 1);
        let mut sink = MirrorBuffer::new();
        let mut frame = 0u64;

        for _ in 0..3 {
            push(&mut ring, 0.0, 0.1);
        }
        tick(&mut ring, 0.0, &mut frame, &mut sink);
        for _ in 0..4 {
            tick(&mut ring, 1.0, &mut frame, &mut sink);
        }
        assert_eq!(ring.alive_count(), 0);
        assert_eq!(ring.cursors().first_free, 3);

        let calls_before = sink.upload_calls();
        push(&mut ring, 1.0, 9.0);
        push(&mut ring, 1.0, 9.0);
        assert_eq!(ring.cursors().first_free, 1);
        assert_eq!(ring.draw_ranges(), vec![3..4, 0..1]);
        assert_eq!(ring.upload(&mut sink), 2);
        assert_eq!(sink.upload_calls() - calls_before, 2);
        assert_eq!(sink.vertex(3).map(|v| v.lifetime()), Some(9.0));
        assert_eq!(sink.vertex(0).map(|v| v.lifetime()), Some(9.0));
    }

    #[test]
    fn clear_rewinds() {
        let mut ring = ParticleRing::new(3, 1);
        push(&mut ring, 0.0, 1.0);
        ring.upload(&mut MirrorBuffer::new());
        ring.clear();
        assert_eq!(ring.cursors(), RingCursors::default());
        assert_eq!(ring.alive_count(), 0);
    }
}
