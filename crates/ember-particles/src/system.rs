//! The particle system: playback state, emission scheduling and the frame loop.
//!
//! A frame is `update` (advance time, retire, free, emit) followed by
//! `upload` (hand the new range to the GPU sink and bump the draw counter).
//! `frame` does both.

use crate::bounds::{estimate_local_bounds, Aabb, CachedMaxima};
use crate::curves::lerp_f32;
use crate::emitter::{EmitterConfig, RenderMode, SimulationSpace, StartDelay};
use crate::modules::ParticleModules;
use crate::particle::{SpawnAttributes, BILLBOARD_VERTEX_COUNT};
use crate::rand::{SeedSlot, SeededRandom};
use crate::ring::{ParticleRing, RingCursors};
use crate::sync::{GpuBufferSink, MeshVertexProvider, WorldPoseProvider};
use ember_core::{EmberError, Result};
use glam::{Quat, Vec3};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

type Pose = (Vec3, Quat);

pub struct ParticleSystem {
    config: EmitterConfig,
    modules: ParticleModules,
    ring: ParticleRing,
    random: SeededRandom,
    mesh: Option<Box<dyn MeshVertexProvider>>,
    cached: CachedMaxima,
    state: PlaybackState,
    emitting: bool,
    current_time: f32,
    /// Position inside the current cycle, in [0, duration]
    emission_time: f32,
    delay_elapsed: f32,
    start_delay: f32,
    /// Next instant owed a rate-over-time particle
    frame_rate_time: f32,
    emission_distance: f32,
    last_world_position: Option<Vec3>,
    burst_index: usize,
    draw_counter: u64,
    total_emitted: u64,
}

impl ParticleSystem {
    /// Build a system, starting playback right away when `play_on_awake` is set
    pub fn new(config: EmitterConfig, modules: ParticleModules) -> Result<Self> {
        config.validate()?;
        modules.validate()?;
        let ring = ParticleRing::new(config.max_particles, BILLBOARD_VERTEX_COUNT);
        let random = SeededRandom::new(config.random_seed, config.auto_random_seed);
        let cached = CachedMaxima::compute(&config, &modules);
        let play_on_awake = config.play_on_awake;

        let mut system = Self {
            config,
            modules,
            ring,
            random,
            mesh: None,
            cached,
            state: PlaybackState::Stopped,
            emitting: false,
            current_time: 0.0,
            emission_time: 0.0,
            delay_elapsed: 0.0,
            start_delay: 0.0,
            frame_rate_time: 0.0,
            emission_distance: 0.0,
            last_world_position: None,
            burst_index: 0,
            draw_counter: 0,
            total_emitted: 0,
        };
        log::debug!(
            "Particle system created: {} max particles, {:?}",
            system.config.max_particles,
            system.config.render_mode
        );
        if play_on_awake && system.config.render_mode == RenderMode::Billboard {
            system.play()?;
        }
        Ok(system)
    }

    // ── Configuration ──

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Changes to capacity or render mode take effect at the next `play()`
    pub fn config_mut(&mut self) -> &mut EmitterConfig {
        &mut self.config
    }

    pub fn modules(&self) -> &ParticleModules {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ParticleModules {
        &mut self.modules
    }

    /// Resize the ring. Every particle is dropped.
    pub fn set_max_particles(&mut self, max_particles: usize) {
        self.config.max_particles = max_particles;
        self.init_buffer();
    }

    pub fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.config.render_mode = render_mode;
        if self.ring.vertices_per_particle() != self.vertices_per_particle() {
            self.init_buffer();
        }
    }

    /// Install the template mesh for mesh render mode
    pub fn set_mesh(&mut self, mesh: Box<dyn MeshVertexProvider>) {
        self.mesh = Some(mesh);
        if self.ring.vertices_per_particle() != self.vertices_per_particle() {
            self.init_buffer();
        }
    }

    fn vertices_per_particle(&self) -> usize {
        match (self.config.render_mode, &self.mesh) {
            (RenderMode::Mesh, Some(mesh)) => mesh.vertex_count().max(1),
            _ => BILLBOARD_VERTEX_COUNT,
        }
    }

    fn init_buffer(&mut self) {
        let vertices_per_particle = self.vertices_per_particle();
        self.ring = ParticleRing::new(self.config.max_particles, vertices_per_particle);
        log::debug!(
            "Particle buffer initialised: {} particles x {} vertices ({} bytes)",
            self.ring.max_particles(),
            vertices_per_particle,
            self.ring.buffer_byte_len()
        );
    }

    /// Refresh the maxima used by bounds and catch-up emission
    pub fn recompute_cached_bounds(&mut self) {
        self.cached = CachedMaxima::compute(&self.config, &self.modules);
    }

    pub fn cached_maxima(&self) -> &CachedMaxima {
        &self.cached
    }

    // ── Playback ──

    /// Start (or restart) emission. Live particles are kept.
    pub fn play(&mut self) -> Result<()> {
        self.config.validate()?;
        self.modules.validate()?;
        if self.config.render_mode == RenderMode::Mesh && self.mesh.is_none() {
            return Err(EmberError::ValidationError(
                "mesh render mode requires a mesh".to_string(),
            ));
        }
        if self.ring.max_particles() != self.config.max_particles
            || self.ring.vertices_per_particle() != self.vertices_per_particle()
        {
            self.init_buffer();
        }
        self.recompute_cached_bounds();
        self.random
            .reseed(self.config.random_seed, self.config.auto_random_seed);

        self.state = PlaybackState::Playing;
        self.emitting = true;
        self.emission_time = 0.0;
        self.emission_distance = 0.0;
        self.last_world_position = None;
        self.burst_index = 0;
        self.delay_elapsed = 0.0;
        self.start_delay = match self.config.start_delay {
            StartDelay::Constant(delay) => delay,
            StartDelay::Random { min, max } => {
                lerp_f32(min, max, self.random.float(SeedSlot::StartDelay))
            }
        };
        self.frame_rate_time = self.current_time + self.start_delay;
        log::debug!("Particle system playing (start delay {:.3}s)", self.start_delay);
        Ok(())
    }

    /// Freeze emission and aging
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            log::debug!("Particle system paused at {:.3}s", self.current_time);
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
            log::debug!("Particle system resumed at {:.3}s", self.current_time);
        }
    }

    /// Stop emitting; live particles keep aging until they expire
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.emitting = false;
        self.burst_index = 0;
        self.emission_time = 0.0;
        log::debug!(
            "Particle system stopped with {} particles alive",
            self.alive_particle_count()
        );
    }

    // ── Frame loop ──

    /// Advance by `elapsed` seconds: retire, free, then emit
    pub fn update<P: WorldPoseProvider + ?Sized>(&mut self, elapsed: f32, pose: &P) {
        if self.state == PlaybackState::Paused || !self.is_alive() {
            return;
        }
        let mut elapsed = elapsed.max(0.0) * self.config.simulation_speed;
        if let Some(max) = self.config.max_elapsed_time {
            elapsed = elapsed.min(max);
        }
        self.step(elapsed, (pose.world_position(), pose.world_rotation()), true);
    }

    /// Copy particles allocated since the last upload into `sink`.
    /// Each call counts as one drawn frame for retirement timing.
    pub fn upload<S: GpuBufferSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let uploaded = self.ring.upload(sink);
        self.draw_counter += 1;
        uploaded
    }

    /// `update` followed by `upload`
    pub fn frame<P, S>(&mut self, elapsed: f32, pose: &P, sink: &mut S) -> usize
    where
        P: WorldPoseProvider + ?Sized,
        S: GpuBufferSink + ?Sized,
    {
        self.update(elapsed, pose);
        self.upload(sink)
    }

    /// Emit one particle stamped with `time`
    pub fn emit<P: WorldPoseProvider + ?Sized>(&mut self, time: f32, pose: &P) -> bool {
        self.emit_at(time, (pose.world_position(), pose.world_rotation()))
    }

    /// Whether `simulate` reproduces what frame-by-frame updates would do
    pub fn is_simulate_supported(&self) -> bool {
        !(self.config.simulation_space == SimulationSpace::World
            && self.modules.emission.rate_over_distance > 0.0)
    }

    /// Fast-forward by `time` seconds in one step, then pause.
    /// With `restart`, all particles are dropped and playback starts over.
    pub fn simulate<P: WorldPoseProvider + ?Sized>(
        &mut self,
        time: f32,
        restart: bool,
        pose: &P,
    ) -> Result<()> {
        if !self.is_simulate_supported() {
            log::warn!(
                "simulate() on a world-space emitter with rate over distance; distance emission is skipped"
            );
        }
        let pose = (pose.world_position(), pose.world_rotation());
        if restart {
            self.ring.clear();
            self.current_time = 0.0;
            self.play()?;
        } else if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
        self.step(time.max(0.0), pose, false);
        if self.state != PlaybackState::Stopped {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn step(&mut self, elapsed: f32, pose: Pose, distance_emission: bool) {
        self.current_time += elapsed;
        self.ring.retire_expired(self.current_time, self.draw_counter);
        self.ring.free_retired(self.draw_counter);

        self.delay_elapsed += elapsed;
        if self.delay_elapsed < self.start_delay {
            return;
        }
        // Only the part of this step past the delay counts toward the cycle
        let elapsed = elapsed.min(self.delay_elapsed - self.start_delay);
        if self.modules.emission.enabled && self.emitting && self.state == PlaybackState::Playing
        {
            self.advance_time(elapsed, pose, distance_emission);
        }
    }

    fn advance_time(&mut self, elapsed: f32, pose: Pose, distance_emission: bool) {
        let emit_time = self.current_time;
        let duration = self.config.duration;
        let mut from = self.emission_time;
        self.emission_time += elapsed;

        let mut count = 0u32;
        if self.emission_time > duration {
            if !self.config.looping {
                count = count.saturating_add(self.burst_count(from, duration, true));
                self.emit_many(count, emit_time, pose);
                let cycle_end = emit_time - (self.emission_time - duration);
                self.emit_over_time(cycle_end, pose);
                if distance_emission {
                    self.emit_over_distance(emit_time, pose);
                }
                log::debug!("Non-looping particle system finished after {duration}s");
                self.stop();
                return;
            }
            // One pass per crossed cycle so a burst at `duration` fires once per loop
            while self.emission_time > duration {
                count = count.saturating_add(self.burst_count(from, self.emission_time, false));
                self.emission_time -= duration;
                self.burst_index = 0;
                from = 0.0;
            }
        }
        count = count.saturating_add(self.burst_count(from, self.emission_time, false));
        self.emit_many(count, emit_time, pose);

        self.emit_over_time(emit_time, pose);
        if distance_emission {
            self.emit_over_distance(emit_time, pose);
        }
    }

    /// Sum of rolled counts for bursts in `[from, to)` (or `[from, to]`)
    fn burst_count(&mut self, from: f32, to: f32, inclusive_end: bool) -> u32 {
        let mut total = 0u32;
        while let Some(burst) = self.modules.emission.bursts().get(self.burst_index).copied() {
            let time = burst.time();
            if time < from {
                self.burst_index += 1;
                continue;
            }
            let in_range = if inclusive_end { time <= to } else { time < to };
            if !in_range {
                break;
            }
            let r = self.random.float(SeedSlot::Burst);
            total = total.saturating_add(burst.roll_count(r));
            self.burst_index += 1;
        }
        total
    }

    fn emit_many(&mut self, count: u32, time: f32, pose: Pose) {
        let room = self
            .ring
            .max_particles()
            .saturating_sub(self.alive_particle_count());
        let count = (count as usize).min(room);
        for _ in 0..count {
            if !self.emit_at(time, pose) {
                log::trace!("Particle ring full, dropping remaining emissions at {time:.3}s");
                break;
            }
        }
    }

    fn emit_over_time(&mut self, emit_time: f32, pose: Pose) {
        let rate = self.modules.emission.rate_over_time;
        if rate <= 0.0 {
            return;
        }
        let interval = 1.0 / rate;
        let max_lifetime = self.cached.max_start_lifetime;
        if max_lifetime > 0.0 {
            // Instants further back than any lifetime could never be alive
            self.frame_rate_time = self.current_time
                - (self.current_time - self.frame_rate_time) % max_lifetime;
        }
        while self.frame_rate_time <= emit_time {
            if !self.emit_at(self.frame_rate_time, pose) {
                log::trace!("Particle ring full, deferring rate emission");
                break;
            }
            let next = self.frame_rate_time + interval;
            if next <= self.frame_rate_time {
                break;
            }
            self.frame_rate_time = next;
        }
    }

    fn emit_over_distance(&mut self, emit_time: f32, pose: Pose) {
        if self.config.simulation_space != SimulationSpace::World {
            return;
        }
        let position = pose.0;
        let Some(last) = self.last_world_position.replace(position) else {
            return;
        };
        let rate = self.modules.emission.rate_over_distance;
        if rate <= 0.0 {
            return;
        }
        self.emission_distance += position.distance(last);
        if self.emission_distance > 1.0 / rate {
            let count = (self.emission_distance * rate).floor();
            self.emission_distance -= count / rate;
            self.emit_many(count as u32, emit_time, pose);
        }
    }

    /// Sample the shape, then allocate. A particle already past its lifetime
    /// reports success without taking a slot.
    fn emit_at(&mut self, time: f32, pose: Pose) -> bool {
        // A full ring draws nothing, so a retried emission sees the same values
        if self.ring.is_full() {
            return false;
        }
        let shape_sample = self.modules.shape.generate(&mut self.random, self.emission_time);
        let attrs = SpawnAttributes::generate(
            &self.config,
            &self.modules,
            &mut self.random,
            shape_sample,
            time,
            self.emission_time,
            pose,
        );
        if attrs.expired_at(self.current_time) {
            return true;
        }
        let render_mode = self.config.render_mode;
        let mesh = self.mesh.as_deref();
        let Some(slot) = self.ring.allocate() else {
            return false;
        };
        attrs.write_vertices(render_mode, mesh, slot);
        self.total_emitted += 1;
        true
    }

    // ── Queries ──

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    /// Playing or paused
    pub fn is_playing(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Playing, or still holding particles
    pub fn is_alive(&self) -> bool {
        self.is_playing() || self.ring.alive_count() > 0 || self.ring.pending_count() > 0
    }

    pub fn alive_particle_count(&self) -> usize {
        self.ring.alive_count()
    }

    pub fn pending_upload_count(&self) -> usize {
        self.ring.pending_count()
    }

    /// Particles written into the ring since construction
    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn emission_time(&self) -> f32 {
        self.emission_time
    }

    /// Travel carried over toward the next distance emission
    pub fn emission_distance(&self) -> f32 {
        self.emission_distance
    }

    pub fn draw_counter(&self) -> u64 {
        self.draw_counter
    }

    pub fn cursors(&self) -> RingCursors {
        self.ring.cursors()
    }

    pub fn ring(&self) -> &ParticleRing {
        &self.ring
    }

    /// Slot ranges to submit for drawing, split where the ring wraps
    pub fn draw_ranges(&self) -> Vec<Range<usize>> {
        self.ring.draw_ranges()
    }

    /// Conservative bounds in the emitter's frame
    pub fn local_bounds(&mut self, emitter_rotation: Quat) -> Aabb {
        self.recompute_cached_bounds();
        estimate_local_bounds(&self.config, &self.modules, &self.cached, emitter_rotation)
    }

    /// Conservative bounds in world space for the emitter at `pose`
    pub fn world_bounds<P: WorldPoseProvider + ?Sized>(&mut self, pose: &P) -> Aabb {
        let rotation = pose.world_rotation();
        self.local_bounds(rotation)
            .transformed(rotation, pose.world_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::FloatKeyframes;
    use crate::modules::Burst;
    use crate::shape::{Shape, ShapeModule};
    use crate::sync::{MeshTemplate, MirrorBuffer};
    use crate::values::{ColorCurve, ScalarCurve};
    use ember_core::Transform;
    use glam::{Vec2, Vec4};

    fn deterministic(config: EmitterConfig) -> EmitterConfig {
        EmitterConfig {
            auto_random_seed: false,
            random_seed: 1234,
            ..config
        }
    }

    fn bursts_only(bursts: &[Burst]) -> ParticleModules {
        let mut modules = ParticleModules::default();
        modules.emission.rate_over_time = 0.0;
        for &b in bursts {
            modules.emission.add_burst(b);
        }
        modules
    }

    fn long_lived(config: EmitterConfig) -> EmitterConfig {
        EmitterConfig {
            start_lifetime: ScalarCurve::Constant(100.0),
            ..deterministic(config)
        }
    }

    #[test]
    fn play_on_awake_starts_playing() {
        let system = ParticleSystem::new(EmitterConfig::default(), ParticleModules::default()).unwrap();
        assert!(system.is_playing());
        assert!(system.is_emitting());

        let config = EmitterConfig {
            play_on_awake: false,
            ..Default::default()
        };
        let system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        assert!(!system.is_playing());
        assert!(!system.is_alive());
    }

    #[test]
    fn rate_emission_fills_over_time() {
        let config = deterministic(EmitterConfig::default());
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();
        for _ in 0..10 {
            system.frame(0.1, &pose, &mut sink);
        }
        // 10 particles per second for one second, first one at t = 0
        let alive = system.alive_particle_count();
        assert!((10..=11).contains(&alive), "alive = {alive}");
        assert_eq!(system.pending_upload_count(), 0);
        assert_eq!(sink.bytes().len() % system.ring().particle_stride(), 0);
    }

    #[test]
    fn deterministic_replay_is_byte_identical() {
        let run = |seed: u32| {
            let config = EmitterConfig {
                start_speed: ScalarCurve::TwoConstants { min: 1.0, max: 3.0 },
                start_lifetime: ScalarCurve::TwoConstants { min: 0.5, max: 1.5 },
                start_color: ColorCurve::TwoConstants {
                    min: Vec4::ZERO,
                    max: Vec4::ONE,
                },
                max_particles: 64,
                random_seed: seed,
                ..deterministic(EmitterConfig::default())
            };
            let mut modules = ParticleModules::default();
            modules.emission.rate_over_time = 40.0;
            modules.emission.add_burst(Burst::new(0.5, 3, 9));
            modules.shape = ShapeModule {
                enabled: true,
                shape: Shape::Sphere {
                    radius: 1.0,
                    emit_from_shell: false,
                },
                random_direction_amount: 0.5,
            };
            let mut system = ParticleSystem::new(config, modules).unwrap();
            let mut sink = MirrorBuffer::new();
            let pose = Transform::default();
            for i in 0..180 {
                let dt = if i % 3 == 0 { 1.0 / 30.0 } else { 1.0 / 60.0 };
                system.frame(dt, &pose, &mut sink);
            }
            (sink.bytes().to_vec(), system.total_emitted())
        };

        let (a, emitted_a) = run(1234);
        let (b, emitted_b) = run(1234);
        assert!(emitted_a > 0);
        assert_eq!(emitted_a, emitted_b);
        assert_eq!(a, b);

        let (c, _) = run(4321);
        assert_ne!(a, c);
    }

    #[test]
    fn burst_fires_once_at_its_tick() {
        let config = long_lived(EmitterConfig {
            duration: 5.0,
            looping: false,
            ..Default::default()
        });
        let modules = bursts_only(&[Burst::new(2.0, 7, 7)]);
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        let mut emitted = Vec::new();
        for _ in 0..5 {
            system.frame(1.0, &pose, &mut sink);
            emitted.push(system.total_emitted());
        }
        assert_eq!(emitted, vec![0, 0, 7, 7, 7]);
        assert!(system.is_playing());
    }

    #[test]
    fn non_looping_system_stops_after_duration() {
        let config = long_lived(EmitterConfig {
            duration: 2.0,
            looping: false,
            ..Default::default()
        });
        let modules = bursts_only(&[Burst::new(2.0, 4, 4)]);
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        system.frame(1.0, &pose, &mut sink);
        system.frame(1.0, &pose, &mut sink);
        assert!(system.is_playing());
        assert_eq!(system.total_emitted(), 0);

        // Final batch includes a burst sitting exactly at the duration
        system.frame(1.0, &pose, &mut sink);
        assert_eq!(system.total_emitted(), 4);
        assert!(!system.is_playing());
        assert!(!system.is_emitting());
        assert!(system.is_alive());

        for _ in 0..3 {
            system.frame(1.0, &pose, &mut sink);
        }
        assert_eq!(system.total_emitted(), 4);
    }

    #[test]
    fn burst_at_duration_fires_once_per_loop() {
        let config = long_lived(EmitterConfig {
            duration: 1.0,
            looping: true,
            ..Default::default()
        });
        let modules = bursts_only(&[Burst::new(1.0, 3, 3)]);
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        let mut firing_ticks = Vec::new();
        let mut last = 0;
        for tick in 1..=16 {
            system.frame(0.25, &pose, &mut sink);
            let now = system.total_emitted();
            if now != last {
                assert_eq!(now - last, 3);
                firing_ticks.push(tick);
            }
            last = now;
        }
        assert_eq!(firing_ticks, vec![5, 9, 13]);
    }

    #[test]
    fn large_step_crosses_several_loops() {
        let config = long_lived(EmitterConfig {
            duration: 1.0,
            looping: true,
            ..Default::default()
        });
        let modules = bursts_only(&[Burst::new(0.5, 2, 2)]);
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        system.frame(3.25, &pose, &mut MirrorBuffer::new());
        assert_eq!(system.total_emitted(), 6);
        assert!((system.emission_time() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn capacity_clamp_holds() {
        let config = EmitterConfig {
            duration: 1.0,
            looping: true,
            max_particles: 10,
            start_lifetime: ScalarCurve::Constant(2.5),
            ..deterministic(EmitterConfig::default())
        };
        let mut modules = bursts_only(&[Burst::new(0.0, 50, 50)]);
        modules.emission.rate_over_time = 50.0;
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        system.frame(1.0, &pose, &mut sink);
        assert_eq!(system.alive_particle_count(), 10);
        for _ in 0..20 {
            system.frame(1.0, &pose, &mut sink);
            assert!(system.alive_particle_count() <= 10);
            assert!(system.ring().occupied_count() <= 10);
        }
    }

    #[test]
    fn distance_emission_keeps_remainder() {
        let config = long_lived(EmitterConfig {
            simulation_space: SimulationSpace::World,
            ..Default::default()
        });
        let mut modules = bursts_only(&[]);
        modules.emission.rate_over_distance = 2.0;
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let mut sink = MirrorBuffer::new();

        system.frame(0.1, &Transform::default(), &mut sink);
        assert_eq!(system.total_emitted(), 0);

        let moved = Transform::from_position(Vec3::new(1.3, 0.0, 0.0));
        system.frame(0.1, &moved, &mut sink);
        assert_eq!(system.total_emitted(), 2);
        assert_eq!(system.alive_particle_count(), 2);
        assert!((system.emission_distance() - 0.3).abs() < 1e-5);

        // Particles carry the pose they were spawned with
        let vertex = sink.vertex(0).unwrap();
        assert_eq!(vertex.world_position, [1.3, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn distance_emission_is_world_space_only() {
        let config = long_lived(EmitterConfig::default());
        let mut modules = bursts_only(&[]);
        modules.emission.rate_over_distance = 2.0;
        let mut system = ParticleSystem::new(config, modules).unwrap();
        assert!(system.is_simulate_supported());
        let mut sink = MirrorBuffer::new();
        system.frame(0.1, &Transform::default(), &mut sink);
        system.frame(0.1, &Transform::from_position(Vec3::X * 5.0), &mut sink);
        assert_eq!(system.total_emitted(), 0);
    }

    #[test]
    fn curve_start_speed_is_rejected_at_play() {
        let config = EmitterConfig {
            start_speed: ScalarCurve::Curve(FloatKeyframes::linear(1.0, 2.0)),
            ..Default::default()
        };
        assert!(matches!(
            ParticleSystem::new(config, ParticleModules::default()),
            Err(EmberError::UnsupportedCurveMode { attribute: "start_speed", .. })
        ));

        let config = EmitterConfig {
            play_on_awake: false,
            ..Default::default()
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        system.config_mut().start_color = ColorCurve::Gradient(Default::default());
        assert!(matches!(
            system.play(),
            Err(EmberError::UnsupportedCurveMode { attribute: "start_color", .. })
        ));
        assert!(!system.is_playing());
    }

    #[test]
    fn pause_freezes_everything() {
        let config = deterministic(EmitterConfig::default());
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();
        for _ in 0..5 {
            system.frame(0.1, &pose, &mut sink);
        }
        let time = system.current_time();
        let emitted = system.total_emitted();
        let alive = system.alive_particle_count();

        system.pause();
        assert!(system.is_paused());
        for _ in 0..10 {
            system.frame(1.0, &pose, &mut sink);
        }
        assert_eq!(system.current_time(), time);
        assert_eq!(system.total_emitted(), emitted);
        assert_eq!(system.alive_particle_count(), alive);

        system.resume();
        system.frame(0.5, &pose, &mut sink);
        assert!(system.total_emitted() > emitted);
    }

    #[test]
    fn stopped_particles_age_out() {
        let config = EmitterConfig {
            start_lifetime: ScalarCurve::Constant(0.5),
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();
        for _ in 0..5 {
            system.frame(0.1, &pose, &mut sink);
        }
        assert!(system.alive_particle_count() > 0);
        system.stop();
        let emitted = system.total_emitted();
        for _ in 0..20 {
            system.frame(0.1, &pose, &mut sink);
        }
        assert_eq!(system.total_emitted(), emitted);
        assert_eq!(system.alive_particle_count(), 0);
        assert!(!system.is_alive());
    }

    #[test]
    fn start_delay_holds_emission() {
        let config = EmitterConfig {
            start_delay: StartDelay::Constant(1.0),
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();
        system.frame(0.5, &pose, &mut sink);
        system.frame(0.25, &pose, &mut sink);
        assert_eq!(system.total_emitted(), 0);
        system.frame(0.5, &pose, &mut sink);
        assert!(system.total_emitted() > 0);
        // No particle predates the delay
        let first = sink.vertex(0).unwrap();
        assert!(first.spawn_time() >= 1.0 - 1e-5);
    }

    #[test]
    fn expired_emission_reports_success_without_a_slot() {
        let config = EmitterConfig {
            start_lifetime: ScalarCurve::Constant(1.0),
            play_on_awake: false,
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        assert!(system.emit(-5.0, &pose));
        assert_eq!(system.pending_upload_count(), 0);
        assert_eq!(system.total_emitted(), 0);

        assert!(system.emit(0.0, &pose));
        assert_eq!(system.pending_upload_count(), 1);
    }

    #[test]
    fn explicit_emit_fails_when_full() {
        let config = EmitterConfig {
            max_particles: 2,
            play_on_awake: false,
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        assert!(system.emit(0.0, &pose));
        assert!(system.emit(0.0, &pose));
        assert!(!system.emit(0.0, &pose));
    }

    #[test]
    fn resize_rebuilds_ring() {
        let mut system = ParticleSystem::new(
            deterministic(EmitterConfig::default()),
            ParticleModules::default(),
        )
        .unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();
        system.frame(0.5, &pose, &mut sink);
        assert!(system.alive_particle_count() > 0);

        system.set_max_particles(3);
        assert_eq!(system.ring().max_particles(), 3);
        assert_eq!(system.alive_particle_count(), 0);
        assert_eq!(system.cursors(), RingCursors::default());
        for _ in 0..10 {
            system.frame(0.5, &pose, &mut sink);
            assert!(system.alive_particle_count() <= 3);
        }
    }

    #[test]
    fn mesh_mode_needs_a_mesh() {
        let config = EmitterConfig {
            render_mode: RenderMode::Mesh,
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        assert!(!system.is_playing());
        assert!(system.play().is_err());

        system.set_mesh(Box::new(MeshTemplate {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            colors: Vec::new(),
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
        }));
        assert_eq!(system.ring().vertices_per_particle(), 3);
        system.play().unwrap();

        let mut sink = MirrorBuffer::new();
        system.frame(0.05, &Transform::default(), &mut sink);
        assert_eq!(system.alive_particle_count(), 1);
        assert_eq!(sink.bytes().len(), 3 * 192);
        assert_eq!(sink.vertex(1).map(|v| v.corner), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn simulate_restart_fast_forwards_and_pauses() {
        let config = deterministic(EmitterConfig::default());
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        system.simulate(1.0, true, &pose).unwrap();
        assert!(system.is_paused());
        assert!((system.current_time() - 1.0).abs() < 1e-6);
        assert!(system.pending_upload_count() >= 10);

        let pending = system.pending_upload_count();
        system.update(1.0, &pose);
        assert_eq!(system.pending_upload_count(), pending);
    }

    #[test]
    fn simulate_skips_unsupported_distance_emission() {
        let config = long_lived(EmitterConfig {
            simulation_space: SimulationSpace::World,
            ..Default::default()
        });
        let mut modules = bursts_only(&[]);
        modules.emission.rate_over_distance = 10.0;
        let mut system = ParticleSystem::new(config, modules).unwrap();
        assert!(!system.is_simulate_supported());

        system
            .simulate(1.0, true, &Transform::from_position(Vec3::X * 100.0))
            .unwrap();
        system
            .simulate(1.0, false, &Transform::from_position(Vec3::X * 200.0))
            .unwrap();
        assert_eq!(system.total_emitted(), 0);
        assert!(system.is_paused());
    }

    #[test]
    fn draw_ranges_cover_live_particles() {
        let config = long_lived(EmitterConfig::default());
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let mut sink = MirrorBuffer::new();
        system.frame(0.25, &Transform::default(), &mut sink);
        let covered: usize = system.draw_ranges().iter().map(|r| r.len()).sum();
        assert_eq!(covered, system.alive_particle_count());
    }

    #[test]
    fn bounds_follow_the_pose() {
        let config = deterministic(EmitterConfig::default());
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let local = system.local_bounds(Quat::IDENTITY);
        let pose = Transform::from_position(Vec3::new(0.0, 10.0, 0.0));
        let world = system.world_bounds(&pose);
        assert!((world.min - (local.min + Vec3::Y * 10.0)).length() < 1e-4);
        assert!((world.max - (local.max + Vec3::Y * 10.0)).length() < 1e-4);
        assert!(system.cached_maxima().max_start_lifetime > 0.0);
    }

    #[test]
    fn burst_phase_starts_when_delay_ends() {
        let config = long_lived(EmitterConfig {
            duration: 10.0,
            looping: false,
            start_delay: StartDelay::Constant(1.0),
            ..Default::default()
        });
        let modules = bursts_only(&[Burst::new(0.4, 5, 5)]);
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        system.frame(0.75, &pose, &mut sink);
        system.frame(0.5, &pose, &mut sink);
        // Only a quarter second has passed since the delay ended
        assert_eq!(system.emission_time(), 0.25);
        assert_eq!(system.total_emitted(), 0);

        system.frame(0.25, &pose, &mut sink);
        assert_eq!(system.emission_time(), 0.5);
        assert_eq!(system.total_emitted(), 5);
    }

    #[test]
    fn final_non_looping_tick_emits_owed_rate_particles() {
        let config = long_lived(EmitterConfig {
            duration: 1.0,
            looping: false,
            ..Default::default()
        });
        let mut modules = ParticleModules::default();
        modules.emission.rate_over_time = 4.0;
        let mut system = ParticleSystem::new(config, modules).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        system.frame(0.75, &pose, &mut sink);
        // 0.0, 0.25, 0.5, 0.75
        assert_eq!(system.total_emitted(), 4);

        system.frame(0.5, &pose, &mut sink);
        // 1.0 is still inside the cycle, 1.25 is not
        assert_eq!(system.total_emitted(), 5);
        assert!(!system.is_playing());
        let last = sink.vertex(4 * BILLBOARD_VERTEX_COUNT).unwrap();
        assert_eq!(last.spawn_time(), 1.0);
    }

    #[test]
    fn retired_slots_wait_three_drawn_frames() {
        let config = EmitterConfig {
            max_particles: 2,
            play_on_awake: false,
            start_lifetime: ScalarCurve::Constant(0.15),
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        let mut sink = MirrorBuffer::new();

        assert!(system.emit(0.0, &pose));
        assert!(system.emit(0.0, &pose));
        system.frame(0.0, &pose, &mut sink);
        assert_eq!(system.draw_counter(), 1);

        // Both expire and are stamped with draw 1
        system.frame(1.0, &pose, &mut sink);
        let stamped = system.cursors();
        assert_eq!(stamped.first_active, stamped.first_new);
        assert_ne!(stamped.first_retired, stamped.first_active);

        let mut first_reuse = None;
        for _ in 0..5 {
            let now = system.current_time();
            if system.emit(now, &pose) {
                first_reuse = Some(system.draw_counter());
                break;
            }
            system.frame(0.1, &pose, &mut sink);
        }
        // Freed by the update that sees draw 4, three draws after the stamp
        assert_eq!(first_reuse, Some(5));
    }

    #[test]
    fn full_ring_rejection_draws_no_randomness() {
        let config = EmitterConfig {
            max_particles: 1,
            play_on_awake: false,
            ..deterministic(EmitterConfig::default())
        };
        let mut system = ParticleSystem::new(config, ParticleModules::default()).unwrap();
        let pose = Transform::default();
        assert!(system.emit(0.0, &pose));
        let seeds = *system.random.seeds();
        assert!(!system.emit(0.0, &pose));
        assert!(!system.emit(0.0, &pose));
        assert_eq!(*system.random.seeds(), seeds);
    }
}
