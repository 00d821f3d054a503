//! Emission module: continuous rate over time and distance, plus scheduled bursts

/// A one-time emission of a random count of particles at `time` seconds
/// into the emitter's cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    time: f32,
    min_count: u32,
    max_count: u32,
}

impl Burst {
    pub fn new(time: f32, min_count: u32, max_count: u32) -> Self {
        Self {
            time,
            min_count: min_count.min(max_count),
            max_count: min_count.max(max_count),
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn min_count(&self) -> u32 {
        self.min_count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Integer count in `[min_count, max_count]` picked by `random` in [0, 1)
    pub fn roll_count(&self, random: f32) -> u32 {
        let span = (self.max_count - self.min_count) as f32 + 1.0;
        self.min_count
            .saturating_add((random * span) as u32)
            .min(self.max_count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub enabled: bool,
    /// Particles per second
    pub rate_over_time: f32,
    /// Particles per unit of emitter travel (world simulation space only)
    pub rate_over_distance: f32,
    bursts: Vec<Burst>,
}

impl Default for Emission {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_over_time: 10.0,
            rate_over_distance: 0.0,
            bursts: Vec::new(),
        }
    }
}

impl Emission {
    /// Insert a burst, keeping the list ordered by time
    pub fn add_burst(&mut self, burst: Burst) {
        let at = self.bursts.partition_point(|b| b.time <= burst.time);
        self.bursts.insert(at, burst);
    }

    pub fn clear_bursts(&mut self) {
        self.bursts.clear();
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    /// Largest count a single cycle of bursts can produce
    pub fn max_burst_total(&self) -> u32 {
        self.bursts
            .iter()
            .fold(0u32, |total, b| total.saturating_add(b.max_count))
    }
}
