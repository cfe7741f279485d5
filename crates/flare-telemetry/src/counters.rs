// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lock-free simulation counters shared between the world module and the
//! effects it updates in parallel.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals and per-frame gauges of a particle world.
///
/// Totals (`frames`, `particles_spawned`, ...) only grow. Gauges
/// (`effects_alive`, `particles_alive`) are overwritten once per frame.
#[derive(Debug, Default)]
pub struct SimulationCounters {
    frames: AtomicU64,
    particles_spawned: AtomicU64,
    particles_dropped: AtomicU64,
    events_processed: AtomicU64,
    effects_finished: AtomicU64,
    effects_alive: AtomicU64,
    systems_alive: AtomicU64,
    particles_alive: AtomicU64,
    last_frame_us: AtomicU64,
}

impl SimulationCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one finished frame that took `frame_us` microseconds.
    pub fn record_frame(&self, frame_us: u64) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.last_frame_us.store(frame_us, Ordering::Relaxed);
    }

    /// Adds spawned and admission-dropped particles.
    pub fn record_spawns(&self, spawned: u64, dropped: u64) {
        self.particles_spawned.fetch_add(spawned, Ordering::Relaxed);
        self.particles_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Adds events drained from the event bus.
    pub fn record_events(&self, count: u64) {
        self.events_processed.fetch_add(count, Ordering::Relaxed);
    }

    /// Adds effects that finished and were released.
    pub fn record_finished_effects(&self, count: u64) {
        self.effects_finished.fetch_add(count, Ordering::Relaxed);
    }

    /// Overwrites the per-frame gauges.
    pub fn set_alive(&self, effects: u64, systems: u64, particles: u64) {
        self.effects_alive.store(effects, Ordering::Relaxed);
        self.systems_alive.store(systems, Ordering::Relaxed);
        self.particles_alive.store(particles, Ordering::Relaxed);
    }

    /// Takes a consistent-enough copy of every counter.
    pub fn snapshot(&self) -> SimulationStats {
        SimulationStats {
            frames: self.frames.load(Ordering::Relaxed),
            particles_spawned: self.particles_spawned.load(Ordering::Relaxed),
            particles_dropped: self.particles_dropped.load(Ordering::Relaxed),
            events_processed: self.events_processed.load(Ordering::Relaxed),
            effects_finished: self.effects_finished.load(Ordering::Relaxed),
            effects_alive: self.effects_alive.load(Ordering::Relaxed),
            systems_alive: self.systems_alive.load(Ordering::Relaxed),
            particles_alive: self.particles_alive.load(Ordering::Relaxed),
            last_frame_us: self.last_frame_us.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`SimulationCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Frames simulated.
    pub frames: u64,
    /// Particles spawned in total.
    pub particles_spawned: u64,
    /// Spawns dropped because a system was full.
    pub particles_dropped: u64,
    /// Events drained from the bus.
    pub events_processed: u64,
    /// Effects released after finishing.
    pub effects_finished: u64,
    /// Effects alive after the last frame.
    pub effects_alive: u64,
    /// Systems alive after the last frame.
    pub systems_alive: u64,
    /// Particles alive after the last frame.
    pub particles_alive: u64,
    /// Wall-clock duration of the last frame.
    pub last_frame_us: u64,
}

impl SimulationStats {
    /// Serializes the stats as a single-line JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_and_gauges_overwrite() {
        let counters = SimulationCounters::new();
        counters.record_spawns(10, 2);
        counters.record_spawns(5, 0);
        counters.set_alive(3, 4, 100);
        counters.set_alive(2, 2, 40);
        counters.record_frame(250);

        let stats = counters.snapshot();
        assert_eq!(stats.particles_spawned, 15);
        assert_eq!(stats.particles_dropped, 2);
        assert_eq!(stats.effects_alive, 2);
        assert_eq!(stats.particles_alive, 40);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.last_frame_us, 250);
    }

    #[test]
    fn stats_serialize_to_json() {
        let counters = SimulationCounters::new();
        counters.record_events(7);
        let json = counters.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["events_processed"], 7);
        assert_eq!(value["frames"], 0);
    }
}
