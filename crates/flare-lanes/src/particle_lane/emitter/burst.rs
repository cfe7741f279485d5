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

use super::{scale_parameter, EmitterState, MaxParticleCount, ParticleEmitter};
use crate::particle_lane::ParticleParameters;
use bincode::{Decode, Encode};
use flare_core::random::RandomExt;
use flare_core::HashedString;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Relative slack on the duration check. Frame times summed by the caller in
/// `f32` may round up past the duration while the emitter's own sum does not.
const DURATION_TOLERANCE: f64 = 1e-5;

/// Configuration of a [`BurstEmitter`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct BurstEmitterDescriptor {
    /// Seconds over which the burst is spread. `0` spawns it in one update.
    pub duration: f32,
    /// Seconds to wait before the burst starts.
    pub start_delay: f32,
    /// Minimum particle count.
    pub spawn_count_min: u32,
    /// Extra particles drawn uniformly in `[0, range]`.
    pub spawn_count_range: u32,
    /// Effect parameter scaling the count; empty for none.
    pub spawn_count_scale_parameter: String,
}

impl BurstEmitterDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for BurstEmitterDescriptor {
    fn default() -> Self {
        Self {
            duration: 0.0,
            start_delay: 0.0,
            spawn_count_min: 10,
            spawn_count_range: 0,
            spawn_count_scale_parameter: String::new(),
        }
    }
}

/// Spawns a fixed, randomly drawn number of particles once, either at once or
/// spread evenly over a duration.
///
/// With a duration, the count is distributed with a fractional accumulator
/// and whatever is left is flushed once the duration has elapsed, so exactly
/// the drawn total is spawned however the frame times fall.
#[derive(Debug, Clone)]
pub struct BurstEmitter {
    descriptor: BurstEmitterDescriptor,
    scale_parameter: HashedString,
    total: u32,
    emitted: u32,
    delay_remaining: f64,
    elapsed: f64,
    accumulator: f32,
}

impl BurstEmitter {
    /// Creates an emitter; call [`ParticleEmitter::on_finalize`] before use.
    pub fn new(descriptor: BurstEmitterDescriptor) -> Self {
        Self {
            scale_parameter: HashedString::new(&descriptor.spawn_count_scale_parameter),
            delay_remaining: f64::from(descriptor.start_delay),
            descriptor,
            total: 0,
            emitted: 0,
            elapsed: 0.0,
            accumulator: 0.0,
        }
    }

    /// The total drawn at the last finalize.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Particles emitted since the last finalize.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    fn flush(&mut self) -> u32 {
        let remaining = self.total - self.emitted;
        self.emitted = self.total;
        remaining
    }
}

impl ParticleEmitter for BurstEmitter {
    fn name(&self) -> &str {
        "Burst"
    }

    fn on_finalize(&mut self, rng: &mut StdRng, parameters: &ParticleParameters, density: f32) {
        let drawn = rng.int_in_range(
            self.descriptor.spawn_count_min,
            self.descriptor.spawn_count_range,
        );
        let scale = density.max(0.0) * scale_parameter(&self.scale_parameter, parameters);
        self.total = (drawn as f32 * scale).floor() as u32;
        self.emitted = 0;
        self.delay_remaining = f64::from(self.descriptor.start_delay.max(0.0));
        self.elapsed = 0.0;
        self.accumulator = 0.0;
        log::trace!("Burst finalized: {} particles.", self.total);
    }

    fn compute_spawn_count(&mut self, delta_time: f32, _rng: &mut StdRng) -> u32 {
        if self.emitted >= self.total {
            return 0;
        }

        let mut dt = f64::from(delta_time.max(0.0));
        if self.delay_remaining > 0.0 {
            if dt < self.delay_remaining {
                self.delay_remaining -= dt;
                return 0;
            }
            dt -= self.delay_remaining;
            self.delay_remaining = 0.0;
        }

        let duration = f64::from(self.descriptor.duration);
        if duration <= 0.0 {
            return self.flush();
        }

        self.elapsed += dt;
        if self.elapsed >= duration * (1.0 - DURATION_TOLERANCE) {
            return self.flush();
        }

        self.accumulator += (f64::from(self.total) * dt / duration) as f32;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        let count = (whole as u32).min(self.total - self.emitted);
        self.emitted += count;
        count
    }

    fn state(&self) -> EmitterState {
        if self.emitted >= self.total {
            EmitterState::Finished
        } else {
            EmitterState::Active
        }
    }

    fn query_max_particle_count(&self) -> MaxParticleCount {
        MaxParticleCount {
            absolute: self
                .descriptor
                .spawn_count_min
                .saturating_add(self.descriptor.spawn_count_range),
            per_second: 0.0,
        }
    }
}
