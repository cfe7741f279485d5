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

/// Configuration of a [`ContinuousEmitter`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct ContinuousEmitterDescriptor {
    /// Seconds of emission; `0` emits forever.
    pub duration: f32,
    /// Seconds to wait before emission starts.
    pub start_delay: f32,
    /// Minimum particles per second.
    pub spawn_count_per_sec: f32,
    /// Extra particles per second drawn uniformly in `[0, range)`.
    pub spawn_count_per_sec_range: f32,
    /// Effect parameter scaling the rate; empty for none.
    pub spawn_count_scale_parameter: String,
}

impl ContinuousEmitterDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for ContinuousEmitterDescriptor {
    fn default() -> Self {
        Self {
            duration: 0.0,
            start_delay: 0.0,
            spawn_count_per_sec: 10.0,
            spawn_count_per_sec_range: 0.0,
            spawn_count_scale_parameter: String::new(),
        }
    }
}

/// Spawns at a constant rate drawn at finalize, forever or for a duration.
#[derive(Debug, Clone)]
pub struct ContinuousEmitter {
    descriptor: ContinuousEmitterDescriptor,
    scale_parameter: HashedString,
    rate: f32,
    delay_remaining: f32,
    elapsed: f32,
    accumulator: f32,
}

impl ContinuousEmitter {
    /// Creates an emitter; call [`ParticleEmitter::on_finalize`] before use.
    pub fn new(descriptor: ContinuousEmitterDescriptor) -> Self {
        Self {
            scale_parameter: HashedString::new(&descriptor.spawn_count_scale_parameter),
            delay_remaining: descriptor.start_delay,
            descriptor,
            rate: 0.0,
            elapsed: 0.0,
            accumulator: 0.0,
        }
    }

    /// Particles per second drawn at the last finalize.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    fn is_finished(&self) -> bool {
        self.descriptor.duration > 0.0 && self.elapsed >= self.descriptor.duration
    }
}

impl ParticleEmitter for ContinuousEmitter {
    fn name(&self) -> &str {
        "Continuous"
    }

    fn on_finalize(&mut self, rng: &mut StdRng, parameters: &ParticleParameters, density: f32) {
        let base = self.descriptor.spawn_count_per_sec.max(0.0)
            + rng.unit_float() * self.descriptor.spawn_count_per_sec_range.max(0.0);
        self.rate = base * density.max(0.0) * scale_parameter(&self.scale_parameter, parameters);
        self.delay_remaining = self.descriptor.start_delay.max(0.0);
        self.elapsed = 0.0;
        self.accumulator = 0.0;
    }

    fn compute_spawn_count(&mut self, delta_time: f32, _rng: &mut StdRng) -> u32 {
        if self.is_finished() {
            return 0;
        }

        let mut dt = delta_time.max(0.0);
        if self.delay_remaining > 0.0 {
            if dt < self.delay_remaining {
                self.delay_remaining -= dt;
                return 0;
            }
            dt -= self.delay_remaining;
            self.delay_remaining = 0.0;
        }

        if self.descriptor.duration > 0.0 {
            dt = dt.min(self.descriptor.duration - self.elapsed);
        }
        self.elapsed += dt;

        self.accumulator += self.rate * dt;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as u32
    }

    fn state(&self) -> EmitterState {
        if self.is_finished() {
            EmitterState::Finished
        } else {
            EmitterState::Active
        }
    }

    fn query_max_particle_count(&self) -> MaxParticleCount {
        MaxParticleCount {
            // One extra for the accumulator carrying over.
            absolute: 1,
            per_second: self.descriptor.spawn_count_per_sec.max(0.0)
                + self.descriptor.spawn_count_per_sec_range.max(0.0),
        }
    }
}
