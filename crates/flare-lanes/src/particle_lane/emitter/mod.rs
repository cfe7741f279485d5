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

//! Emitters decide how many particles a system spawns each update.
//!
//! An emitter is reset with [`ParticleEmitter::on_finalize`] when its system
//! is created or restarted, asked for a spawn count once per update, and
//! shown the frame's events afterwards.

mod burst;
mod continuous;
mod on_event;

pub use burst::{BurstEmitter, BurstEmitterDescriptor};
pub use continuous::{ContinuousEmitter, ContinuousEmitterDescriptor};
pub use on_event::{OnEventEmitter, OnEventEmitterDescriptor};

use super::{EventQueue, ParticleParameters};
use flare_core::HashedString;
use rand::rngs::StdRng;

/// Lifecycle state of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    /// Still spawning on its own schedule.
    Active,
    /// Will never spawn again.
    Finished,
    /// Spawns only in reaction to events; never finishes on its own.
    OnlyReacting,
}

/// Upper bound on the particles an emitter can have spawned at once, as a
/// fixed amount plus a rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaxParticleCount {
    /// Particles that can be spawned at once.
    pub absolute: u32,
    /// Particles spawned per second at most.
    pub per_second: f32,
}

impl std::ops::Add for MaxParticleCount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            absolute: self.absolute.saturating_add(rhs.absolute),
            per_second: self.per_second + rhs.per_second,
        }
    }
}

/// A source of spawn counts.
pub trait ParticleEmitter: Send {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Resets the emitter and draws its random quantities.
    ///
    /// `density` scales every spawn count (global density times the
    /// per-system multiplier).
    fn on_finalize(&mut self, rng: &mut StdRng, parameters: &ParticleParameters, density: f32);

    /// Number of particles to spawn for an update of `delta_time` seconds.
    fn compute_spawn_count(&mut self, delta_time: f32, rng: &mut StdRng) -> u32;

    /// The emitter's current state.
    fn state(&self) -> EmitterState;

    /// Shows the emitter this frame's events.
    fn process_event_queue(&mut self, _events: &EventQueue) {}

    /// Upper bound used to size the system's stream group.
    fn query_max_particle_count(&self) -> MaxParticleCount;
}

/// Resolves the spawn-count scale parameter of an emitter; an empty name
/// means no scaling.
pub(crate) fn scale_parameter(name: &HashedString, parameters: &ParticleParameters) -> f32 {
    if name.is_empty() {
        1.0
    } else {
        parameters.get_or(name, 1.0).max(0.0)
    }
}
