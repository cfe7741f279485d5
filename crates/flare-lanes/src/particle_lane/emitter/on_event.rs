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

use super::{EmitterState, MaxParticleCount, ParticleEmitter};
use crate::particle_lane::{EventQueue, ParticleParameters};
use bincode::{Decode, Encode};
use flare_core::random::RandomExt;
use flare_core::HashedString;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration of an [`OnEventEmitter`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct OnEventEmitterDescriptor {
    /// The event type that triggers a spawn.
    pub event_name: String,
    /// Minimum particle count per trigger.
    pub spawn_count_min: u32,
    /// Extra particles drawn uniformly in `[0, range]`.
    pub spawn_count_range: u32,
}

impl OnEventEmitterDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for OnEventEmitterDescriptor {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            spawn_count_min: 1,
            spawn_count_range: 0,
        }
    }
}

/// Spawns a random count after a frame that carried a matching event.
///
/// Seeing the event latches a trigger; the next spawn-count query consumes it.
/// Several matching events in one frame trigger once.
#[derive(Debug, Clone)]
pub struct OnEventEmitter {
    descriptor: OnEventEmitterDescriptor,
    event_type: HashedString,
    density: f32,
    triggered: bool,
}

impl OnEventEmitter {
    /// Creates an emitter; call [`ParticleEmitter::on_finalize`] before use.
    pub fn new(descriptor: OnEventEmitterDescriptor) -> Self {
        Self {
            event_type: HashedString::new(&descriptor.event_name),
            descriptor,
            density: 1.0,
            triggered: false,
        }
    }

    /// Returns `true` if a matching event is waiting to be consumed.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

impl ParticleEmitter for OnEventEmitter {
    fn name(&self) -> &str {
        "OnEvent"
    }

    fn on_finalize(&mut self, _rng: &mut StdRng, _parameters: &ParticleParameters, density: f32) {
        self.density = density.max(0.0);
        self.triggered = false;
    }

    fn compute_spawn_count(&mut self, _delta_time: f32, rng: &mut StdRng) -> u32 {
        if !std::mem::take(&mut self.triggered) {
            return 0;
        }
        let drawn = rng.int_in_range(
            self.descriptor.spawn_count_min,
            self.descriptor.spawn_count_range,
        );
        (drawn as f32 * self.density).floor() as u32
    }

    fn state(&self) -> EmitterState {
        EmitterState::OnlyReacting
    }

    fn process_event_queue(&mut self, events: &EventQueue) {
        if events.contains_type(&self.event_type) {
            log::trace!("OnEvent emitter triggered by '{}'.", self.event_type);
            self.triggered = true;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_lane::ParticleEvent;
    use flare_core::math::Vec3;
    use rand::SeedableRng;

    #[test]
    fn spawns_once_per_triggering_frame() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut emitter = OnEventEmitter::new(OnEventEmitterDescriptor {
            event_name: "Impact".to_string(),
            spawn_count_min: 6,
            spawn_count_range: 0,
        });
        emitter.on_finalize(&mut rng, &ParticleParameters::new(), 1.0);
        assert_eq!(emitter.compute_spawn_count(0.016, &mut rng), 0);

        let mut events = EventQueue::new();
        events.push(ParticleEvent::new("Footstep", Vec3::ZERO));
        emitter.process_event_queue(&events);
        assert!(!emitter.is_triggered());

        events.push(ParticleEvent::new("Impact", Vec3::ONE));
        events.push(ParticleEvent::new("Impact", Vec3::ZERO));
        emitter.process_event_queue(&events);

        assert_eq!(emitter.compute_spawn_count(0.016, &mut rng), 6);
        assert_eq!(emitter.compute_spawn_count(0.016, &mut rng), 0);
        assert_eq!(emitter.state(), EmitterState::OnlyReacting);
    }
}
