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

use super::{EventQueueManager, ParticleEffectInstance, ParticleError, ParticleWorldConfig};
use flare_core::math::{Transform, Vec3};
use flare_core::task::parallel_for_slice_mut;
use flare_core::Stopwatch;
use flare_lanes::particle_lane::descriptor::ParticleEffectDescriptor;
use flare_lanes::particle_lane::types::ExtractedParticles;
use flare_lanes::particle_lane::ParticleEvent;
use flare_telemetry::{PhaseStat, PhaseTimings, SimulationCounters, SimulationStats};
use std::path::Path;

/// A generation-checked reference to an effect of a [`ParticleWorldModule`].
///
/// A handle stops resolving once its effect is destroyed or finishes, even if
/// the slot is reused by a later effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    index: u32,
    generation: u32,
}

struct EffectSlot {
    generation: u32,
    effect: Option<ParticleEffectInstance>,
}

/// The particle registry of one simulation world.
///
/// Constructed with its world and dropped with it; nothing is global. It
/// owns every effect, the frame's event queue, the configuration and the
/// telemetry counters.
pub struct ParticleWorldModule {
    config: ParticleWorldConfig,
    base_seed: u64,
    next_effect_id: u64,
    slots: Vec<EffectSlot>,
    free_slots: Vec<u32>,
    events: EventQueueManager,
    viewer_position: Option<Vec3>,
    counters: SimulationCounters,
    timings: PhaseTimings,
    frame_index: u64,
}

impl ParticleWorldModule {
    /// Creates an empty module.
    pub fn new(config: ParticleWorldConfig) -> Self {
        let base_seed = config.random_seed.unwrap_or_else(rand::random);
        log::info!("Particle world module created (seed {base_seed:#x}).");
        Self {
            config,
            base_seed,
            next_effect_id: 0,
            slots: Vec::new(),
            free_slots: Vec::new(),
            events: EventQueueManager::new(),
            viewer_position: None,
            counters: SimulationCounters::new(),
            timings: PhaseTimings::new(),
            frame_index: 0,
        }
    }

    /// The module's configuration.
    pub fn config(&self) -> &ParticleWorldConfig {
        &self.config
    }

    /// Instantiates an effect at `transform`.
    pub fn create_effect(
        &mut self,
        descriptor: &ParticleEffectDescriptor,
        transform: Transform,
    ) -> EffectHandle {
        let seed = self.base_seed ^ self.next_effect_id.wrapping_mul(0xA24B_AED4_963E_E407);
        self.next_effect_id += 1;

        let mut effect = ParticleEffectInstance::new(descriptor, &self.config, seed);
        effect.set_transform(transform);

        let index = match self.free_slots.pop() {
            Some(index) => {
                self.slots[index as usize].effect = Some(effect);
                index
            }
            None => {
                self.slots.push(EffectSlot {
                    generation: 0,
                    effect: Some(effect),
                });
                (self.slots.len() - 1) as u32
            }
        };
        EffectHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Loads an effect descriptor from a RON file and instantiates it.
    pub fn create_effect_from_file(
        &mut self,
        path: impl AsRef<Path>,
        transform: Transform,
    ) -> Result<EffectHandle, ParticleError> {
        let descriptor = ParticleEffectDescriptor::from_ron_file(path)?;
        Ok(self.create_effect(&descriptor, transform))
    }

    /// Destroys an effect and its particles.
    pub fn destroy_effect(&mut self, handle: EffectHandle) -> Result<(), ParticleError> {
        if self.effect(handle).is_none() {
            return Err(ParticleError::StaleHandle(handle));
        }
        self.release(handle.index);
        Ok(())
    }

    fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.effect = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(index);
    }

    /// The effect behind `handle`, if it still exists.
    pub fn effect(&self, handle: EffectHandle) -> Option<&ParticleEffectInstance> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.effect.as_ref())
    }

    /// The effect behind `handle`, mutably, if it still exists.
    pub fn effect_mut(&mut self, handle: EffectHandle) -> Option<&mut ParticleEffectInstance> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.effect.as_mut())
    }

    /// Returns `true` if `handle` still resolves.
    pub fn is_alive(&self, handle: EffectHandle) -> bool {
        self.effect(handle).is_some()
    }

    /// Number of live effects.
    pub fn effect_count(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Iterates over the live effects.
    pub fn effects(&self) -> impl Iterator<Item = (EffectHandle, &ParticleEffectInstance)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.effect.as_ref().map(|effect| {
                (
                    EffectHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    effect,
                )
            })
        })
    }

    /// Posts an event; systems see it on the next update.
    pub fn post_event(&self, event: ParticleEvent) {
        self.events.post(event);
    }

    /// A sender for posting events from other threads.
    pub fn event_sender(&self) -> flume::Sender<ParticleEvent> {
        self.events.sender()
    }

    /// Sets the point distance level of detail is measured from. `None`
    /// keeps every effect at full detail.
    pub fn set_viewer_position(&mut self, position: Option<Vec3>) {
        self.viewer_position = position;
    }

    /// Advances every effect by `delta_time` seconds.
    ///
    /// Posted events become this frame's queue, effects update in parallel,
    /// and effects that finished are released.
    pub fn update(&mut self, delta_time: f32) {
        let frame_watch = Stopwatch::new();

        let drained = {
            let _timer = self.timings.scope("drain_events");
            self.events.begin_frame()
        };
        self.counters.record_events(drained as u64);

        let lod = &self.config.lod;
        for effect in self.slots.iter_mut().filter_map(|slot| slot.effect.as_mut()) {
            let scale = self.viewer_position.map_or(1.0, |viewer| {
                lod.spawn_scale(effect.transform().position.distance_squared(viewer))
            });
            effect.set_lod_scale(scale);
        }

        {
            let _timer = self.timings.scope("update_effects");
            let queue = self.events.queue();
            let counters = &self.counters;
            parallel_for_slice_mut(&mut self.slots, &self.config.parallel_for, |_, slots| {
                for effect in slots.iter_mut().filter_map(|slot| slot.effect.as_mut()) {
                    let stats = effect.update(delta_time, queue);
                    counters.record_spawns(stats.spawned, stats.dropped);
                }
            });
        }

        let finished: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.effect.as_ref().is_some_and(|e| e.is_finished()))
            .map(|(index, _)| index as u32)
            .collect();
        for &index in &finished {
            if let Some(effect) = &self.slots[index as usize].effect {
                log::debug!("Effect '{}' finished.", effect.name());
            }
            self.release(index);
        }
        self.counters.record_finished_effects(finished.len() as u64);

        let (systems, particles) = self
            .slots
            .iter()
            .filter_map(|slot| slot.effect.as_ref())
            .fold((0u64, 0u64), |(systems, particles), effect| {
                (
                    systems + effect.systems().filter(|s| s.is_alive()).count() as u64,
                    particles + effect.num_active_particles() as u64,
                )
            });
        self.counters
            .set_alive(self.effect_count() as u64, systems, particles);
        self.counters
            .record_frame(frame_watch.elapsed_us().unwrap_or(0));

        self.frame_index += 1;
        let interval = self.config.stats_log_interval_frames;
        if interval > 0 && self.frame_index % interval == 0 {
            let stats = self.counters.snapshot();
            log::info!(
                "Particles: {} effects, {} systems, {} alive, {} spawned, {} dropped, last frame {}us.",
                stats.effects_alive,
                stats.systems_alive,
                stats.particles_alive,
                stats.particles_spawned,
                stats.particles_dropped,
                stats.last_frame_us
            );
        }
    }

    /// Render data of every visible system of every effect.
    pub fn extract_render_data(&self) -> Vec<ExtractedParticles> {
        let _timer = self.timings.scope("extract");
        self.slots
            .iter()
            .filter_map(|slot| slot.effect.as_ref())
            .flat_map(|effect| effect.extract_render_data(&self.config.parallel_for))
            .collect()
    }

    /// A copy of the simulation counters.
    pub fn stats(&self) -> SimulationStats {
        self.counters.snapshot()
    }

    /// Accumulated timings of the update phases.
    pub fn phase_timings(&self) -> Vec<PhaseStat> {
        self.timings.snapshot()
    }
}

impl Drop for ParticleWorldModule {
    fn drop(&mut self) {
        log::info!(
            "Particle world module torn down with {} live effects.",
            self.effect_count()
        );
    }
}
