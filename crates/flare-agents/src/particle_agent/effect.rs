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

use super::{ParticleSystemInstance, ParticleWorldConfig, SystemUpdateStats};
use flare_core::math::{BoundingBoxSphere, Transform, Vec3};
use flare_core::random::seeded_rng;
use flare_core::task::ParallelForParams;
use flare_core::HashedString;
use flare_lanes::particle_lane::descriptor::ParticleEffectDescriptor;
use flare_lanes::particle_lane::types::ExtractedParticles;
use flare_lanes::particle_lane::{EventQueue, ParticleParameters};
use rand::rngs::StdRng;
use std::sync::Arc;

/// Totals of one [`ParticleEffectInstance::update`] over its systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectUpdateStats {
    /// Particles admitted.
    pub spawned: u64,
    /// Spawn requests dropped by full systems.
    pub dropped: u64,
    /// Particles alive after the update.
    pub active: u64,
    /// Systems alive after the update.
    pub systems_alive: u64,
}

struct SystemSlot {
    instance: ParticleSystemInstance,
    rng: StdRng,
    alive: bool,
}

/// A running effect: systems sharing one transform and one parameter set.
///
/// Each system draws from its own random stream, derived from the effect
/// seed and the system's position in the effect, so an effect replays
/// identically for the same seed.
pub struct ParticleEffectInstance {
    name: String,
    seed: u64,
    systems: Vec<SystemSlot>,
    transform: Transform,
    parameters: Arc<ParticleParameters>,
}

impl ParticleEffectInstance {
    /// Instantiates every system of `descriptor`.
    pub fn new(descriptor: &ParticleEffectDescriptor, config: &ParticleWorldConfig, seed: u64) -> Self {
        let parameters = descriptor.default_parameters();
        let systems = descriptor
            .systems
            .iter()
            .enumerate()
            .map(|(index, system)| {
                let mut rng = seeded_rng(seed, index as u64);
                let instance = ParticleSystemInstance::new(system, config, &parameters, &mut rng);
                SystemSlot {
                    instance,
                    rng,
                    alive: true,
                }
            })
            .collect();

        log::debug!(
            "Instantiated effect '{}' ({} systems, seed {seed:#x}).",
            descriptor.name,
            descriptor.systems.len()
        );
        Self {
            name: descriptor.name.clone(),
            seed,
            systems,
            transform: Transform::IDENTITY,
            parameters: Arc::new(parameters),
        }
    }

    /// Advances every live system. Dead systems are skipped until
    /// [`ParticleEffectInstance::restart`].
    pub fn update(&mut self, delta_time: f32, events: &EventQueue) -> EffectUpdateStats {
        let mut stats = EffectUpdateStats::default();
        for slot in self.systems.iter_mut().filter(|slot| slot.alive) {
            slot.alive = slot
                .instance
                .update(delta_time, events, &self.parameters, &mut slot.rng);
            if !slot.alive {
                log::debug!(
                    "System '{}' of effect '{}' finished.",
                    slot.instance.name(),
                    self.name
                );
            }

            let SystemUpdateStats {
                spawned,
                dropped,
                active,
            } = slot.instance.last_update_stats();
            stats.spawned += u64::from(spawned);
            stats.dropped += u64::from(dropped);
            stats.active += u64::from(active);
            stats.systems_alive += u64::from(slot.alive);
        }
        stats
    }

    /// Returns `true` once every system is dead.
    pub fn is_finished(&self) -> bool {
        self.systems.iter().all(|slot| !slot.alive)
    }

    /// Restarts every system from the effect's current parameters.
    pub fn restart(&mut self) {
        for slot in &mut self.systems {
            slot.instance.restart(&self.parameters, &mut slot.rng);
            slot.alive = true;
        }
    }

    /// Render data of every visible system.
    pub fn extract_render_data(&self, params: &ParallelForParams) -> Vec<ExtractedParticles> {
        self.systems
            .iter()
            .flat_map(|slot| slot.instance.extract_render_data(params))
            .collect()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seed the system random streams derive from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The effect's systems.
    pub fn systems(&self) -> impl Iterator<Item = &ParticleSystemInstance> {
        self.systems.iter().map(|slot| &slot.instance)
    }

    /// The effect's systems, mutably.
    pub fn systems_mut(&mut self) -> impl Iterator<Item = &mut ParticleSystemInstance> {
        self.systems.iter_mut().map(|slot| &mut slot.instance)
    }

    /// Number of systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Particles alive across every system.
    pub fn num_active_particles(&self) -> usize {
        self.systems().map(|s| s.num_active_particles()).sum()
    }

    /// The effect's world transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Moves the effect and every system in it.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        for system in self.systems_mut() {
            system.set_transform(transform);
        }
    }

    /// Sets the velocity inherited by new particles of every system.
    pub fn set_start_velocity(&mut self, velocity: Vec3) {
        for system in self.systems_mut() {
            system.set_start_velocity(velocity);
        }
    }

    /// Current parameter values.
    pub fn parameters(&self) -> &ParticleParameters {
        &self.parameters
    }

    /// Sets a named parameter. Emitters read it at their next restart,
    /// processors on the next update.
    pub fn set_parameter(&mut self, name: impl Into<HashedString>, value: f32) {
        Arc::make_mut(&mut self.parameters).set(name, value);
    }

    /// Scales the spawn counts of every system from the next update on.
    pub fn set_lod_scale(&mut self, scale: f32) {
        for system in self.systems_mut() {
            system.set_lod_scale(scale);
        }
    }

    /// Shows or hides every system.
    pub fn set_visible(&mut self, visible: bool) {
        for system in self.systems_mut() {
            system.set_visible(visible);
        }
    }

    /// The union of the systems' bounding volumes.
    pub fn bounding_volume(&self) -> Option<BoundingBoxSphere> {
        let aabb = self
            .systems()
            .filter_map(|s| s.bounding_volume())
            .map(|volume| volume.aabb())
            .reduce(|a, b| a.merge(&b))?;
        BoundingBoxSphere::from_aabb(&aabb)
    }
}

impl std::fmt::Debug for ParticleEffectInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleEffectInstance")
            .field("name", &self.name)
            .field("seed", &self.seed)
            .field("systems", &self.systems.len())
            .field("active", &self.num_active_particles())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_lanes::particle_lane::descriptor::{
        EmitterDescriptor, FinalizerDescriptor, InitializerDescriptor, ParameterDescriptor,
        ParticleSystemDescriptor, UnitDescriptor,
    };
    use flare_lanes::particle_lane::emitter::BurstEmitterDescriptor;
    use flare_lanes::particle_lane::finalizer::AgeFinalizerDescriptor;
    use flare_lanes::particle_lane::initializer::VelocityConeInitializerDescriptor;
    use flare_lanes::particle_lane::streams;

    fn effect_descriptor() -> ParticleEffectDescriptor {
        let system = |name: &str, lifetime: f32| ParticleSystemDescriptor {
            name: name.to_string(),
            emitters: vec![EmitterDescriptor::Burst(BurstEmitterDescriptor {
                spawn_count_min: 8,
                spawn_count_range: 8,
                spawn_count_scale_parameter: "Intensity".to_string(),
                ..Default::default()
            })],
            initializers: vec![InitializerDescriptor::VelocityCone(
                VelocityConeInitializerDescriptor::default(),
            )],
            finalizers: vec![
                FinalizerDescriptor::Age(AgeFinalizerDescriptor {
                    lifetime,
                    lifetime_variance: 0.0,
                }),
                FinalizerDescriptor::ApplyVelocity(UnitDescriptor),
                FinalizerDescriptor::Volume(UnitDescriptor),
            ],
            ..Default::default()
        };
        ParticleEffectDescriptor {
            name: "Sparks".to_string(),
            systems: vec![system("Short", 0.25), system("Long", 0.5)],
            parameters: vec![ParameterDescriptor {
                name: "Intensity".to_string(),
                default: 1.0,
            }],
        }
    }

    fn positions(effect: &ParticleEffectInstance) -> Vec<Vec3> {
        effect
            .systems()
            .flat_map(|system| {
                let group = system.stream_group();
                let id = group
                    .layout()
                    .bind(&streams::position())
                    .expect("position stream");
                group.streams()[id.0].as_slice::<Vec3>()[..group.active()].to_vec()
            })
            .collect()
    }

    #[test]
    fn same_seed_replays_identically() {
        let descriptor = effect_descriptor();
        let config = ParticleWorldConfig::default();
        let mut a = ParticleEffectInstance::new(&descriptor, &config, 42);
        let mut b = ParticleEffectInstance::new(&descriptor, &config, 42);
        let events = EventQueue::new();

        for _ in 0..3 {
            a.update(0.0625, &events);
            b.update(0.0625, &events);
        }
        assert!(a.num_active_particles() > 0);
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn finishes_when_every_system_is_dead() {
        let mut effect =
            ParticleEffectInstance::new(&effect_descriptor(), &ParticleWorldConfig::default(), 7);
        let events = EventQueue::new();

        let first = effect.update(0.125, &events);
        assert_eq!(first.systems_alive, 2);
        assert!(first.spawned >= 16);
        assert!(effect.bounding_volume().is_some());

        let mut systems_alive = Vec::new();
        for _ in 0..5 {
            systems_alive.push(effect.update(0.125, &events).systems_alive);
        }
        // Short dies on its second update, Long on its fourth.
        assert_eq!(systems_alive, vec![1, 1, 0, 0, 0]);
        assert!(effect.is_finished());
        assert_eq!(effect.num_active_particles(), 0);

        effect.restart();
        assert!(!effect.is_finished());
        assert!(effect.update(0.125, &events).spawned >= 16);
    }

    #[test]
    fn scale_parameter_applies_on_restart() {
        let mut effect =
            ParticleEffectInstance::new(&effect_descriptor(), &ParticleWorldConfig::default(), 9);
        effect.set_parameter("Intensity", 0.0);
        assert_eq!(effect.parameters().get(&"Intensity".into()), Some(0.0));

        effect.restart();
        let stats = effect.update(0.125, &EventQueue::new());
        assert_eq!(stats.spawned, 0);
        assert!(effect.is_finished());
    }

    #[test]
    fn transform_reaches_every_system() {
        let mut effect =
            ParticleEffectInstance::new(&effect_descriptor(), &ParticleWorldConfig::default(), 3);
        let transform = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        effect.set_transform(transform);
        assert!(effect.systems().all(|s| *s.transform() == transform));
    }
}
