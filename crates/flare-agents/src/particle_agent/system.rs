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

use super::ParticleWorldConfig;
use flare_core::math::{Aabb, BoundingBoxSphere, Transform, Vec3};
use flare_core::task::ParallelForParams;
use flare_lanes::particle_lane::descriptor::{FinalizerDescriptor, ParticleSystemDescriptor};
use flare_lanes::particle_lane::emitter::{EmitterState, ParticleEmitter};
use flare_lanes::particle_lane::types::{ExtractedParticles, ParticleType};
use flare_lanes::particle_lane::{
    EventQueue, ParticleFrame, ParticleParameters, ParticleProcessor, ParticleStreamGroup,
};
use rand::rngs::StdRng;
use std::sync::Arc;

/// What one [`ParticleSystemInstance::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemUpdateStats {
    /// Particles admitted this update.
    pub spawned: u32,
    /// Spawn requests dropped because the group was full.
    pub dropped: u32,
    /// Particles alive after the update.
    pub active: u32,
}

struct TypeSlot {
    particle_type: Box<dyn ParticleType>,
    enabled: bool,
    warned: bool,
}

/// One running particle system: its emitters, render types and the stream
/// group its processors run on.
pub struct ParticleSystemInstance {
    name: String,
    group: ParticleStreamGroup,
    emitters: Vec<Box<dyn ParticleEmitter>>,
    types: Vec<TypeSlot>,
    types_layout: Option<u32>,
    frame: ParticleFrame,
    visible: bool,
    emitter_enabled: bool,
    computes_bounds: bool,
    bounding_volume: Option<BoundingBoxSphere>,
    max_particle_size: f32,
    global_density: f32,
    spawn_count_multiplier: f32,
    lod_scale: f32,
    lod_carry: f32,
    last_stats: SystemUpdateStats,
}

impl ParticleSystemInstance {
    /// Builds a system from its descriptor.
    ///
    /// The stream group gets the capacity the emitters can fill over one
    /// particle lifetime, capped by the world config, and is sized once.
    /// Every stream a processor or type declares is created, and the
    /// emitters draw their random quantities from `rng`.
    pub fn new(
        descriptor: &ParticleSystemDescriptor,
        config: &ParticleWorldConfig,
        parameters: &ParticleParameters,
        rng: &mut StdRng,
    ) -> Self {
        let capacity = descriptor.query_max_particle_count(
            config.max_particles_per_system,
            config.spawn_count_multiplier,
        );
        let mut group = ParticleStreamGroup::new(capacity);

        let processors: Vec<ParticleProcessor> = descriptor
            .initializers
            .iter()
            .map(|d| d.build())
            .chain(descriptor.behaviors.iter().map(|d| d.build()))
            .chain(descriptor.finalizers.iter().map(|d| d.build()))
            .collect();
        let types: Vec<Box<dyn ParticleType>> =
            descriptor.types.iter().map(|d| d.build()).collect();

        let declarations = processors
            .iter()
            .flat_map(|p| p.stream_requirements())
            .chain(types.iter().flat_map(|t| t.stream_requirements()));
        for declaration in declarations {
            if let Err(e) = group.add_stream(declaration.name.clone(), declaration.data_type) {
                log::warn!("System '{}': {e}.", descriptor.name);
            }
        }
        for processor in processors {
            group.add_processor(processor);
        }
        group.set_size(capacity);

        let mut instance = Self {
            name: descriptor.name.clone(),
            group,
            emitters: descriptor.emitters.iter().map(|d| d.build()).collect(),
            types: types
                .into_iter()
                .map(|particle_type| TypeSlot {
                    particle_type,
                    enabled: false,
                    warned: false,
                })
                .collect(),
            types_layout: None,
            frame: ParticleFrame::default(),
            visible: true,
            emitter_enabled: true,
            computes_bounds: descriptor
                .finalizers
                .iter()
                .any(|f| matches!(f, FinalizerDescriptor::Volume(_))),
            bounding_volume: None,
            max_particle_size: 0.0,
            global_density: config.spawn_count_multiplier,
            spawn_count_multiplier: 1.0,
            lod_scale: 1.0,
            lod_carry: 0.0,
            last_stats: SystemUpdateStats::default(),
        };
        instance.resolve_type_bindings();
        instance.finalize_emitters(parameters, rng);
        log::debug!(
            "Created particle system '{}' with capacity {capacity}.",
            instance.name
        );
        instance
    }

    fn finalize_emitters(&mut self, parameters: &ParticleParameters, rng: &mut StdRng) {
        let density = self.global_density * self.spawn_count_multiplier;
        for emitter in &mut self.emitters {
            emitter.on_finalize(rng, parameters, density);
        }
    }

    /// Kills every particle and restarts every emitter.
    pub fn restart(&mut self, parameters: &ParticleParameters, rng: &mut StdRng) {
        let capacity = self.group.capacity();
        self.group.set_size(capacity);
        self.emitter_enabled = true;
        self.lod_carry = 0.0;
        self.bounding_volume = None;
        self.max_particle_size = 0.0;
        self.finalize_emitters(parameters, rng);
    }

    /// Advances the system by `delta_time` seconds and returns whether it is
    /// still alive (emitting or holding particles).
    ///
    /// Phases run in order: Emit, Grow, Initialize, React, Simulate, Cull.
    /// Emitters see `events` in React, so a spawn they request for an event
    /// happens on the next update.
    pub fn update(
        &mut self,
        delta_time: f32,
        events: &EventQueue,
        parameters: &Arc<ParticleParameters>,
        rng: &mut StdRng,
    ) -> bool {
        self.frame.delta_time = delta_time;
        self.resolve_type_bindings();
        if !Arc::ptr_eq(&self.frame.parameters, parameters) {
            self.frame.parameters = Arc::clone(parameters);
        }

        // Emit
        let requested = self.emit(delta_time, rng);

        // Grow + Initialize
        let dropped_before = self.group.dropped_spawns();
        let spawned = if requested > 0 {
            self.group
                .spawn(requested as usize, &mut self.frame, rng)
                .len()
        } else {
            0
        };

        // React
        for emitter in &mut self.emitters {
            emitter.process_event_queue(events);
        }

        // Simulate + Cull
        self.frame.bounds = Aabb::INVALID;
        self.frame.max_particle_size = 0.0;
        self.group.process(&mut self.frame, rng);
        if self.computes_bounds {
            self.bounding_volume = BoundingBoxSphere::from_aabb(&self.frame.bounds);
            self.max_particle_size = self.frame.max_particle_size;
        }

        self.last_stats = SystemUpdateStats {
            spawned: spawned as u32,
            dropped: (self.group.dropped_spawns() - dropped_before) as u32,
            active: self.group.active() as u32,
        };
        log::trace!(
            "System '{}': +{spawned} particles, {} alive.",
            self.name,
            self.group.active()
        );
        self.is_alive()
    }

    fn emit(&mut self, delta_time: f32, rng: &mut StdRng) -> u32 {
        if !self.emitter_enabled {
            return 0;
        }

        let mut requested = 0u32;
        let mut all_finished = true;
        for emitter in &mut self.emitters {
            if emitter.state() == EmitterState::Finished {
                continue;
            }
            requested = requested.saturating_add(emitter.compute_spawn_count(delta_time, rng));
            if emitter.state() != EmitterState::Finished {
                all_finished = false;
            }
        }
        if all_finished {
            log::debug!("System '{}': every emitter finished.", self.name);
            self.emitter_enabled = false;
        }

        if self.lod_scale >= 1.0 {
            return requested;
        }
        // Reduced detail keeps the fraction so low rates still spawn on average.
        self.lod_carry += requested as f32 * self.lod_scale;
        let scaled = self.lod_carry.floor();
        self.lod_carry -= scaled;
        scaled as u32
    }

    /// Rebinds the render types when streams were added or removed since
    /// the last binding. A type that fails to bind is skipped until a later
    /// layout satisfies it.
    fn resolve_type_bindings(&mut self) {
        let version = self.group.layout_version();
        if self.types_layout == Some(version) {
            return;
        }
        let layout = self.group.layout();
        for slot in &mut self.types {
            match slot.particle_type.update_stream_bindings(&layout) {
                Ok(()) => slot.enabled = true,
                Err(e) => {
                    slot.enabled = false;
                    if !slot.warned {
                        log::warn!(
                            "System '{}': type '{}' disabled: {e}.",
                            self.name,
                            slot.particle_type.name()
                        );
                        slot.warned = true;
                    }
                }
            }
        }
        self.types_layout = Some(version);
    }

    /// Returns `true` while the system emits or holds particles.
    pub fn is_alive(&self) -> bool {
        self.emitter_enabled || self.group.active() > 0
    }

    /// Produces render data of the active particles through every bound type.
    /// Invisible systems produce nothing, and so does a system whose streams
    /// changed since its last update.
    pub fn extract_render_data(&self, params: &ParallelForParams) -> Vec<ExtractedParticles> {
        if !self.visible || self.group.active() == 0 {
            return Vec::new();
        }
        if self.types_layout != Some(self.group.layout_version()) {
            log::debug!(
                "System '{}': streams changed since the last update, skipping extraction.",
                self.name
            );
            return Vec::new();
        }
        self.types
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.particle_type.extract(&self.group, params))
            .collect()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity of the stream group.
    pub fn max_particles(&self) -> usize {
        self.group.capacity()
    }

    /// Particles currently alive.
    pub fn num_active_particles(&self) -> usize {
        self.group.active()
    }

    /// Statistics of the last update.
    pub fn last_update_stats(&self) -> SystemUpdateStats {
        self.last_stats
    }

    /// The stream group, for reading streams.
    pub fn stream_group(&self) -> &ParticleStreamGroup {
        &self.group
    }

    /// The stream group, for external writers and side-table subscribers.
    pub fn stream_group_mut(&mut self) -> &mut ParticleStreamGroup {
        &mut self.group
    }

    /// World transform new particles are emitted from.
    pub fn transform(&self) -> &Transform {
        &self.frame.transform
    }

    /// Moves the system.
    pub fn set_transform(&mut self, transform: Transform) {
        self.frame.transform = transform;
    }

    /// Velocity inherited by new particles.
    pub fn start_velocity(&self) -> Vec3 {
        self.frame.start_velocity
    }

    /// Sets the velocity inherited by new particles.
    pub fn set_start_velocity(&mut self, velocity: Vec3) {
        self.frame.start_velocity = velocity;
    }

    /// Whether the system is rendered.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the system. Hidden systems keep simulating.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the emitters still run.
    pub fn is_emitter_enabled(&self) -> bool {
        self.emitter_enabled
    }

    /// Starts or stops emission. Live particles keep simulating.
    pub fn set_emitter_enabled(&mut self, enabled: bool) {
        self.emitter_enabled = enabled;
    }

    /// Sets the bounds used for culling, with the largest particle size.
    pub fn set_bounding_volume(&mut self, volume: BoundingBoxSphere, max_particle_size: f32) {
        self.bounding_volume = Some(volume);
        self.max_particle_size = max_particle_size;
    }

    /// The bounds used for culling, if known.
    pub fn bounding_volume(&self) -> Option<BoundingBoxSphere> {
        self.bounding_volume
    }

    /// Largest particle size inside the bounding volume.
    pub fn max_particle_size(&self) -> f32 {
        self.max_particle_size
    }

    /// Density multiplier of this system on top of the world's.
    pub fn spawn_count_multiplier(&self) -> f32 {
        self.spawn_count_multiplier
    }

    /// Sets the density multiplier. It applies from the next
    /// [`ParticleSystemInstance::restart`].
    pub fn set_spawn_count_multiplier(&mut self, multiplier: f32) {
        self.spawn_count_multiplier = multiplier.max(0.0);
    }

    /// Scales spawn counts from the next update on; `1.0` is full detail.
    pub fn set_lod_scale(&mut self, scale: f32) {
        self.lod_scale = scale.clamp(0.0, 1.0);
    }
}

impl std::fmt::Debug for ParticleSystemInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystemInstance")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("emitters", &self.emitters.len())
            .field("types", &self.types.len())
            .field("emitter_enabled", &self.emitter_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flare_core::random::seeded_rng;
    use flare_lanes::particle_lane::descriptor::{
        EmitterDescriptor, InitializerDescriptor, TypeDescriptor, UnitDescriptor,
    };
    use flare_lanes::particle_lane::emitter::{BurstEmitterDescriptor, OnEventEmitterDescriptor};
    use flare_lanes::particle_lane::finalizer::AgeFinalizerDescriptor;
    use flare_lanes::particle_lane::initializer::RandomSizeInitializerDescriptor;
    use flare_data::stream::StreamDataType;
    use flare_lanes::particle_lane::ParticleEvent;

    fn burst_system(count: u32, lifetime: f32) -> ParticleSystemDescriptor {
        ParticleSystemDescriptor {
            name: "Burst".to_string(),
            emitters: vec![EmitterDescriptor::Burst(BurstEmitterDescriptor {
                spawn_count_min: count,
                spawn_count_range: 0,
                ..Default::default()
            })],
            initializers: vec![InitializerDescriptor::RandomSize(
                RandomSizeInitializerDescriptor {
                    size: 0.5,
                    variance: 0.0,
                },
            )],
            finalizers: vec![
                FinalizerDescriptor::Age(AgeFinalizerDescriptor {
                    lifetime,
                    lifetime_variance: 0.0,
                }),
                FinalizerDescriptor::ApplyVelocity(UnitDescriptor),
                FinalizerDescriptor::Volume(UnitDescriptor),
            ],
            types: vec![TypeDescriptor::Point(UnitDescriptor)],
            ..Default::default()
        }
    }

    fn params() -> Arc<ParticleParameters> {
        Arc::new(ParticleParameters::new())
    }

    #[test]
    fn burst_spawns_once_then_dies_with_its_particles() {
        // --- 1. SETUP ---
        let mut rng = seeded_rng(1, 0);
        let config = ParticleWorldConfig::default();
        let mut system = ParticleSystemInstance::new(
            &burst_system(12, 0.5),
            &config,
            &ParticleParameters::new(),
            &mut rng,
        );
        let events = EventQueue::new();
        let params = params();

        // --- 2. FIRST UPDATE ---
        assert_eq!(system.max_particles(), 12);
        assert!(system.update(0.125, &events, &params, &mut rng));
        assert_eq!(system.num_active_particles(), 12);
        assert_eq!(system.last_update_stats().spawned, 12);
        assert!(!system.is_emitter_enabled());

        // --- 3. LIFETIME RUNS OUT ---
        let mut alive = true;
        for _ in 0..8 {
            alive = system.update(0.125, &events, &params, &mut rng);
        }
        assert!(!alive);
        assert_eq!(system.num_active_particles(), 0);
        assert!(system.bounding_volume().is_none());
    }

    #[test]
    fn volume_finalizer_feeds_bounding_volume() {
        let mut rng = seeded_rng(2, 0);
        let mut system = ParticleSystemInstance::new(
            &burst_system(4, 10.0),
            &ParticleWorldConfig::default(),
            &ParticleParameters::new(),
            &mut rng,
        );
        system.set_transform(Transform::from_position(Vec3::new(3.0, 0.0, 0.0)));
        system.update(0.0, &EventQueue::new(), &params(), &mut rng);

        let volume = system.bounding_volume().expect("particles have bounds");
        assert_relative_eq!(volume.center.x, 3.0);
        assert_relative_eq!(volume.half_extents.y, 0.25);
        assert_relative_eq!(system.max_particle_size(), 0.5);

        let extracted = system.extract_render_data(&ParallelForParams::default());
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].len(), 4);

        system.set_visible(false);
        assert!(system.extract_render_data(&ParallelForParams::default()).is_empty());
    }

    #[test]
    fn full_group_drops_spawns() {
        let mut rng = seeded_rng(3, 0);
        let config = ParticleWorldConfig {
            max_particles_per_system: 5,
            ..Default::default()
        };
        let mut system = ParticleSystemInstance::new(
            &burst_system(8, 1.0),
            &config,
            &ParticleParameters::new(),
            &mut rng,
        );
        system.update(0.125, &EventQueue::new(), &params(), &mut rng);

        assert_eq!(system.max_particles(), 5);
        let stats = system.last_update_stats();
        assert_eq!(stats.spawned, 5);
        assert_eq!(stats.dropped, 3);
        assert_eq!(system.stream_group().dropped_spawns(), 3);
    }

    #[test]
    fn on_event_spawns_on_the_update_after_the_event() {
        let descriptor = ParticleSystemDescriptor {
            name: "Sparks".to_string(),
            emitters: vec![EmitterDescriptor::OnEvent(OnEventEmitterDescriptor {
                event_name: "Impact".to_string(),
                spawn_count_min: 6,
                spawn_count_range: 0,
            })],
            finalizers: vec![FinalizerDescriptor::Age(AgeFinalizerDescriptor {
                lifetime: 1.0,
                lifetime_variance: 0.0,
            })],
            ..Default::default()
        };
        let mut rng = seeded_rng(4, 0);
        let mut system = ParticleSystemInstance::new(
            &descriptor,
            &ParticleWorldConfig::default(),
            &ParticleParameters::new(),
            &mut rng,
        );
        let params = params();
        let mut impact = EventQueue::new();
        impact.push(ParticleEvent::new("Impact", Vec3::ZERO));
        let empty = EventQueue::new();

        assert!(system.update(0.125, &impact, &params, &mut rng));
        assert_eq!(system.num_active_particles(), 0);

        assert!(system.update(0.125, &empty, &params, &mut rng));
        assert_eq!(system.num_active_particles(), 6);

        system.update(0.125, &empty, &params, &mut rng);
        assert_eq!(system.num_active_particles(), 6);
        assert!(system.is_emitter_enabled());
    }

    #[test]
    fn lod_scale_thins_spawns() {
        let mut rng = seeded_rng(5, 0);
        let mut system = ParticleSystemInstance::new(
            &burst_system(20, 10.0),
            &ParticleWorldConfig::default(),
            &ParticleParameters::new(),
            &mut rng,
        );
        system.set_lod_scale(0.5);
        system.update(0.125, &EventQueue::new(), &params(), &mut rng);
        assert_eq!(system.num_active_particles(), 10);
    }

    #[test]
    fn restart_clears_and_reemits() {
        let mut rng = seeded_rng(6, 0);
        let parameters = ParticleParameters::new();
        let mut system = ParticleSystemInstance::new(
            &burst_system(3, 10.0),
            &ParticleWorldConfig::default(),
            &parameters,
            &mut rng,
        );
        let params = params();
        system.update(0.125, &EventQueue::new(), &params, &mut rng);
        assert_eq!(system.num_active_particles(), 3);

        system.restart(&parameters, &mut rng);
        assert_eq!(system.num_active_particles(), 0);
        assert!(system.is_emitter_enabled());
        system.update(0.125, &EventQueue::new(), &params, &mut rng);
        assert_eq!(system.num_active_particles(), 3);
    }

    #[test]
    fn removed_stream_disables_extraction_until_restored() {
        // --- 1. SETUP ---
        let mut rng = seeded_rng(7, 0);
        let mut system = ParticleSystemInstance::new(
            &burst_system(4, 10.0),
            &ParticleWorldConfig::default(),
            &ParticleParameters::new(),
            &mut rng,
        );
        let params = params();
        let extract = ParallelForParams::default();
        system.update(0.125, &EventQueue::new(), &params, &mut rng);
        assert_eq!(system.extract_render_data(&extract).len(), 1);

        // --- 2. REMOVE A STREAM THE POINT TYPE READS ---
        system
            .stream_group_mut()
            .remove_stream(&"Size".into())
            .expect("Size exists");
        assert!(system.extract_render_data(&extract).is_empty());
        system.update(0.125, &EventQueue::new(), &params, &mut rng);
        assert_eq!(system.num_active_particles(), 4);
        assert!(system.extract_render_data(&extract).is_empty());

        // --- 3. RESTORE IT ---
        system
            .stream_group_mut()
            .add_stream("Size", StreamDataType::Float)
            .expect("Size restored");
        system.update(0.125, &EventQueue::new(), &params, &mut rng);
        let extracted = system.extract_render_data(&extract);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].len(), 4);
    }
}
