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

use flare_agents::particle_agent::{
    LodConfig, ParticleError, ParticleWorldConfig, ParticleWorldModule,
};
use flare_core::math::{Transform, Vec3};
use flare_lanes::particle_lane::descriptor::ParticleEffectDescriptor;
use flare_lanes::particle_lane::ParticleEvent;
use std::io::Write;

fn burst_effect(count: u32, lifetime: f32) -> ParticleEffectDescriptor {
    ParticleEffectDescriptor::from_ron_str(&format!(
        r#"(
            name: "Burst",
            systems: [(
                name: "Puff",
                emitters: [Burst((spawn_count_min: {count}, spawn_count_range: 0))],
                initializers: [RandomSize((size: 0.5)), VelocityCone((speed: 2.0))],
                finalizers: [
                    Age((lifetime: {lifetime:?})),
                    ApplyVelocity(()),
                    Volume(()),
                ],
                types: [Point(())],
            )],
        )"#
    ))
    .expect("valid effect")
}

fn sparks_on_impact() -> ParticleEffectDescriptor {
    ParticleEffectDescriptor::from_ron_str(
        r#"(
            name: "Sparks",
            systems: [(
                name: "Sparks",
                max_particles: Some(16),
                emitters: [OnEvent((event_name: "Impact", spawn_count_min: 4, spawn_count_range: 0))],
                finalizers: [Age((lifetime: 1.0))],
            )],
        )"#,
    )
    .expect("valid effect")
}

fn seeded_config() -> ParticleWorldConfig {
    ParticleWorldConfig {
        random_seed: Some(1234),
        ..Default::default()
    }
}

#[test]
fn test_finished_effects_release_their_handles() {
    // --- 1. SETUP ---
    let mut world = ParticleWorldModule::new(seeded_config());
    let handle = world.create_effect(&burst_effect(3, 0.25), Transform::IDENTITY);
    assert!(world.is_alive(handle));

    // --- 2. RUN UNTIL THE PARTICLES DIE ---
    world.update(0.125);
    assert_eq!(world.stats().particles_alive, 3);
    world.update(0.125);

    // --- 3. ASSERTIONS ---
    assert!(!world.is_alive(handle));
    assert_eq!(world.effect_count(), 0);
    assert_eq!(world.stats().effects_finished, 1);
    assert!(matches!(
        world.destroy_effect(handle),
        Err(ParticleError::StaleHandle(_))
    ));

    // The slot is reused, the old handle stays stale.
    let reused = world.create_effect(&burst_effect(3, 0.25), Transform::IDENTITY);
    assert_ne!(reused, handle);
    assert!(world.is_alive(reused));
    assert!(world.effect(handle).is_none());
}

#[test]
fn test_destroy_effect() {
    let mut world = ParticleWorldModule::new(seeded_config());
    let handle = world.create_effect(&burst_effect(3, 5.0), Transform::IDENTITY);
    world.update(0.125);

    assert!(world.destroy_effect(handle).is_ok());
    assert!(!world.is_alive(handle));
    world.update(0.125);
    assert_eq!(world.stats().particles_alive, 0);
}

#[test]
fn test_posted_events_spawn_on_the_following_frame() {
    let mut world = ParticleWorldModule::new(seeded_config());
    let handle = world.create_effect(&sparks_on_impact(), Transform::IDENTITY);

    world.post_event(ParticleEvent::new("Impact", Vec3::ZERO));
    world.update(0.125);
    assert_eq!(world.effect(handle).unwrap().num_active_particles(), 0);
    assert_eq!(world.stats().events_processed, 1);

    world.update(0.125);
    assert_eq!(world.effect(handle).unwrap().num_active_particles(), 4);

    // Events from another thread go through the same bus.
    let sender = world.event_sender();
    std::thread::spawn(move || {
        sender
            .send(ParticleEvent::new("Impact", Vec3::ONE))
            .unwrap();
    })
    .join()
    .unwrap();
    world.update(0.125);
    world.update(0.125);
    assert_eq!(world.effect(handle).unwrap().num_active_particles(), 8);
    assert!(world.is_alive(handle));
}

#[test]
fn test_many_effects_update_in_parallel() {
    let mut world = ParticleWorldModule::new(ParticleWorldConfig {
        random_seed: Some(99),
        stats_log_interval_frames: 1,
        ..Default::default()
    });
    let descriptor = burst_effect(5, 10.0);
    for i in 0..32 {
        world.create_effect(
            &descriptor,
            Transform::from_position(Vec3::new(i as f32, 0.0, 0.0)),
        );
    }

    world.update(0.125);

    let stats = world.stats();
    assert_eq!(stats.effects_alive, 32);
    assert_eq!(stats.systems_alive, 32);
    assert_eq!(stats.particles_spawned, 160);
    assert_eq!(stats.particles_alive, 160);
    assert_eq!(stats.particles_dropped, 0);
    assert_eq!(stats.frames, 1);

    let extracted = world.extract_render_data();
    assert_eq!(extracted.len(), 32);
    assert_eq!(extracted.iter().map(|e| e.len()).sum::<usize>(), 160);

    let phases = world.phase_timings();
    assert!(phases.iter().any(|p| p.name == "update_effects"));
    assert!(phases.iter().any(|p| p.name == "extract"));
}

#[test]
fn test_distance_lod_thins_far_effects() {
    let mut world = ParticleWorldModule::new(ParticleWorldConfig {
        random_seed: Some(5),
        lod: LodConfig {
            thresholds: vec![10.0, 20.0],
            spawn_scales: vec![1.0, 0.5],
        },
        ..Default::default()
    });
    let descriptor = burst_effect(20, 10.0);
    let near = world.create_effect(&descriptor, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
    let far = world.create_effect(&descriptor, Transform::from_position(Vec3::new(100.0, 0.0, 0.0)));
    world.set_viewer_position(Some(Vec3::ZERO));

    world.update(0.125);

    assert_eq!(world.effect(near).unwrap().num_active_particles(), 20);
    assert_eq!(world.effect(far).unwrap().num_active_particles(), 10);
}

#[test]
fn test_same_seed_gives_same_world() {
    let run = || {
        let mut world = ParticleWorldModule::new(seeded_config());
        let handle = world.create_effect(&burst_effect(10, 10.0), Transform::IDENTITY);
        for _ in 0..4 {
            world.update(0.0625);
        }
        world
            .effect(handle)
            .unwrap()
            .bounding_volume()
            .expect("bounds")
    };
    assert_eq!(run(), run());
}

#[test]
fn test_effects_and_config_load_from_files() {
    let mut effect_file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
    write!(
        effect_file,
        "{}",
        burst_effect(6, 1.0).to_ron_string().unwrap()
    )
    .unwrap();

    let mut config_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(config_file, r#"{{ "random_seed": 3, "max_particles_per_system": 4 }}"#).unwrap();

    let config = ParticleWorldConfig::from_file(config_file.path()).unwrap();
    assert_eq!(config.max_particles_per_system, 4);

    let mut world = ParticleWorldModule::new(config);
    let handle = world
        .create_effect_from_file(effect_file.path(), Transform::IDENTITY)
        .unwrap();
    world.update(0.125);
    assert_eq!(world.effect(handle).unwrap().num_active_particles(), 4);
    assert_eq!(world.stats().particles_dropped, 2);

    let missing = world.create_effect_from_file("does/not/exist.ron", Transform::IDENTITY);
    assert!(matches!(missing, Err(ParticleError::Descriptor(_))));
}

#[test]
fn test_fountain_demo_asset_runs() {
    let descriptor = ParticleEffectDescriptor::from_ron_str(include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../demos/fountain/assets/fountain.ron"
    )))
    .expect("demo asset parses");
    assert_eq!(descriptor.systems.len(), 2);

    let mut world = ParticleWorldModule::new(seeded_config());
    let fountain = world.create_effect(&descriptor, Transform::IDENTITY);
    for frame in 0..120 {
        if frame == 30 {
            world.post_event(ParticleEvent::new("Splash", Vec3::ZERO));
        }
        world.update(1.0 / 60.0);
    }

    let effect = world.effect(fountain).expect("fountain keeps running");
    assert!(effect.num_active_particles() > 0);
    assert!(effect.bounding_volume().is_some());
    for system in effect.systems() {
        assert!(system.num_active_particles() <= system.max_particles());
    }
    assert_eq!(world.stats().particles_dropped, 0);
}
