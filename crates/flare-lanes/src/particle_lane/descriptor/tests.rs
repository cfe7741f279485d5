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

use super::binary::Writer;
use super::*;
use approx::assert_relative_eq;

const FOUNTAIN: &str = r#"
(
    name: "Fountain",
    systems: [
        (
            name: "Spray",
            emitters: [
                Burst((spawn_count_min: 10, spawn_count_range: 5)),
                Continuous((spawn_count_per_sec: 20.0)),
            ],
            initializers: [
                RandomSize((size: 0.25, variance: 0.05)),
                VelocityCone((angle_degrees: 30.0, speed: 4.0)),
            ],
            behaviors: [
                Gravity((gravity: (x: 0.0, y: -9.81, z: 0.0))),
                Drag((drag: 0.5)),
            ],
            finalizers: [
                Age((lifetime: 2.0, lifetime_variance: 0.5)),
                ApplyVelocity(()),
                Volume(()),
            ],
            types: [Point(())],
        ),
    ],
    parameters: [(name: "Intensity", default: 1.5)],
)
"#;

fn fountain() -> ParticleEffectDescriptor {
    ParticleEffectDescriptor::from_ron_str(FOUNTAIN).expect("sample effect parses")
}

#[test]
fn test_ron_sample_parses_with_defaults() {
    let effect = fountain();
    assert_eq!(effect.name, "Fountain");
    assert_eq!(effect.systems.len(), 1);

    let spray = &effect.systems[0];
    assert_eq!(spray.emitters.len(), 2);
    assert_eq!(spray.finalizers.len(), 3);
    assert_eq!(spray.max_particles, None);
    match &spray.behaviors[0] {
        BehaviorDescriptor::Gravity(gravity) => {
            assert_eq!(gravity.gravity.x, 0.0);
            assert_relative_eq!(gravity.gravity.y, -9.81);
        }
        other => panic!("expected gravity, got {other:?}"),
    }
    match &spray.emitters[0] {
        EmitterDescriptor::Burst(burst) => {
            assert_eq!(burst.spawn_count_min, 10);
            assert!(burst.spawn_count_scale_parameter.is_empty());
        }
        _ => panic!("expected a burst emitter first"),
    }

    let parameters = effect.default_parameters();
    assert_eq!(parameters.get(&"Intensity".into()), Some(1.5));
}

#[test]
fn test_ron_text_round_trips() {
    let effect = fountain();
    let text = effect.to_ron_string().expect("serializes");
    let reparsed = ParticleEffectDescriptor::from_ron_str(&text).expect("reparses");
    assert_eq!(reparsed, effect);
}

#[test]
fn test_invalid_ron_reports_error() {
    let err = ParticleSystemDescriptor::from_ron_str("(emitters: [Fire(())])").unwrap_err();
    assert!(matches!(err, DescriptorError::Ron(_)));
}

#[test]
fn test_binary_round_trips() {
    let effect = fountain();
    let bytes = effect.to_bytes().expect("encodes");
    let decoded = ParticleEffectDescriptor::from_bytes(&bytes).expect("decodes");
    assert_eq!(decoded, effect);

    let system = &effect.systems[0];
    let decoded = ParticleSystemDescriptor::from_bytes(&system.to_bytes().expect("encodes"))
        .expect("decodes");
    assert_eq!(&decoded, system);
}

#[test]
fn test_newer_container_version_is_rejected() {
    let mut bytes = fountain().to_bytes().expect("encodes");
    bytes[0] = CONTAINER_VERSION + 1;
    let err = ParticleEffectDescriptor::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        DescriptorError::UnsupportedVersion { kind: "ParticleEffect", found: 2, supported: 1 }
    ));
}

/// Writes a system header followed by a single emitter entry.
fn system_with_raw_emitter(tag: u8, version: u8) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_u8(CONTAINER_VERSION);
    writer.write(&String::from("Raw")).unwrap();
    writer.write(&1.0f32).unwrap();
    writer.write(&None::<u32>).unwrap();
    writer.write(&1u32).unwrap();
    writer.write_u8(tag);
    writer
        .write_versioned(version, &BurstEmitterDescriptor::default())
        .unwrap();
    for _ in 0..4 {
        writer.write(&0u32).unwrap();
    }
    writer.into_bytes()
}

#[test]
fn test_newer_payload_version_is_rejected() {
    let bytes = system_with_raw_emitter(0, BurstEmitterDescriptor::VERSION);
    let system = ParticleSystemDescriptor::from_bytes(&bytes).expect("current version decodes");
    assert_eq!(system.emitters, vec![EmitterDescriptor::Burst(Default::default())]);

    let bytes = system_with_raw_emitter(0, 9);
    let err = ParticleSystemDescriptor::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        DescriptorError::UnsupportedVersion { kind: "Burst", found: 9, supported: 1 }
    ));
}

#[test]
fn test_unknown_kind_tag_is_rejected() {
    let bytes = system_with_raw_emitter(7, 1);
    let err = ParticleSystemDescriptor::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, DescriptorError::UnknownKind { family: "emitter", tag: 7 }));
}

#[test]
fn test_truncated_bytes_fail() {
    let bytes = fountain().to_bytes().expect("encodes");
    assert!(ParticleEffectDescriptor::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    assert!(matches!(
        ParticleEffectDescriptor::from_bytes(&[]),
        Err(DescriptorError::UnexpectedEof)
    ));
}

#[test]
fn test_max_particle_count_covers_emitters_over_lifetime() {
    // --- 1. SETUP ---
    // Burst: 10 + 5. Continuous: 1 + 20/s. Max lifetime 2.5s.
    let spray = fountain().systems.remove(0);

    // --- 2. ASSERTIONS ---
    assert_eq!(spray.max_lifetime(), 2.5);
    assert_eq!(spray.query_max_particle_count(10_000, 1.0), 66);
    assert_eq!(spray.query_max_particle_count(10_000, 0.5), 33);
    assert_eq!(spray.query_max_particle_count(40, 1.0), 40);

    let fixed = ParticleSystemDescriptor {
        max_particles: Some(5),
        ..spray.clone()
    };
    assert_eq!(fixed.query_max_particle_count(10_000, 1.0), 5);

    let empty = ParticleSystemDescriptor::default();
    assert_eq!(empty.max_lifetime(), 1.0);
    assert_eq!(empty.query_max_particle_count(10_000, 1.0), 1);
}

#[test]
fn test_descriptors_build_runtime_objects() {
    let spray = fountain().systems.remove(0);

    let emitters: Vec<_> = spray.emitters.iter().map(EmitterDescriptor::build).collect();
    assert_eq!(emitters.len(), 2);

    let processors: Vec<ParticleProcessor> = spray
        .initializers
        .iter()
        .map(InitializerDescriptor::build)
        .chain(spray.behaviors.iter().map(BehaviorDescriptor::build))
        .chain(spray.finalizers.iter().map(FinalizerDescriptor::build))
        .collect();
    assert_eq!(processors.len(), 7);

    let types: Vec<_> = spray.types.iter().map(TypeDescriptor::build).collect();
    assert_eq!(types.len(), 1);
}
