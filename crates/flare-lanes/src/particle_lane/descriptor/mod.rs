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

//! Serializable templates of particle systems and effects.
//!
//! A [`ParticleSystemDescriptor`] lists the emitters, initializers,
//! behaviors, finalizers and render types of a system. Descriptors load from
//! RON text and from a compact version-tagged binary format, and build the
//! runtime processors.

mod binary;

use self::binary::{binary_descriptor_enum, read_list, write_list, BinaryDescriptor, Reader, Writer};
use super::behavior::{DragBehavior, DragBehaviorDescriptor, GravityBehavior, GravityBehaviorDescriptor};
use super::emitter::{
    BurstEmitter, BurstEmitterDescriptor, ContinuousEmitter, ContinuousEmitterDescriptor,
    MaxParticleCount, OnEventEmitter, OnEventEmitterDescriptor, ParticleEmitter,
};
use super::finalizer::{AgeFinalizer, AgeFinalizerDescriptor, ApplyVelocityFinalizer, VolumeFinalizer};
use super::initializer::{
    RandomColorInitializer, RandomColorInitializerDescriptor, RandomSizeInitializer,
    RandomSizeInitializerDescriptor, VelocityConeInitializer, VelocityConeInitializerDescriptor,
};
use super::types::{ParticleType, PointType};
use super::{DescriptorError, ParticleParameters, ParticleProcessor};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the binary system and effect containers.
pub const CONTAINER_VERSION: u8 = 1;

/// Descriptor of a processor with no configuration (binary version 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct UnitDescriptor;

impl UnitDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

/// Any emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmitterDescriptor {
    /// A [`BurstEmitter`].
    Burst(BurstEmitterDescriptor),
    /// A [`ContinuousEmitter`].
    Continuous(ContinuousEmitterDescriptor),
    /// An [`OnEventEmitter`].
    OnEvent(OnEventEmitterDescriptor),
}

binary_descriptor_enum!("emitter", EmitterDescriptor {
    0 => Burst(BurstEmitterDescriptor),
    1 => Continuous(ContinuousEmitterDescriptor),
    2 => OnEvent(OnEventEmitterDescriptor),
});

impl EmitterDescriptor {
    /// Builds the runtime emitter.
    pub fn build(&self) -> Box<dyn ParticleEmitter> {
        match self {
            EmitterDescriptor::Burst(d) => Box::new(BurstEmitter::new(d.clone())),
            EmitterDescriptor::Continuous(d) => Box::new(ContinuousEmitter::new(d.clone())),
            EmitterDescriptor::OnEvent(d) => Box::new(OnEventEmitter::new(d.clone())),
        }
    }

    /// The emitter's upper bound, without density scaling.
    pub fn max_particle_count(&self) -> MaxParticleCount {
        self.build().query_max_particle_count()
    }
}

/// Any initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitializerDescriptor {
    /// A [`RandomColorInitializer`].
    RandomColor(RandomColorInitializerDescriptor),
    /// A [`RandomSizeInitializer`].
    RandomSize(RandomSizeInitializerDescriptor),
    /// A [`VelocityConeInitializer`].
    VelocityCone(VelocityConeInitializerDescriptor),
}

binary_descriptor_enum!("initializer", InitializerDescriptor {
    0 => RandomColor(RandomColorInitializerDescriptor),
    1 => RandomSize(RandomSizeInitializerDescriptor),
    2 => VelocityCone(VelocityConeInitializerDescriptor),
});

impl InitializerDescriptor {
    /// Builds the runtime processor.
    pub fn build(&self) -> ParticleProcessor {
        match self {
            InitializerDescriptor::RandomColor(d) => Box::new(RandomColorInitializer::new(d.clone())),
            InitializerDescriptor::RandomSize(d) => Box::new(RandomSizeInitializer::new(d.clone())),
            InitializerDescriptor::VelocityCone(d) => {
                Box::new(VelocityConeInitializer::new(d.clone()))
            }
        }
    }
}

/// Any behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorDescriptor {
    /// A [`GravityBehavior`].
    Gravity(GravityBehaviorDescriptor),
    /// A [`DragBehavior`].
    Drag(DragBehaviorDescriptor),
}

binary_descriptor_enum!("behavior", BehaviorDescriptor {
    0 => Gravity(GravityBehaviorDescriptor),
    1 => Drag(DragBehaviorDescriptor),
});

impl BehaviorDescriptor {
    /// Builds the runtime processor.
    pub fn build(&self) -> ParticleProcessor {
        match self {
            BehaviorDescriptor::Gravity(d) => Box::new(GravityBehavior::new(d.clone())),
            BehaviorDescriptor::Drag(d) => Box::new(DragBehavior::new(d.clone())),
        }
    }
}

/// Any finalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinalizerDescriptor {
    /// An [`AgeFinalizer`].
    Age(AgeFinalizerDescriptor),
    /// An [`ApplyVelocityFinalizer`].
    ApplyVelocity(UnitDescriptor),
    /// A [`VolumeFinalizer`].
    Volume(UnitDescriptor),
}

binary_descriptor_enum!("finalizer", FinalizerDescriptor {
    0 => Age(AgeFinalizerDescriptor),
    1 => ApplyVelocity(UnitDescriptor),
    2 => Volume(UnitDescriptor),
});

impl FinalizerDescriptor {
    /// Builds the runtime processor.
    pub fn build(&self) -> ParticleProcessor {
        match self {
            FinalizerDescriptor::Age(d) => Box::new(AgeFinalizer::new(d.clone())),
            FinalizerDescriptor::ApplyVelocity(_) => Box::new(ApplyVelocityFinalizer::new()),
            FinalizerDescriptor::Volume(_) => Box::new(VolumeFinalizer::new()),
        }
    }
}

/// Any render type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// A [`PointType`].
    Point(UnitDescriptor),
}

binary_descriptor_enum!("type", TypeDescriptor {
    0 => Point(UnitDescriptor),
});

impl TypeDescriptor {
    /// Builds the runtime type.
    pub fn build(&self) -> Box<dyn ParticleType> {
        match self {
            TypeDescriptor::Point(_) => Box::new(PointType::new()),
        }
    }
}

/// Template of one particle system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystemDescriptor {
    /// Display name.
    pub name: String,
    /// Particle lifetime in seconds assumed for sizing when no age finalizer
    /// states one.
    pub lifetime_hint: f32,
    /// Fixed capacity, overriding the computed one.
    pub max_particles: Option<u32>,
    /// Emitters.
    pub emitters: Vec<EmitterDescriptor>,
    /// Initializers, run in order on new particles.
    pub initializers: Vec<InitializerDescriptor>,
    /// Behaviors, run in order every update.
    pub behaviors: Vec<BehaviorDescriptor>,
    /// Finalizers, run in order after the behaviors.
    pub finalizers: Vec<FinalizerDescriptor>,
    /// Render types.
    pub types: Vec<TypeDescriptor>,
}

impl Default for ParticleSystemDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            lifetime_hint: 1.0,
            max_particles: None,
            emitters: Vec::new(),
            initializers: Vec::new(),
            behaviors: Vec::new(),
            finalizers: Vec::new(),
            types: Vec::new(),
        }
    }
}

impl ParticleSystemDescriptor {
    /// The longest particle lifetime this system can produce.
    pub fn max_lifetime(&self) -> f32 {
        self.finalizers
            .iter()
            .filter_map(|finalizer| match finalizer {
                FinalizerDescriptor::Age(age) => Some(age.max_lifetime()),
                _ => None,
            })
            .reduce(f32::max)
            .unwrap_or(self.lifetime_hint.max(0.0))
    }

    /// Capacity needed to never drop a spawn: `absolute + per_second *
    /// max_lifetime` over all emitters, scaled by `density` and clamped to
    /// `[1, hard_cap]`.
    pub fn query_max_particle_count(&self, hard_cap: usize, density: f32) -> usize {
        let hard_cap = hard_cap.max(1);
        if let Some(fixed) = self.max_particles {
            return (fixed as usize).clamp(1, hard_cap);
        }

        let sum = self
            .emitters
            .iter()
            .map(EmitterDescriptor::max_particle_count)
            .fold(MaxParticleCount::default(), |acc, count| acc + count);
        let wanted = (sum.absolute as f32 + sum.per_second * self.max_lifetime()) * density.max(0.0);
        if !wanted.is_finite() || wanted >= hard_cap as f32 {
            return hard_cap;
        }
        (wanted.ceil() as usize).clamp(1, hard_cap)
    }

    /// Parses a system from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, DescriptorError> {
        ron::from_str(text).map_err(|e| DescriptorError::Ron(e.to_string()))
    }

    /// Writes the system as pretty RON text.
    pub fn to_ron_string(&self) -> Result<String, DescriptorError> {
        to_pretty_ron(self)
    }

    /// Encodes the system in the binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut writer = Writer::new();
        writer.write_u8(CONTAINER_VERSION);
        self.write_body(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Decodes a system from the binary format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let mut reader = Reader::new(bytes);
        check_container_version(&mut reader, "ParticleSystem")?;
        Self::read_body(&mut reader)
    }

    fn write_body(&self, writer: &mut Writer) -> Result<(), DescriptorError> {
        writer.write(&self.name)?;
        writer.write(&self.lifetime_hint)?;
        writer.write(&self.max_particles)?;
        write_list(writer, &self.emitters)?;
        write_list(writer, &self.initializers)?;
        write_list(writer, &self.behaviors)?;
        write_list(writer, &self.finalizers)?;
        write_list(writer, &self.types)
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self, DescriptorError> {
        Ok(Self {
            name: reader.read()?,
            lifetime_hint: reader.read()?,
            max_particles: reader.read()?,
            emitters: read_list(reader)?,
            initializers: read_list(reader)?,
            behaviors: read_list(reader)?,
            finalizers: read_list(reader)?,
            types: read_list(reader)?,
        })
    }
}

/// A named effect parameter and its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ParameterDescriptor {
    /// Parameter name.
    pub name: String,
    /// Value an effect starts with.
    pub default: f32,
}

/// Template of an effect: several systems sharing a transform and parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleEffectDescriptor {
    /// Display name.
    pub name: String,
    /// The effect's systems.
    pub systems: Vec<ParticleSystemDescriptor>,
    /// The effect's parameters.
    pub parameters: Vec<ParameterDescriptor>,
}

impl ParticleEffectDescriptor {
    /// The parameters with their default values.
    pub fn default_parameters(&self) -> ParticleParameters {
        let mut parameters = ParticleParameters::new();
        for parameter in &self.parameters {
            parameters.set(parameter.name.as_str(), parameter.default);
        }
        parameters
    }

    /// Parses an effect from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, DescriptorError> {
        ron::from_str(text).map_err(|e| DescriptorError::Ron(e.to_string()))
    }

    /// Loads an effect from a RON file.
    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Writes the effect as pretty RON text.
    pub fn to_ron_string(&self) -> Result<String, DescriptorError> {
        to_pretty_ron(self)
    }

    /// Encodes the effect in the binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut writer = Writer::new();
        writer.write_u8(CONTAINER_VERSION);
        writer.write(&self.name)?;
        writer.write(&self.parameters)?;
        writer.write(&(self.systems.len() as u32))?;
        for system in &self.systems {
            system.write_body(&mut writer)?;
        }
        Ok(writer.into_bytes())
    }

    /// Decodes an effect from the binary format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let mut reader = Reader::new(bytes);
        check_container_version(&mut reader, "ParticleEffect")?;
        let name = reader.read()?;
        let parameters = reader.read()?;
        let count: u32 = reader.read()?;
        let systems = (0..count)
            .map(|_| ParticleSystemDescriptor::read_body(&mut reader))
            .collect::<Result<_, _>>()?;
        if !reader.is_empty() {
            log::warn!("Ignoring trailing bytes after effect '{name}'.");
        }
        Ok(Self {
            name,
            systems,
            parameters,
        })
    }
}

fn check_container_version(reader: &mut Reader<'_>, kind: &'static str) -> Result<(), DescriptorError> {
    let found = reader.read_u8()?;
    if found > CONTAINER_VERSION {
        return Err(DescriptorError::UnsupportedVersion {
            kind,
            found,
            supported: CONTAINER_VERSION,
        });
    }
    Ok(())
}

fn to_pretty_ron<T: Serialize>(value: &T) -> Result<String, DescriptorError> {
    let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    ron::ser::to_string_pretty(value, pretty_config).map_err(|e| DescriptorError::Ron(e.to_string()))
}

#[cfg(test)]
mod tests;
