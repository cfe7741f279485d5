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

use flare_core::math::{Aabb, Transform, Vec3};
use flare_core::HashedString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named float parameters of an effect, read by emitters (spawn-count scale)
/// and available to every processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleParameters {
    values: Vec<(HashedString, f32)>,
}

impl ParticleParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, adding it if absent.
    pub fn set(&mut self, name: impl Into<HashedString>, value: f32) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.values.push((name, value)),
        }
    }

    /// The value of `name`, if set.
    pub fn get(&self, name: &HashedString) -> Option<f32> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// The value of `name`, or `default` if unset.
    pub fn get_or(&self, name: &HashedString, default: f32) -> f32 {
        self.get(name).unwrap_or(default)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The per-update environment handed to every particle processor.
///
/// The system fills the inputs before each pass; `Volume` writes `bounds`
/// and `max_particle_size` back.
#[derive(Debug, Clone)]
pub struct ParticleFrame {
    /// Simulated seconds since the previous update.
    pub delta_time: f32,
    /// The system's world transform.
    pub transform: Transform,
    /// Velocity inherited by newly spawned particles.
    pub start_velocity: Vec3,
    /// The owning effect's parameters.
    pub parameters: Arc<ParticleParameters>,
    /// Bounds of the live particles, written by the volume finalizer.
    pub bounds: Aabb,
    /// Largest particle size, written by the volume finalizer.
    pub max_particle_size: f32,
}

impl Default for ParticleFrame {
    fn default() -> Self {
        Self {
            delta_time: 0.0,
            transform: Transform::IDENTITY,
            start_velocity: Vec3::ZERO,
            parameters: Arc::new(ParticleParameters::new()),
            bounds: Aabb::INVALID,
            max_particle_size: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_overwrite_by_name() {
        let mut params = ParticleParameters::new();
        params.set("Intensity", 1.0);
        params.set("Intensity", 3.0);
        params.set("Wind", 0.5);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get(&HashedString::new("Intensity")), Some(3.0));
        assert_eq!(params.get_or(&HashedString::new("Missing"), 7.0), 7.0);
    }
}
