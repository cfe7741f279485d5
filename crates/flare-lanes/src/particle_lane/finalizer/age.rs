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

use crate::particle_lane::{streams, ParticleFrame};
use bincode::{Decode, Encode};
use flare_core::random::RandomExt;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDeclaration, StreamId, StreamLayout,
    StreamProcessor,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Shortest lifetime a particle can be given, in seconds.
const MIN_LIFETIME: f32 = 1e-4;

/// Configuration of an [`AgeFinalizer`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct AgeFinalizerDescriptor {
    /// Mean lifetime in seconds.
    pub lifetime: f32,
    /// Maximum deviation from `lifetime`, either way.
    pub lifetime_variance: f32,
}

impl AgeFinalizerDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;

    /// The longest lifetime a particle can be given.
    pub fn max_lifetime(&self) -> f32 {
        (self.lifetime + self.lifetime_variance.abs()).max(MIN_LIFETIME)
    }
}

impl Default for AgeFinalizerDescriptor {
    fn default() -> Self {
        Self {
            lifetime: 1.0,
            lifetime_variance: 0.0,
        }
    }
}

/// Gives every particle a lifetime and removes it once that has run out.
///
/// `LifeTime` holds `[remaining seconds, 1 / total seconds]`, so
/// `1 - remaining * inverse` is the normalized age.
pub struct AgeFinalizer {
    descriptor: AgeFinalizerDescriptor,
    lifetime: Option<StreamId>,
}

impl AgeFinalizer {
    /// Creates the finalizer.
    pub fn new(descriptor: AgeFinalizerDescriptor) -> Self {
        Self {
            descriptor,
            lifetime: None,
        }
    }
}

impl StreamProcessor<ParticleFrame> for AgeFinalizer {
    fn name(&self) -> &str {
        "Age"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::lifetime()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.lifetime = Some(layout.bind(&streams::lifetime())?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, range: Range<usize>) {
        let Some(lifetime) = self.lifetime else { return };
        for index in range {
            let total = frame
                .rng
                .float_variance(self.descriptor.lifetime, self.descriptor.lifetime_variance)
                .max(MIN_LIFETIME);
            frame.slice_mut::<[f32; 2]>(lifetime)[index] = [total, 1.0 / total];
        }
    }

    fn process(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, active_count: usize) {
        let Some(lifetime) = self.lifetime else { return };
        let dt = frame.env.delta_time;

        for index in 0..active_count {
            let entry = &mut frame.slice_mut::<[f32; 2]>(lifetime)[index];
            entry[0] -= dt;
            if entry[0] <= 0.0 {
                frame.remove_element(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_lane::testing::{
        assert_only_range_written, group_with, initialize_over_nan, rng, stream,
    };
    use approx::assert_relative_eq;

    #[test]
    fn lifetimes_count_down_and_expired_particles_are_removed() {
        // --- 1. SETUP ---
        let mut group = group_with(
            4,
            vec![Box::new(AgeFinalizer::new(AgeFinalizerDescriptor {
                lifetime: 1.0,
                lifetime_variance: 0.0,
            }))],
        );
        let mut env = ParticleFrame::default();
        let mut rng = rng(2);
        group.spawn(4, &mut env, &mut rng);
        let entry = stream(&group, &streams::lifetime()).as_slice::<[f32; 2]>()[0];
        assert_relative_eq!(entry[0], 1.0);
        assert_relative_eq!(entry[1], 1.0);

        // --- 2. HALF A LIFETIME ---
        env.delta_time = 0.5;
        group.process(&mut env, &mut rng);
        assert_eq!(group.active(), 4);
        let entry = stream(&group, &streams::lifetime()).as_slice::<[f32; 2]>()[3];
        assert_relative_eq!(entry[0], 0.5);

        // --- 3. EXPIRY ---
        group.process(&mut env, &mut rng);
        assert_eq!(group.active(), 0);
    }

    #[test]
    fn writes_every_lifetime_of_its_range() {
        let mut finalizer = AgeFinalizer::new(AgeFinalizerDescriptor {
            lifetime: 2.0,
            lifetime_variance: 0.5,
        });
        let streams = initialize_over_nan(&mut finalizer, 6, 3..6);
        assert_only_range_written(&streams[0], 6, 3..6);
    }
}
