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

/// Configuration of a [`RandomSizeInitializer`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct RandomSizeInitializerDescriptor {
    /// Mean size.
    pub size: f32,
    /// Maximum deviation from `size`, either way.
    pub variance: f32,
}

impl RandomSizeInitializerDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for RandomSizeInitializerDescriptor {
    fn default() -> Self {
        Self {
            size: 1.0,
            variance: 0.0,
        }
    }
}

/// Writes a random, non-negative `Size` into each new particle.
pub struct RandomSizeInitializer {
    descriptor: RandomSizeInitializerDescriptor,
    size: Option<StreamId>,
}

impl RandomSizeInitializer {
    /// Creates the initializer.
    pub fn new(descriptor: RandomSizeInitializerDescriptor) -> Self {
        Self {
            descriptor,
            size: None,
        }
    }
}

impl StreamProcessor<ParticleFrame> for RandomSizeInitializer {
    fn name(&self) -> &str {
        "RandomSize"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::size()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.size = Some(layout.bind(&streams::size())?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, range: Range<usize>) {
        let Some(size) = self.size else { return };
        for index in range {
            let value = frame
                .rng
                .float_variance(self.descriptor.size, self.descriptor.variance)
                .max(0.0);
            frame.slice_mut::<f32>(size)[index] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_lane::testing::{
        assert_only_range_written, group_with, initialize_over_nan, rng, stream,
    };

    #[test]
    fn sizes_stay_within_variance_and_never_go_negative() {
        let mut group = group_with(
            64,
            vec![Box::new(RandomSizeInitializer::new(RandomSizeInitializerDescriptor {
                size: 0.25,
                variance: 0.5,
            }))],
        );
        group.spawn(64, &mut ParticleFrame::default(), &mut rng(8));

        let sizes = stream(&group, &streams::size()).as_slice::<f32>();
        assert!(sizes.iter().all(|s| (0.0..=0.75).contains(s)));
    }

    #[test]
    fn writes_every_size_of_its_range() {
        let mut initializer = RandomSizeInitializer::new(RandomSizeInitializerDescriptor::default());
        let streams = initialize_over_nan(&mut initializer, 10, 0..7);
        assert_only_range_written(&streams[0], 10, 0..7);
    }
}
