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
use flare_core::math::{Aabb, Vec3};
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDataType, StreamDeclaration, StreamId,
    StreamLayout, StreamProcessor,
};
use flare_core::HashedString;

/// Computes the bounds of the live particles for visibility culling.
///
/// The box encloses every `Position`, inflated by half the largest `Size`
/// when the system has a size stream. The result is written to
/// [`ParticleFrame::bounds`] and [`ParticleFrame::max_particle_size`].
#[derive(Default)]
pub struct VolumeFinalizer {
    position: Option<StreamId>,
    size: Option<StreamId>,
}

impl VolumeFinalizer {
    /// Creates the finalizer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamProcessor<ParticleFrame> for VolumeFinalizer {
    fn name(&self) -> &str {
        "Volume"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::position()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.position = Some(layout.bind(&streams::position())?);
        // Size is optional: without it the bounds are not inflated.
        self.size = layout
            .find(&HashedString::new(streams::SIZE), StreamDataType::Float)
            .ok();
        Ok(())
    }

    fn process(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, active_count: usize) {
        let Some(position) = self.position else { return };

        let bounds = frame.slice::<Vec3>(position)[..active_count]
            .iter()
            .fold(Aabb::INVALID, |aabb, p| aabb.merged_with_point(*p));
        let max_size = self.size.map_or(0.0, |size| {
            frame.slice::<f32>(size)[..active_count]
                .iter()
                .fold(0.0f32, |acc, s| acc.max(*s))
        });

        frame.env.bounds = if bounds.is_valid() {
            bounds.inflated(max_size * 0.5)
        } else {
            bounds
        };
        frame.env.max_particle_size = max_size;
    }
}
