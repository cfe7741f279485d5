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

use crate::particle_lane::{streams, ColorGradient, ParticleFrame};
use bincode::{Decode, Encode};
use flare_core::math::LinearRgba;
use flare_core::random::RandomExt;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDeclaration, StreamId, StreamLayout,
    StreamProcessor,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Configuration of a [`RandomColorInitializer`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct RandomColorInitializerDescriptor {
    /// Gradient sampled at a random position; `None` falls back to the two colors.
    pub gradient: Option<ColorGradient>,
    /// Multiplied into every gradient sample.
    pub tint: LinearRgba,
    /// First end of the fallback range.
    pub color1: LinearRgba,
    /// Second end of the fallback range.
    pub color2: LinearRgba,
}

impl RandomColorInitializerDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for RandomColorInitializerDescriptor {
    fn default() -> Self {
        Self {
            gradient: None,
            tint: LinearRgba::WHITE,
            color1: LinearRgba::WHITE,
            color2: LinearRgba::WHITE,
        }
    }
}

/// Writes a random `Color` into each new particle.
pub struct RandomColorInitializer {
    descriptor: RandomColorInitializerDescriptor,
    color: Option<StreamId>,
}

impl RandomColorInitializer {
    /// Creates the initializer.
    pub fn new(descriptor: RandomColorInitializerDescriptor) -> Self {
        Self {
            descriptor,
            color: None,
        }
    }
}

impl StreamProcessor<ParticleFrame> for RandomColorInitializer {
    fn name(&self) -> &str {
        "RandomColor"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::color()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.color = Some(layout.bind(&streams::color())?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, range: Range<usize>) {
        let Some(color) = self.color else { return };
        let descriptor = &self.descriptor;
        let gradient = descriptor.gradient.as_ref().filter(|g| !g.is_empty());

        for index in range {
            let t = frame.rng.unit_float();
            let value = match gradient {
                Some(gradient) => gradient.sample(t) * descriptor.tint,
                None => LinearRgba::lerp(descriptor.color1, descriptor.color2, t),
            };
            frame.slice_mut::<LinearRgba>(color)[index] = value;
        }
    }
}
