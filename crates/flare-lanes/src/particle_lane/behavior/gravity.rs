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
use flare_core::math::Vec3;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDeclaration, StreamId, StreamLayout,
    StreamProcessor,
};
use serde::{Deserialize, Serialize};

/// Configuration of a [`GravityBehavior`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct GravityBehaviorDescriptor {
    /// Acceleration in world units per second squared.
    pub gravity: Vec3,
    /// Multiplier applied to `gravity`.
    pub scale: f32,
}

impl GravityBehaviorDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for GravityBehaviorDescriptor {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            scale: 1.0,
        }
    }
}

/// Accelerates every particle by a constant gravity.
pub struct GravityBehavior {
    acceleration: Vec3,
    velocity: Option<StreamId>,
}

impl GravityBehavior {
    /// Creates the behavior.
    pub fn new(descriptor: GravityBehaviorDescriptor) -> Self {
        Self {
            acceleration: descriptor.gravity * descriptor.scale,
            velocity: None,
        }
    }
}

impl StreamProcessor<ParticleFrame> for GravityBehavior {
    fn name(&self) -> &str {
        "Gravity"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::velocity()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.velocity = Some(layout.bind(&streams::velocity())?);
        Ok(())
    }

    fn process(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, active_count: usize) {
        let Some(velocity) = self.velocity else { return };
        let delta = self.acceleration * frame.env.delta_time;
        for v in &mut frame.slice_mut::<Vec3>(velocity)[..active_count] {
            *v += delta;
        }
    }
}
