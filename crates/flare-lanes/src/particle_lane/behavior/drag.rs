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

/// Configuration of a [`DragBehavior`] (binary version 1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct DragBehaviorDescriptor {
    /// Fraction of velocity lost per second.
    pub drag: f32,
}

impl DragBehaviorDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

/// Slows every particle down linearly with time.
pub struct DragBehavior {
    drag: f32,
    velocity: Option<StreamId>,
}

impl DragBehavior {
    /// Creates the behavior.
    pub fn new(descriptor: DragBehaviorDescriptor) -> Self {
        Self {
            drag: descriptor.drag.max(0.0),
            velocity: None,
        }
    }
}

impl StreamProcessor<ParticleFrame> for DragBehavior {
    fn name(&self) -> &str {
        "Drag"
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
        let factor = (1.0 - self.drag * frame.env.delta_time).max(0.0);
        for v in &mut frame.slice_mut::<Vec3>(velocity)[..active_count] {
            *v *= factor;
        }
    }
}
