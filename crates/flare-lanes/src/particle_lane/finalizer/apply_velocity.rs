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
use flare_core::math::Vec3;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDeclaration, StreamId, StreamLayout,
    StreamProcessor,
};
use std::ops::Range;

/// Places new particles at the system origin and integrates
/// `Position += Velocity * dt` every pass.
#[derive(Default)]
pub struct ApplyVelocityFinalizer {
    position: Option<StreamId>,
    velocity: Option<StreamId>,
}

impl ApplyVelocityFinalizer {
    /// Creates the finalizer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamProcessor<ParticleFrame> for ApplyVelocityFinalizer {
    fn name(&self) -> &str {
        "ApplyVelocity"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::position(), streams::velocity()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.position = Some(layout.bind(&streams::position())?);
        self.velocity = Some(layout.bind(&streams::velocity())?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, range: Range<usize>) {
        let Some(position) = self.position else { return };
        let origin = frame.env.transform.position;
        frame.slice_mut::<Vec3>(position)[range].fill(origin);
    }

    fn process(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, active_count: usize) {
        let (Some(position), Some(velocity)) = (self.position, self.velocity) else {
            return;
        };
        let dt = frame.env.delta_time;
        let (velocities, positions) = frame.read_write::<Vec3, Vec3>(velocity, position);
        for (p, v) in positions[..active_count].iter_mut().zip(&velocities[..active_count]) {
            *p += *v * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_lane::testing::{group_with, rng, stream, stream_mut};
    use approx::assert_relative_eq;
    use flare_core::math::Transform;

    #[test]
    fn spawns_at_the_origin_and_integrates_velocity() {
        // --- 1. SETUP ---
        let mut group = group_with(4, vec![Box::new(ApplyVelocityFinalizer::new())]);
        let mut env = ParticleFrame {
            transform: Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            ..Default::default()
        };
        let mut rng = rng(1);
        group.spawn(2, &mut env, &mut rng);
        let positions = stream(&group, &streams::position()).as_slice::<Vec3>();
        assert_eq!(&positions[..2], &[Vec3::new(1.0, 2.0, 3.0); 2]);

        // --- 2. INTEGRATION ---
        stream_mut(&mut group, &streams::velocity()).as_slice_mut::<Vec3>()[..2]
            .copy_from_slice(&[Vec3::new(1.0, 2.0, 0.0), Vec3::new(0.0, 0.0, -4.0)]);
        env.delta_time = 0.25;
        group.process(&mut env, &mut rng);

        let positions = stream(&group, &streams::position()).as_slice::<Vec3>();
        assert_relative_eq!(positions[0].x, 1.25);
        assert_relative_eq!(positions[0].y, 2.5);
        assert_relative_eq!(positions[1].z, 2.0);

        // --- 3. LATER SPAWNS START FROM THE CURRENT ORIGIN ---
        env.transform = Transform::from_position(Vec3::new(-5.0, 0.0, 0.0));
        let range = group.spawn(1, &mut env, &mut rng);
        let positions = stream(&group, &streams::position()).as_slice::<Vec3>();
        assert_eq!(positions[range.start], Vec3::new(-5.0, 0.0, 0.0));
    }
}
