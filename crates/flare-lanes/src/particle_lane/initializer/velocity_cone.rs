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
use flare_core::math::{degrees_to_radians, Vec3, TAU};
use flare_core::random::RandomExt;
use flare_data::stream::{
    ProcessorFrame, StreamBindingError, StreamDeclaration, StreamId, StreamLayout,
    StreamProcessor,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Configuration of a [`VelocityConeInitializer`] (binary version 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct VelocityConeInitializerDescriptor {
    /// Half-angle of the cone around the local +Z axis, in degrees.
    pub angle_degrees: f32,
    /// Mean speed.
    pub speed: f32,
    /// Maximum deviation from `speed`, either way.
    pub speed_variance: f32,
}

impl VelocityConeInitializerDescriptor {
    /// Binary format version.
    pub const VERSION: u8 = 1;
}

impl Default for VelocityConeInitializerDescriptor {
    fn default() -> Self {
        Self {
            angle_degrees: 30.0,
            speed: 1.0,
            speed_variance: 0.0,
        }
    }
}

/// Launches each new particle in a random direction inside a cone.
///
/// Directions are uniform over the cone's spherical cap around local +Z and
/// rotated into world space by the system transform. The system's start
/// velocity is added on top.
pub struct VelocityConeInitializer {
    cos_half_angle: f32,
    speed: f32,
    speed_variance: f32,
    velocity: Option<StreamId>,
}

impl VelocityConeInitializer {
    /// Creates the initializer.
    pub fn new(descriptor: VelocityConeInitializerDescriptor) -> Self {
        let half_angle = degrees_to_radians(descriptor.angle_degrees.clamp(0.0, 180.0));
        Self {
            cos_half_angle: half_angle.cos(),
            speed: descriptor.speed,
            speed_variance: descriptor.speed_variance,
            velocity: None,
        }
    }

    fn sample_direction(&self, u: f32, v: f32) -> Vec3 {
        let cos_theta = 1.0 - u * (1.0 - self.cos_half_angle);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let (sin_phi, cos_phi) = (TAU * v).sin_cos();
        Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
    }
}

impl StreamProcessor<ParticleFrame> for VelocityConeInitializer {
    fn name(&self) -> &str {
        "VelocityCone"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::velocity()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.velocity = Some(layout.bind(&streams::velocity())?);
        Ok(())
    }

    fn initialize_elements(&mut self, frame: &mut ProcessorFrame<'_, ParticleFrame>, range: Range<usize>) {
        let Some(velocity) = self.velocity else { return };
        let rotation = frame.env.transform.rotation;
        let inherited = frame.env.start_velocity;

        for index in range {
            let (u, v) = (frame.rng.unit_float(), frame.rng.unit_float());
            let direction = rotation * self.sample_direction(u, v);
            let speed = frame.rng.float_variance(self.speed, self.speed_variance);
            frame.slice_mut::<Vec3>(velocity)[index] = direction * speed + inherited;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_lane::testing::{assert_only_range_written, initialize_over_nan};
    use approx::assert_relative_eq;

    #[test]
    fn directions_stay_inside_the_cone() {
        let cone = VelocityConeInitializer::new(VelocityConeInitializerDescriptor {
            angle_degrees: 20.0,
            ..Default::default()
        });
        let cos_limit = degrees_to_radians(20.0).cos();
        for (u, v) in [(0.0, 0.0), (1.0, 0.3), (0.5, 0.9), (0.999, 0.5)] {
            let dir = cone.sample_direction(u, v);
            assert_relative_eq!(dir.length(), 1.0, epsilon = 1e-5);
            assert!(dir.z >= cos_limit - 1e-5);
        }
    }

    #[test]
    fn writes_every_velocity_of_its_range() {
        let mut cone = VelocityConeInitializer::new(VelocityConeInitializerDescriptor {
            angle_degrees: 45.0,
            speed: 3.0,
            speed_variance: 1.0,
        });
        let streams = initialize_over_nan(&mut cone, 9, 1..8);
        assert_only_range_written(&streams[0], 9, 1..8);
    }

    #[test]
    fn zero_angle_is_straight_along_z() {
        let cone = VelocityConeInitializer::new(VelocityConeInitializerDescriptor {
            angle_degrees: 0.0,
            ..Default::default()
        });
        let dir = cone.sample_direction(0.7, 0.2);
        assert_relative_eq!(dir.z, 1.0, epsilon = 1e-6);
    }
}
