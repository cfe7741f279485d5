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

//! A decomposed position / rotation / scale transform.

use serde::{Deserialize, Serialize};

use super::{Quaternion, Vec3};

/// A rigid transform with uniform-or-not scale, applied as scale, then
/// rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space translation.
    pub position: Vec3,
    /// World-space rotation.
    pub rotation: Quaternion,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform that only translates.
    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Transforms a point (scale, rotate, translate).
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    /// Transforms a direction (rotation only).
    #[inline]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// Returns the largest scale component, used to inflate bounds.
    #[inline]
    pub fn max_scale(&self) -> f32 {
        self.scale.abs_max()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_point_is_scaled_rotated_then_translated() {
        let t = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = t.transform_point(Vec3::X);
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);

        let d = t.transform_direction(Vec3::X);
        assert_relative_eq!(d.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(t.max_scale(), 2.0);
    }
}
