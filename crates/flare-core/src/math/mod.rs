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

//! Provides the mathematics primitives used by the simulation.
//!
//! The set is deliberately small: 3D/4D vectors, a rotation quaternion, a
//! position/rotation/scale transform, a linear color, and the bounding
//! volumes the particle systems report for culling.
//!
//! All angular functions in this module operate in **radians**.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// The factor to convert degrees to radians (PI / 180.0).
pub const DEG_TO_RAD: f32 = PI / 180.0;

pub mod color;
pub mod geometry;
pub mod quaternion;
pub mod transform;
pub mod vector;

pub use self::color::LinearRgba;
pub use self::geometry::{Aabb, BoundingBoxSphere, BoundingSphere};
pub use self::quaternion::Quaternion;
pub use self::transform::Transform;
pub use self::vector::{Vec3, Vec4};

/// Converts an angle from degrees to radians.
///
/// # Examples
///
/// ```
/// use flare_core::math::{degrees_to_radians, PI};
/// assert_eq!(degrees_to_radians(180.0), PI);
/// ```
#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * DEG_TO_RAD
}

/// Selects a discrete state from ascending distance thresholds.
///
/// `distance_squared` is compared against the *squared* thresholds so no
/// square root is taken. The first threshold the distance is strictly below
/// wins; a distance beyond every threshold selects the last state. With zero
/// or one threshold there is nothing to choose between and state `0` is
/// returned.
///
/// ```
/// use flare_core::math::select_distance_state;
/// let thresholds = [10.0, 20.0, 40.0];
/// assert_eq!(select_distance_state(5.0 * 5.0, &thresholds), 0);
/// assert_eq!(select_distance_state(10.0 * 10.0, &thresholds), 1);
/// assert_eq!(select_distance_state(100.0 * 100.0, &thresholds), 2);
/// ```
pub fn select_distance_state(distance_squared: f32, thresholds: &[f32]) -> usize {
    if thresholds.len() <= 1 {
        return 0;
    }

    thresholds
        .iter()
        .position(|threshold| distance_squared < threshold * threshold)
        .unwrap_or(thresholds.len() - 1)
}
