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

//! Bounding volumes reported by particle systems for visibility culling.

use super::Vec3;

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An invalid `Aabb` (`min` = +inf, `max` = -inf).
    ///
    /// Merging any point or box into `INVALID` yields that point or box, which
    /// makes it the neutral starting value for accumulation.
    pub const INVALID: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a new `Aabb` from two corner points, in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a degenerate `Aabb` containing a single point.
    #[inline]
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Calculates the center point of the `Aabb`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents of the `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Checks if the `Aabb` is valid (`min <= max` on all axes).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Checks if a point is contained within or on the boundary of the `Aabb`.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns a box that also encloses `point`.
    #[inline]
    pub fn merged_with_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Returns a box that encloses both boxes.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the box grown by `amount` on every side.
    #[inline]
    pub fn inflated(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }
}

impl Default for Aabb {
    /// Returns `Aabb::INVALID`.
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingSphere {
    /// The center of the sphere.
    pub center: Vec3,
    /// The radius of the sphere.
    pub radius: f32,
}

/// A box and a sphere sharing the same center, both enclosing the same volume.
///
/// Culling tests the cheap sphere first and falls back to the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxSphere {
    /// Shared center.
    pub center: Vec3,
    /// Half-extents of the box around `center`.
    pub half_extents: Vec3,
    /// Radius of the sphere around `center`.
    pub sphere_radius: f32,
}

impl BoundingBoxSphere {
    /// Builds the box-sphere enclosing `aabb`, or `None` for an invalid box.
    pub fn from_aabb(aabb: &Aabb) -> Option<Self> {
        if !aabb.is_valid() {
            return None;
        }
        let half_extents = aabb.half_extents();
        Some(Self {
            center: aabb.center(),
            half_extents,
            sphere_radius: half_extents.length(),
        })
    }

    /// Returns the box part as an [`Aabb`].
    pub fn aabb(&self) -> Aabb {
        Aabb {
            min: self.center - self.half_extents,
            max: self.center + self.half_extents,
        }
    }

    /// Returns the sphere part.
    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere {
            center: self.center,
            radius: self.sphere_radius,
        }
    }
}
