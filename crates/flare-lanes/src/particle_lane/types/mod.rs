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

//! Render types turn the live particles of a system into renderer input.
//!
//! Extraction only reads streams, so it runs through the fork-join
//! `parallel_for` while the system is not being updated.

mod point;

pub use point::{PointRenderData, PointType};

use super::ParticleStreamGroup;
use flare_core::task::ParallelForParams;
use flare_data::stream::{StreamBindingError, StreamDeclaration, StreamLayout};

/// A render representation of a particle system.
pub trait ParticleType: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Streams this type reads.
    fn stream_requirements(&self) -> Vec<StreamDeclaration>;

    /// Resolves the streams this type reads.
    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError>;

    /// Extracts render data for the active particles of `group`.
    fn extract(&self, group: &ParticleStreamGroup, params: &ParallelForParams) -> ExtractedParticles;
}

/// Render data produced by a [`ParticleType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedParticles {
    /// Camera-facing points.
    Points(Vec<PointRenderData>),
}

impl ExtractedParticles {
    /// Number of extracted particles.
    pub fn len(&self) -> usize {
        match self {
            ExtractedParticles::Points(points) => points.len(),
        }
    }

    /// Returns `true` if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
