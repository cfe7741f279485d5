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

use super::{ExtractedParticles, ParticleType};
use crate::particle_lane::{streams, ParticleStreamGroup};
use bytemuck::{Pod, Zeroable};
use flare_core::math::{LinearRgba, Vec3};
use flare_core::task::{parallel_for_slice_mut, ParallelForParams};
use flare_data::stream::{StreamBindingError, StreamDeclaration, StreamId, StreamLayout};

/// One camera-facing point, laid out for direct upload to a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PointRenderData {
    /// World-space position.
    pub position: Vec3,
    /// Size in world units.
    pub size: f32,
    /// Linear RGBA color.
    pub color: LinearRgba,
}

/// Renders particles as points with a color and a size.
#[derive(Debug, Default)]
pub struct PointType {
    position: Option<StreamId>,
    color: Option<StreamId>,
    size: Option<StreamId>,
}

impl PointType {
    /// Creates the type.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParticleType for PointType {
    fn name(&self) -> &str {
        "Point"
    }

    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        vec![streams::position(), streams::color(), streams::size()]
    }

    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError> {
        self.position = Some(layout.bind(&streams::position())?);
        self.color = Some(layout.bind(&streams::color())?);
        self.size = Some(layout.bind(&streams::size())?);
        Ok(())
    }

    fn extract(&self, group: &ParticleStreamGroup, params: &ParallelForParams) -> ExtractedParticles {
        let (Some(position), Some(color), Some(size)) = (self.position, self.color, self.size)
        else {
            return ExtractedParticles::Points(Vec::new());
        };

        let active = group.active();
        let streams = group.streams();
        let positions = &streams[position.0].as_slice::<Vec3>()[..active];
        let colors = &streams[color.0].as_slice::<LinearRgba>()[..active];
        let sizes = &streams[size.0].as_slice::<f32>()[..active];

        let mut points = vec![PointRenderData::zeroed(); active];
        parallel_for_slice_mut(&mut points, params, |first, chunk| {
            for (offset, point) in chunk.iter_mut().enumerate() {
                let i = first + offset;
                *point = PointRenderData {
                    position: positions[i],
                    size: sizes[i],
                    color: colors[i],
                };
            }
        });
        ExtractedParticles::Points(points)
    }
}
