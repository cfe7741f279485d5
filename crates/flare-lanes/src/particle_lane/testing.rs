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

//! Helpers for driving single processors in unit tests.

use super::{ParticleFrame, ParticleProcessor, ParticleStreamGroup};
use flare_data::stream::{ProcessorFrame, Stream, StreamDeclaration, StreamLayout, StreamProcessor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::Range;

pub(crate) fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A group holding every stream `processors` declare, sized to `capacity`.
pub(crate) fn group_with(capacity: usize, processors: Vec<ParticleProcessor>) -> ParticleStreamGroup {
    let mut group = ParticleStreamGroup::new(capacity);
    for declaration in processors.iter().flat_map(|p| p.stream_requirements()) {
        group
            .add_stream(declaration.name, declaration.data_type)
            .expect("consistent stream types");
    }
    for processor in processors {
        group.add_processor(processor);
    }
    group.set_size(capacity);
    group
}

/// The stream `declaration` names in `group`.
pub(crate) fn stream<'a>(group: &'a ParticleStreamGroup, declaration: &StreamDeclaration) -> &'a Stream {
    group
        .stream_by_name(&declaration.name, declaration.data_type)
        .expect("stream exists")
}

/// The stream `declaration` names in `group`, mutably.
pub(crate) fn stream_mut<'a>(
    group: &'a mut ParticleStreamGroup,
    declaration: &StreamDeclaration,
) -> &'a mut Stream {
    group
        .stream_by_name_mut(&declaration.name, declaration.data_type)
        .expect("stream exists")
}

/// Runs the initializer of `processor` over `range` of `count` loose
/// elements whose every float starts as NaN, and returns the streams.
pub(crate) fn initialize_over_nan(
    processor: &mut dyn StreamProcessor<ParticleFrame>,
    count: usize,
    range: Range<usize>,
) -> Vec<Stream> {
    let mut streams: Vec<Stream> = processor
        .stream_requirements()
        .into_iter()
        .map(|declaration| {
            let mut stream = Stream::new(declaration.name, declaration.data_type);
            stream.set_size(count);
            for float in stream.as_bytes_mut().chunks_exact_mut(4) {
                float.copy_from_slice(&f32::NAN.to_ne_bytes());
            }
            stream
        })
        .collect();
    processor
        .update_stream_bindings(&StreamLayout::new(&streams))
        .expect("declared streams bind");

    let mut env = ParticleFrame::default();
    let mut rng = rng(99);
    let mut removals = Vec::new();
    {
        let mut frame = ProcessorFrame::new(&mut streams, &mut env, &mut rng, &mut removals, count);
        processor.initialize_elements(&mut frame, range);
    }
    streams
}

/// Every float component of the elements in `range`.
pub(crate) fn floats_in(stream: &Stream, range: Range<usize>) -> Vec<f32> {
    let stride = stream.stride();
    stream.as_bytes()[range.start * stride..range.end * stride]
        .chunks_exact(4)
        .map(|bytes| f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

/// Asserts that `range` was fully written and the rest left untouched.
pub(crate) fn assert_only_range_written(stream: &Stream, count: usize, range: Range<usize>) {
    assert!(
        floats_in(stream, range.clone()).iter().all(|v| !v.is_nan()),
        "'{}' left a sentinel inside {range:?}",
        stream.name().as_str()
    );
    assert!(floats_in(stream, 0..range.start).iter().all(|v| v.is_nan()));
    assert!(floats_in(stream, range.end..count).iter().all(|v| v.is_nan()));
}
