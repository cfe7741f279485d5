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

//! The processor contract: units of work bound to named streams of a group.

use super::{Stream, StreamBindingError, StreamDataType};
use bytemuck::Pod;
use flare_core::HashedString;
use rand::rngs::StdRng;
use std::ops::Range;

/// Index of a stream inside its group. Only valid until streams are added or
/// removed, which triggers a rebinding of every processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub usize);

/// A stream a processor needs, declared so its owner can create it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDeclaration {
    /// The stream name.
    pub name: HashedString,
    /// The element type.
    pub data_type: StreamDataType,
}

impl StreamDeclaration {
    /// Creates a declaration.
    pub fn new(name: impl Into<HashedString>, data_type: StreamDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A read-only view of a group's streams, used to resolve bindings.
#[derive(Clone, Copy)]
pub struct StreamLayout<'a> {
    streams: &'a [Stream],
}

impl<'a> StreamLayout<'a> {
    /// A layout over `streams`. Groups build one per rebind; processors can
    /// also be bound against loose streams.
    pub fn new(streams: &'a [Stream]) -> Self {
        Self { streams }
    }

    /// Finds the stream `name` and checks it has type `data_type`.
    pub fn find(
        &self,
        name: &HashedString,
        data_type: StreamDataType,
    ) -> Result<StreamId, StreamBindingError> {
        let (index, stream) = self
            .streams
            .iter()
            .enumerate()
            .find(|(_, stream)| stream.name() == name)
            .ok_or_else(|| StreamBindingError::MissingStream {
                name: name.clone(),
                data_type,
            })?;

        if stream.data_type() != data_type {
            return Err(StreamBindingError::TypeMismatch {
                name: name.clone(),
                expected: data_type,
                found: stream.data_type(),
            });
        }
        Ok(StreamId(index))
    }

    /// Resolves a declaration.
    pub fn bind(&self, declaration: &StreamDeclaration) -> Result<StreamId, StreamBindingError> {
        self.find(&declaration.name, declaration.data_type)
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Returns `true` if the group has no stream.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Everything a processor sees while it runs: the group's streams, the
/// caller-supplied environment, the system's random generator, and a queue
/// for element removals.
pub struct ProcessorFrame<'a, E> {
    streams: &'a mut [Stream],
    /// Caller-supplied per-update environment.
    pub env: &'a mut E,
    /// The random generator shared by every processor of the group.
    pub rng: &'a mut StdRng,
    removals: &'a mut Vec<usize>,
    active: usize,
}

impl<'a, E> ProcessorFrame<'a, E> {
    /// A frame over loose streams, for running a processor outside a
    /// [`StreamGroup`](super::StreamGroup). Removal requests land in `removals`.
    pub fn new(
        streams: &'a mut [Stream],
        env: &'a mut E,
        rng: &'a mut StdRng,
        removals: &'a mut Vec<usize>,
        active: usize,
    ) -> Self {
        Self {
            streams,
            env,
            rng,
            removals,
            active,
        }
    }

    /// Number of active elements, including any this frame is initializing.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// The stream with id `id`.
    #[inline]
    pub fn stream(&self, id: StreamId) -> &Stream {
        &self.streams[id.0]
    }

    /// The stream with id `id`, mutably.
    #[inline]
    pub fn stream_mut(&mut self, id: StreamId) -> &mut Stream {
        &mut self.streams[id.0]
    }

    /// The whole buffer of stream `id` as `&[T]`.
    #[inline]
    pub fn slice<T: Pod>(&self, id: StreamId) -> &[T] {
        self.streams[id.0].as_slice()
    }

    /// The whole buffer of stream `id` as `&mut [T]`.
    #[inline]
    pub fn slice_mut<T: Pod>(&mut self, id: StreamId) -> &mut [T] {
        self.streams[id.0].as_slice_mut()
    }

    /// Reads one stream while writing another.
    ///
    /// # Panics
    /// If `read` and `write` are the same stream.
    pub fn read_write<R: Pod, W: Pod>(&mut self, read: StreamId, write: StreamId) -> (&[R], &mut [W]) {
        let (read_stream, write_stream) = self.two_streams(read, write);
        (read_stream.as_slice(), write_stream.as_slice_mut())
    }

    /// Writes two distinct streams at once.
    ///
    /// # Panics
    /// If `a` and `b` are the same stream.
    pub fn pair_mut<A: Pod, B: Pod>(&mut self, a: StreamId, b: StreamId) -> (&mut [A], &mut [B]) {
        let (stream_a, stream_b) = self.two_streams(a, b);
        (stream_a.as_slice_mut(), stream_b.as_slice_mut())
    }

    /// Requests removal of element `index`.
    ///
    /// Removals are applied once every processor of the pass has run,
    /// highest index first, so indices seen during the pass stay valid.
    #[inline]
    pub fn remove_element(&mut self, index: usize) {
        debug_assert!(index < self.active, "remove_element({index}) out of range");
        self.removals.push(index);
    }

    fn two_streams(&mut self, a: StreamId, b: StreamId) -> (&mut Stream, &mut Stream) {
        assert_ne!(a, b, "The same stream cannot be borrowed twice");
        if a.0 < b.0 {
            let (head, tail) = self.streams.split_at_mut(b.0);
            (&mut head[a.0], &mut tail[0])
        } else {
            let (head, tail) = self.streams.split_at_mut(a.0);
            (&mut tail[0], &mut head[b.0])
        }
    }
}

/// A unit of work bound to named streams of a [`StreamGroup`](super::StreamGroup).
///
/// `initialize_elements` writes the initial state of freshly admitted
/// elements only. `process` runs once per update over all active elements.
/// Neither may allocate or resize streams.
pub trait StreamProcessor<E>: Send {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Streams this processor needs. Owners use this to create the streams
    /// before the processor is bound.
    fn stream_requirements(&self) -> Vec<StreamDeclaration> {
        Vec::new()
    }

    /// Resolves the processor's streams in `layout`. Called whenever the
    /// group's stream set changed. A processor that fails to bind is disabled.
    fn update_stream_bindings(&mut self, layout: &StreamLayout<'_>) -> Result<(), StreamBindingError>;

    /// Initializes the elements in `range`, which were just admitted.
    fn initialize_elements(&mut self, _frame: &mut ProcessorFrame<'_, E>, _range: Range<usize>) {}

    /// Updates the first `active_count` elements.
    fn process(&mut self, _frame: &mut ProcessorFrame<'_, E>, _active_count: usize) {}
}
