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

//! The [`StreamGroup`]: a fixed-capacity pool of elements stored across
//! several streams, compacted with swap-remove.

use super::events::{ElementHandle, StreamGroupEvent};
use super::processor::{ProcessorFrame, StreamId, StreamLayout, StreamProcessor};
use super::{Stream, StreamDataType, StreamError};
use flare_core::event::EventBroadcaster;
use flare_core::HashedString;
use rand::rngs::StdRng;
use std::ops::Range;

struct ProcessorSlot<E> {
    processor: Box<dyn StreamProcessor<E>>,
    enabled: bool,
    warned: bool,
}

/// A set of equally sized streams whose elements `[0, active)` are alive.
///
/// Element counts obey `0 <= active <= total <= capacity` at all times:
/// - `capacity` is fixed at construction,
/// - `total` is the number of sized (allocated) elements, set by
///   [`StreamGroup::set_size`],
/// - `active` is the live prefix.
///
/// Removing element `i` moves the last active element into slot `i` in every
/// stream. Indices are therefore only stable between mutation points; see
/// [`StreamGroupEvent`] and [`ElementHandle`].
///
/// `E` is the environment handed to every processor on each pass.
pub struct StreamGroup<E = ()> {
    capacity: usize,
    total: usize,
    active: usize,
    highest_active: usize,
    generation: u32,
    layout_version: u32,
    dropped_spawns: u64,
    streams: Vec<Stream>,
    processors: Vec<ProcessorSlot<E>>,
    bindings_dirty: bool,
    pending_removals: Vec<usize>,
    events: EventBroadcaster<StreamGroupEvent>,
}

impl<E> StreamGroup<E> {
    /// Creates an empty group that can hold at most `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            total: 0,
            active: 0,
            highest_active: 0,
            generation: 0,
            layout_version: 0,
            dropped_spawns: 0,
            streams: Vec::new(),
            processors: Vec::new(),
            bindings_dirty: false,
            pending_removals: Vec::new(),
            events: EventBroadcaster::new(),
        }
    }

    /// Maximum number of elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of sized elements.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of live elements.
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// The largest active count reached since the last resize.
    #[inline]
    pub fn highest_active(&self) -> usize {
        self.highest_active
    }

    /// Number of spawn requests refused because the group was full.
    #[inline]
    pub fn dropped_spawns(&self) -> u64 {
        self.dropped_spawns
    }

    /// Changes on every removal and resize.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Changes whenever a stream is added or removed. Consumers holding
    /// [`StreamId`]s outside the processor pipeline rebind when it moves.
    #[inline]
    pub fn layout_version(&self) -> u32 {
        self.layout_version
    }

    /// All streams, in creation order.
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// A read-only view of the streams, for binding consumers outside the
    /// processor pipeline.
    pub fn layout(&self) -> StreamLayout<'_> {
        StreamLayout::new(&self.streams)
    }

    /// Number of registered processors.
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Number of processors currently disabled by a failed binding.
    pub fn disabled_processor_count(&mut self) -> usize {
        self.resolve_bindings();
        self.processors.iter().filter(|slot| !slot.enabled).count()
    }

    /// Subscribes to structural changes of the element set.
    pub fn subscribe(&mut self) -> flume::Receiver<StreamGroupEvent> {
        self.events.subscribe()
    }

    /// Adds a stream sized to the current `total`.
    ///
    /// Adding a stream that already exists with the same type returns its id.
    pub fn add_stream(
        &mut self,
        name: impl Into<HashedString>,
        data_type: StreamDataType,
    ) -> Result<StreamId, StreamError> {
        self.insert_stream(Stream::new(name, data_type))
    }

    /// Adds a stream with explicit buffer and element alignments.
    pub fn add_stream_with_alignment(
        &mut self,
        name: impl Into<HashedString>,
        data_type: StreamDataType,
        alignment: usize,
        element_alignment: usize,
    ) -> Result<StreamId, StreamError> {
        self.insert_stream(Stream::with_alignment(
            name,
            data_type,
            alignment,
            element_alignment,
        )?)
    }

    fn insert_stream(&mut self, mut stream: Stream) -> Result<StreamId, StreamError> {
        if let Some(index) = self.stream_index(stream.name()) {
            let existing = self.streams[index].data_type();
            if existing == stream.data_type() {
                return Ok(StreamId(index));
            }
            log::warn!(
                "Stream '{}' requested as {} but already exists as {existing}.",
                stream.name(),
                stream.data_type()
            );
            return Err(StreamError::TypeMismatch {
                name: stream.name().clone(),
                existing,
                requested: stream.data_type(),
            });
        }

        stream.set_size(self.total);
        // A stream added mid-life starts zeroed for every element.
        log::trace!("Added stream '{}' ({}).", stream.name(), stream.data_type());
        self.streams.push(stream);
        self.layout_version = self.layout_version.wrapping_add(1);
        self.bindings_dirty = true;
        Ok(StreamId(self.streams.len() - 1))
    }

    /// Removes a stream. Processors are rebound on the next pass.
    pub fn remove_stream(&mut self, name: &HashedString) -> Result<(), StreamError> {
        let index = self
            .stream_index(name)
            .ok_or_else(|| StreamError::UnknownStream(name.clone()))?;
        self.streams.remove(index);
        self.layout_version = self.layout_version.wrapping_add(1);
        self.bindings_dirty = true;
        Ok(())
    }

    /// Finds a stream by name and type.
    pub fn stream_by_name(&self, name: &HashedString, data_type: StreamDataType) -> Option<&Stream> {
        self.stream_index(name)
            .map(|index| &self.streams[index])
            .filter(|stream| stream.data_type() == data_type)
    }

    /// Finds a stream by name and type, mutably.
    pub fn stream_by_name_mut(
        &mut self,
        name: &HashedString,
        data_type: StreamDataType,
    ) -> Option<&mut Stream> {
        let index = self.stream_index(name)?;
        let stream = &mut self.streams[index];
        (stream.data_type() == data_type).then_some(stream)
    }

    fn stream_index(&self, name: &HashedString) -> Option<usize> {
        self.streams.iter().position(|stream| stream.name() == name)
    }

    /// Registers a processor. It is bound lazily before the next pass.
    pub fn add_processor(&mut self, processor: Box<dyn StreamProcessor<E>>) {
        self.processors.push(ProcessorSlot {
            processor,
            enabled: false,
            warned: false,
        });
        self.bindings_dirty = true;
    }

    /// Sizes every stream to `total` elements, clamped to the capacity.
    ///
    /// This is destructive: every stream is reallocated zeroed, the active
    /// count and high-water mark are reset, and subscribers receive
    /// [`StreamGroupEvent::ElementsCleared`].
    pub fn set_size(&mut self, total: usize) {
        let total = if total > self.capacity {
            log::debug!(
                "set_size({total}) clamped to the capacity of {}.",
                self.capacity
            );
            self.capacity
        } else {
            total
        };

        for stream in &mut self.streams {
            stream.set_size(total);
        }
        self.total = total;
        self.active = 0;
        self.highest_active = 0;
        self.generation = self.generation.wrapping_add(1);
        self.pending_removals.clear();
        self.events.publish(StreamGroupEvent::ElementsCleared);
        self.debug_assert_invariants();
    }

    /// Admits `count` new elements and runs every enabled processor's
    /// initializer on exactly that range, which is returned.
    ///
    /// New elements start zeroed. No stream is reallocated.
    ///
    /// # Panics
    /// If `active + count` exceeds `total`.
    pub fn initialize_elements(
        &mut self,
        count: usize,
        env: &mut E,
        rng: &mut StdRng,
    ) -> Range<usize> {
        assert!(
            self.active + count <= self.total,
            "initialize_elements({count}) with {} of {} elements active",
            self.active,
            self.total
        );
        let range = self.active..self.active + count;
        if count == 0 {
            return range;
        }

        self.resolve_bindings();
        for stream in &mut self.streams {
            stream.zero_elements(range.clone());
        }
        self.active += count;
        self.highest_active = self.highest_active.max(self.active);

        let mut removals = std::mem::take(&mut self.pending_removals);
        {
            let mut frame =
                ProcessorFrame::new(&mut self.streams, env, rng, &mut removals, self.active);
            for slot in self.processors.iter_mut().filter(|slot| slot.enabled) {
                slot.processor
                    .initialize_elements(&mut frame, range.clone());
            }
        }
        self.events
            .publish(StreamGroupEvent::ElementsAdded { range: range.clone() });
        self.apply_removals(&mut removals);
        self.pending_removals = removals;

        self.debug_assert_invariants();
        range
    }

    /// Grows the active range by up to `requested` elements and initializes them.
    ///
    /// Requests beyond the free space are dropped and counted in
    /// [`StreamGroup::dropped_spawns`].
    pub fn spawn(&mut self, requested: usize, env: &mut E, rng: &mut StdRng) -> Range<usize> {
        let free = self.total - self.active;
        let admitted = requested.min(free);
        if admitted < requested {
            let dropped = requested - admitted;
            self.dropped_spawns += dropped as u64;
            log::debug!(
                "Stream group full ({} / {}): dropped {dropped} of {requested} spawns.",
                self.active,
                self.total
            );
        }
        self.initialize_elements(admitted, env, rng)
    }

    /// Runs every enabled processor over the active elements, in registration
    /// order, then applies the removals they requested.
    pub fn process(&mut self, env: &mut E, rng: &mut StdRng) {
        self.resolve_bindings();

        let active = self.active;
        let mut removals = std::mem::take(&mut self.pending_removals);
        {
            let mut frame = ProcessorFrame::new(&mut self.streams, env, rng, &mut removals, active);
            for slot in self.processors.iter_mut().filter(|slot| slot.enabled) {
                slot.processor.process(&mut frame, active);
            }
        }
        self.apply_removals(&mut removals);
        self.pending_removals = removals;

        self.debug_assert_invariants();
    }

    /// Removes element `index` immediately by moving the last active element
    /// into its slot in every stream.
    ///
    /// # Panics
    /// If `index` is not active.
    pub fn remove_element(&mut self, index: usize) {
        assert!(
            index < self.active,
            "remove_element({index}) with {} elements active",
            self.active
        );
        let last = self.active - 1;
        if index != last {
            for stream in &mut self.streams {
                stream.copy_element(last, index);
            }
        }
        self.active = last;
        self.generation = self.generation.wrapping_add(1);
        self.events.publish(StreamGroupEvent::ElementRemoved {
            removed_index: index,
            moved_from: (index != last).then_some(last),
        });
    }

    /// A handle to active element `index`, valid until the next removal or resize.
    pub fn handle(&self, index: usize) -> Option<ElementHandle> {
        (index < self.active).then_some(ElementHandle {
            index,
            generation: self.generation,
        })
    }

    /// Resolves a handle to an index, or `None` if the group changed since.
    pub fn resolve(&self, handle: ElementHandle) -> Option<usize> {
        (handle.generation == self.generation && handle.index < self.active).then_some(handle.index)
    }

    /// Checks `0 <= active <= total <= capacity` and that every stream holds
    /// `total` elements. Compiled out of release builds.
    pub fn debug_assert_invariants(&self) {
        debug_assert!(self.active <= self.total);
        debug_assert!(self.total <= self.capacity);
        debug_assert!(self.highest_active >= self.active);
        debug_assert!(self
            .streams
            .iter()
            .all(|stream| stream.is_external() || stream.len() == self.total));
    }

    fn apply_removals(&mut self, removals: &mut Vec<usize>) {
        if removals.is_empty() {
            return;
        }
        // Highest first: a swap only ever pulls in an element from above every
        // index still pending.
        removals.sort_unstable_by(|a, b| b.cmp(a));
        removals.dedup();
        for index in removals.drain(..) {
            self.remove_element(index);
        }
    }

    fn resolve_bindings(&mut self) {
        if !self.bindings_dirty {
            return;
        }
        let layout = StreamLayout::new(&self.streams);
        for slot in &mut self.processors {
            match slot.processor.update_stream_bindings(&layout) {
                Ok(()) => slot.enabled = true,
                Err(e) => {
                    slot.enabled = false;
                    if !slot.warned {
                        log::warn!(
                            "Processor '{}' disabled: {e}.",
                            slot.processor.name()
                        );
                        slot.warned = true;
                    }
                }
            }
        }
        self.bindings_dirty = false;
    }
}

impl<E> std::fmt::Debug for StreamGroup<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamGroup")
            .field("capacity", &self.capacity)
            .field("total", &self.total)
            .field("active", &self.active)
            .field("highest_active", &self.highest_active)
            .field("streams", &self.streams)
            .field("processors", &self.processors.len())
            .finish()
    }
}
