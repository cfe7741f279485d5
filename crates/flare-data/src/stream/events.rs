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

//! Change notifications published by a [`StreamGroup`](super::StreamGroup).
//!
//! Swap-remove makes element indices unstable: removing element `i` moves the
//! last active element into slot `i`. Anything that keys data by element
//! index outside the group either listens to these events (see
//! [`IndexedSideTable`]) or holds a generation-checked [`ElementHandle`].

use std::ops::Range;

/// A structural change to the active elements of a stream group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamGroupEvent {
    /// New elements were admitted at the end of the active range.
    ElementsAdded {
        /// The indices of the new elements.
        range: Range<usize>,
    },
    /// The element at `removed_index` was removed.
    ElementRemoved {
        /// The slot that was vacated.
        removed_index: usize,
        /// The old index of the element relocated into `removed_index`, or
        /// `None` when the removed element was the last one.
        moved_from: Option<usize>,
    },
    /// Every element was discarded by a resize.
    ElementsCleared,
}

/// An element index tagged with the group generation it was taken in.
///
/// The generation changes on every removal and resize, so a handle resolves
/// only until the next such mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    /// The element index at the time the handle was taken.
    pub index: usize,
    /// The group generation at the time the handle was taken.
    pub generation: u32,
}

/// A per-element table kept outside a stream group and synchronized with it
/// by replaying its [`StreamGroupEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct IndexedSideTable<T> {
    values: Vec<T>,
}

impl<T: Default> IndexedSideTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Applies one group event so that `self[i]` keeps following element `i`.
    pub fn apply(&mut self, event: &StreamGroupEvent) {
        match event {
            StreamGroupEvent::ElementsAdded { range } => {
                if self.values.len() < range.end {
                    self.values.resize_with(range.end, T::default);
                }
            }
            StreamGroupEvent::ElementRemoved { removed_index, .. } => {
                if *removed_index < self.values.len() {
                    self.values.swap_remove(*removed_index);
                }
            }
            StreamGroupEvent::ElementsCleared => self.values.clear(),
        }
    }

    /// Applies every pending event from a group subscription.
    pub fn sync(&mut self, events: &flume::Receiver<StreamGroupEvent>) {
        for event in events.try_iter() {
            self.apply(&event);
        }
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no element is tracked.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value for element `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// The value for element `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.values.get_mut(index)
    }

    /// All values, in element order.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}
