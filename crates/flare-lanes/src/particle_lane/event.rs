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

use flare_core::math::Vec3;
use flare_core::HashedString;

/// A gameplay or physics event particle systems can react to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEvent {
    /// The event type, matched by name.
    pub event_type: HashedString,
    /// Where the event happened.
    pub position: Vec3,
    /// Surface normal at the event, if meaningful.
    pub normal: Vec3,
    /// Direction of travel at the event, if meaningful.
    pub direction: Vec3,
}

impl ParticleEvent {
    /// Creates an event at `position` with zero normal and direction.
    pub fn new(event_type: impl Into<HashedString>, position: Vec3) -> Self {
        Self {
            event_type: event_type.into(),
            position,
            normal: Vec3::ZERO,
            direction: Vec3::ZERO,
        }
    }
}

/// The events of one frame, refilled at the start of every frame.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<ParticleEvent>,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: ParticleEvent) {
        self.events.push(event);
    }

    /// Removes every event, keeping the allocation.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Iterates over the events in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParticleEvent> {
        self.events.iter()
    }

    /// Iterates over the events of one type.
    pub fn of_type<'a>(
        &'a self,
        event_type: &'a HashedString,
    ) -> impl Iterator<Item = &'a ParticleEvent> + 'a {
        self.events
            .iter()
            .filter(move |event| event.event_type == *event_type)
    }

    /// Returns `true` if an event of `event_type` is queued.
    pub fn contains_type(&self, event_type: &HashedString) -> bool {
        self.of_type(event_type).next().is_some()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no event is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<ParticleEvent> for EventQueue {
    fn extend<I: IntoIterator<Item = ParticleEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

impl<'a> IntoIterator for &'a EventQueue {
    type Item = &'a ParticleEvent;
    type IntoIter = std::slice::Iter<'a, ParticleEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
