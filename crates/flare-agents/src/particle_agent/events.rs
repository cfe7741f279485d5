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

use flare_core::event::EventBus;
use flare_lanes::particle_lane::{EventQueue, ParticleEvent};

/// Collects the events producers post during a frame and exposes them as
/// the frame's [`EventQueue`].
///
/// Producers on any thread send through [`EventQueueManager::sender`]. At
/// frame start [`EventQueueManager::begin_frame`] swaps the pending events
/// into the queue every system reads during that frame.
pub struct EventQueueManager {
    bus: EventBus<ParticleEvent>,
    pending: Vec<ParticleEvent>,
    queue: EventQueue,
}

impl EventQueueManager {
    /// Creates a manager with an empty queue.
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
            pending: Vec::new(),
            queue: EventQueue::new(),
        }
    }

    /// Posts an event for the next frame.
    pub fn post(&self, event: ParticleEvent) {
        self.bus.publish(event);
    }

    /// A sender producers can keep to post events from other threads.
    pub fn sender(&self) -> flume::Sender<ParticleEvent> {
        self.bus.sender()
    }

    /// Replaces the frame queue with every event posted since the previous
    /// call and returns how many there are.
    pub fn begin_frame(&mut self) -> usize {
        self.queue.clear();
        let count = self.bus.drain_into(&mut self.pending);
        self.queue.extend(self.pending.drain(..));
        if count > 0 {
            log::trace!("Drained {count} particle events into the frame queue.");
        }
        count
    }

    /// The current frame's events.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }
}

impl Default for EventQueueManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_core::math::Vec3;
    use flare_core::HashedString;

    #[test]
    fn events_show_up_one_frame_at_a_time() {
        let mut manager = EventQueueManager::new();
        manager.post(ParticleEvent::new("Impact", Vec3::ZERO));
        let sender = manager.sender();
        std::thread::spawn(move || {
            sender
                .send(ParticleEvent::new("Impact", Vec3::ONE))
                .unwrap();
        })
        .join()
        .unwrap();

        assert!(manager.queue().is_empty());
        assert_eq!(manager.begin_frame(), 2);
        assert!(manager.queue().contains_type(&HashedString::new("Impact")));

        assert_eq!(manager.begin_frame(), 0);
        assert!(manager.queue().is_empty());
    }
}
