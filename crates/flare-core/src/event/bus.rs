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

/// Manages a generic, thread-safe event channel.
///
/// The bus is generic over the event type `T` so that `flare-core` stays
/// decoupled from the event types defined in higher-level crates.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Attempts to send an event, logging an error if the receiver is disconnected.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing an event.");

        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the channel.
    /// Use this to allow other parts of the system to send events.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    /// Intended for the owner of the bus to process events.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Moves every pending event into `out`, in publication order.
    ///
    /// Returns the number of events drained.
    pub fn drain_into(&self, out: &mut Vec<T>) -> usize {
        let before = out.len();
        out.extend(self.receiver.try_iter());
        out.len() - before
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Spawned { count: u32 },
        Collided { tag: String },
        Cleared,
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();

        match bus.receiver().try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(event) => panic!("Received unexpected event: {event:?}"),
            Err(e) => panic!("Received unexpected error: {e:?}"),
        }
    }

    #[test]
    fn publish_keeps_order() {
        let bus = EventBus::<TestEvent>::new();
        bus.publish(TestEvent::Spawned { count: 3 });
        bus.publish(TestEvent::Collided {
            tag: "ground".to_string(),
        });
        bus.publish(TestEvent::Cleared);

        let mut drained = Vec::new();
        assert_eq!(bus.drain_into(&mut drained), 3);
        assert_eq!(drained[0], TestEvent::Spawned { count: 3 });
        assert_eq!(drained[2], TestEvent::Cleared);
        assert_eq!(bus.drain_into(&mut drained), 0);
    }

    #[test]
    fn send_from_thread() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            sender
                .send(TestEvent::Spawned { count: 1 })
                .expect("Send from thread should succeed");
        });
        handle.join().expect("Thread panicked");

        let received = bus
            .receiver()
            .recv_timeout(Duration::from_millis(100))
            .expect("Receive failed");
        assert_eq!(received, TestEvent::Spawned { count: 1 });
    }
}
