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

/// A fan-out event channel: every subscriber gets its own copy of each event.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
/// Publishing with no subscribers does not clone the event.
#[derive(Debug)]
pub struct EventBroadcaster<T: Clone + Send + 'static> {
    subscribers: Vec<flume::Sender<T>>,
}

impl<T: Clone + Send + 'static> EventBroadcaster<T> {
    /// Creates a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&mut self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Returns the number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Sends a copy of `event` to every subscriber.
    pub fn publish(&mut self, event: T) {
        if self.subscribers.is_empty() {
            return;
        }
        let before = self.subscribers.len();
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            log::trace!("Pruned {pruned} disconnected event subscriber(s).");
        }
    }
}

impl<T: Clone + Send + 'static> Default for EventBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
