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

//! Provides foundational primitives for event-driven communication.
//!
//! Two shapes of channel are offered:
//! - [`EventBus`], a multi-producer, single-consumer channel. Producers post
//!   through cloned senders and the owner drains the receiver.
//! - [`EventBroadcaster`], a fan-out channel where every subscriber receives
//!   its own copy of each published event.

mod broadcaster;
mod bus;

pub use self::broadcaster::EventBroadcaster;
pub use self::bus::EventBus;
