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

//! Streams, stream groups and the processor pipeline.
//!
//! A [`StreamGroup`] owns one [`Stream`] per attribute (e.g. `Position`,
//! `Velocity`, `Color`), all sized to the same element count, and an ordered
//! list of [`StreamProcessor`]s. Elements `[0, active)` are alive; spawning
//! extends that prefix and removal compacts it with swap-remove.

mod buffer;
mod data_type;
mod error;
mod events;
mod group;
mod iter;
mod processor;


pub use self::buffer::{Stream, DEFAULT_STREAM_ALIGNMENT};
pub use self::data_type::{ScalarKind, StreamDataType, StreamElement};
pub use self::error::{StreamBindingError, StreamError};
pub use self::events::{ElementHandle, IndexedSideTable, StreamGroupEvent};
pub use self::group::StreamGroup;
pub use self::iter::{StreamIter, StreamIterMut};
pub use self::processor::{
    ProcessorFrame, StreamDeclaration, StreamId, StreamLayout, StreamProcessor,
};
