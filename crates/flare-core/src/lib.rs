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

//! # Flare Core
//!
//! Foundational crate containing the math primitives, hashed names, event
//! plumbing, randomness helpers and the fork-join task primitive shared by
//! every layer of the particle simulation.

#![warn(missing_docs)]

pub mod event;
pub mod hashed_string;
pub mod math;
pub mod random;
pub mod task;
pub mod utils;

pub use hashed_string::HashedString;
pub use utils::timer::Stopwatch;
