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

//! Initializers write the starting state of freshly spawned particles.
//!
//! They only implement [`StreamProcessor::initialize_elements`] and never
//! touch particles outside the range they are given.
//!
//! [`StreamProcessor::initialize_elements`]: flare_data::stream::StreamProcessor::initialize_elements

mod random_color;
mod random_size;
mod velocity_cone;

pub use random_color::{RandomColorInitializer, RandomColorInitializerDescriptor};
pub use random_size::{RandomSizeInitializer, RandomSizeInitializerDescriptor};
pub use velocity_cone::{VelocityConeInitializer, VelocityConeInitializerDescriptor};
