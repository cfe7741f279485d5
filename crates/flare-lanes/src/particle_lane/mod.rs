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

//! Particle Lane
//!
//! Every particle system owns one [`ParticleStreamGroup`]. Its processors are
//! registered in pipeline order (initializers, then behaviors, then
//! finalizers) and read or write the [`streams`] they bind to.

pub mod behavior;
pub mod descriptor;
pub mod emitter;
mod error;
mod event;
mod frame;
mod gradient;
pub mod finalizer;
pub mod initializer;
pub mod streams;
#[cfg(test)]
mod testing;
pub mod types;

pub use error::DescriptorError;
pub use event::{EventQueue, ParticleEvent};
pub use frame::{ParticleFrame, ParticleParameters};
pub use gradient::{ColorGradient, GradientKey};

use flare_data::stream::{StreamGroup, StreamProcessor};

/// The stream group type of a particle system.
pub type ParticleStreamGroup = StreamGroup<ParticleFrame>;

/// A boxed processor of a particle stream group.
pub type ParticleProcessor = Box<dyn StreamProcessor<ParticleFrame>>;
