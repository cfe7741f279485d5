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

//! Acts as the **[A]gent** for the particle subsystem.
//!
//! A [`ParticleSystemInstance`] runs one system's update state machine
//! (Emit, Grow, Initialize, React, Simulate, Cull) against its stream group.
//! A [`ParticleEffectInstance`] groups the systems of an effect with their
//! shared transform, parameters and random streams. The
//! [`ParticleWorldModule`] is owned by a simulation world: it registers
//! effects behind generational handles, collects events, and updates every
//! effect in parallel once per frame.

mod config;
mod effect;
mod error;
mod events;
mod system;
mod world;

pub use config::{LodConfig, ParticleWorldConfig};
pub use effect::{EffectUpdateStats, ParticleEffectInstance};
pub use error::ParticleError;
pub use events::EventQueueManager;
pub use system::{ParticleSystemInstance, SystemUpdateStats};
pub use world::{EffectHandle, ParticleWorldModule};
