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

use super::EffectHandle;
use flare_lanes::particle_lane::DescriptorError;
use thiserror::Error;

/// Errors of the particle agent.
#[derive(Error, Debug)]
pub enum ParticleError {
    /// An effect or system descriptor could not be loaded.
    #[error("Invalid particle descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// RON configuration text could not be parsed.
    #[error("Invalid RON configuration: {0}")]
    ConfigRon(String),
    /// JSON configuration text could not be parsed.
    #[error("Invalid JSON configuration: {0}")]
    ConfigJson(#[from] serde_json::Error),
    /// The configuration parsed but holds unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The handle refers to an effect that was destroyed or has finished.
    #[error("Stale effect handle {0:?}")]
    StaleHandle(EffectHandle),
}
