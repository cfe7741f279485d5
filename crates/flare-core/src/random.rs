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

//! Sampling helpers shared by emitters and initializers.
//!
//! Every particle system threads one `StdRng` through its processors, so these
//! helpers are written against `rand::Rng` and never own a generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Extra sampling operations used throughout the simulation.
pub trait RandomExt: Rng {
    /// Uniform integer in `[min, min + range]`, both ends inclusive.
    fn int_in_range(&mut self, min: u32, range: u32) -> u32 {
        min.saturating_add(self.gen_range(0..=range))
    }

    /// Uniform float in `[0, 1)`.
    fn unit_float(&mut self) -> f32 {
        self.gen::<f32>()
    }

    /// `base` offset by a uniform amount in `[-variance, variance]`.
    fn float_variance(&mut self, base: f32, variance: f32) -> f32 {
        let variance = variance.abs();
        if variance == 0.0 {
            return base;
        }
        base + self.gen_range(-variance..=variance)
    }
}

impl<R: Rng + ?Sized> RandomExt for R {}

/// Builds a deterministic generator from a base seed and a stream id.
///
/// Distinct ids give unrelated sequences, so every effect spawned from one
/// world seed gets its own lineage.
pub fn seeded_rng(base_seed: u64, stream_id: u64) -> StdRng {
    StdRng::seed_from_u64(base_seed ^ stream_id.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
