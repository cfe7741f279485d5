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

//! Configuration of a [`ParticleWorldModule`](super::ParticleWorldModule).

use super::ParticleError;
use flare_core::math::select_distance_state;
use flare_core::task::ParallelForParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distance-based level of detail for spawn density.
///
/// `thresholds` are ascending distances from the viewer; the state of an
/// effect is the first threshold it is strictly closer than, or the last one.
/// `spawn_scales[state]` multiplies the effect's spawn counts. Missing
/// scales count as `1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Ascending distance thresholds.
    pub thresholds: Vec<f32>,
    /// Spawn scale per state.
    pub spawn_scales: Vec<f32>,
}

impl LodConfig {
    /// The spawn scale for an effect at `distance_squared` from the viewer.
    pub fn spawn_scale(&self, distance_squared: f32) -> f32 {
        let state = select_distance_state(distance_squared, &self.thresholds);
        self.spawn_scales.get(state).copied().unwrap_or(1.0).max(0.0)
    }
}

/// Settings of a particle world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleWorldConfig {
    /// Global spawn density scale applied to every system.
    pub spawn_count_multiplier: f32,
    /// Hard cap on the capacity of one system.
    pub max_particles_per_system: usize,
    /// Splitting of the per-frame effect update and of render extraction.
    pub parallel_for: ParallelForParams,
    /// Base seed of every effect's random streams. `None` draws one at startup.
    pub random_seed: Option<u64>,
    /// Frames between two statistics log lines; `0` disables them.
    pub stats_log_interval_frames: u64,
    /// Distance level of detail.
    pub lod: LodConfig,
}

impl Default for ParticleWorldConfig {
    fn default() -> Self {
        Self {
            spawn_count_multiplier: 1.0,
            max_particles_per_system: 65_535,
            parallel_for: ParallelForParams::default().with_bin_size(4),
            random_seed: None,
            stats_log_interval_frames: 0,
            lod: LodConfig::default(),
        }
    }
}

impl ParticleWorldConfig {
    /// Parses and validates a RON configuration.
    pub fn from_ron_str(text: &str) -> Result<Self, ParticleError> {
        let config: Self = ron::from_str(text).map_err(|e| ParticleError::ConfigRon(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ParticleError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file: `.json` files as JSON, anything else as RON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParticleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_ron_str(&text)
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ParticleError> {
        if self.spawn_count_multiplier.is_nan() || self.spawn_count_multiplier < 0.0 {
            return Err(ParticleError::InvalidConfig(format!(
                "spawn_count_multiplier must be non-negative, got {}",
                self.spawn_count_multiplier
            )));
        }
        if self.max_particles_per_system == 0 {
            return Err(ParticleError::InvalidConfig(
                "max_particles_per_system must be at least 1".to_string(),
            ));
        }
        if self.lod.thresholds.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ParticleError::InvalidConfig(format!(
                "lod thresholds must be ascending, got {:?}",
                self.lod.thresholds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ron_and_json_fill_missing_fields_with_defaults() {
        let ron_config =
            ParticleWorldConfig::from_ron_str("(spawn_count_multiplier: 0.5, random_seed: Some(7))")
                .unwrap();
        assert_eq!(ron_config.spawn_count_multiplier, 0.5);
        assert_eq!(ron_config.random_seed, Some(7));
        assert_eq!(ron_config.max_particles_per_system, 65_535);

        let json_config = ParticleWorldConfig::from_json_str(
            r#"{ "max_particles_per_system": 1024, "lod": { "thresholds": [10.0, 50.0] } }"#,
        )
        .unwrap();
        assert_eq!(json_config.max_particles_per_system, 1024);
        assert_eq!(json_config.lod.thresholds, vec![10.0, 50.0]);
        assert_eq!(json_config.parallel_for, ParallelForParams::default().with_bin_size(4));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ParticleWorldConfig::from_ron_str("(max_particles_per_system: 0)").unwrap_err();
        assert!(matches!(err, ParticleError::InvalidConfig(_)));

        let err =
            ParticleWorldConfig::from_ron_str("(lod: (thresholds: [20.0, 10.0]))").unwrap_err();
        assert!(matches!(err, ParticleError::InvalidConfig(_)));

        let err = ParticleWorldConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ParticleError::ConfigJson(_)));
    }

    #[test]
    fn lod_scale_follows_distance_state() {
        let lod = LodConfig {
            thresholds: vec![10.0, 20.0],
            spawn_scales: vec![1.0, 0.25],
        };
        assert_eq!(lod.spawn_scale(5.0 * 5.0), 1.0);
        assert_eq!(lod.spawn_scale(10.0 * 10.0), 0.25);
        assert_eq!(lod.spawn_scale(1_000.0 * 1_000.0), 0.25);
        assert_eq!(LodConfig::default().spawn_scale(1e9), 1.0);
    }
}
