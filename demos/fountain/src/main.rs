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

//! Runs the fountain effect headless for a few simulated seconds and logs
//! what the particle world does.
//!
//! Usage: `fountain [effect.ron] [world-config.(ron|json)]`

use anyhow::{Context, Result};
use flare_agents::particle_agent::{ParticleWorldConfig, ParticleWorldModule};
use flare_core::math::{Transform, Vec3};
use flare_lanes::particle_lane::ParticleEvent;
use flare_telemetry::logging::init_logging;

const DEFAULT_EFFECT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fountain.ron");
const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAMES: u32 = 300;

fn main() -> Result<()> {
    init_logging("info");

    let mut args = std::env::args().skip(1);
    let effect_path = args.next().unwrap_or_else(|| DEFAULT_EFFECT.to_string());
    let config = match args.next() {
        Some(path) => ParticleWorldConfig::from_file(&path)
            .with_context(|| format!("loading world config '{path}'"))?,
        None => ParticleWorldConfig {
            random_seed: Some(0x5EED),
            stats_log_interval_frames: 60,
            ..Default::default()
        },
    };

    let mut world = ParticleWorldModule::new(config);
    let fountain = world
        .create_effect_from_file(&effect_path, Transform::IDENTITY)
        .with_context(|| format!("loading effect '{effect_path}'"))?;
    world.set_viewer_position(Some(Vec3::new(0.0, 2.0, 10.0)));

    for frame in 0..FRAMES {
        // A splash every second, where the jet lands.
        if frame % 60 == 30 {
            world.post_event(ParticleEvent::new("Splash", Vec3::new(0.0, 0.0, 0.0)));
        }
        world.update(FRAME_TIME);

        if frame == FRAMES / 2 {
            if let Some(effect) = world.effect_mut(fountain) {
                effect.set_parameter("Intensity", 0.5);
                log::info!("Lowered the fountain intensity.");
            }
        }
    }

    let extracted = world.extract_render_data();
    let points: usize = extracted.iter().map(|e| e.len()).sum();
    log::info!("Final frame extracts {points} points.");
    if let Some(volume) = world.effect(fountain).and_then(|e| e.bounding_volume()) {
        log::info!(
            "Fountain bounds: center {:?}, radius {:.2}.",
            volume.center,
            volume.sphere_radius
        );
    }
    for phase in world.phase_timings() {
        log::info!(
            "{:>16}: {} runs, mean {:.1}us, max {}us",
            phase.name,
            phase.count,
            phase.mean_us(),
            phase.max_us
        );
    }
    log::info!("{}", world.stats().to_json()?);
    Ok(())
}
