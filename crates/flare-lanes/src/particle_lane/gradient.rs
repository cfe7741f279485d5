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

use bincode::{Decode, Encode};
use flare_core::math::LinearRgba;
use serde::{Deserialize, Serialize};

/// One stop of a [`ColorGradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct GradientKey {
    /// Position of the stop in `[0, 1]`.
    pub position: f32,
    /// Color at the stop.
    pub color: LinearRgba,
}

/// A piecewise-linear color ramp over `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ColorGradient {
    keys: Vec<GradientKey>,
}

impl ColorGradient {
    /// Builds a gradient from stops in any order.
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { keys }
    }

    /// The stops, sorted by position.
    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }

    /// Returns `true` if the gradient has no stop.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The color at `t`. Before the first stop and after the last, the end
    /// colors are held. An empty gradient is white.
    pub fn sample(&self, t: f32) -> LinearRgba {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return LinearRgba::WHITE;
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }

        let upper = self.keys.partition_point(|key| key.position <= t);
        let (a, b) = (self.keys[upper - 1], self.keys[upper]);
        let span = b.position - a.position;
        if span <= f32::EPSILON {
            return b.color;
        }
        LinearRgba::lerp(a.color, b.color, (t - a.position) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> ColorGradient {
        ColorGradient::new(vec![
            GradientKey {
                position: 1.0,
                color: LinearRgba::BLUE,
            },
            GradientKey {
                position: 0.0,
                color: LinearRgba::RED,
            },
        ])
    }

    #[test]
    fn sample_interpolates_between_stops() {
        let mid = ramp().sample(0.25);
        assert_relative_eq!(mid.r, 0.75);
        assert_relative_eq!(mid.b, 0.25);
    }

    #[test]
    fn sample_holds_end_colors() {
        assert_eq!(ramp().sample(-1.0), LinearRgba::RED);
        assert_eq!(ramp().sample(2.0), LinearRgba::BLUE);
        assert_eq!(ColorGradient::default().sample(0.5), LinearRgba::WHITE);
    }
}
