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

//! RAII timers accumulating the wall-clock cost of named simulation phases.

use flare_core::Stopwatch;
use std::sync::Mutex;

/// Accumulated timing of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStat {
    /// Phase name.
    pub name: &'static str,
    /// Number of recorded runs.
    pub count: u64,
    /// Sum of all runs, in microseconds.
    pub total_us: u64,
    /// Longest run, in microseconds.
    pub max_us: u64,
}

impl PhaseStat {
    /// Mean duration of a run, in microseconds.
    pub fn mean_us(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_us as f64 / self.count as f64
        }
    }
}

/// Per-phase timing accumulator, safe to record into from worker threads.
#[derive(Debug, Default)]
pub struct PhaseTimings {
    phases: Mutex<Vec<PhaseStat>>,
}

impl PhaseTimings {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one run of `name` lasting `elapsed_us`.
    pub fn record(&self, name: &'static str, elapsed_us: u64) {
        let Ok(mut phases) = self.phases.lock() else {
            log::error!("[PhaseTimings] Lock poisoned, dropping sample for '{name}'.");
            return;
        };
        match phases.iter_mut().find(|p| p.name == name) {
            Some(stat) => {
                stat.count += 1;
                stat.total_us += elapsed_us;
                stat.max_us = stat.max_us.max(elapsed_us);
            }
            None => phases.push(PhaseStat {
                name,
                count: 1,
                total_us: elapsed_us,
                max_us: elapsed_us,
            }),
        }
    }

    /// Starts timing `name` until the returned guard is dropped.
    pub fn scope(&self, name: &'static str) -> ScopedPhaseTimer<'_> {
        ScopedPhaseTimer::new(self, name)
    }

    /// Copies the stats of every phase, in first-recorded order.
    pub fn snapshot(&self) -> Vec<PhaseStat> {
        self.phases
            .lock()
            .map(|phases| phases.clone())
            .unwrap_or_default()
    }

    /// Forgets every recorded run.
    pub fn reset(&self) {
        if let Ok(mut phases) = self.phases.lock() {
            phases.clear();
        }
    }
}

/// Times the enclosing scope and records it into [`PhaseTimings`] on drop,
/// including on early return.
pub struct ScopedPhaseTimer<'a> {
    stopwatch: Stopwatch,
    timings: &'a PhaseTimings,
    name: &'static str,
}

impl<'a> ScopedPhaseTimer<'a> {
    /// Starts a timer for `name`.
    pub fn new(timings: &'a PhaseTimings, name: &'static str) -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            timings,
            name,
        }
    }
}

impl Drop for ScopedPhaseTimer<'_> {
    fn drop(&mut self) {
        if let Some(elapsed_us) = self.stopwatch.elapsed_us() {
            self.timings.record(self.name, elapsed_us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn scoped_timer_records_on_drop() {
        let timings = PhaseTimings::new();
        {
            let _timer = timings.scope("update");
            thread::sleep(Duration::from_millis(2));
        }
        timings.record("update", 0);
        timings.record("extract", 5);

        let stats = timings.snapshot();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "update");
        assert_eq!(stats[0].count, 2);
        assert!(stats[0].max_us >= 2_000);
        assert_eq!(stats[1].mean_us(), 5.0);

        timings.reset();
        assert!(timings.snapshot().is_empty());
    }
}
