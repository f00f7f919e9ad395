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

//! Periodic frame-rate diagnostics.

use crate::tracker::PerformanceTracker;
use cadence_core::Stopwatch;

/// Default seconds between rate reports.
const DEFAULT_REPORT_INTERVAL_SECS: f64 = 10.0;

/// Emits a periodic log line summarizing the scheduler's rates.
///
/// Checked once per completed frame by the frame driver; when the report
/// interval has elapsed it logs the achieved and attempted rates, plus the
/// wake/tick/render averages in hundredths of a millisecond when per-phase
/// capture is enabled.
#[derive(Debug)]
pub struct RateReporter {
    since_report: Stopwatch,
    interval_secs: f64,
    per_phase: bool,
}

impl RateReporter {
    /// Creates a reporter with the given interval between reports.
    pub fn new(interval_secs: f64, per_phase: bool) -> Self {
        Self {
            since_report: Stopwatch::new(),
            interval_secs,
            per_phase,
        }
    }

    /// Creates a reporter with the default 10-second interval.
    pub fn with_default_interval(per_phase: bool) -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL_SECS, per_phase)
    }

    /// Whether the report interval has elapsed.
    pub fn should_report(&self) -> bool {
        self.since_report.elapsed_secs_f64() >= self.interval_secs
    }

    /// Logs a report if the interval has elapsed, restarting the interval.
    /// Returns whether a report was emitted.
    pub fn maybe_report(&mut self, tracker: &PerformanceTracker) -> bool {
        if !self.should_report() {
            return false;
        }
        let snap = tracker.snapshot();
        log::info!(
            "frame rate [achieved={}fps, attempted={}fps, completed={}]",
            snap.achieved_fps,
            snap.attempted_fps,
            snap.completed_frames,
        );
        if self.per_phase {
            // Phase averages in hundredths of a millisecond.
            log::info!(
                "frame phases [wake={}, tick={}, render={}]",
                (snap.wake_avg_us / 10.0).round() as u64,
                (snap.tick_avg_us / 10.0).round() as u64,
                (snap.render_avg_us / 10.0).round() as u64,
            );
        }
        self.since_report.restart();
        true
    }
}
