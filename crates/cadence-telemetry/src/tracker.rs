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

//! Aggregated frame performance metrics.

use crate::average::TrailingAverage;
use serde::Serialize;
use std::sync::Mutex;

/// Completed frames between rate recomputations.
const RATE_WINDOW_FRAMES: u32 = 100;

/// Samples held by each per-phase trailing average.
const METRIC_WINDOW: usize = 150;

/// Aggregates the scheduler's performance metrics.
///
/// Fed from both of the scheduler's threads: the background timer thread
/// reports every frame attempt (dispatched or dropped; drops always count,
/// so `attempted_rate` and `achieved_rate` diverge under overload), while
/// the cooperative context reports wake latency, phase durations, and frame
/// completions. Every 100 completions the attempted and achieved rates are
/// recomputed over the elapsed window and the window restarts.
///
/// Purely observational; nothing here ever affects a scheduling decision.
#[derive(Debug)]
pub struct PerformanceTracker {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    wake_us: TrailingAverage,
    tick_us: TrailingAverage,
    render_us: TrailingAverage,
    tries: u32,
    ticks: u32,
    window_start_ms: u64,
    attempted: f32,
    achieved: f32,
    total_tries: u64,
    total_ticks: u64,
}

/// A point-in-time copy of the tracker's metrics, for diagnostics output.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    /// Frame attempts per second over the last completed rate window.
    pub attempted_fps: u32,
    /// Completed frames per second over the last completed rate window.
    pub achieved_fps: u32,
    /// Mean dispatch wake latency in microseconds.
    pub wake_avg_us: f64,
    /// Mean participant-tick phase duration in microseconds.
    pub tick_avg_us: f64,
    /// Mean render phase duration in microseconds.
    pub render_avg_us: f64,
    /// Total frame attempts since construction.
    pub attempted_frames: u64,
    /// Total completed frames since construction.
    pub completed_frames: u64,
}

impl PerformanceTracker {
    /// Creates an empty tracker. Rates read 0 until the first window of
    /// completions has elapsed.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                wake_us: TrailingAverage::new(METRIC_WINDOW),
                tick_us: TrailingAverage::new(METRIC_WINDOW),
                render_us: TrailingAverage::new(METRIC_WINDOW),
                tries: 0,
                ticks: 0,
                window_start_ms: 0,
                attempted: 0.0,
                achieved: 0.0,
                total_tries: 0,
                total_ticks: 0,
            }),
        }
    }

    /// Records the latency between a frame's scheduled dispatch and the
    /// moment the cooperative context actually picked it up.
    pub fn record_wake(&self, latency_us: u64) {
        self.lock().wake_us.record(latency_us as f64);
    }

    /// Records the duration of the participant-tick phase.
    pub fn record_tick(&self, duration_us: u64) {
        self.lock().tick_us.record(duration_us as f64);
    }

    /// Records the duration of the render phase.
    pub fn record_render(&self, duration_us: u64) {
        self.lock().render_us.record(duration_us as f64);
    }

    /// Counts a frame attempt. Called by the timer thread for every due
    /// frame, before the single-flight check, so dropped frames count too.
    pub fn on_frame_attempt(&self) {
        let mut inner = self.lock();
        inner.tries += 1;
        inner.total_tries += 1;
    }

    /// Counts a completed frame and, every 100 completions, recomputes the
    /// attempted and achieved rates over the elapsed wall-clock window.
    pub fn on_frame_completed(&self, elapsed_ms: u64) {
        let mut inner = self.lock();
        inner.ticks += 1;
        inner.total_ticks += 1;
        if inner.ticks == RATE_WINDOW_FRAMES {
            let window_ms = elapsed_ms.saturating_sub(inner.window_start_ms);
            if window_ms > 0 {
                inner.attempted = inner.tries as f32 * 1000.0 / window_ms as f32;
                inner.achieved = inner.ticks as f32 * 1000.0 / window_ms as f32;
            }
            inner.window_start_ms = elapsed_ms;
            inner.tries = 0;
            inner.ticks = 0;
        }
    }

    /// Completed frames per second over the last rate window, rounded.
    pub fn achieved_rate(&self) -> u32 {
        self.lock().achieved.round() as u32
    }

    /// Attempted frames per second over the last rate window, rounded.
    pub fn attempted_rate(&self) -> u32 {
        self.lock().attempted.round() as u32
    }

    /// Total completed frames since construction.
    pub fn completed_frames(&self) -> u64 {
        self.lock().total_ticks
    }

    /// Total frame attempts since construction.
    pub fn attempted_frames(&self) -> u64 {
        self.lock().total_tries
    }

    /// Copies out the current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();
        MetricsSnapshot {
            attempted_fps: inner.attempted.round() as u32,
            achieved_fps: inner.achieved.round() as u32,
            wake_avg_us: inner.wake_us.value(),
            tick_avg_us: inner.tick_us.value(),
            render_avg_us: inner.render_us.value(),
            attempted_frames: inner.total_tries,
            completed_frames: inner.total_ticks,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // No participant or render code ever runs under this lock.
        self.inner.lock().unwrap()
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_reads_zero() {
        let tracker = PerformanceTracker::new();
        assert_eq!(tracker.achieved_rate(), 0);
        assert_eq!(tracker.attempted_rate(), 0);
        assert_eq!(tracker.completed_frames(), 0);
    }

    #[test]
    fn rates_recompute_after_a_hundred_completions() {
        let tracker = PerformanceTracker::new();
        // Two attempts per completion, one completion every 20ms.
        for i in 1..=100u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_attempt();
            tracker.on_frame_completed(i * 20);
        }
        // 100 ticks over 2000ms -> 50fps; 200 tries -> 100fps.
        assert_eq!(tracker.achieved_rate(), 50);
        assert_eq!(tracker.attempted_rate(), 100);
    }

    #[test]
    fn rates_are_not_computed_before_the_window_closes() {
        let tracker = PerformanceTracker::new();
        for i in 1..=99u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(i * 20);
        }
        assert_eq!(tracker.achieved_rate(), 0);
    }

    #[test]
    fn each_window_reflects_only_its_own_cadence() {
        let tracker = PerformanceTracker::new();
        for i in 1..=100u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(i * 20);
        }
        assert_eq!(tracker.achieved_rate(), 50);
        // Second window runs at half the pace.
        for i in 1..=100u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(2000 + i * 40);
        }
        assert_eq!(tracker.achieved_rate(), 25);
        assert_eq!(tracker.attempted_rate(), 25);
    }

    #[test]
    fn rate_reads_are_rounded() {
        let tracker = PerformanceTracker::new();
        // 100 ticks over 1400ms -> 71.43fps, rounds to 71.
        for i in 1..=100u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(i * 14);
        }
        assert_eq!(tracker.achieved_rate(), 71);
    }

    #[test]
    fn lifetime_counters_survive_window_resets() {
        let tracker = PerformanceTracker::new();
        for i in 1..=250u64 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(i * 10);
        }
        assert_eq!(tracker.completed_frames(), 250);
        assert_eq!(tracker.attempted_frames(), 250);
    }

    #[test]
    fn snapshot_reflects_phase_averages() {
        let tracker = PerformanceTracker::new();
        tracker.record_wake(300);
        tracker.record_wake(500);
        tracker.record_tick(2_000);
        tracker.record_render(8_000);
        let snap = tracker.snapshot();
        assert_eq!(snap.wake_avg_us, 400.0);
        assert_eq!(snap.tick_avg_us, 2_000.0);
        assert_eq!(snap.render_avg_us, 8_000.0);
    }

    #[test]
    fn zero_length_window_does_not_divide_by_zero() {
        let tracker = PerformanceTracker::new();
        for _ in 0..100 {
            tracker.on_frame_attempt();
            tracker.on_frame_completed(0);
        }
        assert_eq!(tracker.achieved_rate(), 0);
    }
}
