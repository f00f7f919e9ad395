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

//! The cooperative execution context's side of the scheduler.

use crate::registry::ParticipantRegistry;
use crate::scheduler::{FrameTask, TickFlag, BIG_GAP_MS, HANG_GAP_MS};
use cadence_core::{Clock, RenderCallback, RenderSurface, SchedulerConfig};
use cadence_telemetry::{PerformanceTracker, RateReporter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Executes dispatched ticks serially on the application's cooperative
/// thread.
///
/// One driver exists per scheduler, created alongside it. The application
/// either parks a thread in [`run`](FrameDriver::run) or calls
/// [`pump`](FrameDriver::pump) from an existing event loop; both execute
/// each dispatched tick to completion before touching the next, so tick and
/// render state never needs cross-thread synchronization.
///
/// The single-flight flag guarantees at most one task is ever waiting in
/// the channel, and it is released on every exit path of the tick routine,
/// including a panicking participant or render callback, so a fault can
/// never wedge the scheduler.
#[derive(Debug)]
pub struct FrameDriver {
    receiver: flume::Receiver<FrameTask>,
    clock: Arc<dyn Clock>,
    surface: Arc<dyn RenderSurface>,
    renderer: Arc<dyn RenderCallback>,
    registry: Arc<ParticipantRegistry>,
    tracker: Arc<PerformanceTracker>,
    flag: Arc<TickFlag>,
    reporter: RateReporter,
    hang_debug: bool,
    last_tick_ms: u64,
}

impl FrameDriver {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        receiver: flume::Receiver<FrameTask>,
        clock: Arc<dyn Clock>,
        surface: Arc<dyn RenderSurface>,
        renderer: Arc<dyn RenderCallback>,
        registry: Arc<ParticipantRegistry>,
        tracker: Arc<PerformanceTracker>,
        flag: Arc<TickFlag>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            receiver,
            clock,
            surface,
            renderer,
            registry,
            tracker,
            flag,
            reporter: RateReporter::with_default_interval(config.perf_debug),
            hang_debug: config.hang_debug,
            last_tick_ms: 0,
        }
    }

    /// Runs dispatched ticks until the scheduler is dropped.
    ///
    /// Blocks the calling thread; this is the simplest way to dedicate a
    /// thread as the cooperative execution context.
    pub fn run(&mut self) {
        while let Ok(task) = self.receiver.recv() {
            self.execute(task);
        }
        log::info!("frame driver shutting down, scheduler disconnected");
    }

    /// Executes any pending dispatched tick without blocking, returning the
    /// number executed.
    ///
    /// For embedding in an existing event loop that already owns the
    /// cooperative thread. At most one task can ever be pending, so this
    /// returns 0 or 1.
    pub fn pump(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            self.execute(task);
            executed += 1;
        }
        executed
    }

    /// The tick routine: one full frame of work.
    fn execute(&mut self, task: FrameTask) {
        // Released (and the completion counted) on every exit path.
        let _guard = FlightGuard {
            flag: &self.flag,
            tracker: &self.tracker,
            clock: &self.clock,
        };

        let entered_us = self.clock.now_micros();
        self.tracker
            .record_wake(entered_us.saturating_sub(task.scheduled_micros));

        let timestamp_ms = self.clock.now_millis();
        let gap_limit = if self.hang_debug { HANG_GAP_MS } else { BIG_GAP_MS };
        if self.last_tick_ms != 0 {
            let gap = timestamp_ms.saturating_sub(self.last_tick_ms);
            if gap > gap_limit {
                log::debug!("long delay between ticks [delay={gap}ms]");
            }
        }
        self.last_tick_ms = timestamp_ms;

        self.registry.tick_all(timestamp_ms);
        let ticked_us = self.clock.now_micros();

        // Skip rendering into a hidden or zero-sized surface; the tick
        // still counts as completed.
        if self.surface.is_presentable() && self.surface.width() > 0 && self.surface.height() > 0
        {
            let renderer = &self.renderer;
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| renderer.render(timestamp_ms)));
            if outcome.is_err() {
                log::warn!("render callback choked during frame [timestamp={timestamp_ms}ms]");
            }
        }
        let rendered_us = self.clock.now_micros();

        self.tracker
            .record_tick(ticked_us.saturating_sub(entered_us));
        self.tracker
            .record_render(rendered_us.saturating_sub(ticked_us));
        self.reporter.maybe_report(&self.tracker);
    }
}

/// Releases the single-flight flag and counts the completion when the tick
/// routine exits, however it exits.
struct FlightGuard<'a> {
    flag: &'a TickFlag,
    tracker: &'a PerformanceTracker,
    clock: &'a Arc<dyn Clock>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // Completion must be counted before the flag is released.
        self.tracker.on_frame_completed(self.clock.now_millis());
        self.flag.release();
    }
}
