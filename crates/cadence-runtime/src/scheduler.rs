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

//! The frame scheduler and its background timer loop.

use crate::driver::FrameDriver;
use crate::registry::ParticipantRegistry;
use cadence_core::config::interval_micros_for;
use cadence_core::{Clock, ConfigError, ConfigResult, FrameParticipant, RenderCallback,
    RenderSurface, SchedulerConfig};
use cadence_telemetry::PerformanceTracker;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Gap between executed ticks worth reporting, in milliseconds.
pub(crate) const BIG_GAP_MS: u64 = 500;

/// Reporting threshold when hang debugging is enabled.
pub(crate) const HANG_GAP_MS: u64 = 100;

/// A dispatched frame, handed from the timer thread to the cooperative
/// execution context.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameTask {
    /// Clock reading at the moment the timer thread dispatched the frame.
    pub scheduled_micros: u64,
}

/// The single-flight flag shared between the timer thread and the
/// cooperative execution context.
///
/// `try_acquire` is an atomic test-and-set, so the check-then-dispatch in
/// the timer loop can never double-dispatch: a frame attempt that finds the
/// flag held is dropped outright rather than queued.
#[derive(Debug, Default)]
pub struct TickFlag {
    ticking: AtomicBool,
}

impl TickFlag {
    /// Creates a released flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to take the flag; returns whether it was free.
    pub fn try_acquire(&self) -> bool {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the flag.
    pub fn release(&self) {
        self.ticking.store(false, Ordering::Release);
    }

    /// Whether a dispatched tick is currently executing.
    pub fn is_in_flight(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }
}

/// Paces frame work against a target rate.
///
/// A background timer thread sleeps in short quanta, and whenever the
/// target interval has elapsed since the last attempt it hands a tick to
/// the cooperative execution context, unless the previous tick is still
/// executing, in which case the frame is dropped. The cooperative side is
/// the [`FrameDriver`] returned at construction; the application runs it on
/// the thread that owns all tick and render state.
///
/// All collaborators are injected at construction, so independent
/// schedulers can coexist (and tests can substitute every dependency).
///
/// ```no_run
/// use cadence_core::{MonotonicClock, SchedulerConfig};
/// use cadence_runtime::FrameScheduler;
/// # use std::borrow::Cow;
/// # use std::sync::Arc;
/// # #[derive(Debug)]
/// # struct Headless;
/// # impl cadence_core::RenderSurface for Headless {
/// #     fn is_presentable(&self) -> bool { true }
/// #     fn width(&self) -> u32 { 640 }
/// #     fn height(&self) -> u32 { 480 }
/// # }
/// # impl cadence_core::RenderCallback for Headless {
/// #     fn render(&self, _timestamp_ms: u64) {}
/// # }
///
/// let (scheduler, mut driver) = FrameScheduler::new(
///     SchedulerConfig::default(),
///     Arc::new(MonotonicClock::new()),
///     Arc::new(Headless),
///     Arc::new(Headless),
/// )?;
/// scheduler.start();
/// driver.run(); // blocks on the cooperative thread
/// # Ok::<(), cadence_core::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    interval_micros: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    flag: Arc<TickFlag>,
    clock: Arc<dyn Clock>,
    registry: Arc<ParticipantRegistry>,
    tracker: Arc<PerformanceTracker>,
    sender: flume::Sender<FrameTask>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl FrameScheduler {
    /// Creates a scheduler and the driver for its cooperative side.
    ///
    /// Validates the configuration up front; an invalid target rate or
    /// sleep granularity never reaches the interval math.
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        surface: Arc<dyn RenderSurface>,
        renderer: Arc<dyn RenderCallback>,
    ) -> ConfigResult<(Self, FrameDriver)> {
        config.validate()?;

        let (sender, receiver) = flume::unbounded();
        let flag = Arc::new(TickFlag::new());
        let registry = Arc::new(ParticipantRegistry::with_hang_gap(
            config.hang_debug.then_some(HANG_GAP_MS),
        ));
        let tracker = Arc::new(PerformanceTracker::new());

        let driver = FrameDriver::new(
            receiver,
            clock.clone(),
            surface,
            renderer,
            registry.clone(),
            tracker.clone(),
            flag.clone(),
            &config,
        );

        let scheduler = Self {
            interval_micros: Arc::new(AtomicU64::new(interval_micros_for(
                config.target_frame_rate,
            ))),
            running: Arc::new(AtomicBool::new(false)),
            flag,
            clock,
            registry,
            tracker,
            sender,
            ticker: Mutex::new(None),
            config,
        };
        Ok((scheduler, driver))
    }

    /// Starts the per-frame tick. A no-op if already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let ticker = Ticker {
            clock: self.clock.clone(),
            running: self.running.clone(),
            flag: self.flag.clone(),
            interval_micros: self.interval_micros.clone(),
            tracker: self.tracker.clone(),
            sender: self.sender.clone(),
            granularity: Duration::from_millis(self.config.sleep_granularity_ms),
            perf_debug: self.config.perf_debug,
        };
        match std::thread::Builder::new()
            .name("cadence-ticker".into())
            .spawn(move || ticker.run())
        {
            Ok(handle) => *self.ticker.lock().unwrap() = Some(handle),
            Err(err) => {
                log::error!("failed to spawn ticker thread: {err}");
                self.running.store(false, Ordering::Release);
            }
        }
    }

    /// Stops the per-frame tick. A no-op if already stopped.
    ///
    /// Prevents new frame attempts and joins the timer thread (bounded by
    /// one sleep quantum). A tick already dispatched to the cooperative
    /// context runs to completion.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            if handle.join().is_err() {
                log::error!("ticker thread terminated abnormally");
            }
        }
    }

    /// Whether the tick interval is running (not necessarily ticking at
    /// this instant, but in general).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Retargets the scheduler to the given frames per second. Takes
    /// effect on the timer thread's next elapsed-time check.
    pub fn set_target_rate(&self, fps: u32) -> ConfigResult<()> {
        if fps == 0 {
            return Err(ConfigError::InvalidTargetRate(fps));
        }
        self.interval_micros
            .store(interval_micros_for(fps), Ordering::Release);
        Ok(())
    }

    /// A millisecond-granularity timestamp from the scheduler's clock.
    pub fn timestamp(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Registers a frame participant; see [`ParticipantRegistry::register`].
    pub fn register_participant(&self, participant: Arc<dyn FrameParticipant>) -> bool {
        self.registry.register(participant)
    }

    /// Whether the given participant is registered.
    pub fn is_registered_participant(&self, participant: &Arc<dyn FrameParticipant>) -> bool {
        self.registry.is_registered(participant)
    }

    /// Removes a frame participant; see [`ParticipantRegistry::unregister`].
    pub fn unregister_participant(&self, participant: &Arc<dyn FrameParticipant>) {
        self.registry.unregister(participant)
    }

    /// The participant registry.
    pub fn registry(&self) -> &Arc<ParticipantRegistry> {
        &self.registry
    }

    /// The performance tracker fed by this scheduler.
    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The background timer loop.
///
/// Owns nothing but its local attempt stamp; everything shared with the
/// cooperative context goes through the running flag, the tick flag, the
/// interval, the tracker, and the dispatch channel.
struct Ticker {
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    flag: Arc<TickFlag>,
    interval_micros: Arc<AtomicU64>,
    tracker: Arc<PerformanceTracker>,
    sender: flume::Sender<FrameTask>,
    granularity: Duration,
    perf_debug: bool,
}

impl Ticker {
    fn run(self) {
        log::info!(
            "frame ticker running [granularity={}ms]",
            self.granularity.as_millis()
        );
        let granularity_us = self.granularity.as_micros() as u64;
        let mut last_attempt_us: u64 = 0;

        while self.running.load(Ordering::Acquire) {
            let slept_at = self.perf_debug.then(|| self.clock.now_micros());
            self.clock.sleep(self.granularity);
            let woke_us = self.clock.now_micros();

            if let Some(start) = slept_at {
                let quantum = woke_us.saturating_sub(start);
                if quantum > granularity_us * 3 / 2 {
                    log::warn!("long sleep quantum [elapsed={quantum}us]");
                }
            }

            // Some platform clocks have been seen leaping into the past;
            // resynchronize on the new reading instead of computing a
            // bogus elapsed time.
            if woke_us < last_attempt_us {
                log::warn!(
                    "clock moved backwards, resynchronizing [dt={}us]",
                    last_attempt_us - woke_us
                );
                last_attempt_us = woke_us;
            }

            if woke_us - last_attempt_us >= self.interval_micros.load(Ordering::Acquire) {
                last_attempt_us = woke_us;
                self.tracker.on_frame_attempt();
                if self.flag.try_acquire() {
                    let task = FrameTask {
                        scheduled_micros: woke_us,
                    };
                    if self.sender.send(task).is_err() {
                        // The driver is gone; nothing will ever release the
                        // flag again, so shut the loop down.
                        self.flag.release();
                        log::warn!("frame driver disconnected, stopping ticker");
                        self.running.store(false, Ordering::Release);
                    }
                } else {
                    // The previous tick is still executing: drop this frame
                    // rather than queue a backlog. The attempt above still
                    // counts, so sustained overload shows up as divergence
                    // between attempted and achieved rates.
                    log::debug!("dropping frame, previous tick still in flight");
                }
            }
        }
        log::info!("frame ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_flag_is_exclusive() {
        let flag = TickFlag::new();
        assert!(flag.try_acquire());
        assert!(!flag.try_acquire());
        assert!(flag.is_in_flight());
        flag.release();
        assert!(!flag.is_in_flight());
        assert!(flag.try_acquire());
    }

    #[test]
    fn tick_flag_survives_contention() {
        let flag = Arc::new(TickFlag::new());
        let mut handles = Vec::new();
        let wins = Arc::new(AtomicU64::new(0));
        for _ in 0..8 {
            let flag = flag.clone();
            let wins = wins.clone();
            handles.push(std::thread::spawn(move || {
                if flag.try_acquire() {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
