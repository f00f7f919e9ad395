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

//! Headless smoke demo: runs the frame scheduler for a couple of seconds
//! with a console "surface", two participants, and a counting renderer,
//! then prints the collected metrics.

use anyhow::Context;
use cadence_core::{
    FrameParticipant, MonotonicClock, RenderCallback, RenderSurface, SchedulerConfig,
};
use cadence_runtime::FrameScheduler;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A stand-in surface that is always presentable.
#[derive(Debug)]
struct ConsoleSurface;

impl RenderSurface for ConsoleSurface {
    fn is_presentable(&self) -> bool {
        true
    }

    fn width(&self) -> u32 {
        640
    }

    fn height(&self) -> u32 {
        480
    }
}

/// "Renders" by counting frames.
#[derive(Debug)]
struct ConsoleRenderer {
    frames: AtomicU64,
}

impl RenderCallback for ConsoleRenderer {
    fn render(&self, _timestamp_ms: u64) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

/// Advances a wrapping phase once per frame, the way an animation manager
/// would advance its animations.
#[derive(Debug)]
struct Spinner {
    name: &'static str,
    phase: AtomicU64,
}

impl FrameParticipant for Spinner {
    fn participant_id(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.name)
    }

    fn tick(&self, timestamp_ms: u64) {
        self.phase.store(timestamp_ms % 360, Ordering::Relaxed);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = SchedulerConfig {
        target_frame_rate: 60,
        perf_debug: true,
        ..Default::default()
    };

    let renderer = Arc::new(ConsoleRenderer {
        frames: AtomicU64::new(0),
    });
    let (scheduler, mut driver) = FrameScheduler::new(
        config,
        Arc::new(MonotonicClock::new()),
        Arc::new(ConsoleSurface),
        renderer.clone(),
    )
    .context("failed to build the frame scheduler")?;

    scheduler.register_participant(Arc::new(Spinner {
        name: "spinner-a",
        phase: AtomicU64::new(0),
    }));
    scheduler.register_participant(Arc::new(Spinner {
        name: "spinner-b",
        phase: AtomicU64::new(0),
    }));

    scheduler.start();
    let cooperative = thread::spawn(move || driver.run());

    thread::sleep(Duration::from_secs(2));
    scheduler.stop();

    let snapshot = scheduler.tracker().snapshot();
    let rendered = renderer.frames.load(Ordering::Relaxed);
    log::info!("rendered {rendered} frames in 2s");
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("failed to serialize metrics")?
    );

    drop(scheduler);
    cooperative
        .join()
        .map_err(|_| anyhow::anyhow!("frame driver thread panicked"))?;
    Ok(())
}
