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

//! Monotonic time sources consumed by the scheduler.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// The scheduler reads this from its background timer thread and from the
/// cooperative execution context, so implementations must be `Send + Sync`
/// and cheap to query. The scheduler corrects for backward jumps
/// defensively, but implementations should be monotonic whenever the
/// platform allows it.
pub trait Clock: Send + Sync + Debug + 'static {
    /// Milliseconds elapsed since the clock's epoch.
    fn now_millis(&self) -> u64;

    /// Microseconds elapsed since the clock's epoch.
    fn now_micros(&self) -> u64;

    /// Suspends the calling thread for the given quantum.
    ///
    /// The background timer loop sleeps through this hook rather than
    /// calling `std::thread::sleep` directly, so a test clock can advance
    /// virtual time instead of blocking.
    fn sleep(&self, quantum: Duration) {
        std::thread::sleep(quantum);
    }
}

/// Standard clock backed by [`std::time::Instant`].
///
/// The epoch is the moment of construction; `Instant` guarantees
/// monotonicity on every supported platform.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose epoch is the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    #[inline]
    fn now_micros(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        assert!(clock.now_millis() < 50, "fresh clock should read near zero");
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_micros();
        for _ in 0..1000 {
            let now = clock.now_micros();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn millis_and_micros_agree() {
        let clock = MonotonicClock::new();
        thread::sleep(Duration::from_millis(20));
        let millis = clock.now_millis();
        let micros = clock.now_micros();
        // The two reads are not simultaneous; allow a small skew.
        assert!(micros / 1000 >= millis);
        assert!(micros / 1000 - millis < 10);
    }

    #[test]
    fn default_sleep_blocks_for_quantum() {
        let clock = MonotonicClock::new();
        let before = clock.now_millis();
        clock.sleep(Duration::from_millis(30));
        let slept = clock.now_millis() - before;
        assert!(slept >= 30, "slept only {slept}ms");
        assert!(slept < 230, "slept {slept}ms, far past the quantum");
    }
}
