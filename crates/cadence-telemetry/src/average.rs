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

//! Fixed-window rolling mean.

/// A rolling mean over the most recent `window` samples.
///
/// The backing ring buffer is allocated once at construction; recording a
/// sample never reallocates. Until the window fills, the mean covers only
/// the samples recorded so far; an empty average reads 0.
///
/// The window size is chosen per metric to smooth short bursts without
/// masking sustained drift; the frame metrics use 150 samples.
#[derive(Debug, Clone)]
pub struct TrailingAverage {
    samples: Vec<f64>,
    window: usize,
    next: usize,
}

impl TrailingAverage {
    /// Creates an average over the most recent `window` samples. A zero
    /// window is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: Vec::with_capacity(window),
            window,
            next: 0,
        }
    }

    /// Appends a sample, overwriting the oldest once the window is full.
    pub fn record(&mut self, value: f64) {
        if self.samples.len() < self.window {
            self.samples.push(value);
        } else {
            self.samples[self.next] = value;
        }
        self.next = (self.next + 1) % self.window;
    }

    /// The mean of the currently held samples, or 0 if none have been
    /// recorded.
    pub fn value(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Number of samples currently held (at most the window size).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no samples have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_reads_zero() {
        let avg = TrailingAverage::new(10);
        assert_eq!(avg.value(), 0.0);
        assert!(avg.is_empty());
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut avg = TrailingAverage::new(10);
        avg.record(2.0);
        avg.record(4.0);
        assert_eq!(avg.len(), 2);
        assert_eq!(avg.value(), 3.0);
    }

    #[test]
    fn full_window_drops_the_oldest() {
        let mut avg = TrailingAverage::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            avg.record(v);
        }
        // 1.0 has been overwritten; mean of [4, 2, 3].
        assert_eq!(avg.len(), 3);
        assert_eq!(avg.value(), 3.0);
    }

    #[test]
    fn window_of_zeros_erases_history() {
        let mut avg = TrailingAverage::new(5);
        for v in [100.0, 250.0, 17.0] {
            avg.record(v);
        }
        for _ in 0..5 {
            avg.record(0.0);
        }
        assert_eq!(avg.value(), 0.0);
    }

    #[test]
    fn only_the_last_window_counts() {
        let mut avg = TrailingAverage::new(4);
        for v in 0..100 {
            avg.record(v as f64);
        }
        // Last four samples: 96, 97, 98, 99.
        assert_eq!(avg.value(), 97.5);
    }

    #[test]
    fn recording_never_grows_past_the_window() {
        let mut avg = TrailingAverage::new(8);
        for v in 0..1000 {
            avg.record(v as f64);
        }
        assert_eq!(avg.len(), 8);
    }

    #[test]
    fn zero_window_is_clamped_to_one() {
        let mut avg = TrailingAverage::new(0);
        avg.record(5.0);
        avg.record(7.0);
        assert_eq!(avg.value(), 7.0);
    }
}
