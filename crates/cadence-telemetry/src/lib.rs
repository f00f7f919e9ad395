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

//! # Cadence Telemetry
//!
//! Rolling frame metrics: the trailing averages behind every timing metric,
//! the performance tracker fed by the scheduler from both of its threads,
//! and the periodic rate reporter. Everything here is observational; none
//! of it ever affects a scheduling decision.

pub mod average;
pub mod reporter;
pub mod tracker;

pub use average::TrailingAverage;
pub use reporter::RateReporter;
pub use tracker::{MetricsSnapshot, PerformanceTracker};
