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

//! # Cadence Core
//!
//! Foundational crate containing the traits, core types, and interface
//! contracts of the frame-pacing scheduler: the clock and participant
//! capabilities, the collaborator traits at the render boundary, and the
//! scheduler configuration.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod participant;
pub mod surface;
pub mod utils;

pub use clock::{Clock, MonotonicClock};
pub use config::SchedulerConfig;
pub use error::{ConfigError, ConfigResult};
pub use participant::FrameParticipant;
pub use surface::{RenderCallback, RenderSurface};
pub use utils::timer::Stopwatch;
