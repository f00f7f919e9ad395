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

//! # Cadence Runtime
//!
//! The frame-pacing scheduler proper: a background timer thread measures
//! elapsed time and decides when a frame attempt is due, a single-flight
//! flag guarantees at most one tick is ever in flight, and the frame driver
//! executes dispatched ticks serially on the application's cooperative
//! execution context: every registered participant is ticked in order, then
//! the render callback runs when the surface is presentable.
//!
//! Overload never queues work: when a frame attempt finds the previous tick
//! still executing, the frame is dropped, which shows up as divergence
//! between the attempted and achieved rates.

pub mod driver;
pub mod registry;
pub mod scheduler;

pub use driver::FrameDriver;
pub use registry::ParticipantRegistry;
pub use scheduler::{FrameScheduler, TickFlag};
