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

//! Collaborator traits at the rendering boundary.
//!
//! The scheduler never draws anything itself. It asks the surface whether
//! presenting makes sense this frame and, if so, hands the timestamp to the
//! render callback. Any windowing or graphics backend can implement these.

use std::fmt::Debug;

/// Abstracts the target the application presents into.
///
/// Queried once per dispatched tick. When the surface is not presentable
/// (hidden, or sized to zero) rendering is skipped for that frame while the
/// tick itself still runs and counts. That is a policy decision, not a
/// failure.
pub trait RenderSurface: Send + Sync + Debug + 'static {
    /// Whether the surface can currently be drawn to.
    fn is_presentable(&self) -> bool;

    /// Width of the drawable area in pixels.
    fn width(&self) -> u32;

    /// Height of the drawable area in pixels.
    fn height(&self) -> u32;
}

/// The external draw hook invoked once per completed dispatch.
pub trait RenderCallback: Send + Sync + Debug + 'static {
    /// Performs all drawing for the frame with the given timestamp.
    ///
    /// Runs on the cooperative execution context. Must not block
    /// indefinitely: while this call is outstanding every scheduled frame
    /// attempt is dropped, so a hung callback starves the application of
    /// frames until it returns. A panic here is caught, logged, and the
    /// frame still counts as completed.
    fn render(&self, timestamp_ms: u64);
}
