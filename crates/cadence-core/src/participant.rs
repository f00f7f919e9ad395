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

//! The periodic-callback capability implemented by frame participants.

use std::borrow::Cow;
use std::fmt::Debug;

/// A component that wants to be called back once per frame.
///
/// Participants are registered with the runtime's participant registry and
/// are ticked in registration order on the cooperative execution context.
/// `tick` is only ever invoked from that context, never concurrently with
/// itself; implementations that mutate state do so through interior
/// mutability.
///
/// A panic inside `tick` is caught by the registry, logged with this
/// participant's id, and does not prevent later participants from being
/// ticked or abort the frame.
pub trait FrameParticipant: Send + Sync + Debug + 'static {
    /// Unique, human-readable identifier used in diagnostics when this
    /// participant misbehaves.
    fn participant_id(&self) -> Cow<'static, str>;

    /// Called once per dispatched frame with the frame timestamp in
    /// milliseconds.
    ///
    /// Must not block: work that takes a meaningful fraction of the frame
    /// interval should be broken up across frames or moved to another
    /// thread with the results handed back for incorporation here.
    fn tick(&self, timestamp_ms: u64);
}
