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

//! Ordered registry of frame participants.

use cadence_core::{FrameParticipant, Stopwatch};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

type Slot = Option<Arc<dyn FrameParticipant>>;

/// An ordered collection of tick participants.
///
/// Participants occupy slots in registration order; removal empties the
/// slot without shifting later entries, so the indices of other
/// participants are stable even while an iteration elsewhere is in
/// progress, and the next registration reuses the first empty slot.
/// Membership is by identity (`Arc::ptr_eq`), never by value.
///
/// Registration and removal may happen from any thread and take effect no
/// later than the next dispatch: `tick_all` iterates a snapshot of the slot
/// array taken when the dispatch starts.
#[derive(Debug)]
pub struct ParticipantRegistry {
    slots: Mutex<Vec<Slot>>,
    hang_gap_ms: Option<u64>,
}

impl ParticipantRegistry {
    /// Creates an empty registry without per-participant hang timing.
    pub fn new() -> Self {
        Self::with_hang_gap(None)
    }

    /// Creates an empty registry. When `hang_gap_ms` is set, each
    /// participant's tick is timed and any participant exceeding the gap is
    /// named in the log.
    pub fn with_hang_gap(hang_gap_ms: Option<u64>) -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            hang_gap_ms,
        }
    }

    /// Registers a participant, appending it to the first empty slot.
    ///
    /// Refuses a participant that is already present (identity check) and
    /// returns whether the registration succeeded.
    pub fn register(&self, participant: Arc<dyn FrameParticipant>) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if slots
            .iter()
            .flatten()
            .any(|p| Arc::ptr_eq(p, &participant))
        {
            log::warn!(
                "refusing to register duplicate frame participant [id={}]",
                participant.participant_id()
            );
            return false;
        }
        log::debug!(
            "registered frame participant [id={}]",
            participant.participant_id()
        );
        match slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(participant),
            None => slots.push(Some(participant)),
        }
        true
    }

    /// Whether the given participant is currently registered.
    pub fn is_registered(&self, participant: &Arc<dyn FrameParticipant>) -> bool {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .any(|p| Arc::ptr_eq(p, participant))
    }

    /// Removes a participant by emptying its slot. Later slots keep their
    /// indices; a no-op if the participant is not registered.
    pub fn unregister(&self, participant: &Arc<dyn FrameParticipant>) {
        let mut slots = self.slots.lock().unwrap();
        for slot in slots.iter_mut() {
            let occupied = matches!(slot, Some(p) if Arc::ptr_eq(p, participant));
            if occupied {
                *slot = None;
                return;
            }
        }
    }

    /// Number of live participants.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().iter().flatten().count()
    }

    /// True if no participants are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ticks every live participant in slot order with the given frame
    /// timestamp.
    ///
    /// Iterates a snapshot of the slot array taken on entry, so concurrent
    /// registration changes take effect at the next dispatch. A panic
    /// inside one participant's tick is caught and logged with the
    /// participant's id; later participants are still ticked.
    pub fn tick_all(&self, timestamp_ms: u64) {
        let snapshot: Vec<Slot> = self.slots.lock().unwrap().clone();
        for participant in snapshot.iter().flatten() {
            let watch = Stopwatch::new();

            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| participant.tick(timestamp_ms)));
            if outcome.is_err() {
                log::warn!(
                    "frame participant choked during tick [id={}]",
                    participant.participant_id()
                );
            }

            if let Some(gap) = self.hang_gap_ms {
                let took = watch.elapsed_ms();
                if took > gap {
                    log::warn!(
                        "frame participant took a long time [id={}, time={}ms]",
                        participant.participant_id(),
                        took
                    );
                }
            }
        }
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Records the order in which participants were ticked.
    #[derive(Debug, Default)]
    struct TickLog {
        entries: Mutex<Vec<String>>,
    }

    impl TickLog {
        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        log: Arc<TickLog>,
        ticks: AtomicU64,
    }

    impl Recorder {
        fn new(name: &'static str, log: Arc<TickLog>) -> Arc<Self> {
            Arc::new(Self {
                name,
                log,
                ticks: AtomicU64::new(0),
            })
        }
    }

    impl FrameParticipant for Recorder {
        fn participant_id(&self) -> Cow<'static, str> {
            Cow::Borrowed(self.name)
        }

        fn tick(&self, _timestamp_ms: u64) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.log.entries.lock().unwrap().push(self.name.to_string());
        }
    }

    #[derive(Debug)]
    struct Panicker;

    impl FrameParticipant for Panicker {
        fn participant_id(&self) -> Cow<'static, str> {
            Cow::Borrowed("panicker")
        }

        fn tick(&self, _timestamp_ms: u64) {
            panic!("participant blew up");
        }
    }

    fn as_participant(recorder: &Arc<Recorder>) -> Arc<dyn FrameParticipant> {
        recorder.clone() as Arc<dyn FrameParticipant>
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        let a = Recorder::new("a", log);
        assert!(registry.register(as_participant(&a)));
        assert!(!registry.register(as_participant(&a)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn identity_not_equality_decides_membership() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        // Two distinct instances with the same name are both welcome.
        let a1 = Recorder::new("a", log.clone());
        let a2 = Recorder::new("a", log);
        assert!(registry.register(as_participant(&a1)));
        assert!(registry.register(as_participant(&a2)));
        assert_eq!(registry.len(), 2);
        assert!(registry.is_registered(&as_participant(&a1)));
    }

    #[test]
    fn participants_tick_in_registration_order() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        for name in ["first", "second", "third"] {
            registry.register(as_participant(&Recorder::new(name, log.clone())));
        }
        registry.tick_all(100);
        assert_eq!(log.entries(), ["first", "second", "third"]);
    }

    #[test]
    fn unregistered_participant_is_not_ticked() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        let a = Recorder::new("a", log.clone());
        let b = Recorder::new("b", log.clone());
        let c = Recorder::new("c", log.clone());
        for p in [&a, &b, &c] {
            registry.register(as_participant(p));
        }
        registry.unregister(&as_participant(&b));
        registry.tick_all(100);
        assert_eq!(log.entries(), ["a", "c"]);
        assert!(!registry.is_registered(&as_participant(&b)));
    }

    #[test]
    fn removal_leaves_later_slots_in_place_and_is_reused() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        let a = Recorder::new("a", log.clone());
        let b = Recorder::new("b", log.clone());
        let c = Recorder::new("c", log.clone());
        for p in [&a, &b, &c] {
            registry.register(as_participant(p));
        }
        registry.unregister(&as_participant(&b));
        // The next registration takes b's vacated slot.
        let d = Recorder::new("d", log.clone());
        registry.register(as_participant(&d));
        registry.tick_all(100);
        assert_eq!(log.entries(), ["a", "d", "c"]);
    }

    #[test]
    fn a_panicking_participant_does_not_stop_the_sweep() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        let a = Recorder::new("a", log.clone());
        let c = Recorder::new("c", log.clone());
        registry.register(as_participant(&a));
        registry.register(Arc::new(Panicker) as Arc<dyn FrameParticipant>);
        registry.register(as_participant(&c));
        registry.tick_all(100);
        assert_eq!(log.entries(), ["a", "c"]);
    }

    #[test]
    fn mid_dispatch_removal_takes_effect_next_dispatch() {
        #[derive(Debug)]
        struct Remover {
            registry: Arc<ParticipantRegistry>,
            victim: Mutex<Option<Arc<dyn FrameParticipant>>>,
        }

        impl FrameParticipant for Remover {
            fn participant_id(&self) -> Cow<'static, str> {
                Cow::Borrowed("remover")
            }

            fn tick(&self, _timestamp_ms: u64) {
                if let Some(victim) = self.victim.lock().unwrap().take() {
                    self.registry.unregister(&victim);
                }
            }
        }

        let registry = Arc::new(ParticipantRegistry::new());
        let log = Arc::new(TickLog::default());
        let victim = Recorder::new("victim", log.clone());
        let remover = Arc::new(Remover {
            registry: registry.clone(),
            victim: Mutex::new(Some(as_participant(&victim))),
        });
        registry.register(remover as Arc<dyn FrameParticipant>);
        registry.register(as_participant(&victim));

        // First dispatch: the snapshot was taken before the removal, so the
        // victim is still ticked once.
        registry.tick_all(1);
        assert_eq!(log.entries(), ["victim"]);

        // Second dispatch: the victim is gone.
        registry.tick_all(2);
        assert_eq!(log.entries(), ["victim"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registration_during_a_dispatch_is_seen_next_dispatch() {
        let registry = ParticipantRegistry::new();
        let log = Arc::new(TickLog::default());
        let a = Recorder::new("a", log.clone());
        registry.register(as_participant(&a));
        registry.tick_all(1);
        let b = Recorder::new("b", log.clone());
        registry.register(as_participant(&b));
        registry.tick_all(2);
        assert_eq!(log.entries(), ["a", "a", "b"]);
    }
}
