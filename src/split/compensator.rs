// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Held-event timeout compensation.
//!
//! A note or pedal whose identity sees no further event for the held timeout
//! is assumed stuck. If its last event was a press, a matching release is
//! synthesized at `press time + timeout`. The engine owns the timers; this
//! type only keeps the last event per identity and decides what a firing
//! timer produces.

use std::collections::HashMap;

use crate::midi::{MidiEvent, NotePedalKey};
use crate::timing::Micros;

/// Per-identity tracking of the most recent note/pedal event
#[derive(Debug)]
pub struct HeldEventCompensator {
    /// Held timeout in microseconds
    timeout: Micros,
    /// Identity -> most recent event since its last expiry
    last: HashMap<NotePedalKey, MidiEvent>,
}

impl HeldEventCompensator {
    /// Create a compensator with the given held timeout
    pub fn new(timeout: Micros) -> Self {
        Self {
            timeout,
            last: HashMap::new(),
        }
    }

    /// Track a note/pedal event.
    ///
    /// Returns the identity and the deadline its timer must be re-armed to,
    /// or `None` for events without an identity.
    pub fn observe(&mut self, event: &MidiEvent) -> Option<(NotePedalKey, Micros)> {
        let key = event.note_pedal_key()?;
        self.last.insert(key, event.clone());
        Some((key, event.at.saturating_add(self.timeout)))
    }

    /// The timer for `key` elapsed.
    ///
    /// Tracking for the identity resets. A release is synthesized only when
    /// the last event seen was a press.
    pub fn expire(&mut self, key: &NotePedalKey) -> Option<MidiEvent> {
        let last = self.last.remove(key)?;
        if last.is_on() {
            Some(last.off_complement(last.at.saturating_add(self.timeout)))
        } else {
            None
        }
    }

    /// Identities currently being tracked
    pub fn tracked(&self) -> usize {
        self.last.len()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_note_is_released_at_timeout() {
        let mut comp = HeldEventCompensator::new(20);
        let on = MidiEvent::note_on(110, 0, 0, 84, 100);

        let (key, deadline) = comp.observe(&on).unwrap();
        assert_eq!(deadline, 130);

        let release = comp.expire(&key).unwrap();
        assert_eq!(release.at, 130);
        assert!(release.is_note_off());
        assert_eq!(release.note_pedal_key(), Some(key));
    }

    #[test]
    fn test_released_note_produces_nothing() {
        let mut comp = HeldEventCompensator::new(20);
        comp.observe(&MidiEvent::note_on(100, 0, 0, 72, 100));
        let (key, deadline) = comp.observe(&MidiEvent::note_off(105, 0, 0, 72)).unwrap();

        assert_eq!(deadline, 125);
        assert_eq!(comp.expire(&key), None);
    }

    #[test]
    fn test_expiry_resets_tracking() {
        let mut comp = HeldEventCompensator::new(20);
        let (key, _) = comp.observe(&MidiEvent::note_on(110, 0, 0, 84, 100)).unwrap();

        assert!(comp.expire(&key).is_some());
        assert_eq!(comp.tracked(), 0);
        // A second expiry for the same episode yields nothing
        assert_eq!(comp.expire(&key), None);
    }

    #[test]
    fn test_new_press_after_expiry_starts_new_episode() {
        let mut comp = HeldEventCompensator::new(20);
        let (key, _) = comp.observe(&MidiEvent::note_on(0, 0, 0, 60, 100)).unwrap();
        comp.expire(&key);

        comp.observe(&MidiEvent::note_on(500, 0, 0, 60, 100));
        let release = comp.expire(&key).unwrap();
        assert_eq!(release.at, 520);
    }

    #[test]
    fn test_pedal_is_compensated() {
        let mut comp = HeldEventCompensator::new(1_000);
        let (key, _) = comp.observe(&MidiEvent::pedal(50, 1, 0, 127)).unwrap();

        let release = comp.expire(&key).unwrap();
        assert!(release.is_pedal_off());
        assert_eq!(release.at, 1_050);
        assert_eq!(release.port, 1);
    }

    #[test]
    fn test_identities_are_independent() {
        let mut comp = HeldEventCompensator::new(30);
        let (a, _) = comp.observe(&MidiEvent::note_on(100, 3, 2, 96, 64)).unwrap();
        let (b, _) = comp.observe(&MidiEvent::note_on(101, 3, 1, 96, 64)).unwrap();
        comp.observe(&MidiEvent::note_off(105, 3, 2, 96));

        assert_eq!(comp.expire(&a), None);
        assert_eq!(comp.expire(&b).map(|e| e.at), Some(131));
    }

    #[test]
    fn test_untracked_events_are_ignored() {
        let mut comp = HeldEventCompensator::new(30);
        let clock = MidiEvent::new(5, 0, crate::midi::MidiMessage::TimingClock);
        assert_eq!(comp.observe(&clock), None);
        assert_eq!(comp.tracked(), 0);
    }
}
