// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Running count of pressed notes and pedals.

use crate::midi::MidiEvent;

/// Result of applying one press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldChange {
    /// Count after the event
    pub count: u32,
    /// The count just dropped to zero
    pub released: bool,
}

/// Scan over the compensated note/pedal stream
#[derive(Debug, Default)]
pub struct HoldCounter {
    count: u32,
}

impl HoldCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Apply an event. Presses add one, releases remove one (never below
    /// zero); anything else is ignored and yields `None`.
    pub fn apply(&mut self, event: &MidiEvent) -> Option<HoldChange> {
        let previous = self.count;
        if event.is_on() {
            self.count = self.count.saturating_add(1);
        } else if event.is_off() {
            self.count = self.count.saturating_sub(1);
        } else {
            return None;
        }

        Some(HoldChange {
            count: self.count,
            released: previous > 0 && self.count == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiMessage;

    #[test]
    fn test_counts_notes_and_pedals() {
        let mut hold = HoldCounter::new();
        assert_eq!(
            hold.apply(&MidiEvent::note_on(0, 0, 0, 60, 90)),
            Some(HoldChange { count: 1, released: false })
        );
        assert_eq!(hold.apply(&MidiEvent::pedal(1, 0, 0, 127)).map(|c| c.count), Some(2));
        assert_eq!(hold.apply(&MidiEvent::note_off(2, 0, 0, 60)).map(|c| c.count), Some(1));
        assert_eq!(
            hold.apply(&MidiEvent::pedal(3, 0, 0, 0)),
            Some(HoldChange { count: 0, released: true })
        );
    }

    #[test]
    fn test_spurious_release_is_floored() {
        let mut hold = HoldCounter::new();
        assert_eq!(
            hold.apply(&MidiEvent::note_off(0, 0, 0, 60)),
            Some(HoldChange { count: 0, released: false })
        );
        assert_eq!(hold.count(), 0);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut hold = HoldCounter::new();
        hold.apply(&MidiEvent::note_on(0, 0, 0, 60, 90));
        let bend = MidiEvent::new(1, 0, MidiMessage::PitchBend { channel: 0, value: 100 });
        assert_eq!(hold.apply(&bend), None);
        assert_eq!(hold.count(), 1);
    }
}
