// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timestamped input events and their classification.
//!
//! Every captured message becomes a [`MidiEvent`] carrying the input port it
//! arrived on and its time on the session timeline. The classification
//! predicates here are what the splitter sees of an event: whether it presses
//! or releases a note or the sustain pedal, and which identity it belongs to.

use std::fmt;

use super::message::MidiMessage;
use crate::timing::Micros;

/// Controller number of the sustain (damper) pedal
pub const SUSTAIN_PEDAL: u8 = 64;

/// Pedal values at or above this are "down"
pub const PEDAL_ON_THRESHOLD: u8 = 64;

/// Identity correlating an on-event with its eventual off-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NotePedalKey {
    /// A note on a given port and channel
    Note { port: u8, channel: u8, note: u8 },
    /// The sustain pedal of a given port and channel
    Pedal { port: u8, channel: u8 },
}

impl fmt::Display for NotePedalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotePedalKey::Note { port, channel, note } => {
                write!(f, "P{} Ch{} Note{}", port, channel + 1, note)
            }
            NotePedalKey::Pedal { port, channel } => {
                write!(f, "P{} Ch{} Sustain", port, channel + 1)
            }
        }
    }
}

/// A message received on an input port at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// Time on the session timeline
    pub at: Micros,
    /// Input port index, assigned at capture
    pub port: u8,
    /// The decoded message
    pub message: MidiMessage,
}

impl MidiEvent {
    /// Create a new event
    pub fn new(at: Micros, port: u8, message: MidiMessage) -> Self {
        Self { at, port, message }
    }

    /// Note On helper
    pub fn note_on(at: Micros, port: u8, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(at, port, MidiMessage::NoteOn { channel, note, velocity })
    }

    /// Note Off helper
    pub fn note_off(at: Micros, port: u8, channel: u8, note: u8) -> Self {
        Self::new(
            at,
            port,
            MidiMessage::NoteOff {
                channel,
                note,
                velocity: 0,
            },
        )
    }

    /// Sustain pedal helper
    pub fn pedal(at: Micros, port: u8, channel: u8, value: u8) -> Self {
        Self::new(
            at,
            port,
            MidiMessage::ControlChange {
                channel,
                controller: SUSTAIN_PEDAL,
                value,
            },
        )
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self.message, MidiMessage::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self.message, MidiMessage::NoteOff { .. })
    }

    pub fn is_pedal_on(&self) -> bool {
        matches!(
            self.message,
            MidiMessage::ControlChange { controller: SUSTAIN_PEDAL, value, .. }
                if value >= PEDAL_ON_THRESHOLD
        )
    }

    pub fn is_pedal_off(&self) -> bool {
        matches!(
            self.message,
            MidiMessage::ControlChange { controller: SUSTAIN_PEDAL, value, .. }
                if value < PEDAL_ON_THRESHOLD
        )
    }

    pub fn is_note(&self) -> bool {
        self.is_note_on() || self.is_note_off()
    }

    pub fn is_pedal(&self) -> bool {
        self.is_pedal_on() || self.is_pedal_off()
    }

    pub fn is_note_or_pedal(&self) -> bool {
        self.is_note() || self.is_pedal()
    }

    /// Presses a note or the pedal
    pub fn is_on(&self) -> bool {
        self.is_note_on() || self.is_pedal_on()
    }

    /// Releases a note or the pedal
    pub fn is_off(&self) -> bool {
        self.is_note_off() || self.is_pedal_off()
    }

    /// Note number, 0 for anything that isn't a note
    pub fn note_number(&self) -> u8 {
        match self.message {
            MidiMessage::NoteOn { note, .. } | MidiMessage::NoteOff { note, .. } => note,
            _ => 0,
        }
    }

    /// Identity of a note or sustain pedal event
    pub fn note_pedal_key(&self) -> Option<NotePedalKey> {
        match self.message {
            MidiMessage::NoteOn { channel, note, .. } | MidiMessage::NoteOff { channel, note, .. } => {
                Some(NotePedalKey::Note {
                    port: self.port,
                    channel,
                    note,
                })
            }
            MidiMessage::ControlChange {
                channel,
                controller: SUSTAIN_PEDAL,
                ..
            } => Some(NotePedalKey::Pedal {
                port: self.port,
                channel,
            }),
            _ => None,
        }
    }

    /// Release matching this event's identity, stamped at `at`.
    ///
    /// Events without an identity complement to themselves.
    pub fn off_complement(&self, at: Micros) -> MidiEvent {
        let message = match self.message {
            MidiMessage::NoteOn { channel, note, .. } | MidiMessage::NoteOff { channel, note, .. } => {
                MidiMessage::NoteOff {
                    channel,
                    note,
                    velocity: 0,
                }
            }
            MidiMessage::ControlChange {
                channel,
                controller: SUSTAIN_PEDAL,
                ..
            } => MidiMessage::ControlChange {
                channel,
                controller: SUSTAIN_PEDAL,
                value: 0,
            },
            _ => return self.clone(),
        };

        MidiEvent::new(at, self.port, message)
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{} {} {}", self.port, self.at, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_classification() {
        let on = MidiEvent::note_on(100, 0, 0, 60, 100);
        assert!(on.is_note_on());
        assert!(on.is_note());
        assert!(on.is_on());
        assert!(!on.is_off());
        assert!(!on.is_pedal());
        assert!(on.is_note_or_pedal());
        assert_eq!(on.note_number(), 60);

        let off = MidiEvent::note_off(110, 0, 0, 60);
        assert!(off.is_note_off());
        assert!(off.is_off());
    }

    #[test]
    fn test_pedal_classification() {
        let down = MidiEvent::pedal(100, 1, 0, 127);
        assert!(down.is_pedal_on());
        assert!(down.is_on());
        assert!(!down.is_note());

        let half = MidiEvent::pedal(100, 1, 0, 64);
        assert!(half.is_pedal_on());

        let up = MidiEvent::pedal(120, 1, 0, 63);
        assert!(up.is_pedal_off());
        assert!(up.is_off());
    }

    #[test]
    fn test_other_controllers_are_invisible() {
        let modwheel = MidiEvent::new(
            100,
            0,
            MidiMessage::ControlChange {
                channel: 0,
                controller: 1,
                value: 127,
            },
        );
        assert!(!modwheel.is_note_or_pedal());
        assert!(!modwheel.is_on());
        assert_eq!(modwheel.note_pedal_key(), None);
        assert_eq!(modwheel.note_number(), 0);
    }

    #[test]
    fn test_note_key_includes_port_channel_and_note() {
        let a = MidiEvent::note_on(100, 3, 2, 96, 64);
        let b = MidiEvent::note_on(101, 3, 1, 96, 64);
        let c = MidiEvent::note_off(105, 3, 2, 96);

        assert_ne!(a.note_pedal_key(), b.note_pedal_key());
        assert_eq!(a.note_pedal_key(), c.note_pedal_key());
        assert_eq!(
            a.note_pedal_key(),
            Some(NotePedalKey::Note {
                port: 3,
                channel: 2,
                note: 96
            })
        );
    }

    #[test]
    fn test_pedal_key_is_shared_by_on_and_off() {
        let down = MidiEvent::pedal(100, 0, 5, 127);
        let up = MidiEvent::pedal(200, 0, 5, 0);
        assert_eq!(down.note_pedal_key(), up.note_pedal_key());
        assert_eq!(
            down.note_pedal_key(),
            Some(NotePedalKey::Pedal { port: 0, channel: 5 })
        );
    }

    #[test]
    fn test_off_complement_of_note() {
        let on = MidiEvent::note_on(110, 2, 4, 84, 90);
        let off = on.off_complement(130);

        assert_eq!(off.at, 130);
        assert_eq!(off.port, 2);
        assert!(off.is_note_off());
        assert_eq!(off.note_pedal_key(), on.note_pedal_key());
        assert_eq!(
            off.message,
            MidiMessage::NoteOff {
                channel: 4,
                note: 84,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_off_complement_of_pedal() {
        let down = MidiEvent::pedal(10, 1, 0, 100);
        let up = down.off_complement(40);
        assert!(up.is_pedal_off());
        assert_eq!(up.at, 40);
        assert_eq!(up.note_pedal_key(), down.note_pedal_key());
    }

    #[test]
    fn test_off_complement_of_untracked_is_itself() {
        let clock = MidiEvent::new(10, 0, MidiMessage::TimingClock);
        assert_eq!(clock.off_complement(99), clock);
    }

    #[test]
    fn test_display() {
        let on = MidiEvent::note_on(100, 3, 1, 96, 64);
        assert_eq!(on.to_string(), "P3 100 NoteOn Ch: 2 C7 Vel:64");
    }
}
