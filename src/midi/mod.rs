// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input layer.
//!
//! This module provides message decoding, the timestamped event type the
//! splitter works on, and device capture backends (Core MIDI on macOS,
//! midir elsewhere through the default `midir` feature).

pub mod durations;
pub mod event;
pub mod input;
pub mod message;

pub use durations::NoteDurations;
pub use event::{MidiEvent, NotePedalKey, PEDAL_ON_THRESHOLD, SUSTAIN_PEDAL};
pub use input::{
    list_sources, open_input, print_sources, resolve_inputs, CaptureSender, CapturedMessage,
    InputConnection, InputSource,
};
pub use message::{note_name, MidiMessage, PacketMessages};

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const SYSEX_END: u8 = 0xF7;

    // System Real-Time Messages
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const START: u8 = 0xFA;
    pub const CONTINUE: u8 = 0xFB;
    pub const STOP: u8 = 0xFC;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
        assert_eq!(messages::CONTROL_CHANGE, 0xB0);
        assert_eq!(messages::TIMING_CLOCK, 0xF8);
        assert_eq!(messages::STOP, 0xFC);
    }
}
