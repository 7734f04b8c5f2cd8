// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Raw MIDI message decoding and encoding.

use std::fmt;

use super::messages;

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },
    /// Pitch Bend: channel (0-15), value (-8192 to 8191)
    PitchBend { channel: u8, value: i16 },
    /// Channel Aftertouch: channel (0-15), pressure (0-127)
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// Poly Aftertouch: channel (0-15), note (0-127), pressure (0-127)
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    /// MIDI Clock tick
    TimingClock,
    /// Start playback
    Start,
    /// Continue playback
    Continue,
    /// Stop playback
    Stop,
    /// Unknown/unparsed message
    Unknown(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let status = data[0];

        // System Real-Time messages (single byte)
        match status {
            messages::TIMING_CLOCK => return Some(MidiMessage::TimingClock),
            messages::START => return Some(MidiMessage::Start),
            messages::CONTINUE => return Some(MidiMessage::Continue),
            messages::STOP => return Some(MidiMessage::Stop),
            _ => {}
        }

        // Channel messages
        let msg_type = status & 0xF0;
        let channel = status & 0x0F;

        match msg_type {
            messages::NOTE_OFF if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            messages::NOTE_ON if data.len() >= 3 => {
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data[1] & 0x7F,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data[1] & 0x7F,
                        velocity,
                    })
                }
            }
            messages::CONTROL_CHANGE if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            messages::PROGRAM_CHANGE if data.len() >= 2 => Some(MidiMessage::ProgramChange {
                channel,
                program: data[1] & 0x7F,
            }),
            messages::PITCH_BEND if data.len() >= 3 => {
                let lsb = (data[1] & 0x7F) as i16;
                let msb = (data[2] & 0x7F) as i16;
                let value = ((msb << 7) | lsb) - 8192;
                Some(MidiMessage::PitchBend { channel, value })
            }
            messages::CHANNEL_AFTERTOUCH if data.len() >= 2 => {
                Some(MidiMessage::ChannelAftertouch {
                    channel,
                    pressure: data[1] & 0x7F,
                })
            }
            messages::POLY_AFTERTOUCH if data.len() >= 3 => Some(MidiMessage::PolyAftertouch {
                channel,
                note: data[1] & 0x7F,
                pressure: data[2] & 0x7F,
            }),
            _ => Some(MidiMessage::Unknown(data.to_vec())),
        }
    }

    /// Decode every message in a packet.
    ///
    /// Device packets may hold several messages back to back, with running
    /// status and real-time bytes between them. SysEx runs to its 0xF7.
    pub fn parse_all(data: &[u8]) -> PacketMessages<'_> {
        PacketMessages {
            data,
            pos: 0,
            running: None,
        }
    }

    /// Channel (0-15) of a channel voice message
    pub fn channel(&self) -> Option<u8> {
        match self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. }
            | MidiMessage::ChannelAftertouch { channel, .. }
            | MidiMessage::PolyAftertouch { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// Encode back to raw MIDI bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![messages::NOTE_ON | channel, note, velocity]
            }
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![messages::NOTE_OFF | channel, note, velocity]
            }
            MidiMessage::ControlChange { channel, controller, value } => {
                vec![messages::CONTROL_CHANGE | channel, controller, value]
            }
            MidiMessage::ProgramChange { channel, program } => {
                vec![messages::PROGRAM_CHANGE | channel, program]
            }
            MidiMessage::PitchBend { channel, value } => {
                let raw = (value + 8192).clamp(0, 0x3FFF) as u16;
                vec![
                    messages::PITCH_BEND | channel,
                    (raw & 0x7F) as u8,
                    ((raw >> 7) & 0x7F) as u8,
                ]
            }
            MidiMessage::ChannelAftertouch { channel, pressure } => {
                vec![messages::CHANNEL_AFTERTOUCH | channel, pressure]
            }
            MidiMessage::PolyAftertouch { channel, note, pressure } => {
                vec![messages::POLY_AFTERTOUCH | channel, note, pressure]
            }
            MidiMessage::TimingClock => vec![messages::TIMING_CLOCK],
            MidiMessage::Start => vec![messages::START],
            MidiMessage::Continue => vec![messages::CONTINUE],
            MidiMessage::Stop => vec![messages::STOP],
            MidiMessage::Unknown(ref data) => data.clone(),
        }
    }
}

/// Iterator over the messages of one packet, see [`MidiMessage::parse_all`]
#[derive(Debug, Clone)]
pub struct PacketMessages<'a> {
    data: &'a [u8],
    pos: usize,
    running: Option<u8>,
}

/// Data bytes following a status byte
fn data_len(status: u8) -> usize {
    match status {
        0x80..=0xBF | 0xE0..=0xEF => 2,
        0xC0..=0xDF => 1,
        0xF1 | 0xF3 => 1,
        0xF2 => 2,
        _ => 0,
    }
}

impl Iterator for PacketMessages<'_> {
    type Item = MidiMessage;

    fn next(&mut self) -> Option<MidiMessage> {
        while let Some(&byte) = self.data.get(self.pos) {
            // Real-time bytes never disturb running status
            if byte >= messages::TIMING_CLOCK {
                self.pos += 1;
                return MidiMessage::parse(&[byte]);
            }

            if byte == messages::SYSEX_START {
                let rest = &self.data[self.pos..];
                let len = rest
                    .iter()
                    .position(|&b| b == messages::SYSEX_END)
                    .map_or(rest.len(), |i| i + 1);
                self.pos += len;
                self.running = None;
                return Some(MidiMessage::Unknown(rest[..len].to_vec()));
            }

            let status = if byte & 0x80 != 0 {
                self.pos += 1;
                self.running = (byte < messages::SYSEX_START).then_some(byte);
                byte
            } else if let Some(status) = self.running {
                status
            } else {
                // Stray data byte
                self.pos += 1;
                continue;
            };

            // A status byte inside the data cuts the message short
            let rest = &self.data[self.pos..];
            let len = rest
                .iter()
                .take(data_len(status))
                .take_while(|&&b| b & 0x80 == 0)
                .count();
            let mut bytes = Vec::with_capacity(len + 1);
            bytes.push(status);
            bytes.extend_from_slice(&rest[..len]);
            self.pos += len;
            return MidiMessage::parse(&bytes);
        }
        None
    }
}

/// Scientific pitch name, e.g. 60 -> "C4"
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note as i16 / 12) - 1;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => write!(
                f,
                "NoteOn Ch: {} {} Vel:{}",
                channel + 1,
                note_name(*note),
                velocity
            ),
            MidiMessage::NoteOff { channel, note, velocity } => write!(
                f,
                "NoteOff Ch: {} {} Vel:{}",
                channel + 1,
                note_name(*note),
                velocity
            ),
            MidiMessage::ControlChange { channel, controller, value } => write!(
                f,
                "ControlChange Ch: {} Controller {} Value {}",
                channel + 1,
                controller,
                value
            ),
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "PatchChange Ch: {} Patch {}", channel + 1, program)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchWheelChange Ch: {} Pitch {}", channel + 1, value)
            }
            MidiMessage::ChannelAftertouch { channel, pressure } => {
                write!(f, "ChannelAfterTouch Ch: {} Pressure {}", channel + 1, pressure)
            }
            MidiMessage::PolyAftertouch { channel, note, pressure } => write!(
                f,
                "KeyAfterTouch Ch: {} {} Pressure {}",
                channel + 1,
                note_name(*note),
                pressure
            ),
            MidiMessage::TimingClock => f.write_str("TimingClock"),
            MidiMessage::Start => f.write_str("StartSequence"),
            MidiMessage::Continue => f.write_str("ContinueSequence"),
            MidiMessage::Stop => f.write_str("StopSequence"),
            MidiMessage::Unknown(data) => write!(f, "Unknown {:02X?}", data),
        }
    }
}
