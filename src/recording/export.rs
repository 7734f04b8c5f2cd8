// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Takes are written as Type 1 files: a tempo track followed by one track
//! per port/channel pair.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::tracks::RecordedTrack;
use crate::midi::MidiMessage;
use crate::timing::Micros;

/// Default ticks per quarter note
pub const DEFAULT_PPQN: u16 = 480;

/// Tempo written into every file
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Time signature written into every file
pub const TIME_SIGNATURE: (u8, u8) = (4, 4);

/// Largest delta a variable-length quantity can hold
const MAX_DELTA: u64 = 0x0FFF_FFFF;

/// A track chunk event
#[derive(Debug, Clone)]
struct SmfEvent {
    /// Absolute tick
    tick: u64,
    /// Event data
    data: Vec<u8>,
}

impl SmfEvent {
    fn message(tick: u64, message: &MidiMessage) -> Self {
        Self {
            tick,
            data: message.to_bytes(),
        }
    }

    fn tempo(tick: u64, micros_per_quarter: u32) -> Self {
        Self {
            tick,
            data: vec![
                0xFF, 0x51, 0x03,
                ((micros_per_quarter >> 16) & 0xFF) as u8,
                ((micros_per_quarter >> 8) & 0xFF) as u8,
                (micros_per_quarter & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(tick: u64, numerator: u8, denominator: u8) -> Self {
        // Denominator is expressed as power of 2
        let denom_power = denominator.max(1).ilog2() as u8;
        Self {
            tick,
            data: vec![
                0xFF, 0x58, 0x04,
                numerator,
                denom_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per MIDI quarter note
            ],
        }
    }

    fn track_name(tick: u64, name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut data = vec![0xFF, 0x03];
        write_variable_length(&mut data, bytes.len() as u64);
        data.extend_from_slice(bytes);
        Self { tick, data }
    }

    fn end_of_track(tick: u64) -> Self {
        Self {
            tick,
            data: vec![0xFF, 0x2F, 0x00],
        }
    }
}

/// Type 1 MIDI file writer for recorded takes
#[derive(Debug, Clone)]
pub struct MidiExporter {
    /// PPQN (ticks per quarter note)
    ppqn: u16,
    /// Tracks to export
    tracks: Vec<RecordedTrack>,
}

impl MidiExporter {
    /// Create an exporter at 120 BPM, 4/4
    pub fn new(ppqn: u16) -> Self {
        Self {
            ppqn: ppqn.max(1),
            tracks: Vec::new(),
        }
    }

    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = RecordedTrack>) {
        self.tracks.extend(tracks);
    }

    /// Length of a quarter note in microseconds
    pub fn micros_per_quarter(&self) -> u32 {
        (60_000_000.0 / DEFAULT_TEMPO).round() as u32
    }

    /// Convert a take offset to ticks
    pub fn ticks_for(&self, offset: Micros) -> u64 {
        let ticks = offset as u128 * self.ppqn as u128 / self.micros_per_quarter() as u128;
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Export to file, creating parent directories as needed
    pub fn export(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create MIDI file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)
            .and_then(|_| writer.flush())
            .with_context(|| format!("Failed to write MIDI file {}", path.display()))
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Encode the whole file
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.write_header(&mut buffer, 1, (self.tracks.len() + 1) as u16);

        let tempo_events = vec![
            SmfEvent::tempo(0, self.micros_per_quarter()),
            SmfEvent::time_signature(0, TIME_SIGNATURE.0, TIME_SIGNATURE.1),
            SmfEvent::track_name(0, "Tempo"),
        ];
        write_track(&mut buffer, &tempo_events);

        for track in &self.tracks {
            let mut events = Vec::with_capacity(track.events.len() + 1);
            events.push(SmfEvent::track_name(0, &track.name()));
            events.extend(
                track
                    .events
                    .iter()
                    .map(|e| SmfEvent::message(self.ticks_for(e.offset), &e.message)),
            );
            write_track(&mut buffer, &events);
        }

        buffer
    }

    /// Write MIDI file header chunk
    fn write_header(&self, buffer: &mut Vec<u8>, format: u16, num_tracks: u16) {
        buffer.extend_from_slice(b"MThd");
        // Chunk length (always 6)
        buffer.extend_from_slice(&[0, 0, 0, 6]);
        buffer.extend_from_slice(&format.to_be_bytes());
        buffer.extend_from_slice(&num_tracks.to_be_bytes());
        buffer.extend_from_slice(&self.ppqn.to_be_bytes());
    }
}

/// Write a track chunk; End-Of-Track lands one tick after the last event
fn write_track(buffer: &mut Vec<u8>, events: &[SmfEvent]) {
    let mut track_data = Vec::new();
    let mut last_tick = 0u64;

    for event in events {
        let delta = event.tick.saturating_sub(last_tick);
        write_variable_length(&mut track_data, delta);
        track_data.extend_from_slice(&event.data);
        last_tick = event.tick;
    }

    let end = SmfEvent::end_of_track(last_tick + 1);
    write_variable_length(&mut track_data, end.tick - last_tick);
    track_data.extend_from_slice(&end.data);

    buffer.extend_from_slice(b"MTrk");
    buffer.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
    buffer.extend_from_slice(&track_data);
}

/// Write variable-length quantity
fn write_variable_length(buffer: &mut Vec<u8>, value: u64) {
    let mut value = value.min(MAX_DELTA);
    let mut bytes = Vec::with_capacity(4);

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buffer.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiEvent;
    use crate::recording::tracks::build_tracks;

    fn vlq(value: u64) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_variable_length(&mut buffer, value);
        buffer
    }

    /// Split a file into (header, [track bodies])
    fn chunks(bytes: &[u8]) -> (&[u8], Vec<&[u8]>) {
        let header = &bytes[8..14];
        let mut tracks = Vec::new();
        let mut pos = 14;
        while pos < bytes.len() {
            assert_eq!(&bytes[pos..pos + 4], b"MTrk");
            let len = u32::from_be_bytes([
                bytes[pos + 4],
                bytes[pos + 5],
                bytes[pos + 6],
                bytes[pos + 7],
            ]) as usize;
            tracks.push(&bytes[pos + 8..pos + 8 + len]);
            pos += 8 + len;
        }
        (header, tracks)
    }

    #[test]
    fn test_variable_length() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x7F), vec![0x7F]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(480), vec![0x83, 0x60]);
        assert_eq!(vlq(u64::MAX), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_ticks_at_default_tempo() {
        let exporter = MidiExporter::new(480);
        assert_eq!(exporter.micros_per_quarter(), 500_000);
        assert_eq!(exporter.ticks_for(500_000), 480);
        assert_eq!(exporter.ticks_for(250_000), 240);
        assert_eq!(exporter.ticks_for(1_000), 0);
    }

    #[test]
    fn test_header_and_track_count() {
        let events = vec![
            MidiEvent::note_on(0, 0, 0, 60, 100),
            MidiEvent::note_on(0, 1, 0, 64, 100),
        ];
        let mut exporter = MidiExporter::new(96);
        exporter.add_tracks(build_tracks(&events));

        let bytes = exporter.to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        let (header, tracks) = chunks(&bytes);
        assert_eq!(header, &[0, 1, 0, 3, 0, 96]);
        assert_eq!(tracks.len(), 3);
    }

    #[test]
    fn test_track_body() {
        let events = vec![
            MidiEvent::note_on(1_000_000, 0, 2, 60, 100),
            MidiEvent::note_off(1_500_000, 0, 2, 60),
        ];
        let mut exporter = MidiExporter::new(480);
        exporter.add_tracks(build_tracks(&events));

        let bytes = exporter.to_bytes();
        let (_, tracks) = chunks(&bytes);

        let mut expected = vec![0x00, 0xFF, 0x03, 11];
        expected.extend_from_slice(b"Port 0 Ch 3");
        expected.extend_from_slice(&[0x00, 0x92, 60, 100]);
        expected.extend_from_slice(&[0x83, 0x60, 0x82, 60, 0]);
        expected.extend_from_slice(&[0x01, 0xFF, 0x2F, 0x00]);
        assert_eq!(tracks[1], expected.as_slice());
    }

    #[test]
    fn test_zero_ppqn_is_clamped() {
        let bytes = MidiExporter::new(0).to_bytes();
        let (header, _) = chunks(&bytes);
        assert_eq!(header, &[0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_tempo_track() {
        let bytes = MidiExporter::new(480).to_bytes();
        let (_, tracks) = chunks(&bytes);
        assert_eq!(tracks.len(), 1);
        assert_eq!(&tracks[0][..7], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        assert_eq!(&tracks[0][7..11], &[0x00, 0xFF, 0x58, 0x04]);
        assert_eq!(tracks[0][12], 2);
        assert!(tracks[0].ends_with(&[0x01, 0xFF, 0x2F, 0x00]));
    }

    #[test]
    fn test_export_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("takes").join("2026").join("take.mid");

        let mut exporter = MidiExporter::new(480);
        exporter.add_tracks(build_tracks(&[MidiEvent::note_on(0, 0, 0, 60, 100)]));
        exporter.export(&path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, exporter.to_bytes());
    }
}
