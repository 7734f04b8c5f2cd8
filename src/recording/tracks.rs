// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Grouping a window's events into file tracks.

use std::collections::BTreeMap;

use crate::midi::{MidiEvent, MidiMessage};
use crate::timing::Micros;

/// A message positioned relative to the start of its take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    /// Microseconds since the first event of the take
    pub offset: Micros,
    pub message: MidiMessage,
}

/// All channel messages of one port/channel pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTrack {
    pub port: u8,
    pub channel: u8,
    pub events: Vec<TrackEvent>,
}

impl RecordedTrack {
    fn new(port: u8, channel: u8) -> Self {
        Self {
            port,
            channel,
            events: Vec::new(),
        }
    }

    /// Display name written into the file
    pub fn name(&self) -> String {
        format!("Port {} Ch {}", self.port, self.channel + 1)
    }

    /// Offset of the last event
    pub fn end(&self) -> Micros {
        self.events.last().map(|e| e.offset).unwrap_or(0)
    }
}

/// Split a take into tracks ordered by (port, channel).
///
/// Offsets are rebased to the first event of the take. Messages without a
/// channel (clock, transport, unknown) are dropped.
pub fn build_tracks(events: &[MidiEvent]) -> Vec<RecordedTrack> {
    let Some(start) = events.first().map(|e| e.at) else {
        return Vec::new();
    };

    let mut tracks: BTreeMap<(u8, u8), RecordedTrack> = BTreeMap::new();
    for event in events {
        let Some(channel) = event.message.channel() else {
            continue;
        };
        tracks
            .entry((event.port, channel))
            .or_insert_with(|| RecordedTrack::new(event.port, channel))
            .events
            .push(TrackEvent {
                offset: event.at.saturating_sub(start),
                message: event.message.clone(),
            });
    }

    tracks.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_port_and_channel() {
        let events = vec![
            MidiEvent::note_on(1_000, 1, 0, 60, 90),
            MidiEvent::note_on(1_010, 0, 9, 36, 100),
            MidiEvent::note_on(1_020, 0, 0, 64, 80),
            MidiEvent::note_off(1_500, 1, 0, 60),
        ];

        let tracks = build_tracks(&events);
        let keys: Vec<_> = tracks.iter().map(|t| (t.port, t.channel)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 9), (1, 0)]);

        let port1 = &tracks[2];
        assert_eq!(port1.events.len(), 2);
        assert_eq!(port1.events[0].offset, 0);
        assert_eq!(port1.events[1].offset, 500);
        assert_eq!(port1.end(), 500);
        assert_eq!(port1.name(), "Port 1 Ch 1");
    }

    #[test]
    fn test_rebases_on_first_event_even_without_channel() {
        let events = vec![
            MidiEvent::new(2_000, 0, MidiMessage::TimingClock),
            MidiEvent::note_on(2_250, 0, 3, 60, 90),
        ];

        let tracks = build_tracks(&events);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].events[0].offset, 250);
        assert_eq!(tracks[0].name(), "Port 0 Ch 4");
    }

    #[test]
    fn test_empty_take() {
        assert!(build_tracks(&[]).is_empty());
    }
}
