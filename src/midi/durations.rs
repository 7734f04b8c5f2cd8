// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note duration tracking for trace output.

use std::collections::HashMap;
use std::time::Duration;

use super::event::MidiEvent;
use crate::timing::Micros;

/// Pairs note offs with their note ons to report how long a note sounded
#[derive(Debug, Default)]
pub struct NoteDurations {
    /// (port, channel, note) -> note on time
    active: HashMap<(u8, u8, u8), Micros>,
}

impl NoteDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, returning the duration when it ends a sounding note
    pub fn observe(&mut self, event: &MidiEvent) -> Option<Duration> {
        let channel = event.message.channel()?;
        let key = (event.port, channel, event.note_number());

        if event.is_note_on() {
            self.active.insert(key, event.at);
            None
        } else if event.is_note_off() {
            self.active
                .remove(&key)
                .map(|start| Duration::from_micros(event.at.saturating_sub(start)))
        } else {
            None
        }
    }

    /// Number of notes currently sounding
    pub fn sounding(&self) -> usize {
        self.active.len()
    }
}
