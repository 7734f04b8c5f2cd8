// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Windows over the raw event stream.
//!
//! The windower buffers every raw event into the open window. A saving point
//! moves the buffer out as a closed [`Window`] and opens the next one at the
//! same instant, so consecutive windows partition the stream.

use crate::midi::MidiEvent;
use crate::timing::Micros;

/// One take: a contiguous run of the raw input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Position in the session, starting at 0
    pub index: usize,
    /// Boundary that opened the window (0 for the first)
    pub opened_at: Micros,
    /// Boundary that closed it; `None` when flushed at session end
    pub closed_at: Option<Micros>,
    /// Raw events in arrival order
    pub events: Vec<MidiEvent>,
}

impl Window {
    fn open(index: usize, opened_at: Micros) -> Self {
        Self {
            index,
            opened_at,
            closed_at: None,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of note on/off events
    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_note()).count()
    }

    /// Time of the first and last event
    pub fn span(&self) -> Option<(Micros, Micros)> {
        Some((self.events.first()?.at, self.events.last()?.at))
    }
}

/// Buffers the open window and cuts it at saving points
#[derive(Debug)]
pub struct Windower {
    current: Window,
}

impl Windower {
    pub fn new() -> Self {
        Self {
            current: Window::open(0, 0),
        }
    }

    /// Append a raw event to the open window
    pub fn push(&mut self, event: MidiEvent) {
        self.current.events.push(event);
    }

    /// Close the open window at `at` and open the next one
    pub fn cut(&mut self, at: Micros) -> Window {
        let next = Window::open(self.current.index + 1, at);
        let mut closed = std::mem::replace(&mut self.current, next);
        closed.closed_at = Some(at);
        closed
    }

    /// Hand out the open window at session end
    pub fn flush(&mut self) -> Window {
        let next = Window::open(self.current.index + 1, self.current.opened_at);
        std::mem::replace(&mut self.current, next)
    }

    /// The window currently receiving events
    pub fn current(&self) -> &Window {
        &self.current
    }
}

impl Default for Windower {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_partitions_events() {
        let mut windower = Windower::new();
        windower.push(MidiEvent::note_on(100, 0, 0, 60, 90));
        windower.push(MidiEvent::note_off(105, 0, 0, 60));

        let first = windower.cut(135);
        assert_eq!(first.index, 0);
        assert_eq!(first.opened_at, 0);
        assert_eq!(first.closed_at, Some(135));
        assert_eq!(first.len(), 2);
        assert_eq!(first.span(), Some((100, 105)));

        windower.push(MidiEvent::note_on(200, 0, 0, 62, 90));
        assert_eq!(windower.current().index, 1);
        assert_eq!(windower.current().opened_at, 135);

        let last = windower.flush();
        assert_eq!(last.index, 1);
        assert_eq!(last.closed_at, None);
        assert_eq!(last.len(), 1);
    }

    #[test]
    fn test_empty_window() {
        let mut windower = Windower::new();
        let window = windower.cut(10);
        assert!(window.is_empty());
        assert_eq!(window.span(), None);
        assert_eq!(window.note_count(), 0);
    }

    #[test]
    fn test_note_count_ignores_other_events() {
        let mut windower = Windower::new();
        windower.push(MidiEvent::note_on(0, 0, 0, 60, 90));
        windower.push(MidiEvent::pedal(1, 0, 0, 127));
        windower.push(MidiEvent::note_off(2, 0, 0, 60));
        assert_eq!(windower.flush().note_count(), 2);
    }
}
