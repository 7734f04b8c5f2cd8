// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Saving-point detection.
//!
//! Debounces the hold-count stream by the quiet period. Every count update
//! re-arms the timer; when it elapses with the last count at zero, the
//! performer has been silent for the whole quiet period and the take can be
//! cut.

use crate::timing::Micros;

/// Debounce state over hold-count updates
#[derive(Debug)]
pub struct SavingPointDetector {
    /// Quiet period in microseconds
    quiet: Micros,
    /// Most recent count and when it was reported
    last: Option<(u32, Micros)>,
}

impl SavingPointDetector {
    pub fn new(quiet: Micros) -> Self {
        Self { quiet, last: None }
    }

    /// Record a hold-count update; returns the re-armed deadline
    pub fn record(&mut self, count: u32, at: Micros) -> Micros {
        self.last = Some((count, at));
        at.saturating_add(self.quiet)
    }

    /// The debounce timer elapsed; returns the saving point, if any
    pub fn expire(&mut self) -> Option<Micros> {
        match self.last.take() {
            Some((0, at)) => Some(at.saturating_add(self.quiet)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_yields_saving_point() {
        let mut detector = SavingPointDetector::new(30);
        assert_eq!(detector.record(1, 100), 130);
        assert_eq!(detector.record(0, 105), 135);
        assert_eq!(detector.expire(), Some(135));
    }

    #[test]
    fn test_held_notes_yield_nothing() {
        let mut detector = SavingPointDetector::new(30);
        detector.record(2, 100);
        assert_eq!(detector.expire(), None);
    }

    #[test]
    fn test_one_saving_point_per_silence() {
        let mut detector = SavingPointDetector::new(30);
        detector.record(0, 105);
        assert_eq!(detector.expire(), Some(135));
        assert_eq!(detector.expire(), None);
    }
}
