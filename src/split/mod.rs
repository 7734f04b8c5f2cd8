// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Splitting a continuous MIDI stream into takes.
//!
//! Takes are cut after the performer has held nothing (no note, no sustain
//! pedal) for a quiet period. Notes or pedals held longer than the held-event
//! timeout are treated as stuck and released synthetically so a dropped
//! note-off cannot stall the split forever.

pub mod compensator;
pub mod engine;
pub mod hold;
pub mod saving;
pub mod timer;
pub mod window;

pub use compensator::HeldEventCompensator;
pub use engine::{split_recorded, SplitConfig, SplitEngine, SplitOutput, SplitRecording};
pub use hold::{HoldChange, HoldCounter};
pub use saving::SavingPointDetector;
pub use timer::{TimerKey, TimerQueue};
pub use window::{Window, Windower};
