// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midisplit: records MIDI input and saves each take to its own file.
//!
//! A take ends once nothing (no note, no sustain pedal) has been held for a
//! configurable quiet period. The splitting core in [`split`] is a pure state
//! machine over timestamped events; [`recording`] drives it from live input
//! and writes the resulting takes as Standard MIDI Files.

pub mod config;
pub mod error;
pub mod midi;
pub mod recording;
pub mod split;
pub mod timing;

pub use config::RecorderConfig;
pub use error::{SplitError, SplitResult};
pub use midi::{MidiEvent, MidiMessage};
pub use recording::{spawn_session, SessionHandle, SessionSummary, WindowSink};
pub use split::{split_recorded, SplitConfig, SplitEngine, SplitOutput, SplitRecording, Window};
