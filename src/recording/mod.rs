// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording and export system.
//!
//! This module provides:
//! - The live recording session driving the splitter
//! - Grouping takes into per-channel tracks
//! - Standard MIDI file export and file naming

pub mod export;
pub mod naming;
pub mod session;
pub mod tracks;

pub use export::{MidiExporter, DEFAULT_PPQN, DEFAULT_TEMPO, TIME_SIGNATURE};
pub use naming::{FileNameTemplate, NameContext, TemplateError, DEFAULT_DATE_FORMAT};
pub use session::{spawn_session, MidiFileSink, SessionHandle, SessionSummary, WindowSink};
pub use tracks::{build_tracks, RecordedTrack, TrackEvent};

