// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the session timeline and the clocks that drive
//! timer deadlines during recording.

pub mod clock;

pub use clock::{to_micros, Clock, Micros, Sleep, VirtualClock, WallClock};
