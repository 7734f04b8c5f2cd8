// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The take-splitting state machine.
//!
//! One serialized transition per input: timers that came due are fired,
//! then the raw event is windowed and, if it presses or releases a note or
//! the sustain pedal, fed through held-event compensation, the hold counter
//! and the saving-point debounce. Everything observable is queued as
//! [`SplitOutput`]s for the caller to drain.
//!
//! Ordering at a single instant `t`:
//! 1. timers due before `t`, by deadline (saving points first on ties)
//! 2. saving points due exactly at `t`, so an event on a boundary opens the
//!    next window
//! 3. the raw event at `t`
//! 4. held-event releases due at `t`, fired by `advance_to(t)` or by the
//!    next later event, so a raw event ingested at `t` before that wins
//!
//! A live session advances to a timer's deadline as soon as it comes due,
//! so a raw release stamped at that same instant but received afterwards
//! follows the synthetic one.

use std::collections::VecDeque;
use std::time::Duration;

use super::compensator::HeldEventCompensator;
use super::hold::HoldCounter;
use super::saving::SavingPointDetector;
use super::timer::{TimerKey, TimerQueue};
use super::window::{Window, Windower};
use crate::error::{SplitError, SplitResult};
use crate::midi::{MidiEvent, NotePedalKey};
use crate::timing::{to_micros, Micros};

/// Timeouts controlling where takes are cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// How long a note/pedal may stay down before it is forcibly released
    pub held_event_timeout: Duration,
    /// How long everything must stay released before a take is cut
    pub quiet_period: Duration,
}

impl SplitConfig {
    pub fn new(held_event_timeout: Duration, quiet_period: Duration) -> Self {
        Self {
            held_event_timeout,
            quiet_period,
        }
    }

    /// Reject timeouts that would cut on every event
    pub fn validate(&self) -> SplitResult<()> {
        if to_micros(self.held_event_timeout) == 0 {
            return Err(SplitError::InvalidConfig(
                "held event timeout must be at least 1us".into(),
            ));
        }
        if to_micros(self.quiet_period) == 0 {
            return Err(SplitError::InvalidConfig(
                "quiet period must be at least 1us".into(),
            ));
        }
        Ok(())
    }
}

/// Everything the engine reports, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutput {
    /// A real or synthetic press/release, in merged order
    Compensated(MidiEvent),
    /// Hold count after a press/release
    HoldCount { at: Micros, count: u32 },
    /// Hold count dropped to zero
    AdjustedRelease { at: Micros },
    /// A held identity was forcibly released
    HeldTimeout { at: Micros, key: NotePedalKey },
    /// The synthesized release itself
    SyntheticRelease(MidiEvent),
    /// A take boundary
    SavingPoint { at: Micros },
    /// A finished take
    Window(Window),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SplitTimer {
    SavingPoint,
    Held(NotePedalKey),
}

impl TimerKey for SplitTimer {
    fn priority(&self) -> u8 {
        match self {
            SplitTimer::SavingPoint => 0,
            SplitTimer::Held(_) => 1,
        }
    }
}

/// Online splitter for one recording session
#[derive(Debug)]
pub struct SplitEngine {
    config: SplitConfig,
    now: Micros,
    timers: TimerQueue<SplitTimer>,
    compensator: HeldEventCompensator,
    hold: HoldCounter,
    saving: SavingPointDetector,
    windower: Windower,
    outputs: VecDeque<SplitOutput>,
    ingested: usize,
    finished: bool,
}

impl SplitEngine {
    /// Create an engine at time zero
    pub fn new(config: SplitConfig) -> SplitResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            now: 0,
            timers: TimerQueue::new(),
            compensator: HeldEventCompensator::new(to_micros(config.held_event_timeout)),
            hold: HoldCounter::new(),
            saving: SavingPointDetector::new(to_micros(config.quiet_period)),
            windower: Windower::new(),
            outputs: VecDeque::new(),
            ingested: 0,
            finished: false,
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Engine time: the latest event, advance or fired timer
    pub fn now(&self) -> Micros {
        self.now
    }

    /// Notes and pedals currently held
    pub fn hold_count(&self) -> u32 {
        self.hold.count()
    }

    /// Raw events accepted so far
    pub fn ingested(&self) -> usize {
        self.ingested
    }

    /// Raw events in the open window
    pub fn pending_events(&self) -> usize {
        self.windower.current().len()
    }

    /// Earliest armed timer
    pub fn next_deadline(&mut self) -> Option<Micros> {
        self.timers.next_deadline()
    }

    /// Feed one raw event.
    ///
    /// Events must arrive in non-decreasing time order; an event older than
    /// the engine time is rejected without touching any state.
    pub fn ingest(&mut self, event: MidiEvent) -> SplitResult<()> {
        self.ensure_open()?;
        self.ensure_not_before(event.at)?;

        let at = event.at;
        self.fire_timers(|deadline, timer| {
            deadline < at || (deadline == at && *timer == SplitTimer::SavingPoint)
        });
        self.now = at;

        if event.is_note_or_pedal() {
            if let Some((key, deadline)) = self.compensator.observe(&event) {
                self.timers.schedule(SplitTimer::Held(key), deadline);
            }
            self.outputs.push_back(SplitOutput::Compensated(event.clone()));
            self.count(&event);
        }

        self.windower.push(event);
        self.ingested += 1;
        Ok(())
    }

    /// Let time pass up to `at`, firing every timer due by then
    pub fn advance_to(&mut self, at: Micros) -> SplitResult<()> {
        self.ensure_open()?;
        self.ensure_not_before(at)?;

        self.fire_timers(|deadline, _| deadline <= at);
        self.now = at;
        Ok(())
    }

    /// Fire every armed timer, however far in the future
    pub fn run_until_idle(&mut self) -> SplitResult<()> {
        self.ensure_open()?;
        self.fire_timers(|_, _| true);
        Ok(())
    }

    /// End the session: cancel all timers and flush the open window.
    pub fn finish(&mut self) -> SplitResult<()> {
        self.ensure_open()?;
        self.finished = true;
        self.timers.clear();
        self.compensator.clear();

        let last = self.windower.flush();
        self.outputs.push_back(SplitOutput::Window(last));
        Ok(())
    }

    /// Take everything reported since the last drain
    pub fn drain_outputs(&mut self) -> impl Iterator<Item = SplitOutput> + '_ {
        self.outputs.drain(..)
    }

    fn ensure_open(&self) -> SplitResult<()> {
        if self.finished {
            Err(SplitError::Finished)
        } else {
            Ok(())
        }
    }

    fn ensure_not_before(&self, at: Micros) -> SplitResult<()> {
        if at < self.now {
            Err(SplitError::OutOfOrder { at, now: self.now })
        } else {
            Ok(())
        }
    }

    fn fire_timers(&mut self, due: impl Fn(Micros, &SplitTimer) -> bool) {
        while let Some((deadline, timer)) = self.timers.pop_due(&due) {
            self.now = self.now.max(deadline);
            match timer {
                SplitTimer::Held(key) => self.release_held(key, deadline),
                SplitTimer::SavingPoint => self.try_cut(),
            }
        }
    }

    fn release_held(&mut self, key: NotePedalKey, at: Micros) {
        let Some(release) = self.compensator.expire(&key) else {
            return;
        };
        debug_assert_eq!(release.at, at);

        self.outputs.push_back(SplitOutput::SyntheticRelease(release.clone()));
        self.outputs.push_back(SplitOutput::HeldTimeout { at, key });
        self.outputs.push_back(SplitOutput::Compensated(release.clone()));
        self.count(&release);
    }

    fn count(&mut self, event: &MidiEvent) {
        let Some(change) = self.hold.apply(event) else {
            return;
        };

        self.outputs.push_back(SplitOutput::HoldCount {
            at: event.at,
            count: change.count,
        });
        if change.released {
            self.outputs.push_back(SplitOutput::AdjustedRelease { at: event.at });
        }

        let deadline = self.saving.record(change.count, event.at);
        self.timers.schedule(SplitTimer::SavingPoint, deadline);
    }

    fn try_cut(&mut self) {
        if let Some(at) = self.saving.expire() {
            self.outputs.push_back(SplitOutput::SavingPoint { at });
            let window = self.windower.cut(at);
            self.outputs.push_back(SplitOutput::Window(window));
        }
    }
}

/// Every output channel of a complete offline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitRecording {
    pub compensated: Vec<MidiEvent>,
    pub hold_counts: Vec<(Micros, u32)>,
    pub adjusted_releases: Vec<Micros>,
    pub held_timeouts: Vec<(Micros, NotePedalKey)>,
    pub synthetic_releases: Vec<MidiEvent>,
    pub saving_points: Vec<Micros>,
    pub windows: Vec<Window>,
}

impl SplitRecording {
    /// File one output under its channel
    pub fn record(&mut self, output: SplitOutput) {
        match output {
            SplitOutput::Compensated(event) => self.compensated.push(event),
            SplitOutput::HoldCount { at, count } => self.hold_counts.push((at, count)),
            SplitOutput::AdjustedRelease { at } => self.adjusted_releases.push(at),
            SplitOutput::HeldTimeout { at, key } => self.held_timeouts.push((at, key)),
            SplitOutput::SyntheticRelease(event) => self.synthetic_releases.push(event),
            SplitOutput::SavingPoint { at } => self.saving_points.push(at),
            SplitOutput::Window(window) => self.windows.push(window),
        }
    }

    /// Events of each window, in order
    pub fn window_events(&self) -> Vec<Vec<MidiEvent>> {
        self.windows.iter().map(|w| w.events.clone()).collect()
    }
}

/// Split a finished recording offline.
///
/// Runs every timer to completion after the last event (the recording is
/// over, so all pending silences are allowed to elapse), then flushes the
/// last window.
pub fn split_recorded(
    config: SplitConfig,
    events: impl IntoIterator<Item = MidiEvent>,
) -> SplitResult<SplitRecording> {
    let mut engine = SplitEngine::new(config)?;
    let mut recording = SplitRecording::default();

    for event in events {
        engine.ingest(event)?;
        engine.drain_outputs().for_each(|o| recording.record(o));
    }

    engine.run_until_idle()?;
    engine.finish()?;
    engine.drain_outputs().for_each(|o| recording.record(o));

    Ok(recording)
}
