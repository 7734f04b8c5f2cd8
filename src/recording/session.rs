// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live recording session.
//!
//! One tokio task owns the [`SplitEngine`]. Captured messages arrive over an
//! unbounded queue and are stamped with the session clock on receipt, which
//! keeps timestamps monotonic no matter how many inputs feed the queue.
//! Between messages the task sleeps until the engine's next timer. Finished
//! takes are written on the blocking pool so a slow disk never delays
//! splitting.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, trace, warn};

use super::export::MidiExporter;
use super::naming::{FileNameTemplate, NameContext};
use super::tracks::build_tracks;
use crate::error::SplitResult;
use crate::midi::{note_name, CaptureSender, CapturedMessage, MidiEvent, NoteDurations};
use crate::split::{SplitConfig, SplitEngine, SplitOutput, Window};
use crate::timing::{Clock, Micros, Sleep};

/// Destination for finished takes
pub trait WindowSink: Send + Sync + 'static {
    /// Persist one take, returning where it went
    fn save(&self, window: &Window) -> Result<PathBuf>;
}

/// Writes each take as a Standard MIDI File named from a template
#[derive(Debug, Clone)]
pub struct MidiFileSink {
    template: FileNameTemplate,
    ppqn: u16,
    base_dir: Option<PathBuf>,
}

impl MidiFileSink {
    pub fn new(template: FileNameTemplate, ppqn: u16) -> Self {
        Self {
            template,
            ppqn,
            base_dir: None,
        }
    }

    /// Resolve relative file names against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Where a take would be written with the given naming context
    pub fn path_for(&self, context: &NameContext) -> PathBuf {
        let path = self.template.path_for(context);
        match &self.base_dir {
            Some(base) => base.join(path),
            None => path,
        }
    }
}

impl WindowSink for MidiFileSink {
    fn save(&self, window: &Window) -> Result<PathBuf> {
        let path = self.path_for(&NameContext::for_window(window));

        let mut exporter = MidiExporter::new(self.ppqn);
        exporter.add_tracks(build_tracks(&window.events));
        exporter.export(&path)?;

        info!(
            window = window.index,
            events = window.len(),
            path = %path.display(),
            "Saved take"
        );
        Ok(path)
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Events accepted by the engine
    pub events: usize,
    /// Windows produced, including empty ones
    pub windows: usize,
    /// Empty windows (not saved)
    pub empty: usize,
    /// Takes written successfully
    pub saved: usize,
    /// Takes whose save failed or panicked
    pub failed: usize,
    /// Events the engine refused
    pub rejected: usize,
}

/// Control handle for a running session
#[derive(Debug)]
pub struct SessionHandle {
    input: CaptureSender,
    stop: oneshot::Sender<()>,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    /// Sender for input backends; one clone per connection
    pub fn sender(&self) -> CaptureSender {
        self.input.clone()
    }

    /// Stop now: pending timers are cancelled and the open take is flushed
    pub async fn stop(self) -> Result<SessionSummary> {
        let _ = self.stop.send(());
        self.task.await.context("Recording session task failed")
    }

    /// Wait for every other sender to be dropped, then finish
    pub async fn join(self) -> Result<SessionSummary> {
        let SessionHandle { input, stop, task } = self;
        drop(input);
        let summary = task.await.context("Recording session task failed");
        drop(stop);
        summary
    }
}

/// Start a session on the current tokio runtime
pub fn spawn_session(
    config: SplitConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn WindowSink>,
) -> SplitResult<SessionHandle> {
    let engine = SplitEngine::new(config)?;
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();

    let session = Session {
        engine,
        clock,
        sink,
        saves: JoinSet::new(),
        durations: NoteDurations::new(),
        summary: SessionSummary::default(),
    };
    let task = tokio::spawn(session.run(input_rx, stop_rx));

    Ok(SessionHandle {
        input: input_tx,
        stop: stop_tx,
        task,
    })
}

type SaveResult = (usize, std::result::Result<Result<PathBuf>, JoinError>);

enum Step {
    Stop,
    Closed,
    Message(CapturedMessage),
    Deadline(Option<Micros>),
    Saved(std::result::Result<SaveResult, JoinError>),
}

struct Session {
    engine: SplitEngine,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn WindowSink>,
    saves: JoinSet<SaveResult>,
    durations: NoteDurations,
    summary: SessionSummary,
}

impl Session {
    async fn run(
        mut self,
        mut input: mpsc::UnboundedReceiver<CapturedMessage>,
        mut stop: oneshot::Receiver<()>,
    ) -> SessionSummary {
        let config = *self.engine.config();
        info!(
            quiet_ms = config.quiet_period.as_millis() as u64,
            held_timeout_ms = config.held_event_timeout.as_millis() as u64,
            "Recording session started"
        );

        loop {
            let deadline = self.engine.next_deadline();
            let sleep: Sleep = match deadline {
                Some(at) => self.clock.sleep_until(at),
                None => Box::pin(std::future::pending()),
            };

            let step = tokio::select! {
                biased;
                _ = &mut stop => Step::Stop,
                received = input.recv() => match received {
                    Some(message) => Step::Message(message),
                    None => Step::Closed,
                },
                _ = sleep => Step::Deadline(deadline),
                Some(saved) = self.saves.join_next(), if !self.saves.is_empty() => Step::Saved(saved),
            };

            match step {
                Step::Stop => {
                    debug!("Stop requested");
                    break;
                }
                Step::Closed => {
                    debug!("Capture queue closed");
                    break;
                }
                Step::Message(message) => self.on_message(message),
                Step::Deadline(Some(at)) => self.on_deadline(at),
                Step::Deadline(None) => {}
                Step::Saved(saved) => self.on_saved(saved),
            }
        }

        self.shutdown().await
    }

    fn on_message(&mut self, captured: CapturedMessage) {
        let at = self.clock.now().max(self.engine.now());
        let event = MidiEvent::new(at, captured.port, captured.message);
        trace!(event = %event, "Captured");

        if let Some(duration) = self.durations.observe(&event) {
            trace!(
                port = event.port,
                note = %note_name(event.note_number()),
                duration_ms = duration.as_secs_f64() * 1000.0,
                "Note released"
            );
        }

        match self.engine.ingest(event) {
            Ok(()) => self.summary.events += 1,
            Err(e) => {
                self.summary.rejected += 1;
                warn!(error = %e, "Event rejected");
            }
        }
        self.dispatch();
    }

    fn on_deadline(&mut self, at: Micros) {
        let at = at.max(self.engine.now());
        if let Err(e) = self.engine.advance_to(at) {
            warn!(error = %e, "Timer advance failed");
        }
        self.dispatch();
    }

    fn on_saved(&mut self, saved: std::result::Result<SaveResult, JoinError>) {
        match saved {
            Ok((_, Ok(Ok(_)))) => self.summary.saved += 1,
            Ok((index, Ok(Err(e)))) => {
                self.summary.failed += 1;
                error!(window = index, error = %format!("{:#}", e), "Failed to save take");
            }
            Ok((index, Err(e))) => {
                self.summary.failed += 1;
                error!(window = index, error = %e, "Save task panicked");
            }
            Err(e) => {
                self.summary.failed += 1;
                error!(error = %e, "Save task failed");
            }
        }
    }

    fn dispatch(&mut self) {
        let outputs: Vec<SplitOutput> = self.engine.drain_outputs().collect();
        for output in outputs {
            match output {
                SplitOutput::Compensated(event) => trace!(event = %event, "Compensated"),
                SplitOutput::HoldCount { at, count } => debug!(at, count, "Hold count"),
                SplitOutput::AdjustedRelease { at } => debug!(at, "All released"),
                SplitOutput::HeldTimeout { at, key } => {
                    warn!(at, key = %key, "Held event timed out, releasing")
                }
                SplitOutput::SyntheticRelease(event) => debug!(event = %event, "Synthetic release"),
                SplitOutput::SavingPoint { at } => info!(at, "Saving point"),
                SplitOutput::Window(window) => self.on_window(window),
            }
        }
    }

    fn on_window(&mut self, window: Window) {
        self.summary.windows += 1;
        if window.is_empty() {
            self.summary.empty += 1;
            debug!(window = window.index, "Empty take skipped");
            return;
        }

        info!(
            window = window.index,
            events = window.len(),
            notes = window.note_count(),
            "Take complete"
        );

        let sink = Arc::clone(&self.sink);
        let index = window.index;
        self.saves.spawn(async move {
            let result = tokio::task::spawn_blocking(move || sink.save(&window)).await;
            (index, result)
        });
    }

    async fn shutdown(mut self) -> SessionSummary {
        if let Err(e) = self.engine.finish() {
            warn!(error = %e, "Session already finished");
        }
        self.dispatch();

        while let Some(saved) = self.saves.join_next().await {
            self.on_saved(saved);
        }

        info!(
            events = self.summary.events,
            windows = self.summary.windows,
            saved = self.summary.saved,
            failed = self.summary.failed,
            "Recording session finished"
        );
        self.summary
    }
}
