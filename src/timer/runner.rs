//! Core runner — drives the sampler → trigger → state machine → ledger loop.
//!
//! [`CoreRunner`] owns every piece of mutable core state and runs as a single
//! tokio task, multiplexing three event sources with `tokio::select!`:
//!
//! * the [`CoreCommand`] channel fed by the UI,
//! * a high-frequency frame poll, active only while Listening,
//! * a one-second tick, active only while Running or Countdown.
//!
//! Because everything runs on one task, each event handler mutates state
//! atomically and a trigger observed while Listening always transitions the
//! machine before any later tick is processed.  The tick interval is reset on
//! every entry into a ticking state so a stale backlog can never fire; the
//! pending alarm and the open microphone are released on Reset and on
//! teardown.
//!
//! After each handled event the runner republishes [`CoreSnapshot`], the
//! read-only view the UI renders.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use crate::audio::{alarm, AlarmSchedule, AlarmSink, SignalSource, TriggerDetector};
use crate::config::AppConfig;
use crate::history::{HistoryEntry, HistoryLedger};

use super::machine::{CompletedSession, StopOutcome, TickOutcome, TimerMachine};
use super::session::{format_seconds, TimerState};

// ---------------------------------------------------------------------------
// CoreCommand
// ---------------------------------------------------------------------------

/// User intents forwarded by the presentation shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Open the microphone and begin listening for the sound trigger.
    Start,
    /// Manually end the running phase.
    Stop,
    /// Discard the in-flight session and return to Idle.
    Reset,
    /// Update the annotation draft attached to the next completed session.
    SetComment(String),
    /// Remove a history entry.
    DeleteEntry(u64),
}

// ---------------------------------------------------------------------------
// CoreSnapshot
// ---------------------------------------------------------------------------

/// Read-only view of the core, republished after every transition.
///
/// The shell renders this and nothing else — it holds no timing logic.
#[derive(Debug, Clone)]
pub struct CoreSnapshot {
    /// Current phase of the timer.
    pub state: TimerState,
    /// Seconds to display (elapsed or remaining, per phase).
    pub display_seconds: u32,
    /// History entries in display order.
    pub history: Vec<HistoryEntry>,
    /// `true` while the microphone is being acquired.
    pub is_busy: bool,
    /// Live input level (frame RMS) while Listening, for the UI meter.
    pub input_level: f32,
    /// Message to surface when the last start attempt failed.
    pub error_message: Option<String>,
}

impl CoreSnapshot {
    fn new() -> Self {
        Self {
            state: TimerState::Idle,
            display_seconds: 0,
            history: Vec::new(),
            is_busy: false,
            input_level: 0.0,
            error_message: None,
        }
    }
}

impl Default for CoreSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to the published [`CoreSnapshot`].
///
/// Cheap to clone (`Arc` clone).  Lock for a short critical section only.
pub type SharedSnapshot = Arc<Mutex<CoreSnapshot>>;

/// Construct a new [`SharedSnapshot`] with an idle snapshot.
pub fn new_shared_snapshot() -> SharedSnapshot {
    Arc::new(Mutex::new(CoreSnapshot::new()))
}

// ---------------------------------------------------------------------------
// CoreRunner
// ---------------------------------------------------------------------------

/// Owns the timer machine, ledger, detector, sampler and alarm, and runs the
/// event loop until the command channel closes.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_stopwatch::audio::{MicSampler, RodioAlarm};
/// use voice_stopwatch::config::AppConfig;
/// use voice_stopwatch::timer::{new_shared_snapshot, CoreRunner};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let snapshot = new_shared_snapshot();
/// let sampler = Box::new(MicSampler::new(config.audio.frame_size));
/// let alarm = Arc::new(RodioAlarm::new(config.alarm.clone()));
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// # let _ = tx;
/// let runner = CoreRunner::new(config, snapshot, sampler, alarm);
/// runner.run(rx).await;
/// # }
/// ```
pub struct CoreRunner {
    snapshot: SharedSnapshot,
    machine: TimerMachine,
    ledger: HistoryLedger,
    detector: TriggerDetector,
    sampler: Box<dyn SignalSource>,
    alarm: Arc<dyn AlarmSink>,
    /// Annotation draft attached to the next completed session.
    comment: String,
    /// Guard for a scheduled-but-not-yet-fired alarm.
    pending_alarm: Option<AlarmSchedule>,
    poll_interval: Duration,
    is_busy: bool,
    input_level: f32,
    error_message: Option<String>,
}

impl CoreRunner {
    /// Create a runner.
    ///
    /// # Arguments
    ///
    /// * `config`   — application configuration (timer mode, threshold, …).
    /// * `snapshot` — shared snapshot also held by the UI.
    /// * `sampler`  — microphone source (e.g. [`crate::audio::MicSampler`]).
    /// * `alarm`    — alarm output (e.g. [`crate::audio::RodioAlarm`]).
    pub fn new(
        config: AppConfig,
        snapshot: SharedSnapshot,
        sampler: Box<dyn SignalSource>,
        alarm: Arc<dyn AlarmSink>,
    ) -> Self {
        Self {
            snapshot,
            machine: TimerMachine::new(config.timer.clone()),
            ledger: HistoryLedger::new(config.ui.history_order),
            detector: TriggerDetector::new(config.audio.trigger_threshold),
            sampler,
            alarm,
            comment: String::new(),
            pending_alarm: None,
            poll_interval: Duration::from_millis(config.audio.poll_interval_ms.max(1)),
            is_busy: false,
            input_level: 0.0,
            error_message: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the event loop until `commands` is closed.
    ///
    /// Spawn this as a tokio task from `main()`.  On exit the pending alarm
    /// is cancelled and the microphone released.
    pub async fn run(mut self, mut commands: mpsc::Receiver<CoreCommand>) {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.publish();

        loop {
            let listening = self.machine.state() == TimerState::Listening;
            let ticking = self.machine.state().is_ticking();

            tokio::select! {
                maybe_cmd = commands.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd, &mut tick).await,
                        None => break,
                    }
                }
                _ = poll.tick(), if listening => self.poll_frame(&mut tick),
                _ = tick.tick(), if ticking => self.handle_tick(),
            }
        }

        log::info!("core: command channel closed, shutting down");
        self.cancel_alarm();
        self.sampler.close();
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    async fn handle_command(&mut self, cmd: CoreCommand, tick: &mut Interval) {
        match cmd {
            CoreCommand::Start => self.handle_start().await,
            CoreCommand::Stop => self.handle_stop(tick),
            CoreCommand::Reset => self.handle_reset(),
            CoreCommand::SetComment(text) => {
                self.comment = text;
            }
            CoreCommand::DeleteEntry(id) => {
                self.ledger.delete(id);
                self.publish();
            }
        }
    }

    /// Acquire the microphone and enter Listening.
    ///
    /// A failed acquisition surfaces its message in the snapshot and leaves
    /// the machine in Idle; the user must issue a new start.
    async fn handle_start(&mut self) {
        if self.machine.state() != TimerState::Idle {
            log::debug!("core: start ignored in {}", self.machine.state().label());
            return;
        }

        self.is_busy = true;
        self.error_message = None;
        self.publish();

        match self.sampler.open().await {
            Ok(()) => {
                self.machine.begin_listening();
            }
            Err(e) => {
                log::warn!("core: microphone unavailable: {e}");
                self.error_message = Some(format!("Microphone unavailable: {e}"));
            }
        }

        self.is_busy = false;
        self.input_level = 0.0;
        self.publish();
    }

    fn handle_stop(&mut self, tick: &mut Interval) {
        match self.machine.request_stop() {
            StopOutcome::Ignored => {}
            StopOutcome::CountdownStarted => {
                // The countdown runs a fresh one-second cadence from the
                // moment of the stop.
                tick.reset();
                self.publish();
            }
            StopOutcome::Completed(done) => self.finalize(done),
        }
    }

    fn handle_reset(&mut self) {
        log::debug!("core: reset");
        self.machine.reset();
        self.cancel_alarm();
        self.sampler.close();
        self.comment.clear();
        self.error_message = None;
        self.input_level = 0.0;
        self.publish();
    }

    /// One frame poll while Listening.
    fn poll_frame(&mut self, tick: &mut Interval) {
        let frame = self.sampler.sample();
        let detection = self.detector.evaluate(&frame);
        self.input_level = detection.rms.min(1.0);

        if detection.fired && self.machine.on_trigger() {
            log::debug!(
                "core: trigger fired (rms {:.4}, peak {:.4})",
                detection.rms,
                detection.peak
            );
            // The microphone is only consulted while Listening.
            self.sampler.close();
            self.input_level = 0.0;
            // First tick lands one full second after the trigger.
            tick.reset();
        }

        self.publish();
    }

    fn handle_tick(&mut self) {
        match self.machine.on_tick() {
            TickOutcome::Ignored => {}
            TickOutcome::Advanced | TickOutcome::CountdownStarted => self.publish(),
            TickOutcome::Completed(done) => self.finalize(done),
        }
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// Log the completed session, schedule the alarm, and re-arm to Idle.
    fn finalize(&mut self, done: CompletedSession) {
        let entry = HistoryEntry::new(
            format_seconds(done.duration_secs),
            std::mem::take(&mut self.comment),
            Local::now(),
        );
        let id = self.ledger.append(entry);
        log::info!(
            "core: session complete — {} logged as entry {id}",
            format_seconds(done.duration_secs)
        );

        // Make the Finished state (with its final seconds value) visible
        // before re-arming.
        self.publish();

        self.pending_alarm = Some(alarm::schedule(
            Arc::clone(&self.alarm),
            Duration::from_secs(done.alarm_delay_secs),
        ));

        self.machine.rearm();
        self.publish();
    }

    fn cancel_alarm(&mut self) {
        if let Some(pending) = self.pending_alarm.take() {
            pending.cancel();
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    fn publish(&self) {
        let mut snap = self.snapshot.lock().unwrap();
        snap.state = self.machine.state();
        snap.display_seconds = self.machine.display_seconds();
        snap.history = self.ledger.entries();
        snap.is_busy = self.is_busy;
        snap.input_level = self.input_level;
        snap.error_message = self.error_message.clone();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
