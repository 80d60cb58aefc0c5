//! The timer state machine.
//!
//! [`TimerMachine`] is pure and synchronous: it owns the canonical session
//! state and seconds value, and is driven entirely by its caller — the core
//! runner feeds it trigger events, one-second ticks, and manual commands,
//! then acts on the returned outcome (log an entry, schedule the alarm).
//! Keeping the machine free of timers and I/O makes every transition
//! directly testable.
//!
//! Two session-termination policies exist (see [`TimerMode`]):
//!
//! * **CountUp** — the stopwatch runs until a manual stop (or the optional
//!   `max_run_secs` bound), then a fixed countdown runs to zero and the
//!   session completes with the elapsed value captured at the stop.
//! * **Capped** — the stopwatch completes by itself at `cap_secs`.

use std::time::Instant;

use crate::config::{TimerConfig, TimerMode};

use super::session::TimerState;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A session that just completed and must be logged by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedSession {
    /// The duration to record, in seconds.
    pub duration_secs: u32,
    /// Seconds to wait before sounding the alarm (0 = immediately).
    pub alarm_delay_secs: u64,
}

/// Result of delivering a one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The machine was not in a ticking state; nothing changed.
    Ignored,
    /// Time advanced; the session continues.
    Advanced,
    /// The `max_run_secs` bound was hit and the countdown phase began.
    CountdownStarted,
    /// The session completed on this tick.
    Completed(CompletedSession),
}

/// Result of a manual stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Stop is only meaningful while running; nothing changed.
    Ignored,
    /// CountUp mode: the elapsed value was captured and the countdown began.
    CountdownStarted,
    /// The session completed immediately.
    Completed(CompletedSession),
}

// ---------------------------------------------------------------------------
// TimerMachine
// ---------------------------------------------------------------------------

/// Authoritative state of the single live timing session.
///
/// # Example
///
/// ```rust
/// use voice_stopwatch::config::TimerConfig;
/// use voice_stopwatch::timer::{TimerMachine, TimerState};
///
/// let mut machine = TimerMachine::new(TimerConfig::default());
/// assert!(machine.begin_listening());
/// assert!(machine.on_trigger());
/// assert_eq!(machine.state(), TimerState::Running);
/// ```
pub struct TimerMachine {
    config: TimerConfig,
    state: TimerState,
    /// Elapsed seconds while Running; remaining seconds while Countdown.
    seconds: u32,
    /// CountUp mode: elapsed value captured when the countdown began.
    recorded_secs: u32,
    /// When the running phase started; `None` outside a session.
    started_at: Option<Instant>,
}

impl TimerMachine {
    /// Create a machine in [`TimerState::Idle`].
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            seconds: 0,
            recorded_secs: 0,
            started_at: None,
        }
    }

    /// Current phase.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// The seconds value to display: zero in Idle and Listening, elapsed
    /// time while Running, remaining time while Countdown, the final value
    /// in Finished.
    pub fn display_seconds(&self) -> u32 {
        self.seconds
    }

    /// When the running phase started, if a session is in flight.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Idle → Listening.  Returns `false` (no change) from any other state.
    ///
    /// The caller must have acquired the microphone first; a machine never
    /// listens without a live input device.
    pub fn begin_listening(&mut self) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        log::debug!("timer: Idle → Listening");
        self.state = TimerState::Listening;
        self.seconds = 0;
        true
    }

    /// Deliver a sound trigger.  Listening → Running; returns `false` when
    /// the trigger was ignored because the machine was not listening.
    pub fn on_trigger(&mut self) -> bool {
        if self.state != TimerState::Listening {
            return false;
        }
        log::debug!("timer: Listening → Running (trigger)");
        self.state = TimerState::Running;
        self.seconds = 0;
        self.recorded_secs = 0;
        self.started_at = Some(Instant::now());
        true
    }

    /// Manual stop.  Only meaningful while Running.
    pub fn request_stop(&mut self) -> StopOutcome {
        if self.state != TimerState::Running {
            return StopOutcome::Ignored;
        }
        self.stop_running()
    }

    /// Deliver a one-second tick.
    pub fn on_tick(&mut self) -> TickOutcome {
        match self.state {
            TimerState::Running => self.tick_running(),
            TimerState::Countdown => self.tick_countdown(),
            _ => TickOutcome::Ignored,
        }
    }

    /// Reset to Idle from any state, discarding the in-flight session.
    pub fn reset(&mut self) {
        log::debug!("timer: {} → Idle (reset)", self.state.label());
        self.clear();
    }

    /// Finished → Idle, once the caller has logged the completed session.
    /// A no-op in any other state.
    pub fn rearm(&mut self) {
        if self.state == TimerState::Finished {
            self.clear();
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn clear(&mut self) {
        self.state = TimerState::Idle;
        self.seconds = 0;
        self.recorded_secs = 0;
        self.started_at = None;
    }

    /// End the running phase, per mode.
    fn stop_running(&mut self) -> StopOutcome {
        match self.config.mode {
            TimerMode::CountUp => {
                self.recorded_secs = self.seconds;
                if self.config.countdown_secs == 0 {
                    // Degenerate countdown: complete on the spot.
                    self.state = TimerState::Finished;
                    StopOutcome::Completed(CompletedSession {
                        duration_secs: self.recorded_secs,
                        alarm_delay_secs: 0,
                    })
                } else {
                    log::debug!(
                        "timer: Running → Countdown ({}s, elapsed {}s)",
                        self.config.countdown_secs,
                        self.recorded_secs
                    );
                    self.state = TimerState::Countdown;
                    self.seconds = self.config.countdown_secs;
                    StopOutcome::CountdownStarted
                }
            }
            TimerMode::Capped => {
                self.state = TimerState::Finished;
                StopOutcome::Completed(CompletedSession {
                    duration_secs: self.seconds,
                    alarm_delay_secs: self.config.alarm_delay_secs,
                })
            }
        }
    }

    fn tick_running(&mut self) -> TickOutcome {
        self.seconds += 1;

        match self.config.mode {
            TimerMode::CountUp => {
                if self
                    .config
                    .max_run_secs
                    .is_some_and(|max| self.seconds >= max)
                {
                    match self.stop_running() {
                        StopOutcome::CountdownStarted => TickOutcome::CountdownStarted,
                        StopOutcome::Completed(done) => TickOutcome::Completed(done),
                        StopOutcome::Ignored => unreachable!("stop from Running is never ignored"),
                    }
                } else {
                    TickOutcome::Advanced
                }
            }
            TimerMode::Capped => {
                if self.seconds >= self.config.cap_secs {
                    self.seconds = self.seconds.min(self.config.cap_secs);
                    log::debug!("timer: Running → Finished (cap {}s)", self.seconds);
                    self.state = TimerState::Finished;
                    TickOutcome::Completed(CompletedSession {
                        duration_secs: self.seconds,
                        alarm_delay_secs: self.config.alarm_delay_secs,
                    })
                } else {
                    TickOutcome::Advanced
                }
            }
        }
    }

    fn tick_countdown(&mut self) -> TickOutcome {
        self.seconds = self.seconds.saturating_sub(1);

        if self.seconds == 0 {
            log::debug!(
                "timer: Countdown → Finished (elapsed {}s)",
                self.recorded_secs
            );
            self.state = TimerState::Finished;
            TickOutcome::Completed(CompletedSession {
                duration_secs: self.recorded_secs,
                alarm_delay_secs: 0,
            })
        } else {
            TickOutcome::Advanced
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn countup_config() -> TimerConfig {
        TimerConfig {
            mode: TimerMode::CountUp,
            ..TimerConfig::default()
        }
    }

    fn capped_config() -> TimerConfig {
        TimerConfig {
            mode: TimerMode::Capped,
            ..TimerConfig::default()
        }
    }

    /// Drive a machine from Idle into Running.
    fn running(config: TimerConfig) -> TimerMachine {
        let mut m = TimerMachine::new(config);
        assert!(m.begin_listening());
        assert!(m.on_trigger());
        m
    }

    // ---- Listening / trigger ----------------------------------------------

    #[test]
    fn begin_listening_only_from_idle() {
        let mut m = TimerMachine::new(countup_config());
        assert!(m.begin_listening());
        assert_eq!(m.state(), TimerState::Listening);
        assert_eq!(m.display_seconds(), 0);

        // Already listening — refused.
        assert!(!m.begin_listening());
    }

    #[test]
    fn trigger_starts_running_from_zero() {
        let mut m = TimerMachine::new(countup_config());
        m.begin_listening();
        assert!(m.on_trigger());

        assert_eq!(m.state(), TimerState::Running);
        assert_eq!(m.display_seconds(), 0);
        assert!(m.started_at().is_some());
    }

    #[test]
    fn trigger_outside_listening_has_no_effect() {
        // Idle
        let mut m = TimerMachine::new(countup_config());
        assert!(!m.on_trigger());
        assert_eq!(m.state(), TimerState::Idle);

        // Running
        let mut m = running(countup_config());
        m.on_tick();
        let before = m.display_seconds();
        assert!(!m.on_trigger());
        assert_eq!(m.state(), TimerState::Running);
        assert_eq!(m.display_seconds(), before);

        // Countdown
        let mut m = running(countup_config());
        m.request_stop();
        assert!(!m.on_trigger());
        assert_eq!(m.state(), TimerState::Countdown);
    }

    // ---- CountUp mode ------------------------------------------------------

    #[test]
    fn countup_ticks_advance_monotonically() {
        let mut m = running(countup_config());
        for expected in 1..=60 {
            assert_eq!(m.on_tick(), TickOutcome::Advanced);
            assert_eq!(m.display_seconds(), expected);
        }
        assert_eq!(m.state(), TimerState::Running);
    }

    #[test]
    fn countup_stop_captures_elapsed_and_starts_countdown() {
        let mut m = running(countup_config());
        for _ in 0..7 {
            m.on_tick();
        }

        assert_eq!(m.request_stop(), StopOutcome::CountdownStarted);
        assert_eq!(m.state(), TimerState::Countdown);
        assert_eq!(m.display_seconds(), 10);
    }

    #[test]
    fn countup_countdown_completes_with_captured_elapsed() {
        let mut m = running(countup_config());
        for _ in 0..7 {
            m.on_tick();
        }
        m.request_stop();

        // 9 ticks: 10 → 1
        for remaining in (1..=9).rev() {
            assert_eq!(m.on_tick(), TickOutcome::Advanced);
            assert_eq!(m.display_seconds(), remaining);
        }

        // 10th tick completes with the elapsed value from before the stop,
        // and the alarm plays immediately.
        assert_eq!(
            m.on_tick(),
            TickOutcome::Completed(CompletedSession {
                duration_secs: 7,
                alarm_delay_secs: 0,
            })
        );
        assert_eq!(m.state(), TimerState::Finished);
        assert_eq!(m.display_seconds(), 0);
    }

    #[test]
    fn countup_zero_countdown_completes_on_stop() {
        let mut config = countup_config();
        config.countdown_secs = 0;
        let mut m = running(config);
        for _ in 0..3 {
            m.on_tick();
        }

        assert_eq!(
            m.request_stop(),
            StopOutcome::Completed(CompletedSession {
                duration_secs: 3,
                alarm_delay_secs: 0,
            })
        );
        assert_eq!(m.state(), TimerState::Finished);
    }

    #[test]
    fn countup_max_run_auto_stops_into_countdown() {
        let mut config = countup_config();
        config.max_run_secs = Some(5);
        let mut m = running(config);

        for _ in 0..4 {
            assert_eq!(m.on_tick(), TickOutcome::Advanced);
        }
        assert_eq!(m.on_tick(), TickOutcome::CountdownStarted);
        assert_eq!(m.state(), TimerState::Countdown);
        assert_eq!(m.display_seconds(), 10);

        // The countdown then completes with the bounded elapsed value.
        for _ in 0..9 {
            m.on_tick();
        }
        assert_eq!(
            m.on_tick(),
            TickOutcome::Completed(CompletedSession {
                duration_secs: 5,
                alarm_delay_secs: 0,
            })
        );
    }

    #[test]
    fn countup_stop_outside_running_is_ignored() {
        let mut m = TimerMachine::new(countup_config());
        assert_eq!(m.request_stop(), StopOutcome::Ignored);

        m.begin_listening();
        assert_eq!(m.request_stop(), StopOutcome::Ignored);

        // During the countdown a second stop is meaningless too.
        let mut m = running(countup_config());
        m.request_stop();
        assert_eq!(m.request_stop(), StopOutcome::Ignored);
    }

    // ---- Capped mode -------------------------------------------------------

    #[test]
    fn capped_completes_at_cap_with_delayed_alarm() {
        let mut m = running(capped_config());

        for expected in 1..=9 {
            assert_eq!(m.on_tick(), TickOutcome::Advanced);
            assert_eq!(m.display_seconds(), expected);
        }

        assert_eq!(
            m.on_tick(),
            TickOutcome::Completed(CompletedSession {
                duration_secs: 10,
                alarm_delay_secs: 3,
            })
        );
        assert_eq!(m.state(), TimerState::Finished);
        assert_eq!(m.display_seconds(), 10);
    }

    #[test]
    fn capped_manual_stop_completes_with_current_elapsed() {
        let mut m = running(capped_config());
        for _ in 0..4 {
            m.on_tick();
        }

        assert_eq!(
            m.request_stop(),
            StopOutcome::Completed(CompletedSession {
                duration_secs: 4,
                alarm_delay_secs: 3,
            })
        );
        assert_eq!(m.state(), TimerState::Finished);
    }

    #[test]
    fn capped_never_exceeds_cap() {
        let mut m = running(capped_config());
        for _ in 0..10 {
            m.on_tick();
        }
        assert!(m.display_seconds() <= 10);
    }

    // ---- Reset / rearm -----------------------------------------------------

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        // Listening
        let mut m = TimerMachine::new(countup_config());
        m.begin_listening();
        m.reset();
        assert_eq!(m.state(), TimerState::Idle);
        assert_eq!(m.display_seconds(), 0);

        // Running, mid-session
        let mut m = running(countup_config());
        for _ in 0..7 {
            m.on_tick();
        }
        m.reset();
        assert_eq!(m.state(), TimerState::Idle);
        assert_eq!(m.display_seconds(), 0);
        assert!(m.started_at().is_none());

        // Countdown
        let mut m = running(countup_config());
        m.request_stop();
        m.reset();
        assert_eq!(m.state(), TimerState::Idle);
        assert_eq!(m.display_seconds(), 0);
    }

    #[test]
    fn ticks_after_reset_are_ignored() {
        let mut m = running(countup_config());
        m.reset();
        assert_eq!(m.on_tick(), TickOutcome::Ignored);
        assert_eq!(m.display_seconds(), 0);
    }

    #[test]
    fn rearm_leaves_finished_only() {
        let mut m = running(capped_config());
        for _ in 0..10 {
            m.on_tick();
        }
        assert_eq!(m.state(), TimerState::Finished);

        m.rearm();
        assert_eq!(m.state(), TimerState::Idle);
        assert_eq!(m.display_seconds(), 0);

        // Outside Finished it is a no-op.
        let mut m = running(countup_config());
        m.rearm();
        assert_eq!(m.state(), TimerState::Running);
    }

    #[test]
    fn restart_after_rearm_starts_a_fresh_session() {
        let mut m = running(capped_config());
        for _ in 0..10 {
            m.on_tick();
        }
        m.rearm();

        assert!(m.begin_listening());
        assert!(m.on_trigger());
        assert_eq!(m.display_seconds(), 0);
        assert_eq!(m.on_tick(), TickOutcome::Advanced);
        assert_eq!(m.display_seconds(), 1);
    }
}
