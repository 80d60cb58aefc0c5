//! Timer states and time formatting.
//!
//! [`TimerState`] is the machine's phase enum; the UI reads it from the
//! published snapshot to pick what to render.

// ---------------------------------------------------------------------------
// TimerState
// ---------------------------------------------------------------------------

/// Phases of a timing session.
///
/// The transitions are:
///
/// ```text
/// Idle ──start command──▶ Listening
///      ──sound trigger──▶ Running
///      ──stop / cap─────▶ Countdown (CountUp mode) or Finished (Capped mode)
/// Countdown ──reaches 0─▶ Finished
/// Finished ──logged─────▶ Idle
/// any state ──reset─────▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Nothing in flight; the display shows zero.
    Idle,

    /// Microphone is open; frames are polled for the sound trigger.
    Listening,

    /// The stopwatch is advancing once per second.
    Running,

    /// Post-stop countdown is decrementing once per second (CountUp mode).
    Countdown,

    /// The session completed; its entry is about to be logged.
    Finished,
}

impl TimerState {
    /// Returns `true` while one-second ticks drive this state.
    ///
    /// ```
    /// use voice_stopwatch::timer::TimerState;
    ///
    /// assert!(!TimerState::Idle.is_ticking());
    /// assert!(!TimerState::Listening.is_ticking());
    /// assert!(TimerState::Running.is_ticking());
    /// assert!(TimerState::Countdown.is_ticking());
    /// assert!(!TimerState::Finished.is_ticking());
    /// ```
    pub fn is_ticking(&self) -> bool {
        matches!(self, TimerState::Running | TimerState::Countdown)
    }

    /// A short human-readable label suitable for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            TimerState::Idle => "Idle",
            TimerState::Listening => "Listening",
            TimerState::Running => "Running",
            TimerState::Countdown => "Countdown",
            TimerState::Finished => "Done",
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Idle
    }
}

// ---------------------------------------------------------------------------
// format_seconds
// ---------------------------------------------------------------------------

/// Format a second count as `MM:SS`, the display format used for both the
/// live readout and history entries.
///
/// Minutes widen past two digits rather than wrapping.
///
/// ```
/// use voice_stopwatch::timer::format_seconds;
///
/// assert_eq!(format_seconds(0), "00:00");
/// assert_eq!(format_seconds(75), "01:15");
/// ```
pub fn format_seconds(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
