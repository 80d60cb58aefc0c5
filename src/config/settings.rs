//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TimerMode
// ---------------------------------------------------------------------------

/// Selects how a timing session ends.
///
/// | Variant | Running phase                  | After the running phase          |
/// |---------|--------------------------------|----------------------------------|
/// | CountUp | counts up until manual Stop    | 10 s countdown, alarm at zero    |
/// | Capped  | counts up to a fixed cap       | finishes at cap, delayed alarm   |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimerMode {
    /// Unbounded stopwatch; a manual Stop starts a fixed countdown and the
    /// alarm plays the moment the countdown reaches zero.
    CountUp,
    /// Counts up to `cap_secs` and finishes automatically; the alarm plays
    /// `alarm_delay_secs` after completion.
    Capped,
}

impl Default for TimerMode {
    fn default() -> Self {
        Self::CountUp
    }
}

// ---------------------------------------------------------------------------
// HistoryOrder
// ---------------------------------------------------------------------------

/// Ordering policy for the history list.
///
/// Fixed for the lifetime of the process; changing it in the settings file
/// takes effect on the next launch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HistoryOrder {
    /// Most recently completed session first.
    NewestFirst,
    /// Insertion order, oldest first.
    Chronological,
}

impl Default for HistoryOrder {
    fn default() -> Self {
        Self::NewestFirst
    }
}

// ---------------------------------------------------------------------------
// TimerConfig
// ---------------------------------------------------------------------------

/// Settings for the timer state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Session-termination policy.
    pub mode: TimerMode,
    /// Countdown length in seconds after a manual Stop (CountUp mode).
    pub countdown_secs: u32,
    /// Elapsed-time cap in seconds (Capped mode).
    pub cap_secs: u32,
    /// Seconds between session completion and alarm playback (Capped mode;
    /// CountUp plays immediately).
    pub alarm_delay_secs: u64,
    /// Optional auto-stop bound for the running phase in CountUp mode.
    /// `None` means the stopwatch runs until a manual Stop.
    pub max_run_secs: Option<u32>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            mode: TimerMode::default(),
            countdown_secs: 10,
            cap_secs: 10,
            alarm_delay_secs: 3,
            max_run_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone sampling and trigger detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// RMS threshold on a [-1, 1] normalised scale; a frame whose RMS exceeds
    /// this (or whose squared peak exceeds twice it) fires the trigger.
    pub trigger_threshold: f32,
    /// Number of mono samples per analysis frame.
    pub frame_size: usize,
    /// Milliseconds between frame polls while listening.
    pub poll_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 0.05,
            frame_size: 4096,
            poll_interval_ms: 33,
        }
    }
}

// ---------------------------------------------------------------------------
// AlarmConfig
// ---------------------------------------------------------------------------

/// Settings for the synthesized completion alarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Total tone duration in seconds.
    pub duration_secs: f32,
    /// Initial gain (0.0 – 1.0); decays exponentially to near-silence.
    pub volume: f32,
    /// Frequency at the start and end of the sweep, in Hz.
    pub start_hz: f32,
    /// Frequency at the midpoint of the sweep, in Hz.
    pub peak_hz: f32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            volume: 0.5,
            start_hz: 440.0,
            peak_hz: 880.0,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Ordering of the history list.
    pub history_order: HistoryOrder,
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            history_order: HistoryOrder::default(),
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_stopwatch::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Timer state machine settings.
    pub timer: TimerConfig,
    /// Microphone sampling / trigger detection settings.
    pub audio: AudioConfig,
    /// Completion alarm settings.
    pub alarm: AlarmConfig,
    /// UI / window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
