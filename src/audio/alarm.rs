//! Completion alarm — synthesized swept-tone playback via `rodio`.
//!
//! [`SirenTone`] generates the alarm signal sample-by-sample: a sine whose
//! frequency ramps exponentially 440 → 880 Hz over the first half of the
//! tone and back to 440 Hz over the second half, with the gain decaying
//! exponentially from the configured volume to near-silence.  The envelope
//! shape is part of the product's audible identity, so the ramp math mirrors
//! per-segment exponential interpolation exactly.
//!
//! [`AlarmSink::play`] hands the tone to a detached playback thread.  When no
//! output device exists the thread bails out silently — a missing speaker
//! must never stall the timer or the history log.

use std::sync::Arc;
use std::time::Duration;

use rodio::source::Source;
use rodio::{OutputStream, Sink};

use crate::config::AlarmConfig;

/// Gain value the decay converges to; effectively inaudible.
const END_GAIN: f32 = 0.01;

/// Output sample rate for the synthesized tone, in Hz.
const TONE_SAMPLE_RATE: u32 = 44_100;

// ---------------------------------------------------------------------------
// SirenTone
// ---------------------------------------------------------------------------

/// Mono swept-tone source for `rodio`.
///
/// # Example
///
/// ```rust
/// use voice_stopwatch::audio::SirenTone;
/// use voice_stopwatch::config::AlarmConfig;
///
/// let tone = SirenTone::new(&AlarmConfig::default());
/// // 2 s at 44.1 kHz
/// assert_eq!(tone.count(), 88_200);
/// ```
#[derive(Debug, Clone)]
pub struct SirenTone {
    duration_secs: f32,
    volume: f32,
    start_hz: f32,
    peak_hz: f32,
    total_samples: usize,
    pos: usize,
    /// Accumulated oscillator phase in radians.
    phase: f32,
}

impl SirenTone {
    /// Build a tone from the alarm settings.
    pub fn new(config: &AlarmConfig) -> Self {
        let total_samples = (config.duration_secs.max(0.0) * TONE_SAMPLE_RATE as f32) as usize;
        Self {
            duration_secs: config.duration_secs,
            volume: config.volume,
            start_hz: config.start_hz,
            peak_hz: config.peak_hz,
            total_samples,
            pos: 0,
            phase: 0.0,
        }
    }

    /// Instantaneous frequency at `t` seconds into the tone.
    ///
    /// Exponential ramp up to `peak_hz` at the midpoint, then exponentially
    /// back down to `start_hz` at the end.
    pub fn frequency_at(&self, t: f32) -> f32 {
        let half = self.duration_secs / 2.0;
        if half <= 0.0 {
            return self.start_hz;
        }
        if t < half {
            let ratio = self.peak_hz / self.start_hz;
            self.start_hz * ratio.powf(t / half)
        } else {
            let ratio = self.start_hz / self.peak_hz;
            self.peak_hz * ratio.powf((t - half) / half)
        }
    }

    /// Instantaneous gain at `t` seconds into the tone.
    ///
    /// Exponential decay from the configured volume to [`END_GAIN`] over the
    /// full duration.
    pub fn gain_at(&self, t: f32) -> f32 {
        if self.volume <= 0.0 || self.duration_secs <= 0.0 {
            return 0.0;
        }
        let ratio = END_GAIN / self.volume;
        self.volume * ratio.powf(t / self.duration_secs)
    }
}

impl Iterator for SirenTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.total_samples {
            return None;
        }

        let t = self.pos as f32 / TONE_SAMPLE_RATE as f32;
        let freq = self.frequency_at(t);
        self.phase += std::f32::consts::TAU * freq / TONE_SAMPLE_RATE as f32;
        self.pos += 1;

        Some(self.phase.sin() * self.gain_at(t))
    }
}

impl Source for SirenTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.pos)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        TONE_SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(self.duration_secs.max(0.0)))
    }
}

// ---------------------------------------------------------------------------
// AlarmSink
// ---------------------------------------------------------------------------

/// Something that can sound the completion alarm.
///
/// The runner holds an `Arc<dyn AlarmSink>` so tests can substitute a
/// counting mock for the real audio output.
pub trait AlarmSink: Send + Sync {
    /// Sound the alarm now.  Must not block the caller and must not fail
    /// observably — an unavailable output device is a silent no-op.
    fn play(&self);
}

// ---------------------------------------------------------------------------
// RodioAlarm
// ---------------------------------------------------------------------------

/// [`AlarmSink`] backed by the default `rodio` output device.
pub struct RodioAlarm {
    config: AlarmConfig,
}

impl RodioAlarm {
    /// Create an alarm that synthesizes tones per `config`.
    pub fn new(config: AlarmConfig) -> Self {
        Self { config }
    }
}

impl AlarmSink for RodioAlarm {
    fn play(&self) {
        let tone = SirenTone::new(&self.config);

        // The output stream cannot leave this thread, so the whole playback
        // lifecycle lives on a short-lived detached thread.
        let spawned = std::thread::Builder::new()
            .name("alarm-playback".into())
            .spawn(move || {
                let Ok((_stream, handle)) = OutputStream::try_default() else {
                    log::warn!("alarm: no audio output device, skipping playback");
                    return;
                };
                let Ok(sink) = Sink::try_new(&handle) else {
                    log::warn!("alarm: failed to open output sink, skipping playback");
                    return;
                };

                sink.append(tone);
                sink.sleep_until_end();
            });

        if let Err(e) = spawned {
            log::warn!("alarm: failed to spawn playback thread: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// AlarmSchedule
// ---------------------------------------------------------------------------

/// Guard for a delayed alarm.  Dropping it before the delay elapses cancels
/// the playback.
pub struct AlarmSchedule {
    handle: tokio::task::JoinHandle<()>,
}

impl AlarmSchedule {
    /// Cancel the pending alarm.  A no-op when it has already fired.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for AlarmSchedule {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Arrange for `sink.play()` to run after `delay`.
///
/// Must be called from within a tokio runtime.  A zero delay plays on the
/// next scheduler turn.
pub fn schedule(sink: Arc<dyn AlarmSink>, delay: Duration) -> AlarmSchedule {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        sink.play();
    });
    AlarmSchedule { handle }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tone() -> SirenTone {
        SirenTone::new(&AlarmConfig::default())
    }

    // ---- Frequency envelope ------------------------------------------------

    #[test]
    fn frequency_starts_at_base() {
        assert!((tone().frequency_at(0.0) - 440.0).abs() < 1e-3);
    }

    #[test]
    fn frequency_peaks_at_midpoint() {
        assert!((tone().frequency_at(1.0) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn frequency_returns_to_base_at_end() {
        assert!((tone().frequency_at(2.0) - 440.0).abs() < 1e-2);
    }

    #[test]
    fn frequency_ramp_is_exponential() {
        // A quarter of the way up, an exponential ramp sits at the geometric
        // midpoint of 440 and 880: 440 · √2 ≈ 622.25 Hz.
        let expected = 440.0_f32 * 2.0_f32.sqrt();
        assert!((tone().frequency_at(0.5) - expected).abs() < 0.1);
    }

    // ---- Gain envelope -----------------------------------------------------

    #[test]
    fn gain_starts_at_volume() {
        assert!((tone().gain_at(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gain_decays_to_near_silence() {
        assert!((tone().gain_at(2.0) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn gain_decay_is_exponential() {
        // Halfway through, the gain sits at the geometric midpoint of 0.5
        // and 0.01: √(0.5 · 0.01) ≈ 0.0707.
        let expected = (0.5_f32 * 0.01).sqrt();
        assert!((tone().gain_at(1.0) - expected).abs() < 1e-4);
    }

    #[test]
    fn zero_volume_is_silent() {
        let cfg = AlarmConfig {
            volume: 0.0,
            ..AlarmConfig::default()
        };
        let t = SirenTone::new(&cfg);
        assert_eq!(t.gain_at(1.0), 0.0);
    }

    // ---- Source shape ------------------------------------------------------

    #[test]
    fn tone_length_matches_duration() {
        assert_eq!(tone().count(), (2.0 * TONE_SAMPLE_RATE as f32) as usize);
    }

    #[test]
    fn samples_stay_within_gain_envelope() {
        let mut t = tone();
        let mut pos = 0usize;
        let probe = t.clone();
        while let Some(s) = t.next() {
            let at = pos as f32 / TONE_SAMPLE_RATE as f32;
            assert!(
                s.abs() <= probe.gain_at(at) + 1e-6,
                "sample {pos} exceeds envelope: {s}"
            );
            pos += 1;
        }
    }

    #[test]
    fn source_metadata() {
        let t = tone();
        assert_eq!(t.channels(), 1);
        assert_eq!(t.sample_rate(), TONE_SAMPLE_RATE);
        assert_eq!(t.total_duration(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn zero_duration_produces_no_samples() {
        let cfg = AlarmConfig {
            duration_secs: 0.0,
            ..AlarmConfig::default()
        };
        assert_eq!(SirenTone::new(&cfg).count(), 0);
    }

    // ---- Scheduling --------------------------------------------------------

    /// Counts calls to `play` instead of touching a real output device.
    struct CountingSink(AtomicUsize);

    impl AlarmSink for CountingSink {
        fn play(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn scheduled_alarm_fires_after_delay() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let _guard = schedule(sink.clone(), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_alarm_never_fires() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let guard = schedule(sink.clone(), Duration::from_millis(50));
        guard.cancel();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropping_the_guard_cancels() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        drop(schedule(sink.clone(), Duration::from_millis(50)));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }
}
