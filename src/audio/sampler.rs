//! Microphone sampling via `cpal`.
//!
//! [`MicSampler`] exposes the pull-based [`SignalSource`] contract: `open()`
//! acquires the default input device, `sample()` returns the newest analysis
//! frame without blocking, `close()` releases the device.  Open and close are
//! both idempotent.
//!
//! cpal streams are not `Send`, so the device and stream live on a dedicated
//! `audio-input` OS thread for the whole process lifetime.  [`MicSampler`]
//! talks to it over a request channel and shares a [`FrameRing`] that the
//! cpal callback fills with downmixed mono samples.  Dropping the sampler
//! drops the request sender, which ends the thread and releases the device.

use std::sync::{mpsc, Arc, Mutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::oneshot;

use super::frame::{downmix_to_mono, AudioFrame, FrameRing};

// ---------------------------------------------------------------------------
// SamplerError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring or running the audio input.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio input thread is no longer running")]
    WorkerGone,
}

// ---------------------------------------------------------------------------
// SignalSource
// ---------------------------------------------------------------------------

/// Pull-based microphone abstraction consumed by the core runner.
///
/// The real implementation is [`MicSampler`]; tests substitute a scripted
/// source that replays canned frames.
#[async_trait]
pub trait SignalSource: Send {
    /// Acquire the input device.  Idempotent — opening an already-open
    /// source succeeds without side effects.
    async fn open(&mut self) -> Result<(), SamplerError>;

    /// Return the newest analysis frame without blocking.  When no new audio
    /// has arrived since the last call, the previous frame's data is returned
    /// again; before the first open it reads as silence.
    fn sample(&mut self) -> AudioFrame;

    /// Release the input device.  Idempotent — closing a closed source is a
    /// no-op.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Input worker thread
// ---------------------------------------------------------------------------

enum InputRequest {
    /// Acquire the device and start streaming; reply with the outcome.
    Open(oneshot::Sender<Result<(), SamplerError>>),
    /// Stop streaming and release the device.
    Close,
}

fn run_input_thread(requests: mpsc::Receiver<InputRequest>, ring: Arc<Mutex<FrameRing>>) {
    // The stream handle must stay on this thread from creation to drop.
    let mut stream: Option<cpal::Stream> = None;

    while let Ok(request) = requests.recv() {
        match request {
            InputRequest::Open(reply) => {
                if stream.is_some() {
                    let _ = reply.send(Ok(()));
                    continue;
                }
                match build_input_stream(Arc::clone(&ring)) {
                    Ok(s) => {
                        stream = Some(s);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            InputRequest::Close => {
                stream = None;
            }
        }
    }
}

fn build_input_stream(ring: Arc<Mutex<FrameRing>>) -> Result<cpal::Stream, SamplerError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(SamplerError::NoDevice)?;

    let supported = device.default_input_config()?;
    let channels = supported.channels();
    let config: cpal::StreamConfig = supported.into();

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono = downmix_to_mono(data, channels);
            if let Ok(mut ring) = ring.lock() {
                ring.push_slice(&mono);
            }
        },
        |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
        },
        None, // no timeout
    )?;

    stream.play()?;
    Ok(stream)
}

// ---------------------------------------------------------------------------
// MicSampler
// ---------------------------------------------------------------------------

/// [`SignalSource`] backed by the system default microphone.
///
/// # Example
///
/// ```rust,no_run
/// use voice_stopwatch::audio::{MicSampler, SignalSource};
///
/// # async fn example() {
/// let mut sampler = MicSampler::new(4096);
/// sampler.open().await.unwrap();
/// let frame = sampler.sample();
/// assert_eq!(frame.len(), 4096);
/// sampler.close();
/// # }
/// ```
pub struct MicSampler {
    ring: Arc<Mutex<FrameRing>>,
    requests: mpsc::Sender<InputRequest>,
    is_open: bool,
}

impl MicSampler {
    /// Create a sampler producing frames of `frame_size` mono samples and
    /// spawn its `audio-input` worker thread.
    ///
    /// The device itself is not touched until [`open`](SignalSource::open).
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the worker thread (extremely
    /// unlikely), or if `frame_size == 0`.
    pub fn new(frame_size: usize) -> Self {
        let ring = Arc::new(Mutex::new(FrameRing::new(frame_size)));
        let (requests, request_rx) = mpsc::channel();

        let ring_clone = Arc::clone(&ring);
        std::thread::Builder::new()
            .name("audio-input".into())
            .spawn(move || run_input_thread(request_rx, ring_clone))
            .expect("failed to spawn audio-input thread");

        Self {
            ring,
            requests,
            is_open: false,
        }
    }

    /// Returns `true` while the device is held open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

#[async_trait]
impl SignalSource for MicSampler {
    async fn open(&mut self) -> Result<(), SamplerError> {
        if self.is_open {
            return Ok(());
        }

        // Stale audio from a previous session must not fire the trigger on
        // the first poll.
        self.ring.lock().unwrap().reset();

        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(InputRequest::Open(reply_tx))
            .map_err(|_| SamplerError::WorkerGone)?;
        reply_rx.await.map_err(|_| SamplerError::WorkerGone)??;

        self.is_open = true;
        Ok(())
    }

    fn sample(&mut self) -> AudioFrame {
        self.ring.lock().unwrap().latest()
    }

    fn close(&mut self) {
        if !self.is_open {
            return;
        }
        // A send failure means the worker is already gone and the device is
        // released with it.
        let _ = self.requests.send(InputRequest::Close);
        self.is_open = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// The runner moves the sampler into a tokio task.
    #[test]
    fn mic_sampler_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MicSampler>();
    }

    /// Before any device is opened, frames read as silence at the configured
    /// size.  No audio hardware is touched.
    #[test]
    fn sample_before_open_is_silent() {
        let mut sampler = MicSampler::new(512);
        let frame = sampler.sample();
        assert_eq!(frame.len(), 512);
        assert!(frame.samples.iter().all(|&s| s == 0.0));
    }

    /// Close without a prior open must be a no-op, repeatedly.
    #[test]
    fn close_is_idempotent() {
        let mut sampler = MicSampler::new(512);
        sampler.close();
        sampler.close();
        assert!(!sampler.is_open());
    }

    #[test]
    fn error_messages_are_user_readable() {
        assert_eq!(
            SamplerError::NoDevice.to_string(),
            "no input device found on the default audio host"
        );
        assert_eq!(
            SamplerError::WorkerGone.to_string(),
            "audio input thread is no longer running"
        );
    }
}
