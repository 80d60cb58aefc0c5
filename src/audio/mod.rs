//! Audio subsystem — microphone sampling, trigger detection, alarm synthesis.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → downmix_to_mono → FrameRing
//!           → MicSampler::sample → TriggerDetector::evaluate
//!
//! session completion → SirenTone → rodio output (alarm-playback thread)
//! ```
//!
//! The sampler is only consulted while the timer is listening; the trigger
//! decision itself is a single stateless evaluation per poll (see
//! [`trigger`]).

pub mod alarm;
pub mod frame;
pub mod sampler;
pub mod trigger;

pub use alarm::{schedule, AlarmSchedule, AlarmSink, RodioAlarm, SirenTone};
pub use frame::{downmix_to_mono, AudioFrame, FrameRing};
pub use sampler::{MicSampler, SamplerError, SignalSource};
pub use trigger::{Detection, TriggerDetector};
