//! Voice Stopwatch — a sound-triggered interval timer.
//!
//! Press Start, make a sound (a clap, a word), and the stopwatch begins.
//! Completed sessions land in an in-memory history with an optional
//! annotation, and a synthesized swept-tone alarm marks the end of each
//! session.
//!
//! # Subsystems
//!
//! * [`audio`]   — microphone sampling (cpal), trigger detection, alarm
//!   synthesis (rodio).
//! * [`timer`]   — the session state machine and the core runner that drives
//!   it from the frame poll and the one-second tick.
//! * [`history`] — the in-memory ledger of completed sessions.
//! * [`config`]  — TOML settings with platform paths.
//! * [`app`]     — the egui presentation shell.

pub mod app;
pub mod audio;
pub mod config;
pub mod history;
pub mod timer;
