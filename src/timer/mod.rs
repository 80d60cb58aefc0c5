//! Timer core — state machine, one-second cadence, and the runner that ties
//! sampling, detection, history and the alarm together.

pub mod machine;
pub mod runner;
pub mod session;

pub use machine::{CompletedSession, StopOutcome, TickOutcome, TimerMachine};
pub use runner::{new_shared_snapshot, CoreCommand, CoreRunner, CoreSnapshot, SharedSnapshot};
pub use session::{format_seconds, TimerState};
