//! Session history — the in-memory ledger of completed timings.

pub mod ledger;

pub use ledger::{HistoryEntry, HistoryLedger};
