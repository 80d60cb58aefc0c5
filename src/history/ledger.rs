//! Append-only in-memory log of completed timing sessions.
//!
//! Entries live for the process lifetime only.  Insertion order is
//! preserved internally; [`HistoryLedger::entries`] applies the configured
//! [`HistoryOrder`] when producing the display sequence.

use chrono::{DateTime, Local};

use crate::config::HistoryOrder;

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One completed timing session.
///
/// Immutable once appended; the only further operation is deletion by id.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Unique, monotonically increasing identifier.  `0` on a freshly built
    /// entry means "assign one on append".
    pub id: u64,
    /// Session duration formatted as `MM:SS`.
    pub duration: String,
    /// User annotation, possibly empty.
    pub comment: String,
    /// Wall-clock completion time.
    pub completed_at: DateTime<Local>,
}

impl HistoryEntry {
    /// Build an entry with an unassigned id.
    pub fn new(duration: String, comment: String, completed_at: DateTime<Local>) -> Self {
        Self {
            id: 0,
            duration,
            comment,
            completed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryLedger
// ---------------------------------------------------------------------------

/// Ordered log of [`HistoryEntry`] values with O(1) append and
/// delete-by-id.
///
/// # Example
///
/// ```rust
/// use chrono::Local;
/// use voice_stopwatch::config::HistoryOrder;
/// use voice_stopwatch::history::{HistoryEntry, HistoryLedger};
///
/// let mut ledger = HistoryLedger::new(HistoryOrder::NewestFirst);
/// let id = ledger.append(HistoryEntry::new("00:10".into(), "warmup".into(), Local::now()));
///
/// assert_eq!(ledger.len(), 1);
/// ledger.delete(id);
/// assert!(ledger.is_empty());
/// ```
pub struct HistoryLedger {
    /// Entries in insertion order.
    entries: Vec<HistoryEntry>,
    order: HistoryOrder,
    /// Highest id handed out so far.
    last_id: u64,
}

impl HistoryLedger {
    /// Create an empty ledger with the given display order.
    ///
    /// The order is fixed for the ledger's lifetime.
    pub fn new(order: HistoryOrder) -> Self {
        Self {
            entries: Vec::new(),
            order,
            last_id: 0,
        }
    }

    /// Append `entry`, assigning a unique id when the caller left it at `0`.
    ///
    /// Assigned ids are derived from the completion timestamp (milliseconds
    /// since the epoch) and bumped past the previous id when two sessions
    /// complete within the same millisecond, so ids stay strictly
    /// monotonic.  Returns the entry's id.
    pub fn append(&mut self, mut entry: HistoryEntry) -> u64 {
        if entry.id == 0 {
            let stamp = entry.completed_at.timestamp_millis().max(0) as u64;
            entry.id = stamp.max(self.last_id + 1);
        }
        self.last_id = self.last_id.max(entry.id);

        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Remove the entry with `id` if present.  A no-op on an unknown id;
    /// surviving entries keep their relative order.
    pub fn delete(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
    }

    /// The entries in display order, per the configured [`HistoryOrder`].
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match self.order {
            HistoryOrder::Chronological => self.entries.clone(),
            HistoryOrder::NewestFirst => self.entries.iter().rev().cloned().collect(),
        }
    }

    /// Number of entries in the ledger.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(duration: &str, comment: &str) -> HistoryEntry {
        HistoryEntry::new(duration.into(), comment.into(), Local::now())
    }

    // ---- Id assignment -----------------------------------------------------

    #[test]
    fn append_assigns_nonzero_id() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        let id = ledger.append(entry("00:10", ""));
        assert!(id > 0);
        assert_eq!(ledger.entries()[0].id, id);
    }

    #[test]
    fn ids_are_strictly_monotonic_within_one_millisecond() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        let now = Local::now();

        let a = ledger.append(HistoryEntry::new("00:01".into(), String::new(), now));
        let b = ledger.append(HistoryEntry::new("00:02".into(), String::new(), now));
        let c = ledger.append(HistoryEntry::new("00:03".into(), String::new(), now));

        assert!(a < b && b < c);
    }

    #[test]
    fn caller_provided_id_is_kept() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        let mut e = entry("00:05", "");
        e.id = 42;
        assert_eq!(ledger.append(e), 42);

        // The next assigned id must not collide with it.
        let next = ledger.append(entry("00:06", ""));
        assert!(next > 42);
    }

    // ---- Delete ------------------------------------------------------------

    #[test]
    fn append_then_delete_restores_previous_content() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        ledger.append(entry("00:10", "keep me"));
        let before = ledger.entries();

        let id = ledger.append(entry("00:20", "transient"));
        ledger.delete(id);

        assert_eq!(ledger.entries(), before);
    }

    #[test]
    fn delete_unknown_id_is_a_noop() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        ledger.append(entry("00:01", ""));
        ledger.append(entry("00:02", ""));
        ledger.append(entry("00:03", ""));

        let before = ledger.entries();
        ledger.delete(999_999_999_999);

        assert_eq!(ledger.entries(), before);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn delete_middle_entry_preserves_order_of_survivors() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        let a = ledger.append(entry("00:01", "a"));
        let b = ledger.append(entry("00:02", "b"));
        let c = ledger.append(entry("00:03", "c"));

        ledger.delete(b);

        let ids: Vec<u64> = ledger.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        let id = ledger.append(entry("00:10", ""));
        ledger.delete(id);
        ledger.delete(id);
        assert!(ledger.is_empty());
    }

    // ---- Ordering ----------------------------------------------------------

    #[test]
    fn newest_first_lists_latest_append_first() {
        let mut ledger = HistoryLedger::new(HistoryOrder::NewestFirst);
        ledger.append(entry("00:01", "first"));
        ledger.append(entry("00:02", "second"));

        let listed = ledger.entries();
        assert_eq!(listed[0].comment, "second");
        assert_eq!(listed[1].comment, "first");
    }

    #[test]
    fn chronological_lists_in_insertion_order() {
        let mut ledger = HistoryLedger::new(HistoryOrder::Chronological);
        ledger.append(entry("00:01", "first"));
        ledger.append(entry("00:02", "second"));

        let listed = ledger.entries();
        assert_eq!(listed[0].comment, "first");
        assert_eq!(listed[1].comment, "second");
    }

    #[test]
    fn empty_ledger_lists_nothing() {
        let ledger = HistoryLedger::new(HistoryOrder::NewestFirst);
        assert!(ledger.entries().is_empty());
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }
}
