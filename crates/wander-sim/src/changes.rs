//! Per-avatar change logs: sparse sequences of `(vtime, value)` transitions.
//!
//! A [`ChangeLog`] is filled once while the scene CSV is read and then only
//! consumed: [`ChangeLog::advance`] locks the log, bumps the log's virtual
//! clock by one vtime, and adopts the head entry's value if its vtime has
//! arrived. Appending obeys two laws:
//!
//! - **first-writer-wins**: a second append at the same vtime with a
//!   *different* value is silently dropped (at most one effective change per
//!   vtime);
//! - **coalescing**: a value equal to the last appended one produces no
//!   entry, so stored entries always alternate values.
//!
//! Together they give the invariant that stored entries have strictly
//! increasing vtimes and strictly different consecutive values.

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// ChangeLog
// ---------------------------------------------------------------------------

/// An ordered queue of `(vtime, value)` transitions with a virtual clock.
///
/// `None` values are meaningful: a `None` place means the avatar is offline
/// for that vtime, a `None` guild means guildless.
#[derive(Debug, Clone)]
pub struct ChangeLog<T> {
    /// Owning avatar's id, for invariant messages.
    owner: String,
    current: Option<T>,
    vclock: i64,
    last_vtime: i64,
    last_value: Option<T>,
    entries: VecDeque<(i64, Option<T>)>,
    locked: bool,
}

impl<T: Copy + PartialEq> ChangeLog<T> {
    /// An empty log with a `None` initial value and `vclock = -1`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            current: None,
            vclock: -1,
            last_vtime: -1,
            last_value: None,
            entries: VecDeque::new(),
            locked: false,
        }
    }

    /// Append a transition at `vtime`.
    ///
    /// A repeat append at the last vtime with a different value is dropped
    /// (first-writer-wins); a value equal to the last one is coalesced away.
    ///
    /// # Panics
    ///
    /// Panics if the log is locked (advanced at least once) or `vtime` is
    /// below the last appended vtime.
    pub fn append(&mut self, vtime: i64, value: Option<T>) {
        assert!(
            !self.locked,
            "{}: cannot append after the log has been advanced",
            self.owner
        );
        assert!(
            vtime >= self.last_vtime,
            "{}: append at vtime {vtime} before last vtime {}",
            self.owner,
            self.last_vtime
        );
        if vtime == self.last_vtime && self.last_value != value {
            // at most one effective change per vtime, first writer wins
            return;
        }
        self.last_vtime = vtime;
        if value != self.last_value {
            self.entries.push_back((vtime, value));
            self.last_value = value;
        }
    }

    /// Advance the virtual clock by one vtime and return the now-current
    /// value. Locks the log against further appends.
    pub fn advance(&mut self) -> Option<T> {
        self.locked = true;
        self.vclock += 1;
        if let Some(&(vtime, value)) = self.entries.front() {
            if vtime == self.vclock {
                self.entries.pop_front();
                self.current = value;
            }
        }
        self.current
    }

    /// The log's virtual clock (`-1` before the first advance).
    #[inline]
    pub fn vclock(&self) -> i64 {
        self.vclock
    }

    /// Number of pending transitions.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn entries(&self) -> impl Iterator<Item = (i64, Option<T>)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. Initial state ----------------------------------------------------

    #[test]
    fn starts_at_minus_one_with_no_value() {
        let mut log: ChangeLog<u32> = ChangeLog::new("AO_0");
        assert_eq!(log.vclock(), -1);
        assert_eq!(log.advance(), None);
        assert_eq!(log.vclock(), 0);
    }

    // -- 2. Transitions pop exactly at their vtime ---------------------------

    #[test]
    fn transition_adopted_at_its_vtime() {
        let mut log = ChangeLog::new("AO_0");
        log.append(0, Some(7));
        log.append(2, Some(9));
        assert_eq!(log.advance(), Some(7)); // vclock 0
        assert_eq!(log.advance(), Some(7)); // vclock 1: entry (2, 9) waits
        assert_eq!(log.advance(), Some(9)); // vclock 2
        assert_eq!(log.advance(), Some(9)); // no further entries
    }

    #[test]
    fn none_value_is_a_real_transition() {
        let mut log = ChangeLog::new("AO_0");
        log.append(0, Some(7));
        log.append(1, None);
        assert_eq!(log.advance(), Some(7));
        assert_eq!(log.advance(), None);
    }

    // -- 3. Coalescing -------------------------------------------------------

    #[test]
    fn equal_consecutive_values_coalesce() {
        let mut log = ChangeLog::new("AO_0");
        log.append(0, Some(7));
        log.append(1, Some(7));
        log.append(2, Some(7));
        assert_eq!(log.pending(), 1);
        log.append(3, Some(8));
        assert_eq!(log.pending(), 2);
    }

    #[test]
    fn initial_none_appends_are_noops() {
        let mut log: ChangeLog<u32> = ChangeLog::new("AO_0");
        log.append(-1, None);
        log.append(0, None);
        assert_eq!(log.pending(), 0);
    }

    // -- 4. First-writer-wins ------------------------------------------------

    #[test]
    fn second_value_at_the_same_vtime_is_dropped() {
        let mut log = ChangeLog::new("AO_0");
        log.append(3, Some(7));
        log.append(3, Some(8)); // silently dropped
        assert_eq!(log.pending(), 1);
        for _ in 0..4 {
            log.advance();
        }
        assert_eq!(log.advance(), Some(7));
    }

    #[test]
    fn repeat_of_the_same_value_at_the_same_vtime_is_fine() {
        let mut log = ChangeLog::new("AO_0");
        log.append(3, Some(7));
        log.append(3, Some(7));
        assert_eq!(log.pending(), 1);
    }

    // -- 5. Ordering and locking ---------------------------------------------

    #[test]
    #[should_panic(expected = "before last vtime")]
    fn appending_backwards_panics() {
        let mut log = ChangeLog::new("AO_0");
        log.append(5, Some(1));
        log.append(4, Some(2));
    }

    #[test]
    #[should_panic(expected = "after the log has been advanced")]
    fn appending_after_advance_panics() {
        let mut log = ChangeLog::new("AO_0");
        log.append(0, Some(1));
        log.advance();
        log.append(1, Some(2));
    }

    // -- 6. Stored-entry laws ------------------------------------------------

    #[test]
    fn stored_entries_strictly_increase_and_alternate() {
        let mut log = ChangeLog::new("AO_0");
        for (vtime, value) in [
            (0, Some(1)),
            (0, Some(2)), // dropped, first writer wins
            (1, Some(1)), // coalesced with (0, 1)
            (2, Some(3)),
            (2, Some(3)),
            (5, None),
            (6, None), // coalesced
            (7, Some(3)),
        ] {
            log.append(vtime, value);
        }
        let stored: Vec<_> = log.entries().collect();
        assert_eq!(stored, [(0, Some(1)), (2, Some(3)), (5, None), (7, Some(3))]);
        for pair in stored.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert_ne!(pair[0].1, pair[1].1);
        }
    }
}
