#![forbid(unsafe_code)]

//! Grace-period tracking for soft deletes.
//!
//! The capture list removes an item from view immediately but only makes
//! the removal permanent once a grace period has passed without an undo.
//! [`DeferredCommits`] tracks those pending items. It owns no timer: the
//! host calls [`poll`](DeferredCommits::poll) from its own tick and commits
//! whatever comes back. A delete command's restore callback calls
//! [`cancel`](DeferredCommits::cancel) so the item is never committed.
//!
//! It is independent of [`CommandStack`](crate::CommandStack) eviction; an
//! item can still be pending after its command has left the history.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, trace};
use web_time::Instant;

/// Default grace period before a soft delete becomes permanent.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Queue of keys waiting for their grace period to run out.
#[derive(Debug, Clone)]
pub struct DeferredCommits<K> {
    grace: Duration,
    /// Pending keys with their deadline, in schedule order. `None` means the
    /// deadline is past what `Instant` can represent, so the key is never due.
    pending: VecDeque<(K, Option<Instant>)>,
}

impl<K: PartialEq> Default for DeferredCommits<K> {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE)
    }
}

impl<K: PartialEq> DeferredCommits<K> {
    /// Create an empty queue with the given grace period.
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            pending: VecDeque::new(),
        }
    }

    /// Grace period applied to newly scheduled keys.
    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Start the grace period for `key` at `now`.
    ///
    /// Scheduling a key that is already pending restarts its grace period.
    /// A grace period too long to add to `now` (e.g. `Duration::MAX`) never
    /// elapses; such keys only leave through `cancel` or `flush`.
    pub fn schedule(&mut self, key: K, now: Instant) {
        let restarted = self.remove(&key);
        self.pending.push_back((key, now.checked_add(self.grace)));
        debug!(
            target: "evcap.deferred",
            pending = self.pending.len(),
            restarted,
            "commit scheduled"
        );
    }

    /// Withdraw a pending key. Returns `false` if it was not pending
    /// (already committed or never scheduled).
    pub fn cancel(&mut self, key: &K) -> bool {
        let cancelled = self.remove(key);
        trace!(target: "evcap.deferred", cancelled, "commit cancel requested");
        cancelled
    }

    /// Check whether `key` is waiting for its grace period.
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.iter().any(|(k, _)| k == key)
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// in schedule order. Each key is returned at most once.
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        let mut keep = VecDeque::with_capacity(self.pending.len());
        for (key, deadline) in self.pending.drain(..) {
            if deadline.is_some_and(|d| d <= now) {
                due.push(key);
            } else {
                keep.push_back((key, deadline));
            }
        }
        self.pending = keep;
        if !due.is_empty() {
            debug!(
                target: "evcap.deferred",
                committed = due.len(),
                pending = self.pending.len(),
                "grace period elapsed"
            );
        }
        due
    }

    /// Remove and return every pending key regardless of deadline, e.g. on
    /// shutdown.
    pub fn flush(&mut self) -> Vec<K> {
        self.pending.drain(..).map(|(key, _)| key).collect()
    }

    /// Earliest pending deadline, for hosts that want to sleep until then.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().filter_map(|(_, deadline)| *deadline).min()
    }

    /// Number of pending keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn remove(&mut self, key: &K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| k != key);
        self.pending.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(5);

    #[test]
    fn nothing_due_before_grace() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(GRACE);
        commits.schedule("capture-1", t0);

        assert!(commits.poll(t0 + Duration::from_secs(4)).is_empty());
        assert!(commits.is_pending(&"capture-1"));
        assert_eq!(commits.len(), 1);
    }

    #[test]
    fn due_at_deadline_in_schedule_order() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(GRACE);
        commits.schedule(1, t0);
        commits.schedule(2, t0 + Duration::from_secs(1));
        commits.schedule(3, t0 + Duration::from_secs(10));

        assert_eq!(commits.poll(t0 + Duration::from_secs(6)), vec![1, 2]);
        assert_eq!(commits.len(), 1);
        // Already returned keys are not returned again.
        assert!(commits.poll(t0 + Duration::from_secs(6)).is_empty());
        assert_eq!(commits.poll(t0 + Duration::from_secs(15)), vec![3]);
        assert!(commits.is_empty());
    }

    #[test]
    fn cancel_prevents_commit() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(GRACE);
        commits.schedule(7, t0);

        assert!(commits.cancel(&7));
        assert!(!commits.cancel(&7));
        assert!(commits.poll(t0 + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn reschedule_restarts_grace() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(GRACE);
        commits.schedule(1, t0);
        commits.schedule(1, t0 + Duration::from_secs(3));

        assert_eq!(commits.len(), 1);
        assert!(commits.poll(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(commits.poll(t0 + Duration::from_secs(8)), vec![1]);
    }

    #[test]
    fn unbounded_grace_is_never_due() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(Duration::MAX);
        commits.schedule(1u32, t0);
        commits.schedule(1u32, t0 + Duration::from_secs(1));

        assert_eq!(commits.len(), 1);
        assert!(commits.poll(t0 + Duration::from_secs(86_400 * 365)).is_empty());
        assert!(commits.is_pending(&1));
        assert_eq!(commits.next_deadline(), None);
        assert_eq!(commits.flush(), vec![1]);
    }

    #[test]
    fn next_deadline_skips_unbounded_entries() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(Duration::MAX);
        commits.schedule('x', t0);
        commits.grace = GRACE;
        commits.schedule('y', t0);

        assert_eq!(commits.next_deadline(), Some(t0 + GRACE));
        assert_eq!(commits.poll(t0 + GRACE), vec!['y']);
        assert_eq!(commits.flush(), vec!['x']);
    }

    #[test]
    fn flush_returns_everything() {
        let t0 = Instant::now();
        let mut commits = DeferredCommits::new(GRACE);
        commits.schedule('a', t0);
        commits.schedule('b', t0);

        assert_eq!(commits.next_deadline(), Some(t0 + GRACE));
        assert_eq!(commits.flush(), vec!['a', 'b']);
        assert!(commits.is_empty());
        assert_eq!(commits.next_deadline(), None);
    }

    #[test]
    fn default_grace() {
        let commits: DeferredCommits<u32> = DeferredCommits::default();
        assert_eq!(commits.grace(), DEFAULT_GRACE);
    }
}
