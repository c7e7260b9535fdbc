//! Counters for observing how a virtual TV is driven.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared, lock-free operation counters.
#[derive(Debug, Default)]
pub struct Activity {
    connects: AtomicUsize,
    operations: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Activity {
    /// Handshakes attempted.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Device operations attempted, handshakes excluded.
    #[must_use]
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Highest number of operations ever running at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn enter(&self) -> InFlight<'_> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }
}

/// Marks one running operation until dropped.
pub(crate) struct InFlight<'a>(&'a Activity);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_track_peak_concurrency() {
        let activity = Activity::default();
        let first = activity.enter();
        let second = activity.enter();
        drop(first);
        drop(second);
        let _third = activity.enter();

        assert_eq!(activity.operations(), 3);
        assert_eq!(activity.max_in_flight(), 2);
    }
}
