//! Key to snapshot storage.

use ahash::AHashMap;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::clock::distance;
use crate::state::{KeySnapshot, KeyStatus};

/// All snapshots of one breaker.
///
/// Not synchronized on its own: the breaker wraps it in a single
/// reader-writer lock.
#[derive(Debug, Default)]
pub(crate) struct KeySnapshotStore {
    snapshots: AHashMap<String, KeySnapshot>,
}

impl KeySnapshotStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&KeySnapshot> {
        self.snapshots.get(key)
    }

    /// Looks up a snapshot without creating one.
    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut KeySnapshot> {
        self.snapshots.get_mut(key)
    }

    /// Looks up a snapshot, creating a fresh one whose round starts at `now`.
    pub(crate) fn get_or_create(&mut self, key: &str, now: Instant) -> &mut KeySnapshot {
        self.snapshots
            .entry(key.to_owned())
            .or_insert_with(|| KeySnapshot::new(now))
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.snapshots.remove(key).is_some()
    }

    /// Drops closed snapshots not accessed for longer than `max_idle`.
    /// Returns how many were removed.
    pub(crate) fn evict_idle(&mut self, now: Instant, max_idle: Duration) -> usize {
        let before = self.snapshots.len();
        self.snapshots.retain(|_, snapshot| {
            snapshot.is_paused || distance(now, snapshot.access_last) <= max_idle
        });
        before - self.snapshots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub(crate) fn report(&self) -> BTreeMap<String, KeyStatus> {
        self.snapshots
            .iter()
            .map(|(key, snapshot)| (key.clone(), snapshot.status()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn creates_once() {
        let clock = ManualClock::new();
        let mut store = KeySnapshotStore::new();

        store.get_or_create("/a", clock.now()).total_count = 3;
        clock.advance(Duration::from_secs(1));
        let again = store.get_or_create("/a", clock.now());

        assert_eq!(again.total_count, 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn evict_idle_keeps_open_keys() {
        let clock = ManualClock::new();
        let mut store = KeySnapshotStore::new();
        store.get_or_create("/idle", clock.now());
        store.get_or_create("/open", clock.now()).is_paused = true;
        clock.advance(Duration::from_secs(10));
        store.get_or_create("/fresh", clock.now());

        let removed = store.evict_idle(clock.now(), Duration::from_secs(5));

        assert_eq!(removed, 1);
        assert!(store.get("/idle").is_none());
        assert!(store.get("/open").is_some());
        assert!(store.get("/fresh").is_some());
    }

    #[test]
    fn report_is_a_copy() {
        let clock = ManualClock::new();
        let mut store = KeySnapshotStore::new();
        store.get_or_create("/a", clock.now()).err_count = 1;

        let report = store.report();
        store.get_or_create("/a", clock.now()).err_count = 7;

        assert_eq!(report["/a"].err_count, 1);
    }
}
