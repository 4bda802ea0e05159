//! Access recording with round-based counter resets.

use std::time::{Duration, Instant};

use crate::clock::distance;
use crate::state::KeySnapshot;

/// Outcome of recording an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// The access was counted in the running round.
    SameRound,
    /// The previous round had expired; counters were reset first.
    NewRound,
}

/// Counts one access against `snapshot`.
///
/// When more than `round_interval` separates `now` from the start of the
/// current round, the counters restart from zero and a new round begins at
/// `now`. A snapshot created at `now` is still inside its first round, so
/// the first access never reports [`Access::NewRound`].
pub(crate) fn record_access(
    snapshot: &mut KeySnapshot,
    now: Instant,
    round_interval: Duration,
) -> Access {
    let mut access = Access::SameRound;

    if distance(now, snapshot.round_last) > round_interval {
        snapshot.err_count = 0;
        snapshot.total_count = 0;
        snapshot.round_last = now;
        access = Access::NewRound;
    }

    snapshot.total_count += 1;
    snapshot.access_last = now;

    access
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    const ROUND: Duration = Duration::from_secs(15);

    #[test]
    fn first_access_stays_in_first_round() {
        let clock = ManualClock::new();
        let mut snapshot = KeySnapshot::new(clock.now());

        assert_eq!(record_access(&mut snapshot, clock.now(), ROUND), Access::SameRound);
        assert_eq!(snapshot.total_count, 1);
    }

    #[test]
    fn counts_accumulate_within_round() {
        let clock = ManualClock::new();
        let mut snapshot = KeySnapshot::new(clock.now());
        snapshot.err_count = 2;
        snapshot.total_count = 2;

        clock.advance(ROUND);
        let access = record_access(&mut snapshot, clock.now(), ROUND);

        assert_eq!(access, Access::SameRound);
        assert_eq!(snapshot.total_count, 3);
        assert_eq!(snapshot.err_count, 2);
        assert_eq!(snapshot.access_last, clock.now());
    }

    #[test]
    fn expired_round_resets_counters() {
        let clock = ManualClock::new();
        let mut snapshot = KeySnapshot::new(clock.now());
        snapshot.err_count = 4;
        snapshot.total_count = 9;

        clock.advance(ROUND + Duration::from_millis(1));
        let access = record_access(&mut snapshot, clock.now(), ROUND);

        assert_eq!(access, Access::NewRound);
        assert_eq!(snapshot.err_count, 0);
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.round_last, clock.now());
    }

    #[test]
    fn reset_keeps_paused_flag() {
        let clock = ManualClock::new();
        let mut snapshot = KeySnapshot::new(clock.now());
        snapshot.is_paused = true;

        clock.advance(ROUND * 2);
        record_access(&mut snapshot, clock.now(), ROUND);

        assert!(snapshot.is_paused);
    }
}
