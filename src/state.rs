//! Per-key breaker state.

use std::fmt::{self, Display, Formatter};
use std::time::Instant;

/// Represents the possible states of a key's breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Calls are allowed. Also the state of keys never reported.
    Closed,

    /// The failure threshold was crossed. Calls are rejected until the
    /// cooldown elapses, then let through as probes until a success closes
    /// the breaker.
    Open,
}

impl State {
    /// Lowercase label, as used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable counters and timestamps tracked for one key.
///
/// Only the breaker mutates snapshots, always under its write lock.
/// Policies get read access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySnapshot {
    pub(crate) is_paused: bool,
    pub(crate) err_count: u64,
    pub(crate) total_count: u64,
    pub(crate) access_last: Instant,
    pub(crate) round_last: Instant,
}

impl KeySnapshot {
    /// A closed snapshot whose first round starts at `now`.
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            is_paused: false,
            err_count: 0,
            total_count: 0,
            access_last: now,
            round_last: now,
        }
    }

    /// Whether the breaker for this key is open.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Failures reported in the current round.
    pub fn err_count(&self) -> u64 {
        self.err_count
    }

    /// Accesses (failures and successes) reported in the current round.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Last time the key was reported.
    pub fn access_last(&self) -> Instant {
        self.access_last
    }

    /// Start of the current counting round.
    pub fn round_last(&self) -> Instant {
        self.round_last
    }

    /// Failure ratio of the current round, `0.0` when nothing was counted.
    pub fn error_rate(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        self.err_count as f64 / self.total_count as f64
    }

    /// The key's breaker state.
    pub fn state(&self) -> State {
        if self.is_paused {
            State::Open
        } else {
            State::Closed
        }
    }

    pub(crate) fn status(&self) -> KeyStatus {
        KeyStatus {
            is_paused: self.is_paused,
            err_count: self.err_count,
            total_count: self.total_count,
            access_last: self.access_last,
            round_last: self.round_last,
        }
    }
}

/// Point-in-time copy of a key's snapshot, returned by
/// [`CircuitBreaker::status`](crate::CircuitBreaker::status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStatus {
    /// Whether the breaker is open.
    pub is_paused: bool,
    /// Failures in the current round.
    pub err_count: u64,
    /// Accesses in the current round.
    pub total_count: u64,
    /// Last reported access.
    pub access_last: Instant,
    /// Start of the current round.
    pub round_last: Instant,
}
