//! Policy engine for trip, probe and clear decisions.

use std::time::Instant;

use crate::clock::distance;
use crate::config::BreakerConfig;
use crate::state::KeySnapshot;

/// Decides when a key trips, when an open key admits probes, and when a
/// success closes it.
///
/// Policies are pure: they read a snapshot and never mutate it.
pub trait BreakerPolicy: Send + Sync + 'static {
    /// Called after a failure was counted. Returning `true` opens the key.
    fn should_trip(&self, snapshot: &KeySnapshot, config: &BreakerConfig) -> bool;

    /// Called for an open key on every access check. Returning `true` lets
    /// the call through as a probe without closing the key.
    fn cooled_down(&self, snapshot: &KeySnapshot, config: &BreakerConfig, now: Instant) -> bool;

    /// Called after a success was counted. Returning `true` closes the key.
    fn should_clear(&self, snapshot: &KeySnapshot, config: &BreakerConfig) -> bool;
}

/// Error-rate policy with a minimum-volume floor.
///
/// - trips when the round counted more than `min_check` accesses and the
///   failure ratio exceeds `error_rate`
/// - admits probes once `recover_interval` has passed since the last access
/// - clears on any success
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl BreakerPolicy for DefaultPolicy {
    fn should_trip(&self, snapshot: &KeySnapshot, config: &BreakerConfig) -> bool {
        snapshot.total_count() > config.min_check() && snapshot.error_rate() > config.error_rate()
    }

    fn cooled_down(&self, snapshot: &KeySnapshot, config: &BreakerConfig, now: Instant) -> bool {
        distance(now, snapshot.access_last()) >= config.recover_interval()
    }

    fn should_clear(&self, snapshot: &KeySnapshot, _config: &BreakerConfig) -> bool {
        snapshot.is_paused()
    }
}
