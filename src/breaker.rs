//! Core circuit breaker implementation.

use parking_lot::RwLock;
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, MonotonicClock};
use crate::config::{BreakerBuilder, BreakerConfig};
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, NullMetricSink};
use crate::policy::{BreakerPolicy, DefaultPolicy};
use crate::recorder::{record_access, Access};
use crate::state::{KeyStatus, State};
use crate::store::KeySnapshotStore;

/// Something worth telling logs, metrics and hooks about. Collected under
/// the lock, dispatched after it is released.
#[derive(Debug, Clone, Copy)]
enum Event {
    RoundReset,
    Tripped {
        total: u64,
        errors: u64,
        error_rate: f64,
    },
    Cleared,
    Probe,
    Forced(State),
}

type Events = SmallVec<[Event; 2]>;

/// Inner state of the circuit breaker, shared between clones.
struct BreakerInner<P>
where
    P: BreakerPolicy,
{
    store: RwLock<KeySnapshotStore>,
    config: BreakerConfig,
    policy: P,
    clock: Arc<dyn Clock>,
    metric_sink: Arc<dyn MetricSink>,
    hooks: Arc<HookRegistry>,
}

/// A circuit breaker tracking an independent open/closed state per key.
///
/// The breaker never runs the protected operation. Callers ask
/// [`can_access`](Self::can_access) first and report exactly one outcome per
/// real attempt through [`failed`](Self::failed) or
/// [`succeed`](Self::succeed).
///
/// All keys share one reader-writer lock: access checks take it shared,
/// reports take it exclusively. Nothing runs in the background; rounds
/// expire and cooldowns elapse when a call observes them.
pub struct CircuitBreaker<P = DefaultPolicy>
where
    P: BreakerPolicy,
{
    inner: Arc<BreakerInner<P>>,
}

impl CircuitBreaker<DefaultPolicy> {
    /// Creates a breaker with the default policy, clock, sink and hooks.
    pub fn new(config: BreakerConfig) -> Self {
        Self::from_parts(
            config,
            DefaultPolicy,
            Arc::new(MonotonicClock),
            Arc::new(NullMetricSink),
            Arc::new(HookRegistry::new()),
        )
    }

    /// Creates a new builder for customizing a circuit breaker.
    pub fn builder() -> BreakerBuilder<DefaultPolicy> {
        BreakerBuilder::new()
    }
}

impl<P> CircuitBreaker<P>
where
    P: BreakerPolicy,
{
    pub(crate) fn from_parts(
        config: BreakerConfig,
        policy: P,
        clock: Arc<dyn Clock>,
        metric_sink: Arc<dyn MetricSink>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        let inner = BreakerInner {
            store: RwLock::new(KeySnapshotStore::new()),
            config,
            policy,
            clock,
            metric_sink,
            hooks,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// The configuration shared by all keys.
    pub fn config(&self) -> &BreakerConfig {
        &self.inner.config
    }

    /// Whether a call for `key` may go ahead.
    ///
    /// Unknown and closed keys are always allowed. An open key is rejected
    /// until the cooldown has passed since its last report, after which
    /// every check is allowed as a probe. The key stays open until a probe
    /// is reported through [`succeed`](Self::succeed).
    pub fn can_access(&self, key: &str) -> bool {
        let mut events = Events::new();

        let allowed = {
            let store = self.inner.store.read();
            match store.get(key) {
                None => true,
                Some(snapshot) => {
                    tracing::trace!(
                        key,
                        total = snapshot.total_count(),
                        errors = snapshot.err_count(),
                        paused = snapshot.is_paused(),
                        "checking access"
                    );

                    if !snapshot.is_paused() {
                        true
                    } else if self.inner.policy.cooled_down(
                        snapshot,
                        &self.inner.config,
                        self.inner.clock.now(),
                    ) {
                        events.push(Event::Probe);
                        true
                    } else {
                        false
                    }
                }
            }
        };

        self.inner.metric_sink.record_access(key, allowed);
        self.dispatch(key, events);
        allowed
    }

    /// Reports a failed call for `key`, creating its snapshot on first use.
    ///
    /// Opens the key when the policy's trip condition holds. Failures on an
    /// already open key keep counting.
    pub fn failed(&self, key: &str) {
        let mut events = Events::new();

        {
            let mut store = self.inner.store.write();
            let now = self.inner.clock.now();
            let snapshot = store.get_or_create(key, now);

            if record_access(snapshot, now, self.inner.config.round_interval()) == Access::NewRound
            {
                events.push(Event::RoundReset);
            }
            snapshot.err_count += 1;

            if self.inner.policy.should_trip(snapshot, &self.inner.config) && !snapshot.is_paused {
                snapshot.is_paused = true;
                events.push(Event::Tripped {
                    total: snapshot.total_count(),
                    errors: snapshot.err_count(),
                    error_rate: snapshot.error_rate(),
                });
            }
        }

        self.inner.metric_sink.record_outcome(key, false);
        self.dispatch(key, events);
    }

    /// Reports a successful call for `key`, closing it if open.
    ///
    /// Successes for keys that never failed are ignored and create nothing.
    pub fn succeed(&self, key: &str) {
        let mut events = Events::new();

        {
            let mut store = self.inner.store.write();
            let now = self.inner.clock.now();
            let Some(snapshot) = store.get_mut(key) else {
                return;
            };

            if record_access(snapshot, now, self.inner.config.round_interval()) == Access::NewRound
            {
                events.push(Event::RoundReset);
            }

            if self.inner.policy.should_clear(snapshot, &self.inner.config) && snapshot.is_paused {
                snapshot.is_paused = false;
                events.push(Event::Cleared);
            }
        }

        self.inner.metric_sink.record_outcome(key, true);
        self.dispatch(key, events);
    }

    /// Whether `key` is open. Unknown keys are closed.
    pub fn is_break(&self, key: &str) -> bool {
        self.inner
            .store
            .read()
            .get(key)
            .is_some_and(|snapshot| snapshot.is_paused())
    }

    /// The state of `key`. Unknown keys are closed.
    pub fn state(&self, key: &str) -> State {
        self.inner
            .store
            .read()
            .get(key)
            .map_or(State::Closed, |snapshot| snapshot.state())
    }

    /// Failure ratio of the current round for `key`, if it was ever reported.
    pub fn error_rate(&self, key: &str) -> Option<f64> {
        self.inner
            .store
            .read()
            .get(key)
            .map(|snapshot| snapshot.error_rate())
    }

    /// A consistent copy of every tracked key, ordered by key.
    pub fn status(&self) -> BTreeMap<String, KeyStatus> {
        self.inner.store.read().report()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.inner.store.read().len()
    }

    /// Whether no key has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forces `key` open, restarting its cooldown.
    ///
    /// Returns `false` if it was already open.
    pub fn force_open(&self, key: &str) -> bool {
        {
            let mut store = self.inner.store.write();
            let now = self.inner.clock.now();
            let snapshot = store.get_or_create(key, now);
            if snapshot.is_paused {
                return false;
            }
            snapshot.is_paused = true;
            snapshot.access_last = now;
        }

        self.dispatch(key, smallvec![Event::Forced(State::Open)]);
        true
    }

    /// Forces `key` closed and starts a fresh counting round.
    ///
    /// Returns `false` if it was not open.
    pub fn force_closed(&self, key: &str) -> bool {
        {
            let mut store = self.inner.store.write();
            let now = self.inner.clock.now();
            let Some(snapshot) = store.get_mut(key) else {
                return false;
            };
            if !snapshot.is_paused {
                return false;
            }
            snapshot.is_paused = false;
            snapshot.err_count = 0;
            snapshot.total_count = 0;
            snapshot.round_last = now;
        }

        self.dispatch(key, smallvec![Event::Forced(State::Closed)]);
        true
    }

    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn forget(&self, key: &str) -> bool {
        self.inner.store.write().remove(key)
    }

    /// Stops tracking closed keys idle for longer than `max_idle`.
    ///
    /// Open keys are kept so their rejection and cooldown survive. Returns
    /// the number of keys removed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let removed = {
            let mut store = self.inner.store.write();
            let now = self.inner.clock.now();
            store.evict_idle(now, max_idle)
        };

        if removed > 0 {
            tracing::debug!(removed, ?max_idle, "evicted idle keys");
        }
        removed
    }

    fn dispatch(&self, key: &str, events: Events) {
        let inner = &self.inner;

        for event in events {
            match event {
                Event::RoundReset => {
                    tracing::warn!(key, "counting round expired, counters reset");
                    inner.metric_sink.record_round_reset(key);
                    inner.hooks.execute_round_reset_hook(key);
                }
                Event::Tripped {
                    total,
                    errors,
                    error_rate,
                } => {
                    tracing::warn!(key, total, errors, error_rate, "error rate reached, breaker opened");
                    inner
                        .metric_sink
                        .record_state_transition(key, State::Closed, State::Open);
                    inner.metric_sink.record_error_rate(key, error_rate);
                    inner.hooks.execute_state_transition_hook(key, State::Open);
                }
                Event::Cleared => {
                    tracing::info!(key, "call succeeded, breaker closed");
                    inner
                        .metric_sink
                        .record_state_transition(key, State::Open, State::Closed);
                    inner.hooks.execute_state_transition_hook(key, State::Closed);
                }
                Event::Probe => {
                    tracing::info!(
                        key,
                        recover_interval = ?inner.config.recover_interval(),
                        "cooldown elapsed, letting probe through"
                    );
                    inner.hooks.execute_probe_hook(key);
                }
                Event::Forced(to) => {
                    let from = match to {
                        State::Open => State::Closed,
                        State::Closed => State::Open,
                    };
                    tracing::info!(key, %to, "breaker state forced");
                    inner.metric_sink.record_state_transition(key, from, to);
                    inner.hooks.execute_state_transition_hook(key, to);
                }
            }
        }
    }
}

impl<P> Clone for CircuitBreaker<P>
where
    P: BreakerPolicy,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
