//! Configuration for circuit breakers.

use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::clock::{Clock, MonotonicClock};
use crate::error::ConfigError;
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, NullMetricSink};
use crate::policy::{BreakerPolicy, DefaultPolicy};

/// Thresholds shared by every key of one breaker.
///
/// Always validated: the only ways to obtain one are [`BreakerConfig::new`]
/// and [`BreakerBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerConfig {
    min_check: u64,
    error_rate: f64,
    recover_interval: Duration,
    round_interval: Duration,
}

impl BreakerConfig {
    /// Validates and creates a configuration.
    pub fn new(
        min_check: u64,
        error_rate: f64,
        recover_interval: Duration,
        round_interval: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            min_check,
            error_rate,
            recover_interval,
            round_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.error_rate.is_finite() || self.error_rate <= 0.0 || self.error_rate > 1.0 {
            return Err(ConfigError::InvalidErrorRate(self.error_rate));
        }
        if self.recover_interval.is_zero() {
            return Err(ConfigError::ZeroRecoverInterval);
        }
        if self.round_interval.is_zero() {
            return Err(ConfigError::ZeroRoundInterval);
        }
        Ok(())
    }

    /// A round must count more than this many accesses before it can trip.
    pub fn min_check(&self) -> u64 {
        self.min_check
    }

    /// Failure ratio that has to be exceeded to trip.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Quiet time after the last access before an open key admits probes.
    pub fn recover_interval(&self) -> Duration {
        self.recover_interval
    }

    /// Width of a counting round.
    pub fn round_interval(&self) -> Duration {
        self.round_interval
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            min_check: 5,
            error_rate: 0.5,
            recover_interval: Duration::from_secs(5),
            round_interval: Duration::from_secs(15),
        }
    }
}

/// Builder for creating circuit breakers with custom configurations.
pub struct BreakerBuilder<P = DefaultPolicy>
where
    P: BreakerPolicy,
{
    config: BreakerConfig,
    policy: P,
    clock: Arc<dyn Clock>,
    metric_sink: Arc<dyn MetricSink>,
    hook_registry: Arc<HookRegistry>,
}

impl Default for BreakerBuilder<DefaultPolicy> {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerBuilder<DefaultPolicy> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BreakerConfig::default(),
            policy: DefaultPolicy,
            clock: Arc::new(MonotonicClock),
            metric_sink: Arc::new(NullMetricSink),
            hook_registry: Arc::new(HookRegistry::new()),
        }
    }
}

impl<P> BreakerBuilder<P>
where
    P: BreakerPolicy,
{
    /// Sets how many accesses a round must exceed before it may trip.
    pub fn min_check(mut self, min_check: u64) -> Self {
        self.config.min_check = min_check;
        self
    }

    /// Sets the failure ratio that trips a key.
    pub fn error_rate(mut self, rate: f64) -> Self {
        self.config.error_rate = rate;
        self
    }

    /// Sets the cooldown an open key waits after its last access.
    pub fn recover_interval(mut self, interval: Duration) -> Self {
        self.config.recover_interval = interval;
        self
    }

    /// Sets the width of the counting round.
    pub fn round_interval(mut self, interval: Duration) -> Self {
        self.config.round_interval = interval;
        self
    }

    /// Sets the time source.
    pub fn clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets a metric sink for the circuit breaker.
    pub fn metric_sink<M: MetricSink>(mut self, sink: M) -> Self {
        self.metric_sink = Arc::new(sink);
        self
    }

    /// Sets a hook registry for the circuit breaker.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hook_registry = Arc::new(hooks);
        self
    }

    /// Replaces the decision policy.
    pub fn policy<Q: BreakerPolicy>(self, policy: Q) -> BreakerBuilder<Q> {
        BreakerBuilder {
            config: self.config,
            policy,
            clock: self.clock,
            metric_sink: self.metric_sink,
            hook_registry: self.hook_registry,
        }
    }

    /// Validates the configuration and builds the breaker.
    pub fn build(self) -> Result<CircuitBreaker<P>, ConfigError> {
        self.config.validate()?;

        Ok(CircuitBreaker::from_parts(
            self.config,
            self.policy,
            self.clock,
            self.metric_sink,
            self.hook_registry,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(BreakerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_error_rate() {
        for rate in [0.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            let result = BreakerConfig::new(5, rate, Duration::from_secs(1), Duration::from_secs(1));
            assert!(matches!(result, Err(ConfigError::InvalidErrorRate(_))), "{rate}");
        }
    }

    #[test]
    fn accepts_full_error_rate() {
        let config = BreakerConfig::new(0, 1.0, Duration::from_secs(1), Duration::from_secs(1));
        assert!(config.is_ok());
    }

    #[test]
    fn rejects_zero_durations() {
        assert_eq!(
            BreakerConfig::new(5, 0.5, Duration::ZERO, Duration::from_secs(1)),
            Err(ConfigError::ZeroRecoverInterval)
        );
        assert_eq!(
            BreakerConfig::new(5, 0.5, Duration::from_secs(1), Duration::ZERO),
            Err(ConfigError::ZeroRoundInterval)
        );
    }
}
