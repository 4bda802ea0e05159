//! Metric sinks for circuit breaker events.

use crate::state::State;

/// Trait for metrics sinks that can receive circuit breaker events.
///
/// Every event carries the key it concerns. Sinks are invoked after the
/// breaker has released its lock.
pub trait MetricSink: Send + Sync + 'static {
    /// Records a state transition event.
    fn record_state_transition(&self, key: &str, from: State, to: State);

    /// Records the error rate that tripped a key.
    fn record_error_rate(&self, key: &str, rate: f64);

    /// Records an access decision.
    fn record_access(&self, key: &str, allowed: bool);

    /// Records a reported call outcome.
    fn record_outcome(&self, key: &str, success: bool);

    /// Records the start of a new counting round.
    fn record_round_reset(&self, key: &str);
}

/// A null metrics sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn record_state_transition(&self, _key: &str, _from: State, _to: State) {}
    fn record_error_rate(&self, _key: &str, _rate: f64) {}
    fn record_access(&self, _key: &str, _allowed: bool) {}
    fn record_outcome(&self, _key: &str, _success: bool) {}
    fn record_round_reset(&self, _key: &str) {}
}

#[cfg(feature = "prometheus")]
pub use self::prometheus::PrometheusSink;

#[cfg(feature = "prometheus")]
mod prometheus {
    use prometheus_client::encoding::EncodeLabelSet;
    use prometheus_client::metrics::counter::Counter;
    use prometheus_client::metrics::family::Family;
    use prometheus_client::metrics::gauge::Gauge;
    use prometheus_client::registry::Registry;
    use std::sync::atomic::AtomicU64;

    use super::MetricSink;
    use crate::state::State;

    #[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
    struct KeyLabels {
        key: String,
    }

    #[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
    struct TransitionLabels {
        key: String,
        from: String,
        to: String,
    }

    #[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
    struct ResultLabels {
        key: String,
        result: String,
    }

    /// Prometheus-backed sink, registered under a `breaker` prefix.
    #[derive(Clone, Default)]
    pub struct PrometheusSink {
        transitions: Family<TransitionLabels, Counter>,
        trip_error_rate: Family<KeyLabels, Gauge<f64, AtomicU64>>,
        accesses: Family<ResultLabels, Counter>,
        outcomes: Family<ResultLabels, Counter>,
        round_resets: Family<KeyLabels, Counter>,
    }

    impl PrometheusSink {
        /// Creates a sink and registers its metric families.
        pub fn new(registry: &mut Registry) -> Self {
            let sink = Self::default();
            let registry = registry.sub_registry_with_prefix("breaker");

            registry.register(
                "transitions",
                "Breaker state transitions per key",
                sink.transitions.clone(),
            );
            registry.register(
                "trip_error_rate",
                "Error rate observed when the key last tripped",
                sink.trip_error_rate.clone(),
            );
            registry.register(
                "access_checks",
                "Access checks per key and decision",
                sink.accesses.clone(),
            );
            registry.register(
                "outcomes",
                "Reported call outcomes per key",
                sink.outcomes.clone(),
            );
            registry.register(
                "round_resets",
                "Counting rounds restarted per key",
                sink.round_resets.clone(),
            );

            sink
        }
    }

    fn result_labels(key: &str, result: &str) -> ResultLabels {
        ResultLabels {
            key: key.to_owned(),
            result: result.to_owned(),
        }
    }

    impl MetricSink for PrometheusSink {
        fn record_state_transition(&self, key: &str, from: State, to: State) {
            self.transitions
                .get_or_create(&TransitionLabels {
                    key: key.to_owned(),
                    from: from.as_str().to_owned(),
                    to: to.as_str().to_owned(),
                })
                .inc();
        }

        fn record_error_rate(&self, key: &str, rate: f64) {
            self.trip_error_rate
                .get_or_create(&KeyLabels { key: key.to_owned() })
                .set(rate);
        }

        fn record_access(&self, key: &str, allowed: bool) {
            let result = if allowed { "allowed" } else { "rejected" };
            self.accesses.get_or_create(&result_labels(key, result)).inc();
        }

        fn record_outcome(&self, key: &str, success: bool) {
            let result = if success { "success" } else { "failure" };
            self.outcomes.get_or_create(&result_labels(key, result)).inc();
        }

        fn record_round_reset(&self, key: &str) {
            self.round_resets
                .get_or_create(&KeyLabels { key: key.to_owned() })
                .inc();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use prometheus_client::encoding::text::encode;

        #[test]
        fn encodes_per_key_series() {
            let mut registry = Registry::default();
            let sink = PrometheusSink::new(&mut registry);

            sink.record_state_transition("/x", State::Closed, State::Open);
            sink.record_outcome("/x", false);
            sink.record_access("/x", false);

            let mut out = String::new();
            encode(&mut out, &registry).unwrap();

            assert!(out.contains("breaker_transitions_total{key=\"/x\",from=\"closed\",to=\"open\"} 1"));
            assert!(out.contains("breaker_outcomes_total{key=\"/x\",result=\"failure\"} 1"));
            assert!(out.contains("breaker_access_checks_total{key=\"/x\",result=\"rejected\"} 1"));
        }
    }
}
