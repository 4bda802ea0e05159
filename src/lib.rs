//! # keyed-breaker
//!
//! A per-key circuit breaker for Rust applications.
//!
//! One [`CircuitBreaker`] guards any number of resources, each identified by
//! a string key (an endpoint, a host, a tenant). Every key has its own
//! counters and its own open/closed flag, evaluated against one shared
//! [`BreakerConfig`].
//!
//! ## How it decides
//!
//! - Failures and successes are counted in **rounds**. When a report arrives
//!   more than `round_interval` after the round began, the counters restart.
//! - A key **trips open** when a failure leaves its round with more than
//!   `min_check` accesses and an error rate above `error_rate`.
//! - An open key rejects calls until `recover_interval` has passed since its
//!   last report. After that every check lets the call through as a
//!   **probe**, while the key stays open.
//! - Any success reported for an open key **closes** it.
//!
//! There are no background timers: everything is evaluated inside the call
//! that observes it. Keys that were never reported are always allowed.
//!
//! ## Basic Usage
//!
//! ```rust
//! use keyed_breaker::{BreakerError, CircuitBreaker};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::builder()
//!     .min_check(5)
//!     .error_rate(0.5)
//!     .round_interval(Duration::from_secs(15))
//!     .recover_interval(Duration::from_secs(5))
//!     .build()
//!     .expect("valid configuration");
//!
//! fn fetch_orders() -> Result<String, std::io::Error> {
//!     Ok("orders".to_string())
//! }
//!
//! let key = "/api/orders";
//! let result = if breaker.can_access(key) {
//!     match fetch_orders() {
//!         Ok(body) => {
//!             breaker.succeed(key);
//!             Ok(body)
//!         }
//!         Err(err) => {
//!             breaker.failed(key);
//!             Err(BreakerError::new(err.to_string()))
//!         }
//!     }
//! } else {
//!     Err(BreakerError::default())
//! };
//!
//! assert!(result.is_ok());
//! assert!(!breaker.is_break(key));
//! ```
//!
//! ## Features
//!
//! - `prometheus` - Prometheus metrics integration

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod clock;
mod config;
mod error;
mod hook;
mod metrics;
mod policy;
pub mod prelude;
mod recorder;
mod state;
mod store;

// Re-exports
pub use breaker::CircuitBreaker;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{BreakerBuilder, BreakerConfig};
pub use error::{BreakerError, ConfigError};
pub use hook::HookRegistry;
#[cfg(feature = "prometheus")]
pub use metrics::PrometheusSink;
pub use metrics::{MetricSink, NullMetricSink};
pub use policy::{BreakerPolicy, DefaultPolicy};
pub use state::{KeySnapshot, KeyStatus, State};
