//! Re-exports common types for convenient usage.
//!
//! # Example
//! ```rust
//! use keyed_breaker::prelude::*;
//!
//! let breaker = CircuitBreaker::new(BreakerConfig::default());
//! assert!(breaker.can_access("/unseen"));
//! ```

pub use crate::{
    BreakerConfig, BreakerError, BreakerPolicy, CircuitBreaker, ConfigError, KeyStatus, State,
};
