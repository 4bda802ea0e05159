//! Error types for the circuit breaker library.

use thiserror::Error;

const DEFAULT_MESSAGE: &str = "CircuitBreaker is break";

/// Rejection error for calls denied by the breaker.
///
/// The breaker never returns this itself: callers build it when
/// [`can_access`](crate::CircuitBreaker::can_access) says no and they want to
/// surface the rejection as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BreakerError {
    message: String,
}

impl BreakerError {
    /// Creates an error with a custom message. An empty message falls back
    /// to the default one.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            return Self::default();
        }
        Self { message }
    }

    /// The rejection message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for BreakerError {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// Invalid breaker configuration, reported at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The error-rate threshold is not a finite number in `(0, 1]`.
    #[error("error rate threshold must be in (0, 1], got {0}")]
    InvalidErrorRate(f64),

    /// The recovery interval is zero.
    #[error("recover interval must be greater than zero")]
    ZeroRecoverInterval,

    /// The counting round is zero.
    #[error("round interval must be greater than zero")]
    ZeroRoundInterval,
}
