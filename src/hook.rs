//! Hook registry for per-key breaker events.

use crate::state::State;
use parking_lot::RwLock;
use std::sync::Arc;

type HookFn = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// A registry of callbacks invoked with the key an event concerns.
///
/// Hooks run after the breaker has released its lock, so they may call back
/// into the breaker.
pub struct HookRegistry {
    on_open: RwLock<Option<HookFn>>,
    on_close: RwLock<Option<HookFn>>,
    on_probe: RwLock<Option<HookFn>>,
    on_round_reset: RwLock<Option<HookFn>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            on_open: RwLock::new(None),
            on_close: RwLock::new(None),
            on_probe: RwLock::new(None),
            on_round_reset: RwLock::new(None),
        }
    }

    /// Sets the hook to call when a key trips open.
    pub fn set_on_open<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_open.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a key closes again.
    pub fn set_on_close<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_close.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when an open key lets a probe through.
    pub fn set_on_probe<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_probe.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a key starts a new counting round.
    pub fn set_on_round_reset<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_round_reset.write() = Some(Arc::new(f));
    }

    /// Executes the appropriate hook for a state transition.
    pub fn execute_state_transition_hook(&self, key: &str, to: State) {
        let slot = match to {
            State::Open => &self.on_open,
            State::Closed => &self.on_close,
        };
        Self::execute(slot, key);
    }

    /// Executes the probe hook.
    pub fn execute_probe_hook(&self, key: &str) {
        Self::execute(&self.on_probe, key);
    }

    /// Executes the round reset hook.
    pub fn execute_round_reset_hook(&self, key: &str) {
        Self::execute(&self.on_round_reset, key);
    }

    fn execute(slot: &RwLock<Option<HookFn>>, key: &str) {
        // Clone out so a hook may replace itself without deadlocking.
        let hook = slot.read().clone();
        if let Some(hook) = hook {
            hook(key);
        }
    }
}
