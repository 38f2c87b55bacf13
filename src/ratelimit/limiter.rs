//! Core rate limiter implementation.

use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

use super::backend::AdmissionControl;
use super::counter::WindowCounters;

/// Default requests per client per window.
pub const DEFAULT_PER_CLIENT_LIMIT: u64 = 10;
/// Default requests across all clients per window.
pub const DEFAULT_GLOBAL_LIMIT: u64 = 100;
/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Limits enforced by a [`RateLimiter`], fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum admitted requests per client in one window
    pub per_client: u64,
    /// Maximum admitted requests across all clients in one window
    pub global: u64,
    /// Time between full resets
    pub window: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            per_client: DEFAULT_PER_CLIENT_LIMIT,
            global: DEFAULT_GLOBAL_LIMIT,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Snapshot of the counters for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Clients with at least one admitted request
    pub tracked_clients: usize,
    /// Requests admitted across all clients
    pub admitted: u64,
}

/// Two-tier fixed-window rate limiter.
///
/// A single mutex guards the per-client counts and the global count together,
/// so the check-then-increment in [`admit`](Self::admit) and the wipe in
/// [`reset_all`](Self::reset_all) are each one critical section. Two callers
/// can never both observe a count below the limit and push it over.
///
/// Windows are advanced externally, normally by a
/// [`ResetLoop`](super::ResetLoop).
pub struct RateLimiter {
    limits: Limits,
    counters: Mutex<WindowCounters>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given limits.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            counters: Mutex::new(WindowCounters::new()),
        }
    }

    /// Decide whether a request from `client_id` is admitted.
    ///
    /// The per-client limit is checked before the global one. Counters are only
    /// touched when the request is admitted; a rejection leaves them unchanged.
    pub fn admit(&self, client_id: &str) -> bool {
        let mut counters = self.counters.lock();

        let client_count = counters.get(client_id);
        if client_count >= self.limits.per_client {
            drop(counters);
            debug!(
                client = %client_id,
                count = client_count,
                limit = self.limits.per_client,
                "Per-client rate limit exceeded"
            );
            return false;
        }

        let global_count = counters.global_get();
        if global_count >= self.limits.global {
            drop(counters);
            debug!(
                client = %client_id,
                count = global_count,
                limit = self.limits.global,
                "Global rate limit exceeded"
            );
            return false;
        }

        counters.increment(client_id);
        counters.global_increment();
        drop(counters);

        trace!(
            client = %client_id,
            client_count = client_count + 1,
            global_count = global_count + 1,
            "Request admitted"
        );
        true
    }

    /// Discard every per-client count and zero the global count, starting a
    /// new window. Returns the state that was discarded.
    pub fn reset_all(&self) -> WindowStats {
        let mut counters = self.counters.lock();
        let discarded = WindowStats {
            tracked_clients: counters.tracked_clients(),
            admitted: counters.global_get(),
        };
        counters.clear_all();
        counters.global_reset();
        discarded
    }

    /// Get the admitted count for a client in the current window.
    pub fn client_count(&self, client_id: &str) -> u64 {
        self.counters.lock().get(client_id)
    }

    /// Get the global admitted count for the current window.
    pub fn global_count(&self) -> u64 {
        self.counters.lock().global_get()
    }

    /// Snapshot the current window.
    pub fn stats(&self) -> WindowStats {
        let counters = self.counters.lock();
        WindowStats {
            tracked_clients: counters.tracked_clients(),
            admitted: counters.global_get(),
        }
    }

    /// Get the limits this limiter enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl AdmissionControl for RateLimiter {
    fn admit(&self, client_id: &str) -> bool {
        RateLimiter::admit(self, client_id)
    }
}
