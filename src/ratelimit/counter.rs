//! Per-window request counters.

use std::collections::HashMap;

/// Request counts for the current window.
///
/// Holds both the per-client counts and the global admitted count so that a
/// single guard in [`RateLimiter`](super::RateLimiter) covers the pair. The
/// methods here are not synchronized on their own.
#[derive(Debug, Default)]
pub struct WindowCounters {
    /// Requests admitted per client identifier in this window
    clients: HashMap<String, u64>,
    /// Requests admitted across all clients in this window
    total: u64,
}

impl WindowCounters {
    /// Create empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the count for a client, or zero if it has not been seen.
    pub fn get(&self, client_id: &str) -> u64 {
        self.clients.get(client_id).copied().unwrap_or(0)
    }

    /// Add one to a client's count, creating the entry if needed.
    pub fn increment(&mut self, client_id: &str) {
        match self.clients.get_mut(client_id) {
            Some(count) => *count += 1,
            None => {
                self.clients.insert(client_id.to_string(), 1);
            }
        }
    }

    /// Drop every client entry.
    pub fn clear_all(&mut self) {
        self.clients.clear();
    }

    /// Get the global admitted count.
    pub fn global_get(&self) -> u64 {
        self.total
    }

    pub fn global_increment(&mut self) {
        self.total += 1;
    }

    pub fn global_reset(&mut self) {
        self.total = 0;
    }

    /// Number of clients with an entry in this window.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_client_is_zero() {
        let counters = WindowCounters::new();

        assert_eq!(counters.get("10.0.0.1"), 0);
        assert_eq!(counters.tracked_clients(), 0);
    }

    #[test]
    fn test_increment_creates_entry() {
        let mut counters = WindowCounters::new();

        counters.increment("10.0.0.1");
        counters.increment("10.0.0.1");
        counters.increment("10.0.0.2");

        assert_eq!(counters.get("10.0.0.1"), 2);
        assert_eq!(counters.get("10.0.0.2"), 1);
        assert_eq!(counters.tracked_clients(), 2);
    }

    #[test]
    fn test_global_counter() {
        let mut counters = WindowCounters::new();
        assert_eq!(counters.global_get(), 0);

        counters.global_increment();
        counters.global_increment();
        assert_eq!(counters.global_get(), 2);

        counters.global_reset();
        assert_eq!(counters.global_get(), 0);
    }

    #[test]
    fn test_clear_all_removes_entries() {
        let mut counters = WindowCounters::new();
        counters.increment("a");
        counters.increment("b");

        counters.clear_all();

        assert_eq!(counters.tracked_clients(), 0);
        assert_eq!(counters.get("a"), 0);
    }
}
