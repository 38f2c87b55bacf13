//! Background task that starts a new rate limit window on a fixed period.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::limiter::RateLimiter;

/// Periodically wipes a [`RateLimiter`], one full reset per window.
///
/// The loop sleeps for the limiter's window, resets every counter, and repeats.
/// It never inspects the counters first. It stops only when its
/// [`ResetHandle`] is shut down or dropped.
pub struct ResetLoop;

impl ResetLoop {
    /// Spawn the reset task on the current tokio runtime.
    ///
    /// The first reset happens one full window after this call.
    pub fn spawn(limiter: Arc<RateLimiter>) -> ResetHandle {
        let window = limiter.limits().window;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(window_secs = window.as_secs_f64(), "Starting rate limit reset loop");
        let task = tokio::spawn(run(limiter, window, shutdown_rx));

        ResetHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

async fn run(limiter: Arc<RateLimiter>, window: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(window) => {
                let discarded = limiter.reset_all();
                debug!(
                    clients = discarded.tracked_clients,
                    admitted = discarded.admitted,
                    "Rate limit window reset"
                );
            }
            // Resolves on an explicit signal or when the handle is dropped.
            _ = shutdown_rx.changed() => break,
        }
    }

    info!("Rate limit reset loop stopped");
}

/// Handle to a running [`ResetLoop`].
///
/// Dropping the handle stops the loop without waiting for it.
pub struct ResetHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ResetHandle {
    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the reset task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::Limits;

    fn limiter(window: Duration) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(Limits {
            per_client: 2,
            global: 100,
            window,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_resets_after_window() {
        let limiter = limiter(Duration::from_secs(60));
        let handle = ResetLoop::spawn(limiter.clone());

        assert!(limiter.admit("A"));
        assert!(limiter.admit("A"));
        assert!(!limiter.admit("A"));

        // Not yet at the window boundary
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(limiter.client_count("A"), 2);
        assert!(!limiter.admit("A"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(limiter.client_count("A"), 0);
        assert_eq!(limiter.global_count(), 0);
        assert!(limiter.admit("A"));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_resets_every_window() {
        let limiter = limiter(Duration::from_secs(10));
        let handle = ResetLoop::spawn(limiter.clone());

        // Stay clear of the boundaries at 10s, 20s and 30s
        tokio::time::sleep(Duration::from_secs(5)).await;

        for _ in 0..3 {
            assert!(limiter.admit("A"));
            assert!(limiter.admit("A"));
            assert!(!limiter.admit("A"));
            tokio::time::sleep(Duration::from_secs(10)).await;
            assert_eq!(limiter.global_count(), 0);
        }

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_resets() {
        let limiter = limiter(Duration::from_secs(10));
        let handle = ResetLoop::spawn(limiter.clone());
        assert!(!handle.is_finished());

        handle.shutdown().await;

        assert!(limiter.admit("A"));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(limiter.client_count("A"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_handle_stops_loop() {
        let limiter = limiter(Duration::from_secs(10));
        drop(ResetLoop::spawn(limiter.clone()));
        tokio::task::yield_now().await;

        assert!(limiter.admit("A"));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(limiter.client_count("A"), 1);
    }
}
