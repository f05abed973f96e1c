//! [`StopSignal`]: the cooperative cancellation flag shared by every loop.
//!
//! Loops check the flag at their suspension points and race their pacing
//! sleeps against it. A stop never interrupts an in-flight command; that
//! call ends through its own timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// A one-way stop flag with async waiting.
#[derive(Debug, Default)]
pub struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    /// A signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn requested(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a request in between is not lost.
            notified.as_mut().enable();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless a stop arrives first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => !self.is_requested(),
            () = self.requested() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_a_stop() {
        let stop = StopSignal::new();
        assert!(stop.sleep(Duration::from_secs(5)).await);
        assert!(!stop.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cuts_sleep_short() {
        let stop = Arc::new(StopSignal::new());
        let sleeper = {
            let stop = Arc::clone(&stop);
            tokio::spawn(async move { stop.sleep(Duration::from_secs(3600)).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        stop.request();
        assert!(!sleeper.await.unwrap_or(true));
    }

    #[tokio::test]
    async fn waiting_after_the_request_returns_immediately() {
        let stop = StopSignal::new();
        stop.request();
        stop.request();
        stop.requested().await;
        assert!(!stop.sleep(Duration::from_secs(60)).await);
    }
}
