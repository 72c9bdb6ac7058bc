//! Injectable time source for waits and pauses.
//!
//! The suite never calls `tokio::time` directly; it goes through [`Clock`] so
//! tests can run every wait against a [`FakeClock`] that advances instantly.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Monotonic time source with an async pause
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time backed by tokio
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: tokio::time::Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` advances time immediately and is recorded
#[derive(Debug, Default)]
pub struct FakeClock {
    /// Current virtual time in milliseconds
    current_ms: AtomicU64,
    /// Every requested pause, in order
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    /// Create a clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Move time forward without recording a sleep
    pub fn fast_forward(&self, duration: Duration) {
        let _ = self
            .current_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Pauses requested so far
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Total time spent sleeping
    #[must_use]
    pub fn slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.fast_forward(duration);
    }
}
