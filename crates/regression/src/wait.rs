//! Bounded poll-until waits.
//!
//! Replaces blind fixed sleeps: a probe is evaluated, and re-evaluated every
//! poll interval, until it yields a value or the ceiling elapses. The probe is
//! always evaluated once more at the ceiling before giving up.

use crate::clock::Clock;
use crate::config::Timeouts;
use crate::result::{RegressionError, RegressionResult};
use std::future::Future;
use std::time::Duration;

/// Ceiling and cadence of a poll-until wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Pause between probes
    pub poll_interval: Duration,
}

impl WaitOptions {
    /// Create wait options
    #[must_use]
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Explicit element wait from a timeout profile
    #[must_use]
    pub const fn element(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.element_wait(), timeouts.poll_interval())
    }

    /// Implicit lookup wait from a timeout profile
    #[must_use]
    pub const fn implicit(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.implicit_wait(), timeouts.poll_interval())
    }

    /// A single probe, no waiting
    #[must_use]
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::from_millis(1))
    }
}

/// Evaluate `probe` until it returns `Some`, bounded by `options.timeout`
///
/// Probe errors propagate immediately.
///
/// # Errors
///
/// Returns [`RegressionError::Timeout`] naming `what` when the ceiling elapses.
pub async fn poll_until<T, F, Fut>(
    clock: &dyn Clock,
    options: WaitOptions,
    what: &str,
    mut probe: F,
) -> RegressionResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RegressionResult<Option<T>>>,
{
    let start = clock.now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= options.timeout {
            return Err(RegressionError::Timeout {
                what: what.to_string(),
                ms: options.timeout.as_millis() as u64,
            });
        }
        let remaining = options.timeout - elapsed;
        clock.sleep(options.poll_interval.min(remaining)).await;
    }
}

/// Like [`poll_until`] for a boolean condition
pub async fn wait_until<F, Fut>(
    clock: &dyn Clock,
    options: WaitOptions,
    what: &str,
    mut condition: F,
) -> RegressionResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RegressionResult<bool>>,
{
    poll_until(clock, options, what, || {
        let check = condition();
        async move { Ok(check.await?.then_some(())) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn options() -> WaitOptions {
        WaitOptions::new(Duration::from_secs(1), Duration::from_millis(250))
    }

    #[tokio::test]
    async fn test_returns_first_value_without_sleeping() {
        let clock = FakeClock::new();
        let value = poll_until(&clock, options(), "ready", || async { Ok(Some(7)) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_polls_until_condition_holds() {
        let clock = FakeClock::new();
        let calls = AtomicU32::new(0);
        let value = poll_until(&clock, options(), "third probe", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok((n == 2).then_some(n)) }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(clock.now_ms(), 500);
    }

    #[tokio::test]
    async fn test_times_out_at_ceiling() {
        let clock = FakeClock::new();
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>(&clock, options(), "never", || {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, RegressionError::Timeout { ms: 1000, .. }));
        // t=0, 250, 500, 750, 1000
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let clock = FakeClock::new();
        let err = poll_until::<(), _, _>(&clock, options(), "broken", || async {
            Err(RegressionError::script("detached"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RegressionError::Script { .. }));
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_immediate_probes_once() {
        let clock = FakeClock::new();
        let calls = AtomicU32::new(0);
        let result = wait_until(&clock, WaitOptions::immediate(), "once", || {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(false) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
