//! Process-wide timer coordinator

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::server_clock::ServerClock;
use crate::state::TimeAccumulator;

/// Owns the server clock and amortizes the one offset measurement across
/// every accumulator created during the process lifetime.
///
/// The offset fetch is single-flight: concurrent first callers await the
/// same in-flight measurement instead of each issuing their own request,
/// and the resolved value is cached for the rest of the process.
pub struct TimerCoordinator {
    clock: Arc<dyn ServerClock>,
    server_offset: OnceCell<f64>,
}

impl TimerCoordinator {
    /// Create a coordinator backed by the given server clock
    pub fn new(clock: Arc<dyn ServerClock>) -> Self {
        Self {
            clock,
            server_offset: OnceCell::new(),
        }
    }

    /// Construct a fresh, independent accumulator. If the shared offset has
    /// already been measured it is injected, so the new timer can translate
    /// local time immediately; otherwise the timer starts unsynchronized.
    pub fn create_timer(&self) -> TimeAccumulator {
        let mut timer = TimeAccumulator::new();
        if let Some(offset) = self.server_offset.get() {
            timer.set_server_offset(*offset);
        }
        timer
    }

    /// Return the cached server offset, measuring it on first use.
    ///
    /// Transport failures propagate to the caller and leave the cache empty,
    /// so a later call retries the measurement.
    pub async fn get_server_offset(&self) -> Result<f64, String> {
        self.server_offset
            .get_or_try_init(|| async {
                debug!("No cached server offset, fetching server time");
                let server_time = self.clock.server_time().await?;

                let mut probe = TimeAccumulator::new();
                let offset = probe.compute_offset(server_time);
                info!("Measured server clock offset: {:.3}s", offset);
                Ok(offset)
            })
            .await
            .map(|offset| *offset)
    }

    /// Offset already measured and cached, if any
    pub fn cached_offset(&self) -> Option<f64> {
        self.server_offset.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClock {
        fetches: AtomicUsize,
        skew_seconds: i64,
    }

    impl CountingClock {
        fn new(skew_seconds: i64) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                skew_seconds,
            }
        }
    }

    #[async_trait]
    impl ServerClock for CountingClock {
        async fn server_time(&self) -> Result<DateTime<Utc>, String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent callers overlap with the in-flight fetch.
            tokio::task::yield_now().await;
            Ok(Utc::now() + Duration::seconds(self.skew_seconds))
        }
    }

    struct FailingClock;

    #[async_trait]
    impl ServerClock for FailingClock {
        async fn server_time(&self) -> Result<DateTime<Utc>, String> {
            Err("upstream unreachable".to_string())
        }
    }

    #[tokio::test]
    async fn offset_is_fetched_once_and_cached() {
        let clock = Arc::new(CountingClock::new(120));
        let coordinator = TimerCoordinator::new(clock.clone());

        let first = coordinator.get_server_offset().await.unwrap();
        let second = coordinator.get_server_offset().await.unwrap();

        assert_eq!(clock.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!((first - 120.0).abs() < 1.0);
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_fetch() {
        let clock = Arc::new(CountingClock::new(60));
        let coordinator = Arc::new(TimerCoordinator::new(clock.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(tokio::spawn(
                async move { coordinator.get_server_offset().await },
            ));
        }

        let mut offsets = Vec::new();
        for handle in handles {
            offsets.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(clock.fetches.load(Ordering::SeqCst), 1);
        assert!(offsets.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn created_timers_inherit_the_cached_offset() {
        let coordinator = TimerCoordinator::new(Arc::new(CountingClock::new(90)));

        let before = coordinator.create_timer();
        assert!(before.server_offset().is_none());

        let offset = coordinator.get_server_offset().await.unwrap();
        let after = coordinator.create_timer();
        assert_eq!(after.server_offset(), Some(offset));
    }

    #[tokio::test]
    async fn fetch_failure_leaves_cache_empty_for_retry() {
        let coordinator = TimerCoordinator::new(Arc::new(FailingClock));

        assert!(coordinator.get_server_offset().await.is_err());
        assert!(coordinator.cached_offset().is_none());
    }
}
