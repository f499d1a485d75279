//! Periodic refresh driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::PortEngine;
use crate::killer::SignalDelivery;
use crate::scanner::Scanner;

/// Drives [`PortEngine::refresh`] on a fixed cadence until stopped.
///
/// The loop refreshes once immediately on start, then sleeps the interval
/// between cycles. The sleep is interruptible: stopping takes effect
/// promptly instead of waiting out the remainder. Stopping is idempotent,
/// and dropping the scheduler stops the loop so an owning scope cannot leak
/// it.
pub struct RefreshScheduler {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Start the auto-refresh loop on the current runtime.
    pub fn start<S, D>(engine: Arc<PortEngine<S, D>>, interval: Duration) -> Self
    where
        S: Scanner + 'static,
        D: SignalDelivery + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            loop {
                engine.refresh().await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stopped.changed() => {
                        debug!("auto-refresh stopped");
                        break;
                    }
                }
            }
        });

        Self { stop, handle }
    }

    /// Stop the loop. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::RwLock;
    use tempfile::tempdir;

    use super::*;
    use crate::config::ConfigStore;
    use crate::domain::PortRecord;
    use crate::error::Result;
    use crate::killer::{ProcessKiller, SignalDelivery};

    #[derive(Clone, Default)]
    struct CountingScanner {
        calls: Arc<AtomicUsize>,
        result: Arc<RwLock<Vec<PortRecord>>>,
    }

    impl Scanner for CountingScanner {
        async fn scan(&self) -> Result<Vec<PortRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.read().clone())
        }
    }

    struct OkDelivery;

    impl SignalDelivery for OkDelivery {
        async fn deliver(&self, _pid: u32, _forceful: bool) -> Result<bool> {
            Ok(true)
        }
    }

    async fn engine_with(
        scanner: CountingScanner,
    ) -> (Arc<PortEngine<CountingScanner, OkDelivery>>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = ConfigStore::with_path(dir.path().join("config.json"));
        let engine = PortEngine::with_parts(
            scanner,
            ProcessKiller::with_delivery(OkDelivery),
            config,
        )
        .await
        .unwrap();
        (Arc::new(engine), dir)
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_immediately_then_on_cadence() {
        let scanner = CountingScanner::default();
        let (engine, _dir) = engine_with(scanner.clone()).await;

        let scheduler = RefreshScheduler::start(engine, Duration::from_secs(5));

        // The immediate first refresh.
        tokio::task::yield_now().await;
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 1);

        // One interval later: one more refresh.
        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 2);

        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_prompt_and_idempotent() {
        let scanner = CountingScanner::default();
        let (engine, _dir) = engine_with(scanner.clone()).await;

        let scheduler = RefreshScheduler::start(engine, Duration::from_secs(3600));
        tokio::task::yield_now().await;
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 1);

        // Stop mid-sleep; the loop must not wait out the hour.
        scheduler.stop();
        scheduler.stop(); // second stop is safe
        tokio::task::yield_now().await;
        assert!(!scheduler.is_running());

        // No further scans, even after a long wait.
        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_loop() {
        let scanner = CountingScanner::default();
        let (engine, _dir) = engine_with(scanner.clone()).await;

        let scheduler = RefreshScheduler::start(engine, Duration::from_secs(5));
        tokio::task::yield_now().await;
        drop(scheduler);
        tokio::task::yield_now().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 1);
    }
}
