//! Event-cache status polling.
//!
//! A [`CachePoller`] queries the cache status on a fixed interval and
//! publishes each answer on a `watch` channel until the active run reports
//! `DONE`, its owner cancels it, or the backend has failed too many times in
//! a row. Consecutive failures stretch the wait along the backoff curve of
//! the live channel; a good answer resets it.

use std::sync::Arc;
use std::time::Duration;

use polyadmin_core::cache_status::CacheStatus;
use polyadmin_gateway::reconnect::{Backoff, BackoffConfig};
use polyadmin_gateway::Gateway;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Polling cadence and failure tolerance.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait between polls while the backend answers.
    pub interval: Duration,
    /// Consecutive failed polls after which polling stops.
    pub max_failures: u32,
    /// Upper bound of the wait after repeated failures.
    pub max_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_failures: 30,
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Latest known cache progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheProgress {
    pub status: Option<CacheStatus>,
    /// Percentage of the active run, `None` when unknown or zero.
    pub percentage: Option<f64>,
}

impl CacheProgress {
    pub fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(CacheStatus::is_done)
    }

    /// Badge class of the active run, empty before the first answer.
    pub fn state_class(&self) -> &'static str {
        self.status
            .as_ref()
            .map(CacheStatus::state_class)
            .unwrap_or_default()
    }
}

/// Why polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEnd {
    /// The active run reached `DONE`.
    Done,
    /// The owner stopped the poller.
    Cancelled,
    /// Too many consecutive failures.
    GaveUp,
}

/// Handle to a running poll loop.
pub struct CachePoller {
    progress: watch::Receiver<CacheProgress>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<PollEnd>>>,
}

impl CachePoller {
    /// Start polling. The first query goes out one interval from now.
    pub fn start(
        gateway: Arc<dyn Gateway>,
        config: PollerConfig,
        parent: &CancellationToken,
    ) -> Self {
        let (progress_tx, progress) = watch::channel(CacheProgress::default());
        let cancel = parent.child_token();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let end = poll_loop(gateway.as_ref(), &config, &progress_tx, &cancel).await;
                tracing::info!(?end, "Cache status polling stopped");
                end
            }
        });

        Self {
            progress,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Observe progress updates.
    pub fn progress(&self) -> watch::Receiver<CacheProgress> {
        self.progress.clone()
    }

    pub fn percentage(&self) -> Option<f64> {
        self.progress.borrow().percentage
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// `true` once the loop has ended for any reason.
    pub async fn is_finished(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the loop to end. Returns `None` if it was already awaited.
    pub async fn finished(&self) -> Option<PollEnd> {
        let handle = self.task.lock().await.take()?;
        match handle.await {
            Ok(end) => Some(end),
            Err(e) => {
                tracing::error!(error = %e, "Cache poller task failed");
                None
            }
        }
    }
}

impl Drop for CachePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    gateway: &dyn Gateway,
    config: &PollerConfig,
    progress_tx: &watch::Sender<CacheProgress>,
    cancel: &CancellationToken,
) -> PollEnd {
    let mut backoff = Backoff::new(BackoffConfig {
        initial: config.interval,
        max: config.max_backoff.max(config.interval),
        factor: 2.0,
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollEnd::Cancelled,
            _ = tokio::time::sleep(backoff.wait()) => {}
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return PollEnd::Cancelled,
            response = gateway.get_event_cache_status() => response,
        };

        match response {
            Ok(status) => {
                backoff.succeed();

                let done = status.is_done();
                let percentage = status.percentage();
                tracing::debug!(?percentage, state = status.state_class(), "Cache status");
                progress_tx.send_replace(CacheProgress {
                    status: Some(status),
                    percentage,
                });

                if done {
                    return PollEnd::Done;
                }
            }
            Err(e) => {
                backoff.fail();
                let failures = backoff.failures();
                tracing::warn!(error = %e, failures, "Cache status query failed");
                if failures >= config.max_failures {
                    tracing::error!(failures, "Giving up on cache status polling");
                    return PollEnd::GaveUp;
                }
            }
        }
    }
}
