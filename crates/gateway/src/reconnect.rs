//! Backoff between retries of the live channel and other retrying loops.
//!
//! A [`Backoff`] tracks the wait before the next attempt: it starts at
//! [`BackoffConfig::initial`], grows by [`BackoffConfig::factor`] after every
//! failure up to [`BackoffConfig::max`], and starts over on success.
//! [`reconnect_loop`] drives the live channel with it until a connection is
//! made or the [`CancellationToken`] fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{LiveChannelClient, LiveConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Wait before the first retry.
    pub initial: Duration,
    /// Longest wait between retries.
    pub max: Duration,
    pub factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

impl BackoffConfig {
    /// The wait following `current`, clamped to [`max`](Self::max).
    pub fn grow(&self, current: Duration) -> Duration {
        current.mul_f64(self.factor).min(self.max)
    }
}

/// Wait state of one retrying loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    wait: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            wait: config.initial,
            config,
            failures: 0,
        }
    }

    /// Wait before the next attempt.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record a failed attempt and return the stretched wait.
    pub fn fail(&mut self) -> Duration {
        self.failures += 1;
        self.wait = self.config.grow(self.wait);
        self.wait
    }

    /// Record a success: the next wait is the initial one again.
    pub fn succeed(&mut self) {
        self.failures = 0;
        self.wait = self.config.initial;
    }
}

/// Reconnect to the live channel, sleeping [`Backoff::wait`] before each
/// attempt.
///
/// Returns `None` once `cancel` fires.
pub async fn reconnect_loop(
    client: &LiveChannelClient,
    config: &BackoffConfig,
    cancel: &CancellationToken,
) -> Option<LiveConnection> {
    let mut backoff = Backoff::new(config.clone());

    loop {
        let wait = backoff.wait();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Live channel reconnect cancelled");
                return None;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let attempt = backoff.failures() + 1;
        tracing::info!(
            attempt,
            wait_ms = wait.as_millis() as u64,
            ws_url = client.ws_url(),
            "Reconnecting",
        );

        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = client.connect() => result,
        };
        match result {
            Ok(conn) => {
                tracing::info!(attempt, client_id = %conn.client_id, "Live channel reconnected");
                return Some(conn);
            }
            Err(e) => {
                let next = backoff.fail();
                tracing::warn!(
                    attempt,
                    error = %e,
                    next_wait_ms = next.as_millis() as u64,
                    "Reconnect failed",
                );
            }
        }
    }
}
