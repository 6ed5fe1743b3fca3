//! Session-owned toast store.
//!
//! [`ToastService`] holds the live toasts keyed by [`ToastKey`], schedules
//! their expiry on the tokio runtime and announces every change on a
//! `tokio::sync::broadcast` channel. It is cheap to clone; all clones share
//! the same store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use polyadmin_core::result_set::ResultSet;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::toast::{Severity, Toast, ToastDuration, ToastKey};

/// Default buffer capacity for the change stream.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// ToastEvent
// ---------------------------------------------------------------------------

/// A change to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    /// A toast was inserted, possibly replacing one with the same key.
    Added(Toast),
    /// A toast was removed by dismissal or expiry.
    Removed(ToastKey),
}

// ---------------------------------------------------------------------------
// ToastService
// ---------------------------------------------------------------------------

struct Entry {
    toast: Toast,
    /// Distinguishes a replacement from the toast an expiry timer was
    /// scheduled for.
    generation: u64,
}

struct Inner {
    toasts: RwLock<HashMap<ToastKey, Entry>>,
    next_generation: AtomicU64,
    sender: broadcast::Sender<ToastEvent>,
    cancel: CancellationToken,
}

/// The live toast store of one console session.
#[derive(Clone)]
pub struct ToastService {
    inner: Arc<Inner>,
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ToastService {
    /// Create a store whose change stream buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(Inner {
                toasts: RwLock::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                sender,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Subscribe to store changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.sender.subscribe()
    }

    /// Insert `toast`, replacing any toast with the same key, and schedule
    /// its removal when it has a delay.
    pub async fn publish(&self, toast: Toast) -> ToastKey {
        let key = toast.key();
        let delay = toast.delay_secs;
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        let replaced = self
            .inner
            .toasts
            .write()
            .await
            .insert(
                key.clone(),
                Entry {
                    toast: toast.clone(),
                    generation,
                },
            )
            .is_some();

        tracing::debug!(key = %key, severity = ?toast.severity, replaced, "Toast added");
        let _ = self.inner.sender.send(ToastEvent::Added(toast));

        if delay > 0 {
            self.schedule_expiry(key.clone(), generation, Duration::from_secs(delay));
        }
        key
    }

    /// Build and insert a toast from raw parts.
    pub async fn notify(
        &self,
        title: &str,
        message: &str,
        generated_query: Option<String>,
        delay_secs: u64,
        severity: Severity,
    ) -> ToastKey {
        let toast = Toast::new(severity, title, message)
            .with_generated_query(generated_query)
            .with_delay_secs(delay_secs);
        self.publish(toast).await
    }

    /// Announce a success. Without `title` or `duration` the toast is titled
    /// `success` and expires after [`ToastDuration::Normal`].
    pub async fn success(
        &self,
        message: &str,
        generated_query: Option<String>,
        title: Option<&str>,
        duration: Option<ToastDuration>,
    ) -> ToastKey {
        let toast = Toast::success(message).with_generated_query(generated_query);
        self.publish(overrides(toast, title, duration)).await
    }

    /// Announce a locally caught problem. Defaults to the title `warning`
    /// and [`ToastDuration::Long`].
    pub async fn warn(
        &self,
        message: &str,
        title: Option<&str>,
        duration: Option<ToastDuration>,
    ) -> ToastKey {
        self.publish(overrides(Toast::warning(message), title, duration))
            .await
    }

    /// Announce a failure to reach the backend, titled `error` and expiring
    /// after [`ToastDuration::Long`].
    pub async fn error(&self, message: &str) -> ToastKey {
        self.publish(Toast::error(message)).await
    }

    /// Surface a failed [`ResultSet`]; see [`Toast::from_result`] for the
    /// defaults `title` and `duration` replace.
    pub async fn exception(
        &self,
        result: &ResultSet,
        extra_message: Option<&str>,
        title: Option<&str>,
        duration: Option<ToastDuration>,
    ) -> ToastKey {
        let toast = Toast::from_result(result, extra_message);
        self.publish(overrides(toast, title, duration)).await
    }

    /// Remove the toast under `key`. Removing an absent key is a no-op.
    pub async fn dismiss(&self, key: &ToastKey) {
        let removed = self.inner.toasts.write().await.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "Toast dismissed");
            let _ = self.inner.sender.send(ToastEvent::Removed(key.clone()));
        }
    }

    /// The live toast under `key`, if it has not expired or been dismissed.
    pub async fn get(&self, key: &ToastKey) -> Option<Toast> {
        self.inner
            .toasts
            .read()
            .await
            .get(key)
            .map(|entry| entry.toast.clone())
    }

    /// Snapshot of the live toasts, newest first.
    pub async fn toasts(&self) -> Vec<Toast> {
        let map = self.inner.toasts.read().await;
        let mut entries: Vec<&Entry> = map.values().collect();
        entries.sort_by(|a, b| {
            b.toast
                .created_at
                .cmp(&a.toast.created_at)
                .then(b.generation.cmp(&a.generation))
        });
        entries.into_iter().map(|e| e.toast.clone()).collect()
    }

    /// Number of live toasts.
    pub async fn len(&self) -> usize {
        self.inner.toasts.read().await.len()
    }

    /// `true` when no toast is showing.
    pub async fn is_empty(&self) -> bool {
        self.inner.toasts.read().await.is_empty()
    }

    /// Cancel every pending expiry timer. Toasts already in the store stay.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn schedule_expiry(&self, key: ToastKey, generation: u64, delay: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.child_token();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(&key, generation).await;
                    }
                }
            }
        });
    }
}

/// Apply caller-supplied title and duration over a factory's defaults.
fn overrides(toast: Toast, title: Option<&str>, duration: Option<ToastDuration>) -> Toast {
    let toast = match title {
        Some(title) => toast.with_title(title),
        None => toast,
    };
    match duration {
        Some(duration) => toast.with_duration(duration),
        None => toast,
    }
}

impl Inner {
    /// Remove `key` only if it still holds the toast of `generation`.
    async fn expire(&self, key: &ToastKey, generation: u64) {
        let mut map = self.toasts.write().await;
        if map.get(key).is_some_and(|e| e.generation == generation) {
            map.remove(key);
            drop(map);
            tracing::debug!(key = %key, "Toast expired");
            let _ = self.sender.send(ToastEvent::Removed(key.clone()));
        }
    }
}
