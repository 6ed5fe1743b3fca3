//! Long-lived live-channel connection.
//!
//! [`LiveChannel`] owns one background task that connects, forwards push
//! messages and reconnects with backoff whenever the socket drops.
//! Everything it observes is broadcast as a [`ChannelEvent`]; subscribers
//! treat [`ChannelEvent::Reconnected`] as the signal to re-fetch state.

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::client::LiveChannelClient;
use crate::messages::{parse_message, PushMessage};
use crate::reconnect::{reconnect_loop, BackoffConfig};

/// Broadcast channel capacity for channel events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something that happened on the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The first connection of this channel was established.
    Connected { client_id: String },
    /// The connection came back after a drop.
    Reconnected { client_id: String },
    /// The connection dropped.
    Disconnected,
    /// A push message arrived.
    Message(PushMessage),
}

/// Handle to the background live-channel task.
pub struct LiveChannel {
    event_tx: broadcast::Sender<ChannelEvent>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveChannel {
    /// Spawn the connection task. It runs until [`shutdown`](Self::shutdown)
    /// or until `parent` is cancelled.
    pub fn start(
        client: LiveChannelClient,
        config: BackoffConfig,
        parent: &CancellationToken,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = parent.child_token();

        let task = tokio::spawn({
            let event_tx = event_tx.clone();
            let cancel = cancel.clone();
            async move {
                tracing::info!(ws_url = client.ws_url(), "Starting live channel task");
                run_channel_loop(&client, &config, &event_tx, &cancel).await;
                tracing::info!("Live channel task exited");
            }
        });

        Self {
            event_tx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.event_tx.subscribe()
    }

    /// Stop the task and wait up to 5 seconds for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.task.lock().await.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }
    }
}

/// Connect -> forward messages -> reconnect, until cancelled.
async fn run_channel_loop(
    client: &LiveChannelClient,
    config: &BackoffConfig,
    event_tx: &broadcast::Sender<ChannelEvent>,
    cancel: &CancellationToken,
) {
    let first = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.connect() => result,
    };
    let mut conn = match first {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "Connection failed, entering reconnect loop");
            match reconnect_loop(client, config, cancel).await {
                Some(conn) => conn,
                None => return,
            }
        }
    };
    let _ = event_tx.send(ChannelEvent::Connected {
        client_id: conn.client_id.clone(),
    });

    loop {
        forward_messages(&mut conn.ws_stream, event_tx, cancel).await;
        let _ = event_tx.send(ChannelEvent::Disconnected);

        if cancel.is_cancelled() {
            return;
        }

        tracing::info!("Live channel lost, entering reconnect loop");
        conn = match reconnect_loop(client, config, cancel).await {
            Some(conn) => conn,
            None => return,
        };
        let _ = event_tx.send(ChannelEvent::Reconnected {
            client_id: conn.client_id.clone(),
        });
    }
}

/// Forward text frames as [`ChannelEvent::Message`] until the stream
/// closes, errors, or `cancel` fires.
pub async fn forward_messages<S>(
    stream: &mut S,
    event_tx: &broadcast::Sender<ChannelEvent>,
    cancel: &CancellationToken,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => match parse_message(&text) {
                Ok(msg) => {
                    let _ = event_tx.send(ChannelEvent::Message(msg));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed push message");
                }
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Live channel closed by backend");
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Live channel receive error");
                return;
            }
            None => return,
        }
    }
}

/// Publish the progress pushed for `context` (e.g. `tableExport`) into
/// `progress` until the channel closes or every receiver of `progress` is
/// gone.
pub async fn track_status(
    mut events: broadcast::Receiver<ChannelEvent>,
    context: String,
    progress: watch::Sender<Option<f64>>,
) {
    loop {
        let event = tokio::select! {
            _ = progress.closed() => return,
            event = events.recv() => event,
        };
        match event {
            Ok(ChannelEvent::Message(message)) => {
                if let Some(status) = message.status_for(&context) {
                    tracing::debug!(context = %context, status, "Status update");
                    progress.send_replace(Some(status));
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, context = %context, "Status listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    type Frame = Result<Message, tungstenite::Error>;

    fn frames(items: Vec<Frame>) -> impl Stream<Item = Frame> + Unpin {
        futures::stream::iter(items)
    }

    #[tokio::test]
    async fn forwards_text_and_skips_garbage() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut stream = frames(vec![
            Ok(Message::Text(r#"{"context":"tableExport","status":0.5}"#.into())),
            Ok(Message::Text("garbage".into())),
            Ok(Message::Ping(vec![])),
            Ok(Message::Text(r#"{"id":"x"}"#.into())),
        ]);

        forward_messages(&mut stream, &tx, &CancellationToken::new()).await;

        assert_matches!(rx.try_recv(), Ok(ChannelEvent::Message(m)) if m.status_for("tableExport") == Some(0.5));
        assert_matches!(rx.try_recv(), Ok(ChannelEvent::Message(PushMessage::Other(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stops_at_close_frame() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut stream = frames(vec![
            Ok(Message::Close(None)),
            Ok(Message::Text(r#"{"id":"late"}"#.into())),
        ]);

        forward_messages(&mut stream, &tx, &CancellationToken::new()).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn tracks_status_of_one_context() {
        let (tx, rx) = broadcast::channel(8);
        let (progress_tx, mut progress) = watch::channel(None);
        let task = tokio::spawn(track_status(rx, "tableExport".into(), progress_tx));

        let status = |json: &str| ChannelEvent::Message(parse_message(json).unwrap());
        tx.send(status(r#"{"context":"schemaImport","status":0.9}"#)).unwrap();
        tx.send(ChannelEvent::Disconnected).unwrap();
        tx.send(status(r#"{"context":"tableExport","status":0.25}"#)).unwrap();

        progress.changed().await.unwrap();
        assert_eq!(*progress.borrow(), Some(0.25));

        drop(tx);
        task.await.unwrap();
        assert_eq!(*progress.borrow(), Some(0.25));
    }

    #[tokio::test]
    async fn tracking_ends_when_nobody_watches() {
        let (tx, rx) = broadcast::channel::<ChannelEvent>(8);
        let (progress_tx, progress) = watch::channel(None);
        let task = tokio::spawn(track_status(rx, "tableExport".into(), progress_tx));

        drop(progress);
        task.await.unwrap();
        assert_eq!(tx.receiver_count(), 0);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let (tx, _rx) = broadcast::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream = futures::stream::pending::<Frame>();

        forward_messages(&mut stream, &tx, &cancel).await;
    }
}
