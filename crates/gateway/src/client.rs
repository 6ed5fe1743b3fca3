//! WebSocket client for the backend's live channel.
//!
//! [`LiveChannelClient`] holds the endpoint configuration. Call
//! [`LiveChannelClient::connect`] to establish a [`LiveConnection`].

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// The raw WebSocket stream of a live connection.
pub type LiveStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for the live channel endpoint.
#[derive(Debug, Clone)]
pub struct LiveChannelClient {
    ws_url: String,
}

/// An established live-channel connection.
pub struct LiveConnection {
    /// Client ID sent during the handshake, new for every connection.
    pub client_id: String,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: LiveStream,
}

impl LiveChannelClient {
    /// * `ws_url` - full WebSocket endpoint, e.g. `ws://host:8080/webSocket`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the live channel.
    ///
    /// Generates a `clientId` (UUID v4) and appends it as a query
    /// parameter so backend logs can correlate the session.
    pub async fn connect(&self) -> Result<LiveConnection, LiveChannelError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let separator = if self.ws_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{separator}clientId={client_id}", self.ws_url);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            LiveChannelError::Connection(format!(
                "Failed to connect to live channel at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(client_id = %client_id, "Connected to live channel at {}", self.ws_url);

        Ok(LiveConnection {
            client_id,
            ws_stream,
        })
    }
}

/// Errors that can occur on the live channel.
#[derive(Debug, thiserror::Error)]
pub enum LiveChannelError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}
