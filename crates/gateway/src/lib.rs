//! Backend access for the polyadmin console.
//!
//! Provides the [`Gateway`](gateway::Gateway) seam over the request/response
//! endpoints, an HTTP implementation of it, and the live WebSocket channel
//! with reconnection logic whose reconnects drive re-fetches upstream.

pub mod api;
pub mod channel;
pub mod client;
pub mod gateway;
pub mod messages;
pub mod reconnect;

pub use gateway::{Gateway, GatewayError};
