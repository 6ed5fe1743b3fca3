//! Push messages delivered over the live channel.
//!
//! The backend pushes JSON frames independent of any request. Status frames
//! have the shape `{"context": "<topic>", "status": <progress>}`; anything
//! else (information-object updates and the like) is kept as raw JSON.

use serde::Deserialize;

/// A parsed live-channel frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PushMessage {
    /// Progress of a long-running backend task.
    Status(StatusUpdate),
    /// Any other well-formed JSON frame.
    Other(serde_json::Value),
}

/// Progress report for a named context, e.g. `tableExport`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdate {
    pub context: String,
    pub status: f64,
}

impl PushMessage {
    /// Progress reported for `context`, if this is a status frame for it.
    pub fn status_for(&self, context: &str) -> Option<f64> {
        match self {
            PushMessage::Status(update) if update.context == context => Some(update.status),
            _ => None,
        }
    }
}

/// Parse a text frame. Returns `Err` only for malformed JSON.
pub fn parse_message(text: &str) -> Result<PushMessage, serde_json::Error> {
    serde_json::from_str(text)
}
