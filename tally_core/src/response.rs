//! Wire-facing response types shared with the transport layer.

use serde::Serialize;

/// Visibility of a response in the chat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    /// Broadcast to every participant.
    #[serde(rename = "in_channel")]
    Channel,
    /// Private echo to the invoking user only.
    #[serde(rename = "ephemeral")]
    Ephemeral,
}

/// A message for the transport layer to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub response_type: ResponseType,
    pub text: String,
}

impl Response {
    pub fn channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Channel,
            text: text.into(),
        }
    }

    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }
}
