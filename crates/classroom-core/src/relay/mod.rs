//! Chat relay wire protocol, client channel and server.
//!
//! The relay speaks JSON text frames over a WebSocket. Every frame is an
//! object with an `event` name and a `payload`:
//!
//! - `send_message` - client to relay, `{ "text": ... }`
//! - `receive_message` - relay to client, `{ "text": ... }`
//!
//! There is no acknowledgment, authentication or reconnection protocol.
//!
//! # Example
//!
//! ```
//! use classroom_core::relay::RelayEvent;
//!
//! let event = RelayEvent::send_message("hello");
//! let json = event.to_json().unwrap();
//! assert_eq!(json, r#"{"event":"send_message","payload":{"text":"hello"}}"#);
//! ```

pub mod client;
pub mod server;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::RelayChannel;
pub use server::{ws_handler, RelayHub};

/// Payload shared by both relay events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message text.
    pub text: String,
}

impl MessagePayload {
    /// Creates a payload with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Events exchanged with the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RelayEvent {
    /// Outbound chat message.
    SendMessage(MessagePayload),
    /// Inbound chat message.
    ReceiveMessage(MessagePayload),
}

impl RelayEvent {
    /// Creates a `SendMessage` event.
    #[must_use]
    pub fn send_message(text: impl Into<String>) -> Self {
        Self::SendMessage(MessagePayload::new(text))
    }

    /// Creates a `ReceiveMessage` event.
    #[must_use]
    pub fn receive_message(text: impl Into<String>) -> Self {
        Self::ReceiveMessage(MessagePayload::new(text))
    }

    /// Returns the event name as it appears on the wire.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "send_message",
            Self::ReceiveMessage(_) => "receive_message",
        }
    }

    /// Returns the payload of either event.
    #[must_use]
    pub const fn payload(&self) -> &MessagePayload {
        match self {
            Self::SendMessage(payload) | Self::ReceiveMessage(payload) => payload,
        }
    }

    /// Encodes the event as a JSON text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an event from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
