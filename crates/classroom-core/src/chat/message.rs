//! Chat message and transcript types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat participant as shown next to their messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable participant identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Creates a new participant.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which side of the relay a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Typed by the local user.
    LocalUser,
    /// Delivered by the relay.
    RemoteServer,
}

/// Delivery status recorded when a message is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Handed to the relay channel. Not acknowledged.
    Sent,
    /// The relay channel refused the message.
    Failed,
    /// Arrived from the relay.
    Received,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique within the session.
    pub id: Uuid,
    /// Display text.
    pub text: String,
    /// When the message was appended.
    pub created_at: DateTime<Utc>,
    /// Origin of the message.
    pub sender: Sender,
    /// Identity displayed with the message.
    pub author: Participant,
    /// Delivery status at append time.
    pub delivery: Delivery,
}

impl ChatMessage {
    /// Creates a locally authored message.
    #[must_use]
    pub fn local(text: impl Into<String>, author: &Participant, delivery: Delivery) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            created_at: Utc::now(),
            sender: Sender::LocalUser,
            author: author.clone(),
            delivery,
        }
    }

    /// Creates a message received from the relay.
    #[must_use]
    pub fn remote(text: impl Into<String>, author: &Participant) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            created_at: Utc::now(),
            sender: Sender::RemoteServer,
            author: author.clone(),
            delivery: Delivery::Received,
        }
    }

    /// Display name of the author.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        &self.author.name
    }

    /// Returns `true` if the relay refused this message.
    #[must_use]
    pub fn delivery_failed(&self) -> bool {
        self.delivery == Delivery::Failed
    }
}

/// Append-only, ordered log of chat messages.
///
/// Stored oldest-first; [`Transcript::newest_first`] yields the render order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a message and returns a reference to it.
    pub(crate) fn append(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in append order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages in render order, newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().rev()
    }

    /// The most recently appended message.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Message texts in append order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.text.as_str())
    }
}
