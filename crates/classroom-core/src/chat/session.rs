//! The chat session reducer.
//!
//! A [`ChatSession`] owns one [`ChatChannel`] for its whole lifetime. The
//! channel is acquired before the session is built and released when the
//! session is closed or dropped, so a session can never hold two channels
//! and never leaks one.
//!
//! All mutation goes through `&mut self`: user input (`send_message`,
//! `toggle_open`) and channel events (`handle_event`) are applied one at a
//! time in the order the caller feeds them. The transcript is append-only.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::channel::{ChannelEvent, ChatChannel};
use super::message::{ChatMessage, Delivery, Participant, Transcript};
use crate::config::Config;
use crate::error::{ClassroomError, Result};
use crate::relay::{MessagePayload, RelayChannel};

/// The two identities a session attributes messages to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    /// The user typing into this session.
    pub local: Participant,
    /// The relay side.
    pub remote: Participant,
}

impl Participants {
    /// Creates a participant pair.
    #[must_use]
    pub const fn new(local: Participant, remote: Participant) -> Self {
        Self { local, remote }
    }

    /// Reads both identities from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.local_user.clone(), config.remote_user.clone())
    }
}

/// Health of the session's channel as observed by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// The channel is live.
    Connected,
    /// The transport reported a disconnect.
    Lost {
        /// Reason reported by the transport.
        reason: String,
    },
    /// The session was closed.
    Closed,
}

/// Chat widget state: transcript, expansion flag and the owned channel.
#[derive(Debug)]
pub struct ChatSession<C: ChatChannel> {
    channel: C,
    participants: Participants,
    transcript: Transcript,
    is_open: bool,
    connection: ConnectionState,
}

impl ChatSession<RelayChannel> {
    /// Connects to the configured relay and opens a session on the channel.
    ///
    /// Returns the session together with the inbound event stream that the
    /// caller feeds back through [`ChatSession::handle_event`].
    pub async fn connect(
        config: &Config,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let (channel, inbound) = RelayChannel::connect(&config.relay_endpoint).await?;
        Ok((Self::open(channel, Participants::from_config(config)), inbound))
    }
}

impl<C: ChatChannel> ChatSession<C> {
    /// Opens a session on an already connected channel.
    ///
    /// The widget starts collapsed with an empty transcript.
    pub fn open(channel: C, participants: Participants) -> Self {
        info!(local = %participants.local.name, "Chat session opened");
        Self {
            channel,
            participants,
            transcript: Transcript::new(),
            is_open: false,
            connection: ConnectionState::Connected,
        }
    }

    /// Appends a locally authored message and emits it to the relay.
    ///
    /// The message is appended before the emit and stays in the transcript
    /// whatever the emit outcome. A locally refused emit is recorded as
    /// [`Delivery::Failed`] on the entry. Empty or whitespace-only text is
    /// rejected without touching the transcript.
    pub fn send_message(&mut self, text: &str) -> Result<&ChatMessage> {
        if text.trim().is_empty() {
            return Err(ClassroomError::EmptyMessage);
        }

        let delivery = match self.channel.emit(MessagePayload::new(text)) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!(error = %e, "Chat message not handed to relay");
                Delivery::Failed
            }
        };

        debug!(?delivery, "Appending local chat message");
        let message = ChatMessage::local(text, &self.participants.local, delivery);
        Ok(self.transcript.append(message))
    }

    /// Appends a message delivered by the relay.
    pub fn on_message_received(&mut self, payload: MessagePayload) -> &ChatMessage {
        debug!("Appending received chat message");
        let message = ChatMessage::remote(payload.text, &self.participants.remote);
        self.transcript.append(message)
    }

    /// Applies one channel event.
    ///
    /// Returns the appended message for `Message` events. Malformed frames
    /// and disconnects never reach the transcript.
    pub fn handle_event(&mut self, event: ChannelEvent) -> Option<&ChatMessage> {
        match event {
            ChannelEvent::Message(payload) => Some(self.on_message_received(payload)),
            ChannelEvent::Malformed(reason) => {
                warn!(%reason, "Dropping malformed relay frame");
                None
            }
            ChannelEvent::Disconnected(reason) => {
                if self.connection != ConnectionState::Closed {
                    warn!(%reason, "Chat relay disconnected");
                    self.connection = ConnectionState::Lost { reason };
                }
                None
            }
        }
    }

    /// Flips the widget between collapsed and expanded.
    ///
    /// Returns the new `is_open` value. The channel stays live either way.
    pub fn toggle_open(&mut self) -> bool {
        self.is_open = !self.is_open;
        debug!(is_open = self.is_open, "Chat widget toggled");
        self.is_open
    }

    /// Closes the session, releasing the channel.
    ///
    /// The transcript is discarded with the session.
    pub fn close(mut self) {
        self.detach();
    }

    /// The transcript in append order.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether the widget is expanded.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Current connection state.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// The identities messages are attributed to.
    #[must_use]
    pub const fn participants(&self) -> &Participants {
        &self.participants
    }

    /// The owned channel.
    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    fn detach(&mut self) {
        if !self.channel.is_closed() {
            self.channel.close();
            info!(messages = self.transcript.len(), "Chat session closed");
        }
        self.connection = ConnectionState::Closed;
    }
}

impl<C: ChatChannel> Drop for ChatSession<C> {
    fn drop(&mut self) {
        self.detach();
    }
}
