//! The seam between a chat session and its transport.

use crate::error::Result;
use crate::relay::MessagePayload;

/// Events a transport delivers to the session reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A `receive_message` event arrived.
    Message(MessagePayload),
    /// An inbound frame could not be decoded.
    Malformed(String),
    /// The transport went away.
    Disconnected(String),
}

/// An open, duplex chat channel owned by exactly one session.
///
/// `emit` is fire-and-forget: it hands the payload to the transport and
/// returns without waiting for the relay. An `Err` means the transport
/// refused the payload locally (for example because it is already closed).
pub trait ChatChannel {
    /// Queues a `send_message` event.
    fn emit(&mut self, payload: MessagePayload) -> Result<()>;

    /// Stops listening and releases the transport. Must be idempotent.
    fn close(&mut self);

    /// Returns `true` once [`ChatChannel::close`] has run.
    fn is_closed(&self) -> bool;
}
