//! Realtime chat session.
//!
//! - [`message`] - transcript entries and the append-only [`Transcript`]
//! - [`channel`] - the [`ChatChannel`] seam and the events it delivers
//! - [`session`] - the [`ChatSession`] reducer that owns one channel

pub mod channel;
pub mod message;
pub mod session;

pub use channel::{ChannelEvent, ChatChannel};
pub use message::{ChatMessage, Delivery, Participant, Sender, Transcript};
pub use session::{ChatSession, ConnectionState, Participants};
