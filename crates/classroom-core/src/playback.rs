//! The "current playback URL" slot shared between lesson viewer and player.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Receives the URL of the video selected for playback.
pub trait PlaybackSink: Send + Sync {
    /// Replaces the current playback URL.
    fn set_playback_url(&self, url: &str);
}

/// Single-value slot backed by a watch channel.
///
/// Cloning the slot shares it. Players call [`PlaybackSlot::subscribe`] and
/// observe every change.
#[derive(Debug, Clone)]
pub struct PlaybackSlot {
    sender: Arc<watch::Sender<Option<String>>>,
}

impl PlaybackSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribes to slot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// The URL currently loaded, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }
}

impl Default for PlaybackSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for PlaybackSlot {
    fn set_playback_url(&self, url: &str) {
        debug!(%url, "Loading playback URL");
        self.sender.send_replace(Some(url.to_string()));
    }
}
