//! Relay server: fans `send_message` frames out to the other clients.
//!
//! Each WebSocket connection gets a numeric id. A `send_message` frame from
//! connection `n` is published on a broadcast channel and delivered as
//! `receive_message` to every connection except `n`; the sender never sees
//! its own message echoed back. Nothing is persisted for clients that are
//! not connected.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::RelayEvent;
use crate::api::AppState;

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// A message published to the hub, tagged with the connection it came from.
#[derive(Debug, Clone)]
pub struct RelayFrame {
    /// Connection that sent the message.
    pub origin: u64,
    /// Message text.
    pub text: String,
}

/// Pub-sub hub shared by all relay connections.
#[derive(Debug, Clone)]
pub struct RelayHub {
    sender: broadcast::Sender<RelayFrame>,
    next_id: Arc<AtomicU64>,
    connected: Arc<AtomicUsize>,
}

impl RelayHub {
    /// Creates a hub whose subscribers buffer up to `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
            connected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers a new connection.
    ///
    /// The returned guard holds the connection id and unregisters the
    /// connection when dropped.
    #[must_use]
    pub fn register(&self) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connected.fetch_add(1, Ordering::Relaxed);
        Registration {
            id,
            connected: Arc::clone(&self.connected),
        }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RelayFrame> {
        self.sender.subscribe()
    }

    /// Publishes a frame. Returns the number of subscribers it reached.
    pub fn publish(&self, origin: u64, text: impl Into<String>) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender
            .send(RelayFrame {
                origin,
                text: text.into(),
            })
            .unwrap_or(0)
    }

    /// Number of currently registered connections.
    #[must_use]
    pub fn connected_clients(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(100)
    }
}

/// A registered relay connection. Unregisters on drop.
#[derive(Debug)]
pub struct Registration {
    id: u64,
    connected: Arc<AtomicUsize>,
}

impl Registration {
    /// The connection id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.connected.fetch_sub(1, Ordering::Relaxed);
    }
}

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New relay connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a single relay connection.
///
/// - Relays inbound `send_message` frames to the other clients
/// - Forwards other clients' messages as `receive_message`
/// - Sends heartbeat pings and closes after 3 missed pongs
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before registering so a counted client never misses a frame
    let mut frames = state.hub.subscribe();
    let registration = state.hub.register();
    let conn_id = registration.id();

    info!(conn_id, "Relay client connected");

    let mut heartbeat_interval = interval(Duration::from_secs(state.config.heartbeat_seconds));
    // The first tick completes immediately
    heartbeat_interval.tick().await;
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match RelayEvent::from_json(&text) {
                        Ok(RelayEvent::SendMessage(payload)) => {
                            let reached = state.hub.publish(conn_id, payload.text);
                            debug!(conn_id, reached, "Relayed chat message");
                        }
                        Ok(other) => {
                            debug!(conn_id, event = other.event_name(), "Ignoring event from client");
                        }
                        Err(e) => {
                            warn!(conn_id, error = %e, "Ignoring malformed frame");
                        }
                    },
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(conn_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(conn_id, "Client requested close");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(conn_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                }
            }

            frame = frames.recv() => {
                match frame {
                    Ok(frame) if frame.origin == conn_id => {}
                    Ok(frame) => {
                        let json = match RelayEvent::receive_message(frame.text).to_json() {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode relay event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!(conn_id, "Failed to forward message, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(conn_id, missed = n, "Relay client lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!(conn_id, "Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    drop(registration);
    info!(conn_id, "Relay client disconnected");
}
