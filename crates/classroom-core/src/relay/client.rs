//! WebSocket client side of the chat relay.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

use super::{MessagePayload, RelayEvent};
use crate::chat::{ChannelEvent, ChatChannel};
use crate::error::{ClassroomError, Result};

/// A live connection to the chat relay.
///
/// Socket I/O runs on a background task. Emits are queued to that task and
/// never block; inbound `receive_message` frames are forwarded to the
/// receiver returned by [`RelayChannel::connect`]. Closing (or dropping) the
/// channel ends the task, which closes the socket and the inbound stream.
#[derive(Debug)]
pub struct RelayChannel {
    endpoint: String,
    outbound: Option<mpsc::UnboundedSender<RelayEvent>>,
}

impl RelayChannel {
    /// Dials the relay and starts listening for inbound events.
    pub async fn connect(
        endpoint: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let (ws_stream, _) = connect_async(endpoint)
            .await
            .map_err(|e| ClassroomError::connection(endpoint, e.to_string()))?;
        info!(%endpoint, "Connected to chat relay");

        let (mut sink, mut stream) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<RelayEvent>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ChannelEvent>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = out_rx.recv() => {
                        let Some(event) = frame else {
                            debug!("Relay channel closed by owner");
                            let _ = sink.close().await;
                            break;
                        };
                        let json = match event.to_json() {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode relay event");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(WsMessage::Text(json)).await {
                            let _ = in_tx.send(ChannelEvent::Disconnected(e.to_string()));
                            break;
                        }
                    }

                    msg = stream.next() => {
                        match msg {
                            Some(Ok(WsMessage::Text(text))) => {
                                let event = match RelayEvent::from_json(&text) {
                                    Ok(RelayEvent::ReceiveMessage(payload)) => {
                                        ChannelEvent::Message(payload)
                                    }
                                    Ok(other) => ChannelEvent::Malformed(format!(
                                        "unexpected '{}' event from relay",
                                        other.event_name()
                                    )),
                                    Err(e) => ChannelEvent::Malformed(e.to_string()),
                                };
                                if in_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) | None => {
                                let _ = in_tx.send(ChannelEvent::Disconnected(
                                    "relay closed the connection".to_string(),
                                ));
                                break;
                            }
                            // Pings are answered by tungstenite itself
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                let _ = in_tx.send(ChannelEvent::Disconnected(e.to_string()));
                                break;
                            }
                        }
                    }
                }
            }
            debug!("Relay I/O task finished");
        });

        Ok((
            Self {
                endpoint: endpoint.to_string(),
                outbound: Some(out_tx),
            },
            in_rx,
        ))
    }

    /// The endpoint this channel was dialed to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatChannel for RelayChannel {
    fn emit(&mut self, payload: MessagePayload) -> Result<()> {
        let Some(outbound) = &self.outbound else {
            return Err(ClassroomError::send_failure("relay channel is closed"));
        };
        outbound
            .send(RelayEvent::SendMessage(payload))
            .map_err(|_| ClassroomError::send_failure("relay connection has ended"))
    }

    fn close(&mut self) {
        if self.outbound.take().is_some() {
            info!(endpoint = %self.endpoint, "Closing chat relay channel");
        }
    }

    fn is_closed(&self) -> bool {
        self.outbound.is_none()
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        self.close();
    }
}
