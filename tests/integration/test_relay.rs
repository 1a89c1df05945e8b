//! Integration tests for the chat relay.
//!
//! These tests run the real relay server and connect chat sessions and raw
//! WebSocket clients to it, validating delivery order, echo suppression and
//! connection lifecycle.

use std::net::TcpListener;
use std::time::Duration;

use classroom_core::{
    create_router, AppState, ChannelEvent, ChatChannel, ChatMessage, ChatSession, ClassroomError,
    Config, ConnectionState, Delivery, MessagePayload, RelayChannel, RelayHub, Sender,
    StatusResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for raw WebSocket clients.
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A chat session together with its inbound event stream.
type Client = (ChatSession<RelayChannel>, UnboundedReceiver<ChannelEvent>);

/// A running test server.
struct TestServer {
    config: Config,
    hub: RelayHub,
    http_base: String,
}

/// Spawns the relay server and returns a config pointing at it.
async fn spawn_test_server() -> TestServer {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let config = Config {
        relay_endpoint: format!("ws://{addr}/ws"),
        api_base_url: format!("http://{addr}/api"),
        ..Config::default()
    };
    let state = AppState::new(config.clone());
    let hub = state.hub.clone();

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        config,
        hub,
        http_base: format!("http://{addr}"),
    }
}

/// Waits until the hub has registered exactly `n` clients.
async fn wait_for_clients(hub: &RelayHub, n: usize) {
    timeout(Duration::from_secs(5), async {
        while hub.connected_clients() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("Timeout waiting for {n} relay clients"));
}

/// Opens a chat session against the test server.
async fn connect_session(server: &TestServer) -> Client {
    ChatSession::connect(&server.config)
        .await
        .expect("Failed to connect chat session")
}

/// Connects a raw WebSocket client.
async fn connect_raw(server: &TestServer) -> WsClient {
    let (ws_stream, _) = connect_async(server.config.relay_endpoint.as_str())
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Feeds inbound events to the session until a message is appended.
async fn next_message(client: &mut Client) -> ChatMessage {
    let (session, inbound) = client;
    loop {
        let event = timeout(Duration::from_secs(5), inbound.recv())
            .await
            .expect("Timeout waiting for relay event")
            .expect("Inbound stream ended");
        if let Some(message) = session.handle_event(event) {
            return message.clone();
        }
    }
}

/// Asserts that nothing arrives on the inbound stream for a short while.
async fn assert_silent(client: &mut Client) {
    let (_, inbound) = client;
    let result = timeout(Duration::from_millis(200), inbound.recv()).await;
    assert!(result.is_err(), "Expected no relay event, got: {result:?}");
}

/// Receives the next text frame from a raw client, answering pings.
async fn receive_text(client: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse frame");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

// ============================================================================
// Delivery Tests
// ============================================================================

/// Messages sent by one session arrive at the other in send order.
#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    for text in ["A", "B", "C"] {
        let message = alice.0.send_message(text).expect("send failed");
        assert_eq!(message.delivery, Delivery::Sent);
    }

    for expected in ["A", "B", "C"] {
        let message = next_message(&mut bob).await;
        assert_eq!(message.text, expected);
        assert_eq!(message.sender, Sender::RemoteServer);
        assert_eq!(message.author.name, "Server");
    }

    let bob_texts: Vec<&str> = bob.0.transcript().texts().collect();
    assert_eq!(bob_texts, vec!["A", "B", "C"]);

    let alice_texts: Vec<&str> = alice.0.transcript().texts().collect();
    assert_eq!(alice_texts, vec!["A", "B", "C"]);
    assert!(alice
        .0
        .transcript()
        .messages()
        .iter()
        .all(|m| m.sender == Sender::LocalUser && m.author.name == "User"));
}

/// The relay never echoes a message back to its sender.
#[tokio::test]
async fn test_sender_does_not_receive_echo() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    alice.0.send_message("hello").expect("send failed");

    assert_eq!(next_message(&mut bob).await.text, "hello");
    assert_silent(&mut alice).await;
    assert_eq!(alice.0.transcript().len(), 1);
}

/// Local and remote messages interleave in the order they were applied.
#[tokio::test]
async fn test_conversation_interleaves() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    alice.0.send_message("ping").expect("send failed");
    next_message(&mut bob).await;
    bob.0.send_message("pong").expect("send failed");
    next_message(&mut alice).await;
    alice.0.send_message("done").expect("send failed");
    next_message(&mut bob).await;

    let senders: Vec<(String, Sender)> = alice
        .0
        .transcript()
        .messages()
        .iter()
        .map(|m| (m.text.clone(), m.sender))
        .collect();
    assert_eq!(
        senders,
        vec![
            ("ping".to_string(), Sender::LocalUser),
            ("pong".to_string(), Sender::RemoteServer),
            ("done".to_string(), Sender::LocalUser),
        ]
    );

    let bob_texts: Vec<&str> = bob.0.transcript().texts().collect();
    assert_eq!(bob_texts, vec!["ping", "pong", "done"]);
}

/// Every other client receives a broadcast message.
#[tokio::test]
async fn test_message_fans_out_to_all_other_clients() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    let mut bob = connect_session(&server).await;
    let mut carol = connect_session(&server).await;
    wait_for_clients(&server.hub, 3).await;

    carol.0.send_message("hi all").expect("send failed");

    assert_eq!(next_message(&mut alice).await.text, "hi all");
    assert_eq!(next_message(&mut bob).await.text, "hi all");
    assert_silent(&mut carol).await;
}

/// Empty input is refused locally and never reaches the relay.
#[tokio::test]
async fn test_empty_message_is_not_sent() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    let err = alice.0.send_message("   ").unwrap_err();
    assert!(matches!(err, ClassroomError::EmptyMessage));
    assert!(alice.0.transcript().is_empty());
    assert_silent(&mut bob).await;
}

// ============================================================================
// Wire Format Tests
// ============================================================================

/// Raw clients see the `{event, payload}` frame format.
#[tokio::test]
async fn test_raw_clients_use_event_payload_frames() {
    let server = spawn_test_server().await;
    let mut sender = connect_raw(&server).await;
    let mut receiver = connect_raw(&server).await;
    wait_for_clients(&server.hub, 2).await;

    sender
        .send(Message::Text(
            r#"{"event":"send_message","payload":{"text":"raw hello"}}"#.to_string(),
        ))
        .await
        .expect("Failed to send");

    let frame = receive_text(&mut receiver).await;
    assert_eq!(frame["event"], "receive_message");
    assert_eq!(frame["payload"]["text"], "raw hello");
}

/// Malformed frames are dropped and later frames still flow.
#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let server = spawn_test_server().await;
    let mut sender = connect_raw(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    for junk in [
        "not json",
        r#"{"event":"shout","payload":{"text":"x"}}"#,
        r#"{"event":"send_message"}"#,
    ] {
        sender
            .send(Message::Text(junk.to_string()))
            .await
            .expect("Failed to send");
    }
    sender
        .send(Message::Text(
            r#"{"event":"send_message","payload":{"text":"valid"}}"#.to_string(),
        ))
        .await
        .expect("Failed to send");

    assert_eq!(next_message(&mut bob).await.text, "valid");
    assert_eq!(bob.0.transcript().len(), 1);
}

/// A `receive_message` frame pushed to a session is appended as remote.
#[tokio::test]
async fn test_session_receives_frames_from_raw_client() {
    let server = spawn_test_server().await;
    let mut raw = connect_raw(&server).await;
    let mut bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    raw.send(Message::Text(
        r#"{"event":"send_message","payload":{"text":"from raw"}}"#.to_string(),
    ))
    .await
    .expect("Failed to send");

    let message = next_message(&mut bob).await;
    assert_eq!(message.text, "from raw");
    assert_eq!(message.delivery, Delivery::Received);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

/// Closing a session releases its relay connection.
#[tokio::test]
async fn test_close_releases_connection() {
    let server = spawn_test_server().await;
    let alice = connect_session(&server).await;
    let (bob, _bob_inbound) = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    bob.close();
    wait_for_clients(&server.hub, 1).await;

    drop(alice);
    wait_for_clients(&server.hub, 0).await;
}

/// Closing a channel ends its I/O task: the inbound stream finishes and the
/// relay sees a clean close.
#[tokio::test]
async fn test_channel_close_ends_io_task() {
    let server = spawn_test_server().await;
    let (mut channel, mut inbound) = RelayChannel::connect(&server.config.relay_endpoint)
        .await
        .expect("Failed to connect channel");
    wait_for_clients(&server.hub, 1).await;

    channel.close();
    assert!(channel.is_closed());

    let end = timeout(Duration::from_secs(5), inbound.recv())
        .await
        .expect("Timeout waiting for inbound stream to end");
    assert!(end.is_none(), "Expected end of stream, got: {end:?}");
    wait_for_clients(&server.hub, 0).await;

    let err = channel.emit(MessagePayload::new("late")).unwrap_err();
    assert!(matches!(err, ClassroomError::SendFailure { .. }));
}

/// Dropping a session has the same effect as closing it.
#[tokio::test]
async fn test_drop_releases_connection() {
    let server = spawn_test_server().await;
    {
        let _client = connect_session(&server).await;
        wait_for_clients(&server.hub, 1).await;
    }
    wait_for_clients(&server.hub, 0).await;
}

/// A session with nobody else connected still sends successfully.
#[tokio::test]
async fn test_send_without_peers() {
    let server = spawn_test_server().await;
    let mut alice = connect_session(&server).await;
    wait_for_clients(&server.hub, 1).await;

    let message = alice.0.send_message("anyone?").expect("send failed");
    assert_eq!(message.delivery, Delivery::Sent);
    assert_silent(&mut alice).await;
    assert_eq!(alice.0.connection(), &ConnectionState::Connected);
}

/// Connecting to a dead endpoint fails with a connection error.
#[tokio::test]
async fn test_connect_to_unreachable_relay() {
    let port = find_available_port();
    let config = Config {
        relay_endpoint: format!("ws://127.0.0.1:{port}/ws"),
        ..Config::default()
    };

    let err = ChatSession::connect(&config).await.unwrap_err();
    assert!(matches!(err, ClassroomError::ConnectionError { .. }));
}

/// The status endpoint reports connected relay clients.
#[tokio::test]
async fn test_status_reports_connected_clients() {
    let server = spawn_test_server().await;
    let _alice = connect_session(&server).await;
    let _bob = connect_session(&server).await;
    wait_for_clients(&server.hub, 2).await;

    let status: StatusResponse = reqwest::get(format!("{}/api/status", server.http_base))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid status body");

    assert_eq!(status.connected_clients, 2);
}
