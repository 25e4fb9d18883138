#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use chat_api::config::Config;
use chat_api::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsWrite = SplitSink<WsStream, tungstenite::Message>;
pub type WsRead = SplitStream<WsStream>;

/// Build a fresh AppState with default configuration.
pub fn test_state() -> AppState {
    AppState::new(Config::default())
}

/// Build the full application router wired to a fresh state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = chat_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background for the rest of the test.
pub async fn start_ws_server() -> (SocketAddr, AppState) {
    let (app, state) = test_app();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Open a gateway connection.
pub async fn connect(addr: SocketAddr) -> (WsWrite, WsRead) {
    let url = format!("ws://{addr}/gateway");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream.split()
}

/// Send a `{t, d}` frame.
pub async fn send_event(write: &mut WsWrite, event: &str, data: serde_json::Value) {
    let frame = serde_json::json!({ "t": event, "d": data });
    write
        .send(tungstenite::Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// Read the next `{t, s, d}` frame.
pub async fn next_frame(read: &mut WsRead) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), read.next())
            .await
            .expect("timeout")
            .expect("stream ended")
            .expect("read error");
        if let tungstenite::Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("parse frame");
        }
    }
}

/// Read frames until one named `event` arrives and return its `d`.
pub async fn expect_event(read: &mut WsRead, event: &str) -> serde_json::Value {
    loop {
        let frame = next_frame(read).await;
        if frame["t"] == event {
            return frame["d"].clone();
        }
    }
}

/// Assert that no frame arrives within a short window.
pub async fn assert_silent(read: &mut WsRead) {
    let result = time::timeout(Duration::from_millis(200), read.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

/// Connect and register as `username`. Returns the registered user record
/// with the join sequence fully consumed.
pub async fn join_as(addr: SocketAddr, username: &str) -> (WsWrite, WsRead, serde_json::Value) {
    let (mut write, mut read) = connect(addr).await;
    send_event(&mut write, "user-join", serde_json::json!({ "username": username })).await;
    let user = expect_event(&mut read, "user-registered").await;
    expect_event(&mut read, "room-history").await;
    (write, read, user)
}
