mod common;

use chrono::Utc;
use futures_util::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite;

use common::{assert_silent, connect, expect_event, join_as, next_frame, send_event};

#[tokio::test]
async fn user_join_sequence_and_frame_shape() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut write, mut read) = connect(addr).await;

    send_event(&mut write, "user-join", json!({ "username": "alice" })).await;

    let registered = next_frame(&mut read).await;
    assert_eq!(registered["t"], "user-registered");
    assert_eq!(registered["s"], 1);
    let user = &registered["d"];
    assert!(user["id"].as_str().unwrap().starts_with("usr_"));
    assert_eq!(user["username"], "alice");
    assert_eq!(user["online"], true);
    assert_eq!(user["currentRoom"], "general");

    let presence = next_frame(&mut read).await;
    assert_eq!(presence["t"], "online-users-update");
    assert_eq!(presence["s"], 2);
    assert_eq!(presence["d"].as_array().unwrap().len(), 1);

    let history = next_frame(&mut read).await;
    assert_eq!(history["t"], "room-history");
    assert_eq!(history["d"]["room"], "general");
    assert!(history["d"]["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_join_gets_generated_name() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut write, mut read) = connect(addr).await;

    send_event(&mut write, "user-join", json!({})).await;

    let user = expect_event(&mut read, "user-registered").await;
    let id = user["id"].as_str().unwrap();
    let expected = format!("User-{}", &id[id.len() - 8..]);
    assert_eq!(user["username"], expected.as_str());
}

#[tokio::test]
async fn room_message_reaches_members_and_is_replayed() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (_bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;

    let joined = expect_event(&mut alice_rx, "user-joined").await;
    assert_eq!(joined["user"], "bob");
    assert_eq!(joined["message"], "bob joined the chat");
    assert_eq!(joined["onlineUsers"], 2);

    send_event(&mut alice_tx, "send-message", json!({ "text": "hi" })).await;

    for rx in [&mut alice_rx, &mut bob_rx] {
        let msg = expect_event(rx, "new-message").await;
        assert_eq!(msg["text"], "hi");
        assert_eq!(msg["user"], "alice");
        assert_eq!(msg["room"], "general");
        assert_eq!(msg["isPrivate"], false);
        assert_eq!(msg["status"], "delivered");
    }

    // A third user sees the message in the replayed history.
    let (mut carol_tx, mut carol_rx) = connect(addr).await;
    send_event(&mut carol_tx, "user-join", json!({ "username": "carol" })).await;
    let history = expect_event(&mut carol_rx, "room-history").await;
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hi");
}

#[tokio::test]
async fn typing_is_not_echoed_to_sender() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (_bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;
    expect_event(&mut alice_rx, "user-joined").await;

    send_event(&mut alice_tx, "typing-start", json!({})).await;

    let typing = expect_event(&mut bob_rx, "user-typing").await;
    assert_eq!(typing["user"], "alice");
    assert_eq!(typing["isTyping"], true);
    assert_silent(&mut alice_rx).await;
}

#[tokio::test]
async fn join_room_moves_user_between_rooms() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (_bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;

    send_event(&mut alice_tx, "join-room", json!({ "roomName": "tech" })).await;

    let left = expect_event(&mut bob_rx, "user-left-room").await;
    assert_eq!(left["user"], "alice");
    assert_eq!(left["room"], "general");

    let history = expect_event(&mut alice_rx, "room-history").await;
    assert_eq!(history["room"], "tech");
    let joined = next_frame(&mut alice_rx).await;
    assert_eq!(joined["t"], "room-joined");
    assert_eq!(joined["d"]["room"], "tech");
    assert_eq!(joined["d"]["users"][0]["username"], "alice");

    // Messages now stay in tech.
    send_event(&mut alice_tx, "send-message", json!({ "text": "in tech" })).await;
    let msg = expect_event(&mut alice_rx, "new-message").await;
    assert_eq!(msg["room"], "tech");
    assert_silent(&mut bob_rx).await;
}

#[tokio::test]
async fn private_message_delivered_to_both_parties() {
    let (addr, state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (_bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;
    let (_carol_tx, mut carol_rx, _) = join_as(addr, "carol").await;

    send_event(
        &mut alice_tx,
        "private-message",
        json!({ "toUser": "bob", "text": "secret" }),
    )
    .await;

    let to_bob = expect_event(&mut bob_rx, "private-message-received").await;
    let to_alice = expect_event(&mut alice_rx, "private-message-received").await;

    assert_eq!(to_bob["id"], to_alice["id"]);
    assert_eq!(to_bob["text"], "secret");
    assert_eq!(to_bob["from"], "alice");
    assert_eq!(to_bob["to"], "bob");
    assert_eq!(to_bob["isPrivate"], true);
    assert!(to_bob.get("isOwn").is_none());
    assert_eq!(to_alice["isOwn"], true);

    assert_silent(&mut carol_rx).await;
    assert_eq!(state.store.lock().conversation_count(), 1);
}

#[tokio::test]
async fn private_message_to_absent_user_errors() {
    let (addr, state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;

    send_event(
        &mut alice_tx,
        "private-message",
        json!({ "toUser": "carol", "text": "hello?" }),
    )
    .await;

    let err = expect_event(&mut alice_rx, "private-message-error").await;
    assert_eq!(err["error"], "User is offline");
    assert_eq!(err["toUser"], "carol");
    assert_eq!(state.store.lock().conversation_count(), 0);
}

#[tokio::test]
async fn reaction_is_broadcast_to_room() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (mut bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;

    send_event(&mut alice_tx, "send-message", json!({ "text": "react to me" })).await;
    let msg = expect_event(&mut bob_rx, "new-message").await;
    let message_id = msg["id"].as_str().unwrap().to_string();

    send_event(
        &mut bob_tx,
        "message-reaction",
        json!({ "messageId": message_id, "reaction": "👍" }),
    )
    .await;

    let added = expect_event(&mut alice_rx, "message-reaction-added").await;
    assert_eq!(added["messageId"], message_id.as_str());
    assert_eq!(added["reaction"], "👍");
    assert_eq!(added["user"], "bob");
}

#[tokio::test]
async fn invalid_frames_are_reported() {
    let (addr, _state) = common::start_ws_server().await;
    let (mut write, mut read) = connect(addr).await;

    write
        .send(tungstenite::Message::Text("not json".into()))
        .await
        .unwrap();
    let err = expect_event(&mut read, "invalid-payload").await;
    assert_eq!(err["event"], "unknown");

    send_event(&mut write, "join-room", json!({ "roomName": "  " })).await;
    let err = expect_event(&mut read, "invalid-payload").await;
    assert_eq!(err["event"], "join-room");

    send_event(&mut write, "self-destruct", json!({})).await;
    let err = expect_event(&mut read, "invalid-payload").await;
    assert_eq!(err["event"], "self-destruct");
}

#[tokio::test]
async fn events_before_join_are_ignored() {
    let (addr, state) = common::start_ws_server().await;
    let (mut write, mut read) = connect(addr).await;

    send_event(&mut write, "send-message", json!({ "text": "too early" })).await;
    assert_silent(&mut read).await;
    assert!(state.store.lock().room("general").unwrap().messages.is_empty());
}

#[tokio::test]
async fn disconnect_notifies_room_and_keeps_record() {
    let (addr, state) = common::start_ws_server().await;
    let (_alice_tx, mut alice_rx, _) = join_as(addr, "alice").await;
    let (mut bob_tx, _bob_rx, bob) = join_as(addr, "bob").await;
    expect_event(&mut alice_rx, "user-joined").await;

    bob_tx.send(tungstenite::Message::Close(None)).await.unwrap();

    let left = expect_event(&mut alice_rx, "user-left").await;
    assert_eq!(left["user"], "bob");
    assert_eq!(left["onlineUsers"], 1);
    let online = expect_event(&mut alice_rx, "online-users-update").await;
    assert_eq!(online.as_array().unwrap().len(), 1);

    let store = state.store.lock();
    let record = store.user(bob["id"].as_str().unwrap()).unwrap();
    assert!(!record.online);
}

#[tokio::test]
async fn reconnect_restores_identity() {
    let (addr, state) = common::start_ws_server().await;
    let (mut old_tx, _old_rx, alice) = join_as(addr, "alice").await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    old_tx.send(tungstenite::Message::Close(None)).await.unwrap();

    let (mut new_tx, mut new_rx) = connect(addr).await;
    send_event(&mut new_tx, "reconnect-user", json!({ "userId": alice_id })).await;

    // The presence update may still be racing the old socket's close; wait
    // for one that lists alice.
    loop {
        let online = expect_event(&mut new_rx, "online-users-update").await;
        if online.as_array().unwrap().iter().any(|u| u["id"] == alice_id.as_str()) {
            break;
        }
    }

    send_event(&mut new_tx, "send-message", json!({ "text": "back" })).await;
    let msg = expect_event(&mut new_rx, "new-message").await;
    assert_eq!(msg["userId"], alice_id.as_str());
    assert_eq!(state.store.lock().user_count(), 1);
}

#[tokio::test]
async fn sweeper_expires_idle_session() {
    let (addr, state) = common::start_ws_server().await;
    let (_alice_tx, mut alice_rx, alice) = join_as(addr, "alice").await;
    let (_bob_tx, mut bob_rx, _) = join_as(addr, "bob").await;
    expect_event(&mut alice_rx, "user-joined").await;

    let alice_id = alice["id"].as_str().unwrap();
    state
        .store
        .lock()
        .record_activity(alice_id, Utc::now() - chrono::Duration::hours(1));

    assert_eq!(chat_api::chat::sweeper::run_sweep(&state), 1);

    let expired = expect_event(&mut alice_rx, "session-expired").await;
    assert_eq!(expired["userId"], alice_id);

    let left = expect_event(&mut bob_rx, "user-left").await;
    assert_eq!(left["user"], "alice");
    let online = expect_event(&mut bob_rx, "online-users-update").await;
    let online = online.as_array().unwrap();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0]["username"], "bob");
}
