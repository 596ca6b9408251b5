//! Full end-to-end session flow against a real `axum::Router` + WebSocket
//! transport, mirroring the teacher's `tests/e2e_tests.rs` style: spawn the
//! server on an ephemeral port, connect genuine `tokio-tungstenite` clients,
//! and assert on the JSON frames they actually receive.


use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use test_helpers::{adhoc_token, spawn_test_server};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

async fn recv_json(
    stream: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> Value {
    loop {
        let msg = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
            .await
            .expect("message within timeout")
            .expect("stream not closed")
            .expect("no transport error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("valid JSON frame");
        }
    }
}

#[tokio::test]
async fn two_players_join_and_host_starts_the_game() {
    let server = spawn_test_server().await;
    let url = server.ws_url("ARENA");

    let (mut host, _) = connect_async(&url).await.expect("host connects");
    host.send(Message::Text(
        json!({"action": "AUTH", "payload": {"token": adhoc_token("p1", "Alice")}}).to_string().into(),
    ))
    .await
    .unwrap();
    let auth = recv_json(&mut host).await;
    assert_eq!(auth["type"], "AUTH_SUCCESS");

    let (mut guest, _) = connect_async(&url).await.expect("guest connects");
    guest
        .send(Message::Text(
            json!({"action": "AUTH", "payload": {"token": adhoc_token("p2", "Bob")}}).to_string().into(),
        ))
        .await
        .unwrap();
    let auth = recv_json(&mut guest).await;
    assert_eq!(auth["type"], "AUTH_SUCCESS");

    // Both sockets receive a GAME_STATE_UPDATE on their own join, and the
    // host is additionally notified when the guest joins.
    let _ = recv_json(&mut host).await;
    let _ = recv_json(&mut host).await;
    let _ = recv_json(&mut guest).await;

    host.send(Message::Text(json!({"action": "START_GAME", "payload": {}}).to_string().into()))
        .await
        .unwrap();

    let mut saw_playing = false;
    for _ in 0..5 {
        let update = recv_json(&mut host).await;
        if update["type"] == "GAME_STATE_UPDATE" && update["payload"]["status"] == "Playing" {
            saw_playing = true;
            break;
        }
    }
    assert!(saw_playing, "expected a Playing snapshot after START_GAME");
}

#[tokio::test]
async fn missing_auth_frame_is_rejected() {
    let server = spawn_test_server().await;
    let url = server.ws_url("BADAUTH");
    let (mut socket, _) = connect_async(&url).await.expect("connects");

    socket
        .send(Message::Text(json!({"action": "ROLL_DICE", "payload": {}}).to_string().into()))
        .await
        .unwrap();

    let mut saw_failure_or_close = false;
    for _ in 0..2 {
        let msg = tokio::time::timeout(std::time::Duration::from_secs(2), socket.next())
            .await
            .expect("response within timeout");
        match msg {
            Some(Ok(Message::Close(frame))) => {
                let code: u16 = frame.map(|f| f.code.into()).unwrap_or(0);
                assert_eq!(code, 4001);
                saw_failure_or_close = true;
                break;
            }
            Some(Ok(Message::Text(text))) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value["type"], "AUTH_FAILURE");
                saw_failure_or_close = true;
            }
            None => break,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
    assert!(saw_failure_or_close, "expected AUTH_FAILURE or a 4001 close");
}
