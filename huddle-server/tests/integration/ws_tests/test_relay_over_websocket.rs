use huddle_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, spawn_relay};

#[tokio::test]
async fn test_two_clients_negotiate_through_relay() {
    init_tracing();

    let addr = spawn_relay().await.expect("Failed to start relay");
    let mut alice = WsTestClient::connect(addr).await.expect("alice connect");
    let mut bob = WsTestClient::connect(addr).await.expect("bob connect");
    assert_ne!(alice.participant_id, bob.participant_id);

    alice
        .send(&ClientMessage::Join {
            room: "x".into(),
            nickname: "alice".into(),
        })
        .await
        .unwrap();
    // Round trip so alice's join is processed before bob's.
    alice.send(&ClientMessage::Ping).await.unwrap();
    assert_eq!(alice.recv().await.unwrap(), ServerMessage::Pong);

    bob.send(&ClientMessage::Join {
        room: "x".into(),
        nickname: "bob".into(),
    })
    .await
    .unwrap();

    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::Welcome {
            nickname: "bob".into(),
            participant_id: bob.participant_id,
        }
    );

    alice
        .send(&ClientMessage::Offer {
            target_id: bob.participant_id,
            sdp: "v=0 offer".into(),
            nickname: "alice".into(),
        })
        .await
        .unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        ServerMessage::Offer {
            sender_id: alice.participant_id,
            sdp: "v=0 offer".into(),
            nickname: "alice".into(),
        }
    );

    bob.send(&ClientMessage::Answer {
        target_id: alice.participant_id,
        sdp: "v=0 answer".into(),
    })
    .await
    .unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::Answer {
            sender_id: bob.participant_id,
            sdp: "v=0 answer".into(),
        }
    );

    let bob_id = bob.participant_id;
    bob.close().await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::Leave {
            participant_id: bob_id,
            nickname: "bob".into(),
        }
    );
}

#[tokio::test]
async fn test_malformed_message_gets_error_reply() {
    init_tracing();

    let addr = spawn_relay().await.expect("Failed to start relay");
    let mut alice = WsTestClient::connect(addr).await.expect("alice connect");

    alice.send_raw(r#"{"op":"teleport"}"#).await.unwrap();

    assert!(matches!(
        alice.recv().await.unwrap(),
        ServerMessage::Error { .. }
    ));

    alice.send(&ClientMessage::Ping).await.unwrap();
    assert_eq!(alice.recv().await.unwrap(), ServerMessage::Pong);
}
