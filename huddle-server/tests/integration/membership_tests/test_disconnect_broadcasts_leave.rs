use huddle_core::{ClientMessage, ServerMessage};

use crate::integration::{TestRelay, init_tracing};

#[tokio::test]
async fn test_disconnect_broadcasts_leave_to_room_only() {
    init_tracing();

    let relay = TestRelay::start();
    let alice = relay.connect().await;
    let bob = relay.connect().await;
    let carol = relay.connect().await;
    let outsider = relay.connect().await;

    relay.join(alice, "x", "alice").await;
    relay.join(carol, "x", "carol").await;
    relay.join(outsider, "y", "dave").await;
    relay.join(bob, "x", "bob").await;
    relay.flush().await;
    relay.signaling.clear().await;

    relay.disconnect(bob).await;
    let stats = relay.flush().await;

    let expected = vec![ServerMessage::Leave {
        participant_id: bob,
        nickname: "bob".into(),
    }];
    assert_eq!(relay.signaling.signals_for(&alice).await, expected);
    assert_eq!(relay.signaling.signals_for(&carol).await, expected);
    assert!(relay.signaling.signals_for(&outsider).await.is_empty());
    assert_eq!(stats.participants, 3);
}

#[tokio::test]
async fn test_disconnect_without_join_is_silent() {
    init_tracing();

    let relay = TestRelay::start();
    let alice = relay.connect().await;
    let lurker = relay.connect().await;
    relay.join(alice, "x", "alice").await;

    relay.disconnect(lurker).await;
    relay.flush().await;

    assert!(relay.signaling.signals_for(&alice).await.is_empty());
}

#[tokio::test]
async fn test_explicit_leave_then_disconnect_notifies_once() {
    init_tracing();

    let relay = TestRelay::start();
    let alice = relay.connect().await;
    let bob = relay.connect().await;
    relay.join(alice, "x", "alice").await;
    relay.join(bob, "x", "bob").await;
    relay.flush().await;
    relay.signaling.clear().await;

    relay.send(bob, ClientMessage::Leave).await;
    relay.disconnect(bob).await;
    relay.flush().await;

    assert_eq!(
        relay.signaling.signals_for(&alice).await,
        vec![ServerMessage::Leave {
            participant_id: bob,
            nickname: "bob".into(),
        }]
    );
}
