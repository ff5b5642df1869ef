use huddle_core::{ClientMessage, ServerMessage};

use crate::integration::{TestRelay, init_tracing};

#[tokio::test]
async fn test_chat_reaches_room_except_sender() {
    init_tracing();

    let relay = TestRelay::start();
    let alice = relay.connect().await;
    let bob = relay.connect().await;
    let carol = relay.connect().await;
    let outsider = relay.connect().await;
    relay.join(alice, "x", "alice").await;
    relay.join(bob, "x", "bob").await;
    relay.join(carol, "x", "carol").await;
    relay.join(outsider, "y", "dave").await;
    relay.flush().await;
    relay.signaling.clear().await;

    relay
        .send(
            alice,
            ClientMessage::Chat {
                text: "hello".into(),
            },
        )
        .await;
    relay.flush().await;

    let expected = vec![ServerMessage::Chat {
        text: "hello".into(),
        sender_nickname: "alice".into(),
    }];
    assert_eq!(relay.signaling.signals_for(&bob).await, expected);
    assert_eq!(relay.signaling.signals_for(&carol).await, expected);
    assert!(relay.signaling.signals_for(&alice).await.is_empty());
    assert!(relay.signaling.signals_for(&outsider).await.is_empty());
}

#[tokio::test]
async fn test_chat_without_room_is_dropped() {
    init_tracing();

    let relay = TestRelay::start();
    let alice = relay.connect().await;
    let bob = relay.connect().await;
    relay.join(bob, "x", "bob").await;
    relay.flush().await;

    relay
        .send(
            alice,
            ClientMessage::Chat {
                text: "anyone?".into(),
            },
        )
        .await;
    relay.flush().await;

    assert!(relay.signaling.signals_for(&alice).await.is_empty());
    assert!(relay.signaling.signals_for(&bob).await.is_empty());
}
