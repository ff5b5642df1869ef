use std::net::SocketAddr;
use std::sync::Arc;

use huddle_client::{Client, ClientConfig, ClientError, UiEvent};
use huddle_server::RelayConfig;
use tokio::net::TcpListener;

use crate::integration::{init_tracing, wait_for_ui};
use crate::utils::{MockMediaSource, MockPeerConnector};

async fn spawn_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(huddle_server::serve(listener, RelayConfig::default()));
    addr
}

fn client_for(addr: SocketAddr) -> Client {
    Client::new(
        ClientConfig {
            relay_url: format!("ws://{}/ws", addr),
            ..Default::default()
        },
        Arc::new(MockPeerConnector::new()),
        Arc::new(MockMediaSource::new()),
    )
}

#[tokio::test]
async fn test_two_clients_connect_through_relay() {
    init_tracing();
    let addr = spawn_relay().await;

    let (alice, mut alice_ui) = client_for(addr).join("x", "alice").await.unwrap();
    let (bob, mut bob_ui) = client_for(addr).join("x", "bob").await.unwrap();
    let bob_id = bob.participant_id();

    let seen_by_alice = wait_for_ui(&mut alice_ui, |e| {
        matches!(e, UiEvent::RemoteStreamAvailable { .. })
    })
    .await;
    assert!(matches!(
        seen_by_alice,
        UiEvent::RemoteStreamAvailable { remote_id, ref nickname, .. }
            if remote_id == bob_id && nickname == "bob"
    ));

    let seen_by_bob = wait_for_ui(&mut bob_ui, |e| {
        matches!(e, UiEvent::RemoteStreamAvailable { .. })
    })
    .await;
    assert!(matches!(
        seen_by_bob,
        UiEvent::RemoteStreamAvailable { remote_id, .. } if remote_id == alice.participant_id()
    ));

    bob.leave().await.unwrap();

    assert_eq!(
        wait_for_ui(&mut alice_ui, |e| matches!(e, UiEvent::RemoveRemoteView { .. })).await,
        UiEvent::RemoveRemoteView { remote_id: bob_id }
    );
    assert!(alice.sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_relay_is_a_transport_error() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client_for(addr).join("x", "alice").await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
}
