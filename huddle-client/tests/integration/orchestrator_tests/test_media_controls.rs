use std::sync::Arc;

use huddle_client::media::{LocalTrack, TrackKind};
use huddle_client::peer::PeerConnection;
use huddle_client::session::SessionState;
use huddle_client::{ClientError, UiEvent};
use huddle_core::{ClientMessage, ParticipantId, ServerMessage, SignalingError};

use crate::integration::TestOrchestrator;
use crate::utils::MockMediaSource;

#[tokio::test]
async fn test_replace_outbound_video_reaches_every_session() {
    let mut t = TestOrchestrator::new().await;
    let bob = ParticipantId::new();
    let carol = ParticipantId::new();
    let dave = ParticipantId::new();
    t.connect_as_offerer(bob, "bob").await;
    t.welcome(carol, "carol").await;
    t.offer_from(dave, "dave").await;
    t.sent();

    let before: Vec<SessionState> = t.orchestrator.snapshot().iter().map(|s| s.state).collect();
    assert_eq!(
        before,
        [SessionState::Connected, SessionState::OfferSent, SessionState::AnswerSent]
    );

    t.orchestrator
        .replace_outbound_video(LocalTrack::detached("screen", TrackKind::Video))
        .await
        .unwrap();

    for connection in t.connector.connections().await {
        assert_eq!(
            connection.outbound_video_track_id().await.as_deref(),
            Some("screen")
        );
    }
    let after: Vec<SessionState> = t.orchestrator.snapshot().iter().map(|s| s.state).collect();
    assert_eq!(before, after);
    assert_eq!(t.orchestrator.local_media().video().unwrap().id(), "screen");
    assert!(t.sent().is_empty());
}

#[tokio::test]
async fn test_rejected_video_swap_keeps_current_track_everywhere() {
    let mut t = TestOrchestrator::new().await;
    let bob = ParticipantId::new();
    let carol = ParticipantId::new();
    t.connect_as_offerer(bob, "bob").await;
    t.connect_as_offerer(carol, "carol").await;
    t.connector
        .connection_for(&carol)
        .await
        .unwrap()
        .reject_video_swaps();

    let err = t
        .orchestrator
        .replace_outbound_video(LocalTrack::detached("screen", TrackKind::Video))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::VideoSwapRejected { ref rejected } if *rejected == [carol]
    ));
    for connection in t.connector.connections().await {
        assert_eq!(
            connection.outbound_video_track_id().await.as_deref(),
            Some("video-front-0")
        );
    }
    let video = t.orchestrator.local_media().video().unwrap();
    assert_eq!(video.id(), "video-front-0");
    assert!(!video.is_stopped());
}

#[tokio::test]
async fn test_rejected_camera_switch_stops_new_track_only() {
    let mut t = TestOrchestrator::new().await;
    let bob = ParticipantId::new();
    t.connect_as_offerer(bob, "bob").await;
    let connection = t.connector.connection_for(&bob).await.unwrap();
    connection.reject_video_swaps();
    let old_video = t.orchestrator.local_media().video().unwrap().clone();

    let err = t.orchestrator.switch_camera("back".into()).await.unwrap_err();

    assert!(matches!(err, ClientError::VideoSwapRejected { .. }));
    assert!(!old_video.is_stopped());
    assert_eq!(
        connection.outbound_video_track_id().await.as_deref(),
        Some("video-front-0")
    );
    assert_eq!(
        t.orchestrator.local_media().video().unwrap().id(),
        "video-front-0"
    );
}

#[tokio::test]
async fn test_switch_camera_keeps_video_flag_and_stops_old_track() {
    let mut t = TestOrchestrator::new().await;
    let bob = ParticipantId::new();
    t.connect_as_offerer(bob, "bob").await;

    let old_video = t.orchestrator.local_media().video().unwrap().clone();
    assert!(!t.orchestrator.toggle_video());

    t.orchestrator.switch_camera("back".into()).await.unwrap();

    let connection = t.connector.connection_for(&bob).await.unwrap();
    assert_eq!(
        connection.outbound_video_track_id().await.as_deref(),
        Some("video-back-1")
    );
    assert!(old_video.is_stopped());

    let media = t.orchestrator.local_media();
    let video = media.video().unwrap();
    assert_eq!(video.id(), "video-back-1");
    assert!(!video.is_enabled());
    assert_eq!(media.audio().unwrap().id(), "audio-0");
    assert!(!media.audio().unwrap().is_stopped());
}

#[tokio::test]
async fn test_switch_to_missing_camera_reports_media_unavailable() {
    let mut t = TestOrchestrator::new().await;

    let err = t.orchestrator.switch_camera("usb".into()).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Signaling(SignalingError::MediaUnavailable(_))
    ));
    assert!(matches!(
        t.ui_events().as_slice(),
        [UiEvent::MediaUnavailable { .. }]
    ));
    assert_eq!(
        t.orchestrator.local_media().video().unwrap().id(),
        "video-front-0"
    );
}

#[tokio::test]
async fn test_list_cameras() {
    let t = TestOrchestrator::with_media_source(Arc::new(MockMediaSource::new())).await;

    let cameras = t.orchestrator.list_cameras().await.unwrap();

    assert_eq!(cameras, MockMediaSource::devices());
}

#[tokio::test]
async fn test_toggles_flip_local_tracks() {
    let mut t = TestOrchestrator::new().await;

    assert!(!t.orchestrator.toggle_audio());
    assert!(!t.orchestrator.local_media().audio().unwrap().is_enabled());
    assert!(t.orchestrator.toggle_audio());

    assert!(!t.orchestrator.toggle_video());
    assert!(t.orchestrator.toggle_video());
    assert!(t.orchestrator.local_media().video().unwrap().is_enabled());
}

#[tokio::test]
async fn test_chat_is_sent_and_echoed() {
    let mut t = TestOrchestrator::new().await;

    t.orchestrator.send_chat("hi".into()).unwrap();
    t.signal(ServerMessage::Chat {
        text: "hello".into(),
        sender_nickname: "bob".into(),
    })
    .await;

    assert_eq!(t.sent(), vec![ClientMessage::Chat { text: "hi".into() }]);
    assert_eq!(
        t.ui_events(),
        vec![
            UiEvent::ChatMessage {
                from: None,
                text: "hi".into()
            },
            UiEvent::ChatMessage {
                from: Some("bob".into()),
                text: "hello".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_relay_error_is_surfaced() {
    let mut t = TestOrchestrator::new().await;

    t.signal(ServerMessage::Error {
        message: "Room name must not be empty".into(),
    })
    .await;

    assert_eq!(
        t.ui_events(),
        vec![UiEvent::RelayError {
            message: "Room name must not be empty".into()
        }]
    );
}
