use huddle_core::ParticipantId;

use crate::peer::RemoteStream;

/// Notifications for whatever renders the call.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Someone entered the room. Negotiation with them has started.
    ParticipantJoined {
        remote_id: ParticipantId,
        nickname: String,
    },
    /// Fired once per session, when it is connected and media has arrived.
    RemoteStreamAvailable {
        remote_id: ParticipantId,
        nickname: String,
        stream: RemoteStream,
    },
    RemoveRemoteView {
        remote_id: ParticipantId,
    },
    /// `from` is `None` for the local echo of our own message.
    ChatMessage {
        from: Option<String>,
        text: String,
    },
    MediaUnavailable {
        reason: String,
    },
    RelayError {
        message: String,
    },
}
