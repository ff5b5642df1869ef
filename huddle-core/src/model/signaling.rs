use crate::model::ice::{IceCandidate, IceServerConfig};
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        room: String,
        nickname: String,
    },
    Offer {
        target_id: ParticipantId,
        sdp: String,
        nickname: String,
    },
    Answer {
        target_id: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        target_id: ParticipantId,
        candidate: IceCandidate,
    },
    Chat {
        text: String,
    },
    /// Leave the current room without closing the connection.
    Leave,
    Ping,
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection: the id the relay assigned.
    Connected {
        participant_id: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
    },
    /// Someone joined the recipient's room.
    Welcome {
        nickname: String,
        participant_id: ParticipantId,
    },
    Offer {
        sender_id: ParticipantId,
        sdp: String,
        nickname: String,
    },
    Answer {
        sender_id: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        sender_id: ParticipantId,
        candidate: IceCandidate,
    },
    Chat {
        text: String,
        sender_nickname: String,
    },
    /// Someone left the recipient's room.
    Leave {
        participant_id: ParticipantId,
        nickname: String,
    },
    Pong,
    Error {
        message: String,
    },
}
