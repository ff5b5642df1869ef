use std::sync::Arc;

use huddle_core::{
    ClientMessage, IceServerConfig, ParticipantId, ServerMessage, SignalingError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::room::{JoinOutcome, RoomRegistry};
use crate::router::{RelayStats, RouterCommand};
use crate::signaling::SignalingOutput;

/// The relay's message router.
///
/// A single task owns the [`RoomRegistry`]; every connection handler talks to it
/// through [`RouterCommand`]s, so membership changes and fan-out are serialized.
pub struct MessageRouter {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RouterCommand>,
    signaling: Arc<dyn SignalingOutput>,
    ice_servers: Vec<IceServerConfig>,
}

impl MessageRouter {
    pub fn new(
        command_rx: mpsc::Receiver<RouterCommand>,
        signaling: Arc<dyn SignalingOutput>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(),
            command_rx,
            signaling,
            ice_servers,
        }
    }

    /// Runs until every command sender is dropped.
    pub async fn run(mut self) {
        info!("Router event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Router event loop finished");
    }

    async fn handle_command(&mut self, cmd: RouterCommand) {
        match cmd {
            RouterCommand::Connected { participant_id } => {
                let hello = ServerMessage::Connected {
                    participant_id,
                    ice_servers: self.ice_servers.clone(),
                };
                self.deliver(participant_id, hello).await;
            }

            RouterCommand::Message {
                participant_id,
                message,
            } => self.handle_message(participant_id, message).await,

            RouterCommand::Disconnected { participant_id } => {
                info!("Participant {} disconnected", participant_id);
                self.depart(participant_id).await;
            }

            RouterCommand::Stats { reply } => {
                let _ = reply.send(RelayStats {
                    participants: self.registry.participant_count(),
                    rooms: self.registry.room_count(),
                });
            }
        }
    }

    async fn handle_message(&mut self, sender_id: ParticipantId, message: ClientMessage) {
        match message {
            ClientMessage::Join { room, nickname } => {
                self.handle_join(sender_id, room, nickname).await;
            }

            ClientMessage::Offer {
                target_id,
                sdp,
                nickname,
            } => {
                let msg = ServerMessage::Offer {
                    sender_id,
                    sdp,
                    nickname,
                };
                self.deliver(target_id, msg).await;
            }

            ClientMessage::Answer { target_id, sdp } => {
                self.deliver(target_id, ServerMessage::Answer { sender_id, sdp })
                    .await;
            }

            ClientMessage::IceCandidate {
                target_id,
                candidate,
            } => {
                let msg = ServerMessage::IceCandidate {
                    sender_id,
                    candidate,
                };
                self.deliver(target_id, msg).await;
            }

            ClientMessage::Chat { text } => {
                let Some(sender) = self.registry.room_of(&sender_id) else {
                    warn!("Dropping chat from {}: not in a room", sender_id);
                    return;
                };
                let room = sender.room.clone();
                let msg = ServerMessage::Chat {
                    text,
                    sender_nickname: sender.nickname.clone(),
                };
                self.broadcast(&room, sender_id, msg).await;
            }

            ClientMessage::Leave => self.depart(sender_id).await,

            ClientMessage::Ping => self.deliver(sender_id, ServerMessage::Pong).await,
        }
    }

    async fn handle_join(&mut self, participant_id: ParticipantId, room: String, nickname: String) {
        if room.trim().is_empty() {
            let msg = ServerMessage::Error {
                message: "Room name must not be empty".to_owned(),
            };
            self.deliver(participant_id, msg).await;
            return;
        }

        match self.registry.join(participant_id, &room, &nickname) {
            JoinOutcome::AlreadyMember => {
                debug!("{} is already in room '{}'", participant_id, room);
                return;
            }
            JoinOutcome::Moved {
                previous_room,
                nickname: previous_nickname,
            } => {
                let msg = ServerMessage::Leave {
                    participant_id,
                    nickname: previous_nickname,
                };
                self.broadcast(&previous_room, participant_id, msg).await;
            }
            JoinOutcome::Admitted => {}
        }

        let welcome = ServerMessage::Welcome {
            nickname,
            participant_id,
        };
        self.broadcast(&room, participant_id, welcome).await;
    }

    /// Removes the participant from its room and tells the remaining members.
    async fn depart(&mut self, participant_id: ParticipantId) {
        let Some((room, nickname)) = self.registry.leave(participant_id) else {
            return;
        };

        let msg = ServerMessage::Leave {
            participant_id,
            nickname,
        };
        self.broadcast(&room, participant_id, msg).await;
    }

    /// Sends `message` to every member of `room` except `except`.
    ///
    /// Each delivery is independent: a failure for one member is logged and the
    /// fan-out continues.
    async fn broadcast(&self, room: &str, except: ParticipantId, message: ServerMessage) {
        for member in self.registry.members_of(room) {
            if member == except {
                continue;
            }
            self.deliver(member, message.clone()).await;
        }
    }

    async fn deliver(&self, target_id: ParticipantId, message: ServerMessage) {
        match self.signaling.send(target_id, message).await {
            Ok(()) => {}
            Err(SignalingError::RoutingMiss(missing)) => {
                debug!("Dropping message for disconnected participant {}", missing);
            }
            Err(e) => error!("Failed to deliver message to {}: {}", target_id, e),
        }
    }
}
