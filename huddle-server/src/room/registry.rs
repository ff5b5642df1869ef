use std::collections::{BTreeSet, HashMap};

use huddle_core::ParticipantId;
use tracing::{debug, info};

/// A connected client that has joined a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub nickname: String,
    pub room: String,
}

/// Result of [`RoomRegistry::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The participant was not in any room and is now a member.
    Admitted,
    /// The participant was already a member of this room. Nothing changed.
    AlreadyMember,
    /// The participant was in another room; it has been removed from it first.
    Moved {
        previous_room: String,
        nickname: String,
    },
}

/// Authoritative room membership of the relay.
///
/// Owned by the router task; never shared. A participant is in at most one room,
/// and a participant missing from the registry is treated as gone.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    participants: HashMap<ParticipantId, Participant>,
    rooms: HashMap<String, BTreeSet<ParticipantId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, participant_id: ParticipantId, room: &str, nickname: &str) -> JoinOutcome {
        let current_room = self
            .participants
            .get(&participant_id)
            .map(|existing| existing.room.clone());

        let outcome = match current_room {
            Some(current) if current == room => return JoinOutcome::AlreadyMember,
            Some(_) => match self.leave(participant_id) {
                Some((previous_room, nickname)) => JoinOutcome::Moved {
                    previous_room,
                    nickname,
                },
                None => JoinOutcome::Admitted,
            },
            None => JoinOutcome::Admitted,
        };

        self.participants.insert(
            participant_id,
            Participant {
                id: participant_id,
                nickname: nickname.to_owned(),
                room: room.to_owned(),
            },
        );
        let members = self.rooms.entry(room.to_owned()).or_default();
        members.insert(participant_id);

        info!(
            participant = %participant_id,
            room,
            nickname,
            members = members.len(),
            "Participant joined room"
        );
        outcome
    }

    /// Removes the participant, returning the room and nickname it had.
    pub fn leave(&mut self, participant_id: ParticipantId) -> Option<(String, String)> {
        let participant = self.participants.remove(&participant_id)?;

        if let Some(members) = self.rooms.get_mut(&participant.room) {
            members.remove(&participant_id);
            if members.is_empty() {
                self.rooms.remove(&participant.room);
                debug!(room = participant.room.as_str(), "Pruned empty room");
            }
        }

        info!(
            participant = %participant_id,
            room = participant.room.as_str(),
            "Participant left room"
        );
        Some((participant.room, participant.nickname))
    }

    pub fn members_of(&self, room: &str) -> BTreeSet<ParticipantId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn room_of(&self, participant_id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(participant_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
