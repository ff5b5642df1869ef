use std::sync::Arc;

use huddle_core::{IceCandidate, ParticipantId};
use tokio::time::Instant;

use crate::error::SessionError;
use crate::peer::{PeerConnection, RemoteStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    OfferSent,
    OfferReceived,
    AnswerSent,
    AnswerReceived,
    Connected,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Created, OfferSent)
                | (Created, OfferReceived)
                | (OfferReceived, AnswerSent)
                | (OfferSent, AnswerReceived)
                | (AnswerReceived, Connected)
                | (AnswerSent, Connected)
                | (Connected, Connected)
        ) || (self != Closed && next == Closed)
    }
}

/// Negotiation state with one remote participant.
pub struct PeerSession {
    pub remote_id: ParticipantId,
    pub remote_nickname: String,
    pub role: SessionRole,
    pub connection: Arc<dyn PeerConnection>,
    state: SessionState,
    pending_candidates: Vec<IceCandidate>,
    remote_description_set: bool,
    remote_stream: Option<RemoteStream>,
    view_announced: bool,
    created_at: Instant,
}

impl std::fmt::Debug for PeerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSession")
            .field("remote_id", &self.remote_id)
            .field("remote_nickname", &self.remote_nickname)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("pending_candidates", &self.pending_candidates.len())
            .finish_non_exhaustive()
    }
}

impl PeerSession {
    pub fn new(
        remote_id: ParticipantId,
        remote_nickname: impl Into<String>,
        role: SessionRole,
        connection: Arc<dyn PeerConnection>,
    ) -> Self {
        Self {
            remote_id,
            remote_nickname: remote_nickname.into(),
            role,
            connection,
            state: SessionState::Created,
            pending_candidates: Vec::new(),
            remote_description_set: false,
            remote_stream: None,
            view_announced: false,
            created_at: Instant::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Moves to `Closed`. Returns false if it already was.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = SessionState::Closed;
        self.pending_candidates.clear();
        true
    }

    pub fn remote_description_set(&self) -> bool {
        self.remote_description_set
    }

    pub fn mark_remote_description_set(&mut self) {
        self.remote_description_set = true;
    }

    pub fn buffer_candidate(&mut self, candidate: IceCandidate) {
        self.pending_candidates.push(candidate);
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Buffered candidates in arrival order.
    pub fn take_pending_candidates(&mut self) -> Vec<IceCandidate> {
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    /// Records inbound media. Tracks of the same stream are merged.
    pub fn add_remote_stream(&mut self, stream: RemoteStream) {
        match &mut self.remote_stream {
            Some(existing) if existing.stream_id == stream.stream_id => {
                for track in stream.tracks {
                    if !existing.tracks.contains(&track) {
                        existing.tracks.push(track);
                    }
                }
            }
            _ => self.remote_stream = Some(stream),
        }
    }

    /// Returns the stream the first time the session is both connected and has
    /// inbound media; `None` before that and on every later call.
    pub fn announce_view(&mut self) -> Option<RemoteStream> {
        if self.view_announced || self.state != SessionState::Connected {
            return None;
        }
        let stream = self.remote_stream.clone()?;
        self.view_announced = true;
        Some(stream)
    }
}
