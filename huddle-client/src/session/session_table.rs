use std::time::Duration;

use huddle_core::ParticipantId;
use tokio::time::Instant;

use crate::error::SessionError;
use crate::session::{PeerSession, SessionState};

/// Sessions keyed by remote id, kept in the order they were created.
#[derive(Debug, Default)]
pub struct PeerSessionTable {
    sessions: Vec<PeerSession>,
}

impl PeerSessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: PeerSession) -> Result<(), SessionError> {
        if self.contains(&session.remote_id) {
            return Err(SessionError::Duplicate(session.remote_id));
        }
        self.sessions.push(session);
        Ok(())
    }

    pub fn get(&self, remote_id: &ParticipantId) -> Option<&PeerSession> {
        self.sessions.iter().find(|s| s.remote_id == *remote_id)
    }

    pub fn get_mut(&mut self, remote_id: &ParticipantId) -> Option<&mut PeerSession> {
        self.sessions.iter_mut().find(|s| s.remote_id == *remote_id)
    }

    pub fn remove(&mut self, remote_id: &ParticipantId) -> Option<PeerSession> {
        let index = self.sessions.iter().position(|s| s.remote_id == *remote_id)?;
        Some(self.sessions.remove(index))
    }

    pub fn contains(&self, remote_id: &ParticipantId) -> bool {
        self.get(remote_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerSession> {
        self.sessions.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PeerSession> + '_ {
        self.sessions.drain(..)
    }

    /// Sessions older than `timeout` that never reached `Connected`.
    pub fn stalled(&self, timeout: Duration, now: Instant) -> Vec<ParticipantId> {
        self.sessions
            .iter()
            .filter(|s| !matches!(s.state(), SessionState::Connected | SessionState::Closed))
            .filter(|s| now.saturating_duration_since(s.created_at()) >= timeout)
            .map(|s| s.remote_id)
            .collect()
    }
}
