use crate::error::SignalError;
use optahire_core::{ConnectionId, MediaKind, Participant, RoomId};
use serde::Serialize;

/// A room pairs exactly one interviewer slot and one candidate slot.
pub const MAX_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomPhase {
    Empty,
    Waiting,
    Active,
}

/// Progress of the offer/answer exchange inside an active room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum Negotiation {
    Idle,
    Pending { initiator: ConnectionId, epoch: u64 },
    Connected,
}

#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    participants: Vec<Participant>,
    negotiation: Negotiation,
}

impl Room {
    pub(crate) fn new(id: RoomId, first: Participant) -> Self {
        Self {
            id,
            participants: vec![first],
            negotiation: Negotiation::Idle,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Participants in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn negotiation(&self) -> Negotiation {
        self.negotiation
    }

    pub fn phase(&self) -> RoomPhase {
        match self.participants.len() {
            0 => RoomPhase::Empty,
            1 => RoomPhase::Waiting,
            _ => RoomPhase::Active,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            phase: self.phase(),
            participants: self.participants.clone(),
            negotiation: self.negotiation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.participant(connection).is_some()
    }

    pub fn participant(&self, connection: &ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| &p.connection_id == connection)
    }

    /// The other participant, if any.
    pub fn peer_of(&self, connection: &ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| &p.connection_id != connection)
    }

    pub(crate) fn admit(&mut self, participant: Participant) -> Result<(), SignalError> {
        if self.contains(&participant.connection_id) {
            return Err(SignalError::AlreadyJoined(self.id.clone()));
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(SignalError::RoomFull(self.id.clone()));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Removing anyone abandons whatever negotiation was in flight.
    pub(crate) fn remove(&mut self, connection: &ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.connection_id == connection)?;
        self.negotiation = Negotiation::Idle;
        Some(self.participants.remove(index))
    }

    pub(crate) fn set_media(
        &mut self,
        connection: &ConnectionId,
        kind: MediaKind,
        enabled: bool,
    ) -> Option<&Participant> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.connection_id == connection)?;
        participant.media.set(kind, enabled);
        Some(participant)
    }

    /// Marks an offer in flight. Returns `false` when one is already pending,
    /// in which case the running timer keeps covering it.
    pub(crate) fn begin_negotiation(&mut self, initiator: ConnectionId, epoch: u64) -> bool {
        if matches!(self.negotiation, Negotiation::Pending { .. }) {
            return false;
        }
        self.negotiation = Negotiation::Pending { initiator, epoch };
        true
    }

    /// An answer from the non-initiating side settles the negotiation.
    pub(crate) fn complete_negotiation(&mut self, answerer: &ConnectionId) -> bool {
        match self.negotiation {
            Negotiation::Pending { initiator, .. } if &initiator != answerer => {
                self.negotiation = Negotiation::Connected;
                true
            }
            _ => false,
        }
    }

    /// Initiator of the negotiation identified by `epoch`, if still pending.
    pub(crate) fn pending_initiator(&self, epoch: u64) -> Option<ConnectionId> {
        match self.negotiation {
            Negotiation::Pending {
                initiator,
                epoch: current,
            } if current == epoch => Some(initiator),
            _ => None,
        }
    }
}

/// Read-only view of a room for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub phase: RoomPhase,
    pub participants: Vec<Participant>,
    pub negotiation: Negotiation,
}
