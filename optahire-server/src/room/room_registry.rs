use crate::error::SignalError;
use crate::room::room::{Room, RoomPhase};
use optahire_core::{ConnectionId, Participant, RoomId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    /// The room did not exist; the joiner is alone and waits.
    Created,
    /// The joiner became second; `existing` must start the offer.
    Paired { existing: Participant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveResult {
    pub room_id: RoomId,
    pub departed: Participant,
    /// `None` means the room was destroyed.
    pub remaining: Option<Participant>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub participants: usize,
}

/// Which connections are in which room.
///
/// Plain data owned by the relay task; every mutation runs to completion
/// before the next command is read, so no locking is needed.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    memberships: HashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &mut self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<JoinResult, SignalError> {
        if !room_id.is_valid() {
            return Err(SignalError::InvalidRoomId);
        }
        let connection = participant.connection_id;
        if let Some(current) = self.memberships.get(&connection) {
            return Err(SignalError::AlreadyJoined(current.clone()));
        }

        let result = match self.rooms.get_mut(room_id) {
            None => {
                self.rooms
                    .insert(room_id.clone(), Room::new(room_id.clone(), participant));
                JoinResult::Created
            }
            Some(room) => {
                let existing = room.participants().first().cloned();
                room.admit(participant)?;
                match existing {
                    Some(existing) => JoinResult::Paired { existing },
                    None => JoinResult::Created,
                }
            }
        };

        self.memberships.insert(connection, room_id.clone());
        Ok(result)
    }

    /// Removes `connection` from whatever room it is in. A second call for the
    /// same connection is a no-op.
    pub fn leave(&mut self, connection: &ConnectionId) -> Option<LeaveResult> {
        let room_id = self.memberships.remove(connection)?;
        let room = self.rooms.get_mut(&room_id)?;
        let departed = room.remove(connection)?;
        let remaining = room.participants().first().cloned();

        if room.is_empty() {
            self.rooms.remove(&room_id);
        }

        Some(LeaveResult {
            room_id,
            departed,
            remaining,
        })
    }

    /// Destroys the room and returns everyone who was in it.
    pub fn end(&mut self, room_id: &RoomId) -> Vec<Participant> {
        let Some(room) = self.rooms.remove(room_id) else {
            return Vec::new();
        };
        let participants = room.participants().to_vec();
        for participant in &participants {
            self.memberships.remove(&participant.connection_id);
        }
        participants
    }

    /// Empties the registry, for shutdown.
    pub fn drain(&mut self) -> Vec<Room> {
        self.memberships.clear();
        self.rooms.drain().map(|(_, room)| room).collect()
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub(crate) fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn room_of(&self, connection: &ConnectionId) -> Option<&RoomId> {
        self.memberships.get(connection)
    }

    /// The relay target for a message from `connection` in `room_id`.
    pub fn peer_of(
        &self,
        room_id: &RoomId,
        connection: &ConnectionId,
    ) -> Result<&Participant, SignalError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SignalError::RoomNotFound(room_id.clone()))?;
        if !room.contains(connection) {
            return Err(SignalError::NotInRoom(room_id.clone()));
        }
        room.peer_of(connection)
            .ok_or_else(|| SignalError::PeerAbsent(room_id.clone()))
    }

    pub fn phase(&self, room_id: &RoomId) -> RoomPhase {
        self.rooms
            .get(room_id)
            .map(Room::phase)
            .unwrap_or(RoomPhase::Empty)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.rooms.len(),
            participants: self.memberships.len(),
        }
    }
}
