use optahire_core::RoomId;

/// Events the relay schedules for itself.
#[derive(Debug)]
pub enum RelayEvent {
    NegotiationExpired { room_id: RoomId, epoch: u64 },
}
