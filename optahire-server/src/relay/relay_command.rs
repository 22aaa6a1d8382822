use crate::room::{RegistryStats, RoomSnapshot};
use optahire_core::{ClientMessage, ConnectionId, Identity, MediaKind, RoomId};
use serde_json::Value;
use tokio::sync::oneshot;

/// Commands fed to the relay by the WebSocket layer.
#[derive(Debug)]
pub enum RelayCommand {
    Join {
        connection: ConnectionId,
        identity: Identity,
        room_id: RoomId,
    },

    Offer {
        connection: ConnectionId,
        room_id: RoomId,
        offer: Value,
    },

    Answer {
        connection: ConnectionId,
        room_id: RoomId,
        answer: Value,
    },

    IceCandidate {
        connection: ConnectionId,
        room_id: RoomId,
        candidate: Value,
    },

    Toggle {
        connection: ConnectionId,
        room_id: Option<RoomId>,
        kind: MediaKind,
        enabled: bool,
    },

    Leave {
        connection: ConnectionId,
        room_id: Option<RoomId>,
    },

    EndCall {
        connection: ConnectionId,
        room_id: Option<RoomId>,
    },

    /// The socket closed without a leave.
    Disconnect { connection: ConnectionId },

    Snapshot {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },

    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },

    Shutdown,
}

impl RelayCommand {
    pub fn from_client(connection: ConnectionId, identity: &Identity, msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::JoinCallRoom { room_id } => Self::Join {
                connection,
                identity: identity.clone(),
                room_id,
            },
            ClientMessage::Offer { room_id, offer } => Self::Offer {
                connection,
                room_id,
                offer,
            },
            ClientMessage::Answer { room_id, answer } => Self::Answer {
                connection,
                room_id,
                answer,
            },
            ClientMessage::IceCandidate { room_id, candidate } => Self::IceCandidate {
                connection,
                room_id,
                candidate,
            },
            ClientMessage::ToggleAudio { enabled, room_id } => Self::Toggle {
                connection,
                room_id,
                kind: MediaKind::Audio,
                enabled,
            },
            ClientMessage::ToggleVideo { enabled, room_id } => Self::Toggle {
                connection,
                room_id,
                kind: MediaKind::Video,
                enabled,
            },
            ClientMessage::LeaveCallRoom { room_id } => Self::Leave {
                connection,
                room_id,
            },
            ClientMessage::EndCall { room_id } => Self::EndCall {
                connection,
                room_id,
            },
        }
    }
}
