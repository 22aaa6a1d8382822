use crate::model::connection::ConnectionId;
use crate::model::participant::{MediaKind, Participant, UserId};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    /// Public Google STUN pair used by the interview client.
    pub fn default_stun() -> Vec<Self> {
        vec![
            Self::stun("stun:stun.l.google.com:19302"),
            Self::stun("stun:stun1.l.google.com:19302"),
        ]
    }
}

/// Events a browser sends over the signaling socket.
///
/// SDP and ICE payloads are kept as raw JSON and forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinCallRoom {
        room_id: RoomId,
    },
    Offer {
        room_id: RoomId,
        offer: Value,
    },
    Answer {
        room_id: RoomId,
        answer: Value,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        room_id: RoomId,
        candidate: Value,
    },
    ToggleAudio {
        enabled: bool,
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    ToggleVideo {
        enabled: bool,
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    LeaveCallRoom {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    EndCall {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
}

impl ClientMessage {
    pub fn toggle(kind: MediaKind, enabled: bool, room_id: Option<RoomId>) -> Self {
        match kind {
            MediaKind::Audio => Self::ToggleAudio { enabled, room_id },
            MediaKind::Video => Self::ToggleVideo { enabled, room_id },
        }
    }
}

/// Events the relay pushes to a connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    CallRoomJoined {
        room_id: RoomId,
        participants: Vec<Participant>,
        ice_servers: Vec<IceServerConfig>,
    },
    ParticipantJoined {
        room_id: RoomId,
        participant: Participant,
    },
    Offer {
        room_id: RoomId,
        from: ConnectionId,
        offer: Value,
    },
    Answer {
        room_id: RoomId,
        from: ConnectionId,
        answer: Value,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        room_id: RoomId,
        from: ConnectionId,
        candidate: Value,
    },
    ParticipantToggleAudio {
        user_id: UserId,
        enabled: bool,
    },
    ParticipantToggleVideo {
        user_id: UserId,
        enabled: bool,
    },
    ParticipantLeft {
        room_id: RoomId,
        id: ConnectionId,
    },
    InterviewerDisconnected {
        room_id: RoomId,
    },
    CallEnded {
        room_id: RoomId,
        message: String,
    },
    RoomFull {
        room_id: RoomId,
        message: String,
    },
    NegotiationTimeout {
        room_id: RoomId,
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn toggle(kind: MediaKind, user_id: UserId, enabled: bool) -> Self {
        match kind {
            MediaKind::Audio => Self::ParticipantToggleAudio { user_id, enabled },
            MediaKind::Video => Self::ParticipantToggleVideo { user_id, enabled },
        }
    }

    /// Wire name of the event, handy for logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CallRoomJoined { .. } => "callRoomJoined",
            Self::ParticipantJoined { .. } => "participantJoined",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::ParticipantToggleAudio { .. } => "participantToggleAudio",
            Self::ParticipantToggleVideo { .. } => "participantToggleVideo",
            Self::ParticipantLeft { .. } => "participantLeft",
            Self::InterviewerDisconnected { .. } => "interviewerDisconnected",
            Self::CallEnded { .. } => "callEnded",
            Self::RoomFull { .. } => "roomFull",
            Self::NegotiationTimeout { .. } => "negotiationTimeout",
            Self::Error { .. } => "error",
        }
    }
}
