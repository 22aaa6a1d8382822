use optahire_core::RoomId;
use thiserror::Error;

/// Failures of registry and relay operations.
///
/// None of these stop the relay; they are logged and, where the sender can
/// act on them, turned into a `roomFull` or `error` event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("no peer present in room {0}")]
    PeerAbsent(RoomId),

    #[error("connection is not a participant in room {0}")]
    NotInRoom(RoomId),

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("connection has not joined a room")]
    NotJoined,

    #[error("connection already joined room {0}")]
    AlreadyJoined(RoomId),

    #[error("invalid room id")]
    InvalidRoomId,

    #[error("only interviewers can end the call for everyone")]
    EndCallForbidden,

    #[error("negotiation in room {0} timed out")]
    NegotiationTimeout(RoomId),

    #[error("relay is not running")]
    RelayClosed,
}

impl SignalError {
    /// Text shown to the participant whose request failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::RoomFull(_) => {
                "This interview room is full. Maximum of 2 participants allowed.".to_owned()
            }
            Self::NotInRoom(_) => "You are not a participant in this room".to_owned(),
            Self::RoomNotFound(_) => "Room does not exist".to_owned(),
            Self::NotJoined => "You have not joined a call room".to_owned(),
            Self::InvalidRoomId => "Invalid room ID provided".to_owned(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no bearer token provided")]
    MissingToken,

    #[error("bearer token rejected")]
    InvalidToken,

    #[error("not authorized to join room {0}")]
    RoomForbidden(RoomId),
}

impl AuthError {
    /// Text shown to the participant whose join was refused.
    pub fn user_message(&self) -> String {
        match self {
            Self::RoomForbidden(_) => "You are not authorized to join this interview".to_owned(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
