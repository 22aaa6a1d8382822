mod connection;
mod participant;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use participant::{Identity, MediaKind, MediaState, Participant, Role, UserId};
pub use room::RoomId;
pub use signaling::{ClientMessage, IceServerConfig, ServerMessage};
