use async_trait::async_trait;
use optahire_core::{ConnectionId, ServerMessage};

/// Outbound side of the relay: whatever owns the client sockets implements
/// this so the relay can push events without knowing the transport.
///
/// Delivery is best effort. An unknown or closed connection is logged by the
/// implementation and the message is dropped.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, connection: ConnectionId, msg: ServerMessage);
}
