use crate::auth::Authenticator;
use crate::error::AuthError;
use crate::relay::RelayHandle;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use optahire_core::{ConnectionId, Identity, RoomId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    authenticator: Arc<dyn Authenticator>,
}

/// Owns the outbound queue of every live socket and the relay handle.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) relay: RelayHandle,
}

impl SignalingService {
    pub fn new(relay: RelayHandle, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                authenticator,
            }),
            relay,
        }
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        self.inner.authenticator.authenticate(token).await
    }

    pub async fn authorize_room(&self, identity: &Identity, room_id: &RoomId) -> Result<(), AuthError> {
        self.inner.authenticator.authorize_room(identity, room_id).await
    }

    pub fn add_connection(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection, tx);
    }

    pub fn remove_connection(&self, connection: &ConnectionId) {
        self.inner.connections.remove(connection);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn send_message(&self, connection: ConnectionId, msg: &ServerMessage) {
        if let Some(peer) = self.inner.connections.get(&connection) {
            match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", connection, e);
                    }
                }
                Err(e) => error!("Failed to serialize {} event: {}", msg.event_name(), e),
            }
        } else {
            warn!(
                "Attempted to send {} to disconnected connection {}",
                msg.event_name(),
                connection
            );
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, connection: ConnectionId, msg: ServerMessage) {
        self.send_message(connection, &msg);
    }
}
