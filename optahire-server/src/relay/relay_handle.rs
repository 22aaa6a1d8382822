use crate::error::SignalError;
use crate::relay::RelayCommand;
use crate::room::{RegistryStats, RoomSnapshot};
use optahire_core::{ClientMessage, ConnectionId, Identity, MediaKind, RoomId};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to the relay task.
///
/// Every method only enqueues; effects are observed through the
/// `SignalingOutput` the relay was built with.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    pub fn new(tx: mpsc::Sender<RelayCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: RelayCommand) -> Result<(), SignalError> {
        self.tx.send(cmd).await.map_err(|_| SignalError::RelayClosed)
    }

    pub async fn dispatch(
        &self,
        connection: ConnectionId,
        identity: &Identity,
        msg: ClientMessage,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::from_client(connection, identity, msg))
            .await
    }

    pub async fn join(
        &self,
        connection: ConnectionId,
        identity: Identity,
        room_id: RoomId,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::Join {
            connection,
            identity,
            room_id,
        })
        .await
    }

    pub async fn relay_offer(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        offer: Value,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::Offer {
            connection,
            room_id,
            offer,
        })
        .await
    }

    pub async fn relay_answer(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        answer: Value,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::Answer {
            connection,
            room_id,
            answer,
        })
        .await
    }

    pub async fn relay_ice_candidate(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        candidate: Value,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::IceCandidate {
            connection,
            room_id,
            candidate,
        })
        .await
    }

    pub async fn relay_toggle(
        &self,
        connection: ConnectionId,
        room_id: Option<RoomId>,
        kind: MediaKind,
        enabled: bool,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::Toggle {
            connection,
            room_id,
            kind,
            enabled,
        })
        .await
    }

    pub async fn leave(
        &self,
        connection: ConnectionId,
        room_id: Option<RoomId>,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::Leave {
            connection,
            room_id,
        })
        .await
    }

    pub async fn end_call(
        &self,
        connection: ConnectionId,
        room_id: Option<RoomId>,
    ) -> Result<(), SignalError> {
        self.send(RelayCommand::EndCall {
            connection,
            room_id,
        })
        .await
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), SignalError> {
        self.send(RelayCommand::Disconnect { connection }).await
    }

    pub async fn snapshot(&self, room_id: RoomId) -> Result<Option<RoomSnapshot>, SignalError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Snapshot { room_id, reply }).await?;
        rx.await.map_err(|_| SignalError::RelayClosed)
    }

    pub async fn stats(&self) -> Result<RegistryStats, SignalError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats { reply }).await?;
        rx.await.map_err(|_| SignalError::RelayClosed)
    }

    pub async fn shutdown(&self) -> Result<(), SignalError> {
        self.send(RelayCommand::Shutdown).await
    }
}
