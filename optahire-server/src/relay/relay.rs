use crate::config::ServerConfig;
use crate::error::SignalError;
use crate::relay::{RelayCommand, RelayEvent, RelayHandle};
use crate::room::{JoinResult, LeaveResult, Room, RoomPhase, RoomRegistry};
use crate::signaling::SignalingOutput;
use optahire_core::{
    ConnectionId, IceServerConfig, Identity, MediaKind, Participant, RoomId, ServerMessage,
};
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub ice_servers: Vec<IceServerConfig>,
    pub negotiation_timeout: Duration,
    pub end_call_requires_interviewer: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for RelaySettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
            negotiation_timeout: config.negotiation_timeout(),
            end_call_requires_interviewer: config.end_call_requires_interviewer,
        }
    }
}

/// Which negotiation message is being forwarded.
enum Forward {
    Offer(Value),
    Answer(Value),
    IceCandidate(Value),
}

impl Forward {
    fn name(&self) -> &'static str {
        match self {
            Forward::Offer(_) => "offer",
            Forward::Answer(_) => "answer",
            Forward::IceCandidate(_) => "ice-candidate",
        }
    }

    fn into_message(self, room_id: RoomId, from: ConnectionId) -> ServerMessage {
        match self {
            Forward::Offer(offer) => ServerMessage::Offer {
                room_id,
                from,
                offer,
            },
            Forward::Answer(answer) => ServerMessage::Answer {
                room_id,
                from,
                answer,
            },
            Forward::IceCandidate(candidate) => ServerMessage::IceCandidate {
                room_id,
                from,
                candidate,
            },
        }
    }
}

/// The signaling relay.
///
/// One task owns the [`RoomRegistry`] and handles each command to completion
/// before reading the next, so membership changes never interleave.
/// Forwarding is at-most-once: nothing is buffered, retried or deduplicated.
pub struct Relay {
    registry: RoomRegistry,
    settings: RelaySettings,
    command_rx: mpsc::Receiver<RelayCommand>,
    event_rx: mpsc::Receiver<RelayEvent>,
    event_tx: mpsc::Sender<RelayEvent>,
    signaling: Arc<dyn SignalingOutput>,
    next_epoch: u64,
}

impl Relay {
    pub fn new(
        settings: RelaySettings,
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(64);

        Self {
            registry: RoomRegistry::new(),
            settings,
            command_rx,
            event_rx,
            event_tx,
            signaling,
            next_epoch: 0,
        }
    }

    /// Builds the relay and runs it on its own task.
    pub fn spawn(
        settings: RelaySettings,
        capacity: usize,
        signaling: Arc<dyn SignalingOutput>,
    ) -> (RelayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let relay = Relay::new(settings, rx, signaling);
        let task = tokio::spawn(relay.run());
        (RelayHandle::new(tx), task)
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if self.handle_command(c).await.is_break() {
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Shutting down relay.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                evt = self.event_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_event(e).await;
                    }
                }
            }
        }

        info!("Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) -> ControlFlow<()> {
        match cmd {
            RelayCommand::Join {
                connection,
                identity,
                room_id,
            } => self.handle_join(connection, identity, room_id).await,

            RelayCommand::Offer {
                connection,
                room_id,
                offer,
            } => {
                self.forward(connection, room_id, Forward::Offer(offer))
                    .await
            }

            RelayCommand::Answer {
                connection,
                room_id,
                answer,
            } => {
                self.forward(connection, room_id, Forward::Answer(answer))
                    .await
            }

            RelayCommand::IceCandidate {
                connection,
                room_id,
                candidate,
            } => {
                self.forward(connection, room_id, Forward::IceCandidate(candidate))
                    .await
            }

            RelayCommand::Toggle {
                connection,
                room_id,
                kind,
                enabled,
            } => self.handle_toggle(connection, room_id, kind, enabled).await,

            RelayCommand::Leave {
                connection,
                room_id,
            } => self.handle_leave(connection, room_id).await,

            RelayCommand::EndCall {
                connection,
                room_id,
            } => self.handle_end_call(connection, room_id).await,

            RelayCommand::Disconnect { connection } => {
                if let Some(left) = self.registry.leave(&connection) {
                    info!(
                        "Connection {} dropped out of room {}",
                        connection, left.room_id
                    );
                    self.notify_departure(left, true).await;
                }
            }

            RelayCommand::Snapshot { room_id, reply } => {
                let _ = reply.send(self.registry.get(&room_id).map(Room::snapshot));
            }

            RelayCommand::Stats { reply } => {
                let _ = reply.send(self.registry.stats());
            }

            RelayCommand::Shutdown => {
                self.shutdown().await;
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    async fn handle_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::NegotiationExpired { room_id, epoch } => {
                self.handle_negotiation_expired(room_id, epoch).await
            }
        }
    }

    async fn handle_join(&mut self, connection: ConnectionId, identity: Identity, room_id: RoomId) {
        info!(
            "Join request from {} ({}) for room {}",
            connection, identity.user_id, room_id
        );

        if !room_id.is_valid() {
            self.reject(connection, SignalError::InvalidRoomId).await;
            return;
        }

        if let Some(current) = self.registry.room_of(&connection).cloned() {
            if current == room_id {
                debug!("{} re-sent join for room {}", connection, room_id);
                self.acknowledge_join(connection, &room_id).await;
                return;
            }
            if self.registry.phase(&room_id) == RoomPhase::Active {
                warn!(
                    "Room {} is full, {} stays in room {}",
                    room_id, connection, current
                );
                self.reject_full(connection, room_id).await;
                return;
            }
            info!("{} switches from room {} to {}", connection, current, room_id);
            if let Some(left) = self.registry.leave(&connection) {
                self.notify_departure(left, false).await;
            }
        }

        let participant = Participant::new(connection, identity);
        match self.registry.join(&room_id, participant) {
            Ok(JoinResult::Created) => {
                info!("Room {} created by {}", room_id, connection);
                self.acknowledge_join(connection, &room_id).await;
            }

            Ok(JoinResult::Paired { existing }) => {
                info!(
                    "{} paired with {} in room {}",
                    connection, existing.connection_id, room_id
                );
                self.acknowledge_join(connection, &room_id).await;

                let Some(joined) = self
                    .registry
                    .get(&room_id)
                    .and_then(|room| room.participant(&connection))
                    .cloned()
                else {
                    return;
                };
                self.signaling
                    .send(
                        existing.connection_id,
                        ServerMessage::ParticipantJoined {
                            room_id,
                            participant: joined,
                        },
                    )
                    .await;
            }

            Err(SignalError::RoomFull(room_id)) => {
                warn!("Room {} is full, rejecting {}", room_id, connection);
                self.reject_full(connection, room_id).await;
            }

            Err(e) => self.reject(connection, e).await,
        }
    }

    async fn acknowledge_join(&self, connection: ConnectionId, room_id: &RoomId) {
        let participants = self
            .registry
            .get(room_id)
            .map(|room| room.participants().to_vec())
            .unwrap_or_default();

        self.signaling
            .send(
                connection,
                ServerMessage::CallRoomJoined {
                    room_id: room_id.clone(),
                    participants,
                    ice_servers: self.settings.ice_servers.clone(),
                },
            )
            .await;
    }

    async fn forward(&mut self, connection: ConnectionId, room_id: RoomId, payload: Forward) {
        let peer = match self.registry.peer_of(&room_id, &connection) {
            Ok(peer) => peer.connection_id,
            Err(SignalError::PeerAbsent(_)) => {
                warn!(
                    "Dropping {} from {}: no peer in room {}",
                    payload.name(),
                    connection,
                    room_id
                );
                return;
            }
            Err(e) => {
                warn!("Rejected {} from {}: {}", payload.name(), connection, e);
                self.reject(connection, e).await;
                return;
            }
        };

        match &payload {
            Forward::Offer(_) => self.begin_negotiation(connection, &room_id),
            Forward::Answer(_) => {
                if let Some(room) = self.registry.get_mut(&room_id)
                    && room.complete_negotiation(&connection)
                {
                    info!("Negotiation in room {} answered", room_id);
                }
            }
            Forward::IceCandidate(_) => {}
        }

        debug!(
            "Forwarding {} from {} to {} in room {}",
            payload.name(),
            connection,
            peer,
            room_id
        );
        self.signaling
            .send(peer, payload.into_message(room_id, connection))
            .await;
    }

    fn begin_negotiation(&mut self, initiator: ConnectionId, room_id: &RoomId) {
        let epoch = self.next_epoch + 1;
        let started = self
            .registry
            .get_mut(room_id)
            .is_some_and(|room| room.begin_negotiation(initiator, epoch));
        if !started {
            return;
        }
        self.next_epoch = epoch;

        let tx = self.event_tx.clone();
        let timeout = self.settings.negotiation_timeout;
        let room_id = room_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx
                .send(RelayEvent::NegotiationExpired { room_id, epoch })
                .await;
        });
    }

    async fn handle_negotiation_expired(&mut self, room_id: RoomId, epoch: u64) {
        let Some(room) = self.registry.get(&room_id) else {
            return;
        };
        let Some(initiator) = room.pending_initiator(epoch) else {
            debug!("Ignoring stale negotiation timer for room {}", room_id);
            return;
        };
        let Some(silent) = room.peer_of(&initiator).map(|p| p.connection_id) else {
            return;
        };

        warn!(
            "{}",
            SignalError::NegotiationTimeout(room_id.clone())
        );
        self.registry.leave(&silent);

        self.signaling
            .send(
                initiator,
                ServerMessage::NegotiationTimeout {
                    room_id: room_id.clone(),
                    message: "The other participant did not answer in time. Waiting for them to rejoin."
                        .to_owned(),
                },
            )
            .await;
        self.signaling
            .send(
                silent,
                ServerMessage::NegotiationTimeout {
                    room_id,
                    message: "Call setup timed out. Please rejoin the room.".to_owned(),
                },
            )
            .await;
    }

    async fn handle_toggle(
        &mut self,
        connection: ConnectionId,
        room_id: Option<RoomId>,
        kind: MediaKind,
        enabled: bool,
    ) {
        let Some(room_id) = self.resolve_room(connection, room_id).await else {
            return;
        };

        let Some(user_id) = self
            .registry
            .get_mut(&room_id)
            .and_then(|room| room.set_media(&connection, kind, enabled))
            .map(|p| p.identity.user_id.clone())
        else {
            return;
        };
        info!(
            "{} toggled {:?} {} in room {}",
            user_id,
            kind,
            if enabled { "on" } else { "off" },
            room_id
        );

        match self.registry.peer_of(&room_id, &connection) {
            Ok(peer) => {
                let peer = peer.connection_id;
                self.signaling
                    .send(peer, ServerMessage::toggle(kind, user_id, enabled))
                    .await;
            }
            Err(e) => debug!("Toggle not relayed: {}", e),
        }
    }

    async fn handle_leave(&mut self, connection: ConnectionId, room_id: Option<RoomId>) {
        if let Some(requested) = &room_id
            && self.registry.room_of(&connection) != Some(requested)
        {
            debug!("{} is not in room {}, nothing to leave", connection, requested);
            return;
        }

        match self.registry.leave(&connection) {
            Some(left) => {
                info!("{} left room {}", connection, left.room_id);
                self.notify_departure(left, false).await;
            }
            None => debug!("{} is not in any room, nothing to leave", connection),
        }
    }

    async fn handle_end_call(&mut self, connection: ConnectionId, room_id: Option<RoomId>) {
        let Some(room_id) = self.resolve_room(connection, room_id).await else {
            return;
        };
        let Some(ender) = self
            .registry
            .get(&room_id)
            .and_then(|room| room.participant(&connection))
            .cloned()
        else {
            return;
        };

        if self.settings.end_call_requires_interviewer && !ender.is_interviewer() {
            warn!("{} tried to end call in room {} without permission", connection, room_id);
            self.reject(connection, SignalError::EndCallForbidden).await;
            return;
        }

        let message = if ender.is_interviewer() {
            "The interviewer has ended the call".to_owned()
        } else {
            format!("{} has ended the call", ender.identity.display_name)
        };

        let participants = self.registry.end(&room_id);
        info!(
            "Call in room {} ended by {}, notifying {} participants",
            room_id,
            connection,
            participants.len()
        );
        for participant in participants {
            self.signaling
                .send(
                    participant.connection_id,
                    ServerMessage::CallEnded {
                        room_id: room_id.clone(),
                        message: message.clone(),
                    },
                )
                .await;
        }
    }

    async fn notify_departure(&self, left: LeaveResult, dropped: bool) {
        let LeaveResult {
            room_id,
            departed,
            remaining,
        } = left;

        let Some(remaining) = remaining else {
            info!("Room {} deleted (empty)", room_id);
            return;
        };

        self.signaling
            .send(
                remaining.connection_id,
                ServerMessage::ParticipantLeft {
                    room_id: room_id.clone(),
                    id: departed.connection_id,
                },
            )
            .await;

        if dropped && departed.is_interviewer() {
            self.signaling
                .send(
                    remaining.connection_id,
                    ServerMessage::InterviewerDisconnected { room_id },
                )
                .await;
        }
    }

    /// Room a toggle or end-call applies to: the named one, which must be the
    /// sender's, or else the sender's current room.
    async fn resolve_room(
        &self,
        connection: ConnectionId,
        requested: Option<RoomId>,
    ) -> Option<RoomId> {
        let current = self.registry.room_of(&connection).cloned();
        let result = match (requested, current) {
            (Some(requested), Some(current)) if requested == current => Ok(current),
            (None, Some(current)) => Ok(current),
            (Some(requested), _) => Err(SignalError::NotInRoom(requested)),
            (None, None) => Err(SignalError::NotJoined),
        };

        match result {
            Ok(room_id) => Some(room_id),
            Err(e) => {
                warn!("Rejected request from {}: {}", connection, e);
                self.reject(connection, e).await;
                None
            }
        }
    }

    async fn reject_full(&self, connection: ConnectionId, room_id: RoomId) {
        let message = SignalError::RoomFull(room_id.clone()).user_message();
        self.signaling
            .send(connection, ServerMessage::RoomFull { room_id, message })
            .await;
    }

    async fn reject(&self, connection: ConnectionId, error: SignalError) {
        self.signaling
            .send(connection, ServerMessage::error(error.user_message()))
            .await;
    }

    async fn shutdown(&mut self) {
        let rooms = self.registry.drain();
        info!("Relay shutting down, closing {} rooms", rooms.len());

        for room in rooms {
            for participant in room.participants() {
                self.signaling
                    .send(
                        participant.connection_id,
                        ServerMessage::CallEnded {
                            room_id: room.id().clone(),
                            message: "The signaling server is shutting down".to_owned(),
                        },
                    )
                    .await;
            }
        }
    }
}
