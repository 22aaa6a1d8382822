//! Client-side call state machine.
//!
//! `CallSession` holds no sockets and no media objects. The UI feeds it local
//! actions and decoded [`ServerMessage`]s and executes the returned
//! [`SessionAction`]s against its own WebRTC stack, so every front end walks
//! the same transitions.

use crate::model::{
    ClientMessage, IceServerConfig, MediaKind, MediaState, Participant, RoomId, ServerMessage,
};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Joining,
    Waiting,
    Negotiating,
    Connected,
    Reconnecting,
    Ended,
}

/// Side effects the UI layer must perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    Send(ClientMessage),
    CreateOffer,
    ApplyRemoteOffer(Value),
    ApplyRemoteAnswer(Value),
    AddRemoteCandidate(Value),
    ClearRemoteView,
    MirrorRemoteMedia(MediaState),
    ShowNotice(String),
    Reconnect(Duration),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("camera or microphone unavailable: {0}")]
    MediaAcquisition(String),

    #[error("cannot {event} while {phase:?}")]
    InvalidTransition {
        phase: CallPhase,
        event: &'static str,
    },

    #[error("gave up reconnecting after {0} attempts")]
    ReconnectExhausted(u32),
}

/// Bounded exponential backoff for re-joining after a dropped socket.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the zero-based `attempt`, or `None` once attempts run out.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

pub struct CallSession {
    room_id: RoomId,
    phase: CallPhase,
    local_media: MediaState,
    remote: Option<Participant>,
    initiator: bool,
    remote_description_set: bool,
    pending_candidates: Vec<Value>,
    ice_servers: Vec<IceServerConfig>,
    policy: ReconnectPolicy,
    reconnect_attempts: u32,
}

impl CallSession {
    pub fn new(room_id: RoomId) -> Self {
        Self::with_policy(room_id, ReconnectPolicy::default())
    }

    pub fn with_policy(room_id: RoomId, policy: ReconnectPolicy) -> Self {
        Self {
            room_id,
            phase: CallPhase::Idle,
            local_media: MediaState::default(),
            remote: None,
            initiator: false,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            ice_servers: Vec::new(),
            policy,
            reconnect_attempts: 0,
        }
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn local_media(&self) -> MediaState {
        self.local_media
    }

    pub fn remote(&self) -> Option<&Participant> {
        self.remote.as_ref()
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    /// Enter the room once local media is available. A device failure keeps
    /// the session idle and is returned to the caller for display.
    pub fn start(&mut self, media: Result<(), String>) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(&[CallPhase::Idle], "start")?;
        media.map_err(SessionError::MediaAcquisition)?;

        self.phase = CallPhase::Joining;
        Ok(vec![self.join_message()])
    }

    pub fn handle(&mut self, msg: ServerMessage) -> Result<Vec<SessionAction>, SessionError> {
        match msg {
            ServerMessage::CallRoomJoined {
                participants,
                ice_servers,
                ..
            } => {
                self.expect_phase(&[CallPhase::Joining], "join room")?;
                self.ice_servers = ice_servers;
                self.reconnect_attempts = 0;

                // Join order is preserved; the newcomer is listed last.
                if participants.len() >= 2 {
                    let remote = participants[0].clone();
                    let media = remote.media;
                    self.remote = Some(remote);
                    self.initiator = false;
                    self.phase = CallPhase::Negotiating;
                    Ok(vec![SessionAction::MirrorRemoteMedia(media)])
                } else {
                    self.phase = CallPhase::Waiting;
                    Ok(Vec::new())
                }
            }

            ServerMessage::ParticipantJoined { participant, .. } => {
                self.expect_phase(&[CallPhase::Waiting], "accept participant")?;
                let media = participant.media;
                self.remote = Some(participant);
                self.initiator = true;
                self.remote_description_set = false;
                self.phase = CallPhase::Negotiating;
                Ok(vec![
                    SessionAction::MirrorRemoteMedia(media),
                    SessionAction::CreateOffer,
                ])
            }

            ServerMessage::Offer { offer, .. } => {
                self.expect_phase(&[CallPhase::Negotiating, CallPhase::Connected], "apply offer")?;
                self.initiator = false;
                self.phase = CallPhase::Negotiating;
                self.remote_description_set = true;

                let mut actions = vec![SessionAction::ApplyRemoteOffer(offer)];
                actions.extend(self.flush_candidates());
                Ok(actions)
            }

            ServerMessage::Answer { answer, .. } => {
                self.expect_phase(&[CallPhase::Negotiating], "apply answer")?;
                if !self.initiator {
                    return Err(SessionError::InvalidTransition {
                        phase: self.phase,
                        event: "apply answer",
                    });
                }
                self.remote_description_set = true;
                self.phase = CallPhase::Connected;

                let mut actions = vec![SessionAction::ApplyRemoteAnswer(answer)];
                actions.extend(self.flush_candidates());
                Ok(actions)
            }

            ServerMessage::IceCandidate { candidate, .. } => match self.phase {
                CallPhase::Negotiating | CallPhase::Connected => {
                    if self.remote_description_set {
                        Ok(vec![SessionAction::AddRemoteCandidate(candidate)])
                    } else {
                        self.pending_candidates.push(candidate);
                        Ok(Vec::new())
                    }
                }
                // Late candidates after a teardown are harmless.
                _ => Ok(Vec::new()),
            },

            ServerMessage::ParticipantToggleAudio { enabled, .. } => {
                Ok(self.mirror_remote(MediaKind::Audio, enabled))
            }

            ServerMessage::ParticipantToggleVideo { enabled, .. } => {
                Ok(self.mirror_remote(MediaKind::Video, enabled))
            }

            ServerMessage::ParticipantLeft { .. } => {
                if self.remote.is_none() {
                    return Ok(Vec::new());
                }
                self.reset_remote();
                self.phase = CallPhase::Waiting;
                Ok(vec![
                    SessionAction::ClearRemoteView,
                    SessionAction::ShowNotice("The other participant left the call".to_owned()),
                ])
            }

            ServerMessage::InterviewerDisconnected { .. } => Ok(vec![SessionAction::ShowNotice(
                "The interviewer has disconnected from the call".to_owned(),
            )]),

            ServerMessage::CallEnded { message, .. } => {
                self.reset_remote();
                self.phase = CallPhase::Ended;
                Ok(vec![
                    SessionAction::ClearRemoteView,
                    SessionAction::ShowNotice(message),
                ])
            }

            ServerMessage::RoomFull { message, .. } => {
                self.expect_phase(&[CallPhase::Joining], "handle room full")?;
                self.phase = CallPhase::Idle;
                Ok(vec![SessionAction::ShowNotice(message)])
            }

            ServerMessage::NegotiationTimeout { message, .. } => {
                let was_initiator = self.initiator;
                self.reset_remote();
                // The offering side keeps the room; the silent side was evicted.
                self.phase = if was_initiator {
                    CallPhase::Waiting
                } else {
                    CallPhase::Idle
                };
                Ok(vec![
                    SessionAction::ClearRemoteView,
                    SessionAction::ShowNotice(message),
                ])
            }

            ServerMessage::Error { message } => Ok(vec![SessionAction::ShowNotice(message)]),
        }
    }

    pub fn offer_created(&mut self, offer: Value) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(&[CallPhase::Negotiating], "send offer")?;
        if !self.initiator {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                event: "send offer",
            });
        }
        Ok(vec![SessionAction::Send(ClientMessage::Offer {
            room_id: self.room_id.clone(),
            offer,
        })])
    }

    pub fn answer_created(&mut self, answer: Value) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(&[CallPhase::Negotiating], "send answer")?;
        if self.initiator || !self.remote_description_set {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                event: "send answer",
            });
        }
        self.phase = CallPhase::Connected;
        Ok(vec![SessionAction::Send(ClientMessage::Answer {
            room_id: self.room_id.clone(),
            answer,
        })])
    }

    pub fn local_candidate(&mut self, candidate: Value) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(&[CallPhase::Negotiating, CallPhase::Connected], "send candidate")?;
        Ok(vec![SessionAction::Send(ClientMessage::IceCandidate {
            room_id: self.room_id.clone(),
            candidate,
        })])
    }

    pub fn toggle_audio(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.toggle(MediaKind::Audio)
    }

    pub fn toggle_video(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.toggle(MediaKind::Video)
    }

    pub fn leave(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(
            &[CallPhase::Waiting, CallPhase::Negotiating, CallPhase::Connected],
            "leave",
        )?;
        self.reset_remote();
        self.phase = CallPhase::Ended;
        Ok(vec![
            SessionAction::Send(ClientMessage::LeaveCallRoom {
                room_id: Some(self.room_id.clone()),
            }),
            SessionAction::ClearRemoteView,
        ])
    }

    pub fn end_call(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(
            &[CallPhase::Waiting, CallPhase::Negotiating, CallPhase::Connected],
            "end call",
        )?;
        self.reset_remote();
        self.phase = CallPhase::Ended;
        Ok(vec![
            SessionAction::Send(ClientMessage::EndCall {
                room_id: Some(self.room_id.clone()),
            }),
            SessionAction::ClearRemoteView,
        ])
    }

    /// The signaling socket dropped. Schedules a re-join while attempts remain.
    pub fn transport_lost(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        match self.phase {
            CallPhase::Idle | CallPhase::Ended => return Ok(Vec::new()),
            _ => {}
        }

        self.reset_remote();
        match self.policy.delay_for(self.reconnect_attempts) {
            Some(delay) => {
                self.reconnect_attempts += 1;
                self.phase = CallPhase::Reconnecting;
                Ok(vec![
                    SessionAction::ClearRemoteView,
                    SessionAction::Reconnect(delay),
                ])
            }
            None => {
                self.phase = CallPhase::Ended;
                Err(SessionError::ReconnectExhausted(self.reconnect_attempts))
            }
        }
    }

    /// A fresh socket is up; the relay treats this as a new join.
    pub fn reconnected(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(&[CallPhase::Reconnecting], "rejoin")?;
        self.phase = CallPhase::Joining;
        Ok(vec![self.join_message()])
    }

    fn toggle(&mut self, kind: MediaKind) -> Result<Vec<SessionAction>, SessionError> {
        self.expect_phase(
            &[CallPhase::Waiting, CallPhase::Negotiating, CallPhase::Connected],
            "toggle media",
        )?;
        let enabled = match kind {
            MediaKind::Audio => !self.local_media.audio,
            MediaKind::Video => !self.local_media.video,
        };
        self.local_media.set(kind, enabled);
        Ok(vec![SessionAction::Send(ClientMessage::toggle(
            kind,
            enabled,
            Some(self.room_id.clone()),
        ))])
    }

    fn mirror_remote(&mut self, kind: MediaKind, enabled: bool) -> Vec<SessionAction> {
        match self.remote.as_mut() {
            Some(remote) => {
                remote.media.set(kind, enabled);
                vec![SessionAction::MirrorRemoteMedia(remote.media)]
            }
            None => Vec::new(),
        }
    }

    fn flush_candidates(&mut self) -> Vec<SessionAction> {
        std::mem::take(&mut self.pending_candidates)
            .into_iter()
            .map(SessionAction::AddRemoteCandidate)
            .collect()
    }

    fn reset_remote(&mut self) {
        self.remote = None;
        self.initiator = false;
        self.remote_description_set = false;
        self.pending_candidates.clear();
    }

    fn join_message(&self) -> SessionAction {
        SessionAction::Send(ClientMessage::JoinCallRoom {
            room_id: self.room_id.clone(),
        })
    }

    fn expect_phase(&self, allowed: &[CallPhase], event: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                event,
            })
        }
    }
}
