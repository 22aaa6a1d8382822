use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

use optahire_core::{ConnectionId, Identity, Role, ServerMessage, UserId};

use super::mock_signaling::SignalMessage;

/// Timeout for a single expected signal (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// How long a connection must stay silent to count as "nothing sent" (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

pub fn identity(name: &str, role: Role) -> Identity {
    Identity {
        user_id: UserId::from(name),
        display_name: name.to_owned(),
        role,
    }
}

pub fn interviewer(name: &str) -> Identity {
    identity(name, Role::Interviewer)
}

pub fn candidate(name: &str) -> Identity {
    identity(name, Role::Candidate)
}

/// Per-connection view over the mock's signal channel.
///
/// Signals for other connections are parked, not dropped, so tests can read
/// each participant's events in order regardless of interleaving.
pub struct SignalInbox {
    rx: mpsc::UnboundedReceiver<SignalMessage>,
    parked: VecDeque<SignalMessage>,
}

impl SignalInbox {
    pub fn new(rx: mpsc::UnboundedReceiver<SignalMessage>) -> Self {
        Self {
            rx,
            parked: VecDeque::new(),
        }
    }

    /// Next event addressed to `connection`.
    pub async fn next_for(&mut self, connection: &ConnectionId) -> Result<ServerMessage> {
        if let Some(pos) = self.parked.iter().position(|s| &s.connection == connection) {
            if let Some(signal) = self.parked.remove(pos) {
                return Ok(signal.message);
            }
        }

        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        tokio::time::timeout(deadline, async {
            loop {
                match self.rx.recv().await {
                    Some(signal) if &signal.connection == connection => {
                        return Ok(signal.message);
                    }
                    Some(signal) => self.parked.push_back(signal),
                    None => anyhow::bail!("Signal channel closed"),
                }
            }
        })
        .await
        .with_context(|| format!("Timeout waiting for a signal to {}", connection))?
    }

    /// Next event for `connection`, which must carry the given wire name.
    pub async fn expect(
        &mut self,
        connection: &ConnectionId,
        event: &str,
    ) -> Result<ServerMessage> {
        let msg = self.next_for(connection).await?;
        anyhow::ensure!(
            msg.event_name() == event,
            "Expected {} for {}, got {:?}",
            event,
            connection,
            msg
        );
        Ok(msg)
    }

    /// Fails if `connection` receives anything within the quiet period.
    pub async fn expect_quiet(&mut self, connection: &ConnectionId) -> Result<()> {
        if let Some(signal) = self.parked.iter().find(|s| &s.connection == connection) {
            anyhow::bail!("Unexpected signal for {}: {:?}", connection, signal.message);
        }

        let quiet = Duration::from_millis(QUIET_PERIOD_MS);
        let result = tokio::time::timeout(quiet, async {
            loop {
                match self.rx.recv().await {
                    Some(signal) if &signal.connection == connection => return Some(signal),
                    Some(signal) => self.parked.push_back(signal),
                    None => return None,
                }
            }
        })
        .await;

        match result {
            Ok(Some(signal)) => anyhow::bail!(
                "Unexpected signal for {}: {:?}",
                connection,
                signal.message
            ),
            _ => Ok(()),
        }
    }
}
