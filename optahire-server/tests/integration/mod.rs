pub mod messaging_tests;

use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use optahire_core::{ConnectionId, Identity, RoomId, ServerMessage};
use optahire_server::{Relay, RelayHandle, RelaySettings};

use crate::utils::{MockSignalingOutput, SignalInbox};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct TestRelay {
    pub handle: RelayHandle,
    pub inbox: SignalInbox,
    pub signaling: MockSignalingOutput,
}

pub fn create_test_relay(settings: RelaySettings) -> TestRelay {
    let (signaling, signal_rx) = MockSignalingOutput::new();
    let (handle, _task) = Relay::spawn(settings, 100, Arc::new(signaling.clone()));

    TestRelay {
        handle,
        inbox: SignalInbox::new(signal_rx),
        signaling,
    }
}

/// Settings with a negotiation timeout short enough for paused-clock tests.
pub fn fast_timeout_settings() -> RelaySettings {
    RelaySettings {
        negotiation_timeout: Duration::from_millis(100),
        ..RelaySettings::default()
    }
}

impl TestRelay {
    /// Joins `identity` to `room` and consumes the `callRoomJoined` ack.
    pub async fn join(&mut self, identity: Identity, room: &str) -> ConnectionId {
        let connection = ConnectionId::new();
        self.handle
            .join(connection, identity, RoomId::from(room))
            .await
            .expect("Failed to send join");

        let ack = self
            .inbox
            .expect(&connection, "callRoomJoined")
            .await
            .expect("Join not acknowledged");
        assert!(matches!(ack, ServerMessage::CallRoomJoined { .. }));
        connection
    }

    /// Joins two participants and drains the `participantJoined` notice.
    pub async fn pair(
        &mut self,
        first: Identity,
        second: Identity,
        room: &str,
    ) -> (ConnectionId, ConnectionId) {
        let a = self.join(first, room).await;
        let b = self.join(second, room).await;
        self.inbox
            .expect(&a, "participantJoined")
            .await
            .expect("Existing participant not notified");
        (a, b)
    }
}
