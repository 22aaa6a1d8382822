use optahire_core::{RoomId, ServerMessage};
use optahire_server::{RelaySettings, SignalError};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{candidate, interviewer};

#[tokio::test]
async fn test_shutdown_command_ends_calls_and_stops_relay() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay.handle.shutdown().await.unwrap();

    let expected = ServerMessage::CallEnded {
        room_id: RoomId::from("R1"),
        message: "The signaling server is shutting down".to_owned(),
    };
    assert_eq!(relay.inbox.next_for(&a).await.unwrap(), expected);
    assert_eq!(relay.inbox.next_for(&b).await.unwrap(), expected);

    // The loop has exited, so nothing answers any more.
    assert_eq!(relay.handle.stats().await, Err(SignalError::RelayClosed));
}
